//! The build-time singleton initializer.
//!
//! Every declared singleton moves through `Declared -> InProgress` on its first
//! reference and ends either realized (promoted to a permanent instance of the
//! registry) or `Failed`. A reference to a singleton that is still `InProgress`
//! means its construction re-entered itself.

use crate::construct::{Param, Parameter, Resolve};
use crate::container::Container;
use crate::core::{Shared, TypeKey};
use crate::error::{Error, Result, SingletonFailure};
use crate::resolver::Activate;
use crate::store::Registry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};

pub(crate) struct SingletonDescriptor {
  pub(crate) implementation: TypeKey,
  pub(crate) activate: Activate,
  pub(crate) parameter: Option<Parameter>,
}

enum SingletonState {
  Declared(SingletonDescriptor),
  InProgress,
  Failed,
}

/// Declared singletons, kept in declaration order.
#[derive(Default)]
pub(crate) struct Singletons {
  states: HashMap<TypeKey, SingletonState>,
  order: Vec<TypeKey>,
}

impl Singletons {
  pub(crate) fn declare(&mut self, key: TypeKey, descriptor: SingletonDescriptor) -> Result<()> {
    if self.states.contains_key(&key) {
      return Err(Error::DuplicateRegistration {
        type_name: key.name(),
        key: None,
      });
    }
    self.states.insert(key, SingletonState::Declared(descriptor));
    self.order.push(key);
    Ok(())
  }

  pub(crate) fn contains(&self, key: &TypeKey) -> bool {
    self.states.contains_key(key)
  }

  pub(crate) fn len(&self) -> usize {
    self.states.len()
  }

  fn is_declared(&self, key: &TypeKey) -> bool {
    matches!(self.states.get(key), Some(SingletonState::Declared(_)))
  }
}

/// Satisfies constructor parameters while a container is being built.
///
/// Lookup order: instances of the registry and its ancestors, then declared
/// singletons, then construction of parameters declared injectable (cached as
/// instances). Anything else is unavailable.
pub(crate) struct Initializer<'a, 'p> {
  registry: &'a mut Registry,
  singletons: &'a mut Singletons,
  parent: Option<&'p Container<'p>>,
  constructing: HashSet<TypeKey>,
  failures: Vec<SingletonFailure>,
}

impl<'a, 'p> Initializer<'a, 'p> {
  pub(crate) fn new(
    registry: &'a mut Registry,
    singletons: &'a mut Singletons,
    parent: Option<&'p Container<'p>>,
  ) -> Self {
    Self {
      registry,
      singletons,
      parent,
      constructing: HashSet::new(),
      failures: Vec::new(),
    }
  }

  /// Forces every still-declared singleton through the state machine.
  ///
  /// A cycle aborts immediately. Other failures are collected; with `fail_fast`
  /// the first failing singleton stops the pass.
  pub(crate) fn realize_all(mut self, fail_fast: bool) -> Result<()> {
    let pending: Vec<TypeKey> = self.singletons.order.clone();
    for key in pending {
      if !self.singletons.is_declared(&key) {
        continue;
      }
      match self.realize(&key) {
        Err(error) if error.is_circular() => return Err(error),
        Err(_) if fail_fast => break,
        _ => {}
      }
    }

    if self.failures.is_empty() {
      Ok(())
    } else {
      Err(Error::UnsatisfiedSingleton {
        failures: self.failures,
      })
    }
  }

  fn lookup_instance(&self, key: &TypeKey) -> Option<Shared> {
    self
      .registry
      .try_get_instance(key)
      .cloned()
      .or_else(|| self.parent.and_then(|parent| parent.try_get_shared(key)))
  }

  fn realize(&mut self, key: &TypeKey) -> Result<Option<Shared>> {
    let previous = match self.singletons.states.get_mut(key) {
      Some(state) => std::mem::replace(state, SingletonState::InProgress),
      None => return Ok(None),
    };

    match previous {
      SingletonState::Declared(descriptor) => {
        debug!(
          singleton = key.name(),
          implementation = descriptor.implementation.name(),
          "realizing singleton"
        );
        match (descriptor.activate)(descriptor.parameter.as_ref(), self) {
          Ok(activated) => {
            self.singletons.states.remove(key);
            self
              .registry
              .register_instance(*key, activated.value.clone(), activated.disposer)?;
            Ok(Some(activated.value))
          }
          Err(error) => {
            warn!(singleton = key.name(), %error, "singleton could not be realized");
            self.singletons.states.insert(*key, SingletonState::Failed);
            self.failures.push(SingletonFailure {
              type_name: key.name(),
              source: error.clone(),
            });
            Err(error)
          }
        }
      }
      SingletonState::InProgress => Err(Error::CircularDependency {
        type_name: key.name(),
      }),
      SingletonState::Failed => {
        self.singletons.states.insert(*key, SingletonState::Failed);
        Ok(None)
      }
    }
  }

  fn construct_injectable(&mut self, param: &Param) -> Result<Option<Shared>> {
    let Some(activate) = param.activator() else {
      return Ok(None);
    };

    let key = *param.key();
    if !self.constructing.insert(key) {
      return Err(Error::CircularDependency {
        type_name: key.name(),
      });
    }
    let result = activate(None, self);
    self.constructing.remove(&key);

    let activated = result?;
    self
      .registry
      .register_instance(key, activated.value.clone(), activated.disposer)?;
    trace!(service = key.name(), "constructed and cached dependency");
    Ok(Some(activated.value))
  }
}

impl Resolve for Initializer<'_, '_> {
  fn resolve(&mut self, param: &Param) -> Result<Option<Shared>> {
    let key = param.key();
    if let Some(instance) = self.lookup_instance(key) {
      return Ok(Some(instance));
    }
    if self.singletons.contains(key) {
      // A nested failure is already recorded; the dependent may still fit
      // another constructor. Only a cycle aborts the scan.
      return match self.realize(key) {
        Err(error) if !error.is_circular() => Ok(None),
        other => other,
      };
    }
    self.construct_injectable(param)
  }
}
