//! The registration store: materialized instances, implementation mappings and
//! the ordered set of instances to release on disposal.

use crate::core::{Shared, TypeKey};
use crate::error::{Error, Result};
use crate::resolver::ImplementationEntry;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// A release capability for instances owned by a container.
///
/// Registered disposables are released in reverse registration order when the
/// container is disposed or dropped, so a service is released before the
/// services it was built from.
pub trait Dispose: Send + Sync {
  fn dispose(&self);
}

#[derive(Default)]
pub(crate) struct Registry {
  instances: HashMap<TypeKey, Shared>,
  disposables: Vec<Arc<dyn Dispose>>,
  pub(crate) implementations: HashMap<TypeKey, ImplementationEntry>,
  pub(crate) keyed_implementations: HashMap<(String, TypeKey), ImplementationEntry>,
}

impl Registry {
  pub(crate) fn register_instance(
    &mut self,
    key: TypeKey,
    value: Shared,
    disposer: Option<Arc<dyn Dispose>>,
  ) -> Result<()> {
    match self.instances.entry(key) {
      Entry::Occupied(_) => {
        return Err(Error::DuplicateRegistration {
          type_name: key.name(),
          key: None,
        })
      }
      Entry::Vacant(slot) => {
        slot.insert(value);
      }
    }

    if let Some(disposer) = disposer {
      // One instance may be registered under several keys; release it once.
      let address = Arc::as_ptr(&disposer) as *const ();
      let enrolled = self
        .disposables
        .iter()
        .any(|existing| Arc::as_ptr(existing) as *const () == address);
      if !enrolled {
        self.disposables.push(disposer);
      }
    }

    trace!(service = key.name(), "registered instance");
    Ok(())
  }

  pub(crate) fn register_implementation(
    &mut self,
    abstract_key: TypeKey,
    key: Option<&str>,
    entry: ImplementationEntry,
  ) -> Result<()> {
    let occupied = || Error::DuplicateRegistration {
      type_name: abstract_key.name(),
      key: key.map(str::to_owned),
    };

    match key {
      None => match self.implementations.entry(abstract_key) {
        Entry::Occupied(_) => return Err(occupied()),
        Entry::Vacant(slot) => {
          slot.insert(entry);
        }
      },
      Some(name) => match self.keyed_implementations.entry((name.to_owned(), abstract_key)) {
        Entry::Occupied(_) => return Err(occupied()),
        Entry::Vacant(slot) => {
          slot.insert(entry);
        }
      },
    }

    trace!(service = abstract_key.name(), key, "registered implementation");
    Ok(())
  }

  /// Exact key match only; no parent lookup happens at this level.
  pub(crate) fn try_get_instance(&self, key: &TypeKey) -> Option<&Shared> {
    self.instances.get(key)
  }

  pub(crate) fn contains_instance(&self, key: &TypeKey) -> bool {
    self.instances.contains_key(key)
  }

  pub(crate) fn contains_implementation(&self, key: &TypeKey) -> bool {
    self.implementations.contains_key(key)
  }

  /// Releases every disposable in reverse registration order, then forgets all
  /// instances. Calling this again is a no-op.
  pub(crate) fn dispose(&mut self) {
    if self.disposables.is_empty() && self.instances.is_empty() {
      return;
    }

    debug!(
      disposables = self.disposables.len(),
      instances = self.instances.len(),
      "disposing registry"
    );
    while let Some(disposable) = self.disposables.pop() {
      disposable.dispose();
    }
    self.instances.clear();
  }
}

impl Drop for Registry {
  fn drop(&mut self) {
    self.dispose();
  }
}
