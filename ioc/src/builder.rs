//! The fluent `ContainerBuilder`.

use crate::construct::{Injectable, Parameter};
use crate::container::Container;
use crate::core::{Shared, TypeKey};
use crate::error::{Error, Result};
use crate::resolver::{Implementation, ImplementationEntry};
use crate::singleton::{Initializer, SingletonDescriptor, Singletons};
use crate::store::{Dispose, Registry};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Configures and builds a [`Container`].
///
/// Registration methods chain through `&mut Self` and fail on an occupied
/// slot; a failed registration leaves the earlier one untouched.
///
/// # Examples
///
/// ```
/// use lattice_ioc::{Constructor, Injectable};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///   fn now(&self) -> u64;
/// }
///
/// struct FixedClock;
/// impl Clock for FixedClock {
///   fn now(&self) -> u64 {
///     42
///   }
/// }
/// impl Injectable for FixedClock {
///   fn constructors() -> Vec<Constructor<Self>> {
///     vec![Constructor::new(|_| Ok(FixedClock))]
///   }
/// }
///
/// # fn main() -> lattice_ioc::Result<()> {
/// let mut builder = lattice_ioc::builder();
/// builder
///   .with_instance(Arc::new(String::from("config")))?
///   .with_singleton::<dyn Clock, FixedClock>(|clock| clock, None)?;
/// let container = builder.build()?;
///
/// assert_eq!(container.get::<dyn Clock>()?.now(), 42);
/// assert_eq!(*container.get::<String>()?, "config");
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ContainerBuilder<'p> {
  registry: Registry,
  singletons: Singletons,
  parent: Option<&'p Container<'p>>,
  fail_fast: bool,
}

impl<'p> ContainerBuilder<'p> {
  pub fn new() -> Self {
    Self::default()
  }

  /// A builder for a child of `parent`.
  pub fn child(parent: &'p Container<'p>) -> Self {
    Self {
      parent: Some(parent),
      ..Self::default()
    }
  }

  // --- PRIVATE HELPERS ---

  fn register_instance(
    &mut self,
    key: TypeKey,
    value: Shared,
    disposer: Option<Arc<dyn Dispose>>,
  ) -> Result<&mut Self> {
    if self.singletons.contains(&key) {
      return Err(Error::DuplicateRegistration {
        type_name: key.name(),
        key: None,
      });
    }
    self.registry.register_instance(key, value, disposer)?;
    debug!(service = key.name(), "instance registered");
    Ok(self)
  }

  fn register_implementation(
    &mut self,
    abstract_key: TypeKey,
    key: Option<&str>,
    entry: ImplementationEntry,
  ) -> Result<&mut Self> {
    debug!(service = abstract_key.name(), key, implementation = ?entry, "implementation registered");
    self.registry.register_implementation(abstract_key, key, entry)?;
    Ok(self)
  }

  // --- PUBLIC API ---

  /// Consults `parent` for instances and implementations this container lacks.
  pub fn with_parent(&mut self, parent: &'p Container<'p>) -> &mut Self {
    self.parent = Some(parent);
    self
  }

  /// Aborts `build()` at the first singleton that cannot be realized instead of
  /// reporting all of them.
  pub fn fail_fast(&mut self, enabled: bool) -> &mut Self {
    self.fail_fast = enabled;
    self
  }

  // --- Instance Registration ---

  /// Registers `instance` for `T`. The same `Arc` may be registered under
  /// several types.
  ///
  /// The container never releases instances registered this way, even if `T`
  /// implements [`Dispose`]. Use
  /// [`with_disposable_instance`](Self::with_disposable_instance) for those.
  pub fn with_instance<T: ?Sized + Any + Send + Sync>(&mut self, instance: Arc<T>) -> Result<&mut Self> {
    self.register_instance(TypeKey::of::<T>(), Shared::new(instance), None)
  }

  /// Registers `instance` for `T` and releases it when the container is disposed.
  pub fn with_disposable_instance<T: Dispose + Any>(&mut self, instance: Arc<T>) -> Result<&mut Self> {
    let disposer: Arc<dyn Dispose> = instance.clone();
    self.register_instance(TypeKey::of::<T>(), Shared::new(instance), Some(disposer))
  }

  // --- Implementation Registration ---

  /// Maps `A` to the concrete type `I`.
  pub fn with_implementation<A: ?Sized + Any + Send + Sync, I: Injectable>(
    &mut self,
    upcast: fn(Arc<I>) -> Arc<A>,
  ) -> Result<&mut Self> {
    let entry = Implementation::of::<I>(upcast).into();
    self.register_implementation(TypeKey::of::<A>(), None, entry)
  }

  /// Maps `A` under `key` to the concrete type `I`. Keyed mappings are only
  /// consulted by keyed lookups.
  pub fn with_keyed_implementation<A: ?Sized + Any + Send + Sync, I: Injectable>(
    &mut self,
    key: &str,
    upcast: fn(Arc<I>) -> Arc<A>,
  ) -> Result<&mut Self> {
    let entry = Implementation::of::<I>(upcast).into();
    self.register_implementation(TypeKey::of::<A>(), Some(key), entry)
  }

  /// Maps the open generic definition `D` to the open implementation `ID`.
  /// See [`Generic`](crate::Generic).
  pub fn with_generic_implementation<D: ?Sized + Any, ID: ?Sized + Any>(&mut self) -> Result<&mut Self> {
    let entry = ImplementationEntry::Open {
      definition: TypeKey::of::<ID>(),
    };
    self.register_implementation(TypeKey::of::<D>(), None, entry)
  }

  pub fn with_keyed_generic_implementation<D: ?Sized + Any, ID: ?Sized + Any>(
    &mut self,
    key: &str,
  ) -> Result<&mut Self> {
    let entry = ImplementationEntry::Open {
      definition: TypeKey::of::<ID>(),
    };
    self.register_implementation(TypeKey::of::<D>(), Some(key), entry)
  }

  // --- Singleton Registration ---

  /// Declares `A` as a singleton implemented by `I`, constructed with the
  /// optional `parameter`. It is realized by `build()` at the latest.
  pub fn with_singleton<A: ?Sized + Any + Send + Sync, I: Injectable>(
    &mut self,
    upcast: fn(Arc<I>) -> Arc<A>,
    parameter: Option<Parameter>,
  ) -> Result<&mut Self> {
    let key = TypeKey::of::<A>();
    if self.registry.contains_instance(&key) {
      return Err(Error::DuplicateRegistration {
        type_name: key.name(),
        key: None,
      });
    }

    let implementation = Implementation::of::<I>(upcast);
    self.singletons.declare(
      key,
      SingletonDescriptor {
        implementation: implementation.concrete(),
        activate: implementation.into_resolved().activate,
        parameter,
      },
    )?;
    debug!(service = key.name(), implementation = std::any::type_name::<I>(), "singleton declared");
    Ok(self)
  }

  // --- Queries ---

  /// Whether `T` is a declared singleton, has an instance, or has an unkeyed
  /// implementation, here or in the parent chain. Never fails.
  pub fn is_registered<T: ?Sized + Any>(&self) -> bool {
    let key = TypeKey::of::<T>();
    self.singletons.contains(&key)
      || self.registry.contains_instance(&key)
      || self.registry.contains_implementation(&key)
      || self.parent.is_some_and(|parent| parent.knows(&key))
  }

  /// Realizes every declared singleton and freezes the registrations.
  ///
  /// Fails with [`Error::CircularDependency`] when singleton construction
  /// re-enters itself, and with [`Error::UnsatisfiedSingleton`] listing every
  /// singleton that could not be realized otherwise.
  pub fn build(mut self) -> Result<Container<'p>> {
    debug!(
      singletons = self.singletons.len(),
      has_parent = self.parent.is_some(),
      "building container"
    );
    Initializer::new(&mut self.registry, &mut self.singletons, self.parent).realize_all(self.fail_fast)?;
    debug!("container built");
    Ok(Container::from_parts(self.registry, self.parent))
  }
}
