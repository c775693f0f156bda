//! The built `Container` and its runtime query surface.

use crate::construct::{construct, Injectable, Param, Parameter, Resolve};
use crate::core::{Shared, TypeKey};
use crate::error::{Error, Result};
use crate::resolver::{Generic, GenericRequest, ImplementationMapper, ResolveRequest, Resolved};
use crate::store::Registry;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A built Inversion of Control (IoC) container.
///
/// A container is immutable once built: it serves instances registered on its
/// builder and the singletons realized by `build()`, and constructs transient
/// values on demand. Lookups that miss fall back to the optional parent. The
/// parent is borrowed, so it outlives every child built on top of it.
///
/// The container does no internal locking. It can be shared for queries, but
/// [`dispose`](Container::dispose) needs exclusive access.
pub struct Container<'p> {
  registry: Registry,
  parent: Option<&'p Container<'p>>,
}

impl<'p> Container<'p> {
  pub(crate) fn from_parts(registry: Registry, parent: Option<&'p Container<'p>>) -> Self {
    Self { registry, parent }
  }

  pub fn parent(&self) -> Option<&'p Container<'p>> {
    self.parent
  }

  // --- PRIVATE HELPERS ---

  pub(crate) fn try_get_shared(&self, key: &TypeKey) -> Option<Shared> {
    match self.registry.try_get_instance(key) {
      Some(instance) => Some(instance.clone()),
      None => self.parent.and_then(|parent| parent.try_get_shared(key)),
    }
  }

  /// Whether `key` has an instance or an unkeyed implementation here or in an ancestor.
  pub(crate) fn knows(&self, key: &TypeKey) -> bool {
    self.registry.contains_instance(key)
      || self.registry.contains_implementation(key)
      || self.parent.is_some_and(|parent| parent.knows(key))
  }

  fn parent_mapper(&self) -> Option<&dyn ImplementationMapper> {
    self.parent.map(|parent| parent as &dyn ImplementationMapper)
  }

  fn activate<A: ?Sized + Any + Send + Sync>(
    &self,
    request: &ResolveRequest<'_>,
    parameter: Option<Parameter>,
  ) -> Result<Arc<A>> {
    let resolved = ImplementationMapper::resolve(self, request)?;
    trace!(
      service = type_name::<A>(),
      implementation = resolved.concrete.name(),
      "constructing transient"
    );
    let activated = (resolved.activate)(parameter.as_ref(), &mut InstanceLookup { container: self })?;
    activated.value.downcast_or_mismatch::<A>()
  }

  fn generic_request<'s, A: ?Sized + Generic>(
    key: Option<&'s str>,
    specialize: &'s dyn Fn(&TypeKey) -> Option<Resolved>,
  ) -> ResolveRequest<'s> {
    ResolveRequest {
      abstract_key: TypeKey::of::<A>(),
      key,
      generic: Some(GenericRequest {
        definition: TypeKey::of::<A::Definition>(),
        specialize,
      }),
    }
  }

  // --- Instances ---

  /// Returns the instance registered for `T` here or in an ancestor.
  ///
  /// Nothing is constructed by this call.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    let key = TypeKey::of::<T>();
    self
      .try_get_shared(&key)
      .ok_or(Error::NotFound {
        type_name: key.name(),
        key: None,
      })?
      .downcast_or_mismatch::<T>()
  }

  /// Like [`get`](Self::get), but returns `None` when nothing is registered.
  pub fn try_get<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self
      .try_get_shared(&TypeKey::of::<T>())
      .and_then(|instance| instance.downcast::<T>())
  }

  pub fn contains<T: ?Sized + Any>(&self) -> bool {
    self.try_get_shared(&TypeKey::of::<T>()).is_some()
  }

  // --- Transient Construction ---
  // Constructed values are owned by the caller: never cached, never disposed.
  // Their parameters are satisfied from instances only.

  /// Constructs a new `T` directly.
  pub fn construct<T: Injectable>(&self, parameter: Option<Parameter>) -> Result<T> {
    construct::<T>(parameter.as_ref(), &mut InstanceLookup { container: self })
  }

  /// Constructs a new instance of the implementation registered for `A`.
  pub fn construct_as<A: ?Sized + Any + Send + Sync>(&self, parameter: Option<Parameter>) -> Result<Arc<A>> {
    self.activate::<A>(&ResolveRequest::new(TypeKey::of::<A>(), None), parameter)
  }

  /// Constructs a new instance of the implementation registered for `A` under `key`.
  pub fn construct_keyed<A: ?Sized + Any + Send + Sync>(
    &self,
    key: &str,
    parameter: Option<Parameter>,
  ) -> Result<Arc<A>> {
    self.activate::<A>(&ResolveRequest::new(TypeKey::of::<A>(), Some(key)), parameter)
  }

  /// Constructs a new instance of the implementation registered for `A`, or of
  /// the open implementation registered for `A`'s generic definition.
  pub fn construct_generic<A: ?Sized + Generic>(&self, parameter: Option<Parameter>) -> Result<Arc<A>> {
    let specialize = |definition: &TypeKey| A::specialize(definition).map(|implementation| implementation.into_resolved());
    self.activate::<A>(&Self::generic_request::<A>(None, &specialize), parameter)
  }

  // --- Implementation Mapping ---

  /// The concrete type that would be constructed for `A` (optionally under `key`).
  pub fn resolve_implementation<A: ?Sized + Any>(&self, key: Option<&str>) -> Result<TypeKey> {
    ImplementationMapper::resolve(self, &ResolveRequest::new(TypeKey::of::<A>(), key)).map(|resolved| resolved.concrete)
  }

  /// Like [`resolve_implementation`](Self::resolve_implementation), including
  /// open generic implementations.
  pub fn resolve_generic_implementation<A: ?Sized + Generic>(&self, key: Option<&str>) -> Result<TypeKey> {
    let specialize = |definition: &TypeKey| A::specialize(definition).map(|implementation| implementation.into_resolved());
    ImplementationMapper::resolve(self, &Self::generic_request::<A>(key, &specialize)).map(|resolved| resolved.concrete)
  }

  // --- Disposal ---

  /// Releases every disposable instance in reverse registration order and
  /// forgets all instances. Calling it again does nothing. Dropping the
  /// container disposes it as well.
  pub fn dispose(&mut self) {
    self.registry.dispose();
  }
}

impl ImplementationMapper for Container<'_> {
  fn resolve(&self, request: &ResolveRequest<'_>) -> Result<Resolved> {
    self.registry.resolve_implementation(request, self.parent_mapper())
  }
}

impl fmt::Debug for Container<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("has_parent", &self.parent.is_some())
      .finish_non_exhaustive()
  }
}

/// Satisfies parameters of transient constructions from materialized instances.
struct InstanceLookup<'c, 'p> {
  container: &'c Container<'p>,
}

impl Resolve for InstanceLookup<'_, '_> {
  fn resolve(&mut self, param: &Param) -> Result<Option<Shared>> {
    Ok(self.container.try_get_shared(param.key()))
  }
}
