//! The implementation resolver: maps an abstract type (optionally qualified by a
//! key) to the concrete implementation that should be constructed for it.

use crate::construct::{construct, Activated, Injectable, Parameter, Resolve};
use crate::core::{Shared, TypeKey};
use crate::error::{Error, Result};
use crate::store::Registry;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

pub(crate) type Activate =
  Arc<dyn Fn(Option<&Parameter>, &mut dyn Resolve) -> Result<Activated> + Send + Sync>;

/// A concrete implementation of the abstract type `A`.
///
/// Rust cannot coerce `Arc<I>` into `Arc<A>` generically, so registrations take
/// the coercion as a function; `|service| service` is enough in practice.
pub struct Implementation<A: ?Sized> {
  concrete: TypeKey,
  activate: Activate,
  _abstract: PhantomData<fn() -> Arc<A>>,
}

impl<A: ?Sized + Any + Send + Sync> Implementation<A> {
  pub fn of<I: Injectable>(upcast: fn(Arc<I>) -> Arc<A>) -> Self {
    let activate: Activate = Arc::new(
      move |parameter: Option<&Parameter>, resolver: &mut dyn Resolve| -> Result<Activated> {
        let instance = Arc::new(construct::<I>(parameter, resolver)?);
        let disposer = I::disposer(&instance);
        Ok(Activated {
          value: Shared::new(upcast(instance)),
          disposer,
        })
      },
    );
    Self {
      concrete: TypeKey::of::<I>(),
      activate,
      _abstract: PhantomData,
    }
  }
}

impl<A: ?Sized> Implementation<A> {
  /// The key of the concrete type this implementation constructs.
  pub fn concrete(&self) -> TypeKey {
    self.concrete
  }

  pub(crate) fn into_resolved(self) -> Resolved {
    Resolved {
      concrete: self.concrete,
      activate: self.activate,
    }
  }
}

impl<A: ?Sized> fmt::Debug for Implementation<A> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Implementation")
      .field("concrete", &self.concrete)
      .finish()
  }
}

/// A closed generic abstract type, e.g. `dyn Repository<User>`.
///
/// All closed forms of one generic share a `Definition` marker. An open
/// implementation registered for that marker with
/// [`with_generic_implementation`](crate::ContainerBuilder::with_generic_implementation)
/// covers every closed form: resolution finds the implementation's own
/// definition marker and asks [`specialize`](Generic::specialize) to close it
/// over `Self`'s arguments.
///
/// # Examples
///
/// ```
/// use lattice_ioc::{Constructor, Generic, Implementation, Injectable, TypeKey};
/// use std::marker::PhantomData;
///
/// trait Repository<T>: Send + Sync {}
/// struct RepositoryDefinition;
///
/// struct MemoryRepository<T>(PhantomData<fn() -> T>);
/// struct MemoryRepositoryDefinition;
/// impl<T: 'static> Repository<T> for MemoryRepository<T> {}
///
/// impl<T: 'static> Injectable for MemoryRepository<T> {
///   fn constructors() -> Vec<Constructor<Self>> {
///     vec![Constructor::new(|_| Ok(MemoryRepository(PhantomData)))]
///   }
/// }
///
/// impl<T: 'static> Generic for dyn Repository<T> {
///   type Definition = RepositoryDefinition;
///
///   fn specialize(definition: &TypeKey) -> Option<Implementation<Self>> {
///     if definition.is::<MemoryRepositoryDefinition>() {
///       return Some(Implementation::<Self>::of::<MemoryRepository<T>>(|repository| repository));
///     }
///     None
///   }
/// }
/// ```
pub trait Generic: Any + Send + Sync {
  /// Marker naming the open definition shared by every closed form of `Self`.
  type Definition: ?Sized + Any;

  /// Closes the open implementation `definition` over `Self`'s arguments.
  fn specialize(definition: &TypeKey) -> Option<Implementation<Self>>;
}

/// What an implementation table slot maps to.
#[derive(Clone)]
pub(crate) enum ImplementationEntry {
  Concrete { concrete: TypeKey, activate: Activate },
  /// An open generic implementation, named by its definition marker.
  Open { definition: TypeKey },
}

impl fmt::Debug for ImplementationEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ImplementationEntry::Concrete { concrete, .. } => write!(f, "Concrete({})", concrete),
      ImplementationEntry::Open { definition } => write!(f, "Open({})", definition),
    }
  }
}

impl<A: ?Sized> From<Implementation<A>> for ImplementationEntry {
  fn from(implementation: Implementation<A>) -> Self {
    ImplementationEntry::Concrete {
      concrete: implementation.concrete,
      activate: implementation.activate,
    }
  }
}

pub(crate) struct GenericRequest<'a> {
  pub(crate) definition: TypeKey,
  pub(crate) specialize: &'a dyn Fn(&TypeKey) -> Option<Resolved>,
}

/// A query for the implementation of an abstract type.
pub struct ResolveRequest<'a> {
  pub(crate) abstract_key: TypeKey,
  pub(crate) key: Option<&'a str>,
  pub(crate) generic: Option<GenericRequest<'a>>,
}

impl<'a> ResolveRequest<'a> {
  pub fn new(abstract_key: TypeKey, key: Option<&'a str>) -> Self {
    Self {
      abstract_key,
      key,
      generic: None,
    }
  }

  pub fn abstract_key(&self) -> TypeKey {
    self.abstract_key
  }

  pub fn key(&self) -> Option<&'a str> {
    self.key
  }

  fn not_found(&self) -> Error {
    Error::NotFound {
      type_name: self.abstract_key.name(),
      key: self.key.map(str::to_owned),
    }
  }
}

/// The concrete implementation chosen for a [`ResolveRequest`].
#[derive(Clone)]
pub struct Resolved {
  pub(crate) concrete: TypeKey,
  pub(crate) activate: Activate,
}

impl Resolved {
  pub fn concrete(&self) -> TypeKey {
    self.concrete
  }
}

impl fmt::Debug for Resolved {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Resolved").field(&self.concrete).finish()
  }
}

/// The capability of resolving implementations, consulted by child containers
/// when their own tables have no answer.
pub trait ImplementationMapper {
  fn resolve(&self, request: &ResolveRequest<'_>) -> Result<Resolved>;
}

impl Registry {
  fn lookup(&self, abstract_key: &TypeKey, key: Option<&str>) -> Option<&ImplementationEntry> {
    // Keyed and unkeyed tables never fall back to each other.
    match key {
      None => self.implementations.get(abstract_key),
      Some(name) => self.keyed_implementations.get(&(name.to_owned(), *abstract_key)),
    }
  }

  /// Resolves against this registry, then against `parent`.
  pub(crate) fn resolve_implementation(
    &self,
    request: &ResolveRequest<'_>,
    parent: Option<&dyn ImplementationMapper>,
  ) -> Result<Resolved> {
    match self.lookup(&request.abstract_key, request.key) {
      Some(ImplementationEntry::Concrete { concrete, activate }) => {
        trace!(service = request.abstract_key.name(), implementation = concrete.name(), "resolved implementation");
        return Ok(Resolved {
          concrete: *concrete,
          activate: activate.clone(),
        });
      }
      Some(ImplementationEntry::Open { .. }) => {
        // The request names an open definition itself, which cannot be built.
        return Err(Error::AbstractType {
          type_name: request.abstract_key.name(),
        });
      }
      None => {}
    }

    if let Some(generic) = &request.generic {
      if let Some(ImplementationEntry::Open { definition }) = self.lookup(&generic.definition, request.key) {
        trace!(
          service = request.abstract_key.name(),
          definition = definition.name(),
          "specializing open implementation"
        );
        return (generic.specialize)(definition).ok_or_else(|| request.not_found());
      }
    }

    match parent {
      Some(parent) => {
        trace!(service = request.abstract_key.name(), "delegating to parent");
        parent.resolve(request)
      }
      None => Err(request.not_found()),
    }
  }
}
