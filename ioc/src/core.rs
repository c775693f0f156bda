//! Core data structures shared by every part of the container: type identity
//! and type-erased shared values.

use crate::error::{Error, Result};
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The identity of a registrable type.
///
/// Keys compare and hash by [`TypeId`] alone; the type name is carried along for
/// diagnostics. A closed generic such as `dyn Repository<User>` and the marker
/// naming its open definition are distinct keys.
#[derive(Clone, Copy)]
pub struct TypeKey {
  id: TypeId,
  name: &'static str,
}

impl TypeKey {
  /// The key of `T`, which may be unsized (e.g. `dyn Trait`).
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: type_name::<T>(),
    }
  }

  /// Returns `true` if this is the key of `T`.
  pub fn is<T: ?Sized + Any>(&self) -> bool {
    self.id == TypeId::of::<T>()
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl PartialEq for TypeKey {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeKey({})", self.name)
  }
}

impl fmt::Display for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// A type-erased `Arc<T>`.
///
/// The outer `Arc` wraps the caller's `Arc<T>` so that clones share the same
/// allocation as the value handed out by [`Shared::downcast`]. Pointer identity
/// of the registered instance is preserved.
#[derive(Clone)]
pub(crate) struct Shared(Arc<dyn Any + Send + Sync>);

impl Shared {
  pub(crate) fn new<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    Self(Arc::new(value))
  }

  pub(crate) fn downcast<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.0.downcast_ref::<Arc<T>>().cloned()
  }

  pub(crate) fn downcast_or_mismatch<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.downcast::<T>().ok_or(Error::TypeMismatch {
      expected: type_name::<T>(),
    })
  }
}

impl fmt::Debug for Shared {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Shared(..)")
  }
}
