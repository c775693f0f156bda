//! Error types for registration, resolution and construction.

use thiserror::Error;

/// The main error type for `lattice_ioc`.
#[derive(Debug, Clone, Error)]
pub enum Error {
  #[error("No instance or implementation registered for {type_name}{}", keyed(.key))]
  NotFound {
    type_name: &'static str,
    key: Option<String>,
  },

  #[error("{type_name} is already registered{}", keyed(.key))]
  DuplicateRegistration {
    type_name: &'static str,
    key: Option<String>,
  },

  #[error("Cannot instantiate abstract type {type_name}")]
  AbstractType { type_name: &'static str },

  #[error("No constructor of {type_name} can be satisfied by the registered services")]
  NoMatchingConstructor { type_name: &'static str },

  #[error("Circular dependency detected while constructing {type_name}")]
  CircularDependency { type_name: &'static str },

  #[error("{}", summary(.failures))]
  UnsatisfiedSingleton { failures: Vec<SingletonFailure> },

  #[error("Argument {index} of {type_name} was taken as {expected}, which does not match its declaration")]
  ArgumentMismatch {
    type_name: &'static str,
    index: usize,
    expected: &'static str,
  },

  // Raised only if an erased value does not hold the type its key promises.
  #[error("Stored value is not a {expected}")]
  TypeMismatch { expected: &'static str },
}

impl Error {
  /// Returns `true` for [`Error::NotFound`].
  pub fn is_not_found(&self) -> bool {
    matches!(self, Error::NotFound { .. })
  }

  /// Returns `true` for [`Error::CircularDependency`].
  pub fn is_circular(&self) -> bool {
    matches!(self, Error::CircularDependency { .. })
  }
}

/// A declared singleton that `build()` could not realize, and why.
#[derive(Debug, Clone, Error)]
#[error("{type_name}: {source}")]
pub struct SingletonFailure {
  pub type_name: &'static str,
  #[source]
  pub source: Error,
}

/// A specialized `Result` type for `lattice_ioc` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

fn keyed(key: &Option<String>) -> String {
  match key {
    Some(key) => format!(" with key '{}'", key),
    None => String::new(),
  }
}

fn summary(failures: &[SingletonFailure]) -> String {
  let names = failures
    .iter()
    .map(|failure| failure.type_name)
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "{} declared singleton(s) could not be realized: {}",
    failures.len(),
    names
  )
}
