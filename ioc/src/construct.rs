//! The constructor matcher.
//!
//! Rust has no runtime constructor reflection, so constructible types declare
//! their constructors explicitly through [`Injectable`]. Each [`Constructor`] lists
//! its formal parameters in order, and the matcher picks the first constructor
//! whose parameters can all be bound.

use crate::core::{Shared, TypeKey};
use crate::error::{Error, Result};
use crate::store::Dispose;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A concrete type the container knows how to construct.
///
/// # Examples
///
/// ```
/// use lattice_ioc::{Constructor, Injectable};
/// use std::sync::Arc;
///
/// struct Settings {
///   retries: u32,
/// }
///
/// struct Client {
///   settings: Arc<Settings>,
/// }
///
/// impl Injectable for Client {
///   fn constructors() -> Vec<Constructor<Self>> {
///     vec![Constructor::new(|args| {
///       Ok(Client {
///         settings: args.take::<Settings>()?,
///       })
///     })
///     .param::<Settings>()]
///   }
/// }
/// ```
pub trait Injectable: Any + Send + Sync + Sized {
  /// Constructors in the order they are tried. A type declaring none cannot be
  /// instantiated directly.
  fn constructors() -> Vec<Constructor<Self>>;

  /// Exposes the release capability of a constructed instance. Instances that
  /// return `Some` and are cached by a container are released when it is
  /// disposed.
  fn disposer(this: &Arc<Self>) -> Option<Arc<dyn Dispose>> {
    let _ = this;
    None
  }
}

/// The outcome of activating an implementation: the erased value and, if the
/// concrete type has one, its release capability.
pub(crate) struct Activated {
  pub(crate) value: Shared,
  pub(crate) disposer: Option<Arc<dyn Dispose>>,
}

type ActivateFn = fn(Option<&Parameter>, &mut dyn Resolve) -> Result<Activated>;

/// Supplies values for formal parameters the caller parameter does not cover.
pub(crate) trait Resolve {
  /// `Ok(None)` means the dependency is unavailable, which lets the matcher fall
  /// back to a default or the next constructor. `Err` aborts the construction.
  fn resolve(&mut self, param: &Param) -> Result<Option<Shared>>;
}

pub(crate) struct Param {
  key: TypeKey,
  default: Option<Box<dyn Fn() -> Shared>>,
  activate: Option<ActivateFn>,
}

impl Param {
  pub(crate) fn key(&self) -> &TypeKey {
    &self.key
  }

  /// Constructs the concrete parameter type, when it was declared injectable.
  pub(crate) fn activator(&self) -> Option<ActivateFn> {
    self.activate
  }
}

/// One way of building a `T`.
pub struct Constructor<T> {
  params: Vec<Param>,
  invoke: Box<dyn Fn(&mut Arguments) -> Result<T>>,
}

impl<T: 'static> Constructor<T> {
  /// Creates a constructor. `invoke` receives the bound arguments in the order
  /// the parameters are declared with [`param`](Self::param) and friends.
  pub fn new(invoke: impl Fn(&mut Arguments) -> Result<T> + 'static) -> Self {
    Self {
      params: Vec::new(),
      invoke: Box::new(invoke),
    }
  }

  /// Declares a required parameter.
  pub fn param<P: ?Sized + Any + Send + Sync>(mut self) -> Self {
    self.params.push(Param {
      key: TypeKey::of::<P>(),
      default: None,
      activate: None,
    });
    self
  }

  /// Declares a parameter bound to `default()` when it cannot be resolved.
  pub fn param_or<P: Any + Send + Sync>(mut self, default: impl Fn() -> P + 'static) -> Self {
    self.params.push(Param {
      key: TypeKey::of::<P>(),
      default: Some(Box::new(move || Shared::new(Arc::new(default())))),
      activate: None,
    });
    self
  }

  /// Declares a concrete parameter that the singleton initializer may construct
  /// (and cache) while building a container, if nothing is registered for it.
  pub fn param_injectable<P: Injectable>(mut self) -> Self {
    self.params.push(Param {
      key: TypeKey::of::<P>(),
      default: None,
      activate: Some(activate::<P>),
    });
    self
  }

  /// Binds every parameter, or returns `Ok(None)` if this constructor does not fit.
  fn bind(&self, parameter: Option<&Parameter>, resolver: &mut dyn Resolve) -> Result<Option<Arguments>> {
    if let Some(parameter) = parameter {
      // A supplied parameter must be consumed by the chosen constructor.
      if !self.params.iter().any(|param| parameter.accepts(&param.key)) {
        return Ok(None);
      }
    }

    let mut values = Vec::with_capacity(self.params.len());
    for param in &self.params {
      if let Some(value) = parameter.and_then(|parameter| parameter.view(&param.key)) {
        values.push(value);
        continue;
      }
      match resolver.resolve(param)? {
        Some(value) => values.push(value),
        None => match &param.default {
          Some(default) => values.push(default()),
          None => {
            trace!(
              service = type_name::<T>(),
              missing = param.key.name(),
              "constructor skipped"
            );
            return Ok(None);
          }
        },
      }
    }

    Ok(Some(Arguments {
      type_name: type_name::<T>(),
      values,
      next: 0,
    }))
  }
}

impl<T> fmt::Debug for Constructor<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let params: Vec<_> = self.params.iter().map(|param| param.key.name()).collect();
    f.debug_struct("Constructor").field("params", &params).finish()
  }
}

/// The arguments bound for a constructor, taken in declaration order.
pub struct Arguments {
  type_name: &'static str,
  values: Vec<Shared>,
  next: usize,
}

impl Arguments {
  /// Takes the next argument. `P` must be the type its parameter was declared with.
  pub fn take<P: ?Sized + Any + Send + Sync>(&mut self) -> Result<Arc<P>> {
    let index = self.next;
    self.next += 1;
    self
      .values
      .get(index)
      .and_then(|value| value.downcast::<P>())
      .ok_or(Error::ArgumentMismatch {
        type_name: self.type_name,
        index,
        expected: type_name::<P>(),
      })
  }
}

/// The single, optional caller-supplied parameter of a construction.
///
/// It binds to every formal parameter whose type matches one of its views. A
/// value can be offered under additional types (typically a trait object it
/// implements) with [`also`](Self::also).
#[derive(Clone)]
pub struct Parameter {
  views: Vec<(TypeKey, Shared)>,
}

impl Parameter {
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::shared(Arc::new(value))
  }

  pub fn shared<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      views: vec![(TypeKey::of::<T>(), Shared::new(value))],
    }
  }

  /// Offers the same parameter under another type.
  pub fn also<U: ?Sized + Any + Send + Sync>(mut self, view: Arc<U>) -> Self {
    self.views.push((TypeKey::of::<U>(), Shared::new(view)));
    self
  }

  /// Returns `true` if a formal parameter of type `key` would accept this value.
  pub fn accepts(&self, key: &TypeKey) -> bool {
    self.views.iter().any(|(view, _)| view == key)
  }

  fn view(&self, key: &TypeKey) -> Option<Shared> {
    self
      .views
      .iter()
      .find(|(view, _)| view == key)
      .map(|(_, value)| value.clone())
  }
}

impl fmt::Debug for Parameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let views: Vec<_> = self.views.iter().map(|(key, _)| key.name()).collect();
    f.debug_struct("Parameter").field("views", &views).finish()
  }
}

/// Builds a `T` with the first constructor whose parameters can all be bound.
pub(crate) fn construct<T: Injectable>(parameter: Option<&Parameter>, resolver: &mut dyn Resolve) -> Result<T> {
  let type_name = type_name::<T>();
  let constructors = T::constructors();
  if constructors.is_empty() {
    return Err(Error::AbstractType { type_name });
  }

  for (index, constructor) in constructors.iter().enumerate() {
    if let Some(mut arguments) = constructor.bind(parameter, resolver)? {
      trace!(service = type_name, constructor = index, "constructor matched");
      return (constructor.invoke)(&mut arguments);
    }
  }

  Err(Error::NoMatchingConstructor { type_name })
}

pub(crate) fn activate<T: Injectable>(parameter: Option<&Parameter>, resolver: &mut dyn Resolve) -> Result<Activated> {
  let instance = Arc::new(construct::<T>(parameter, resolver)?);
  let disposer = T::disposer(&instance);
  Ok(Activated {
    value: Shared::new(instance),
    disposer,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  #[derive(Default)]
  struct Fixed {
    values: HashMap<TypeKey, Shared>,
    asked: Vec<&'static str>,
  }

  impl Fixed {
    fn with<T: ?Sized + Any + Send + Sync>(mut self, value: Arc<T>) -> Self {
      self.values.insert(TypeKey::of::<T>(), Shared::new(value));
      self
    }
  }

  impl Resolve for Fixed {
    fn resolve(&mut self, param: &Param) -> Result<Option<Shared>> {
      self.asked.push(param.key().name());
      Ok(self.values.get(param.key()).cloned())
    }
  }

  trait Service: Send + Sync {
    fn name(&self) -> &'static str;
  }

  struct Registered;
  impl Service for Registered {
    fn name(&self) -> &'static str {
      "registered"
    }
  }

  struct Calculator {
    x: i32,
    service: Arc<dyn Service>,
  }

  impl Injectable for Calculator {
    fn constructors() -> Vec<Constructor<Self>> {
      vec![Constructor::new(|args| {
        Ok(Calculator {
          x: *args.take::<i32>()?,
          service: args.take::<dyn Service>()?,
        })
      })
      .param::<i32>()
      .param::<dyn Service>()]
    }
  }

  #[test]
  fn caller_parameter_takes_precedence_over_the_registry() {
    let mut resolver = Fixed::default().with::<dyn Service>(Arc::new(Registered));

    let built = construct::<Calculator>(Some(&Parameter::new(42_i32)), &mut resolver).unwrap();

    assert_eq!(built.x, 42);
    assert_eq!(built.service.name(), "registered");
    assert_eq!(resolver.asked, vec![type_name::<dyn Service>()]);
  }

  struct Overloaded {
    origin: &'static str,
  }

  impl Injectable for Overloaded {
    fn constructors() -> Vec<Constructor<Self>> {
      vec![
        Constructor::new(|args| {
          let label = args.take::<String>()?;
          Ok(Overloaded {
            origin: if label.is_empty() { "empty" } else { "label" },
          })
        })
        .param::<String>(),
        Constructor::new(|_| Ok(Overloaded { origin: "default" })),
      ]
    }
  }

  #[test]
  fn first_fitting_constructor_wins() {
    let mut resolver = Fixed::default().with(Arc::new("named".to_string()));
    let built = construct::<Overloaded>(None, &mut resolver).unwrap();
    assert_eq!(built.origin, "label");

    let built = construct::<Overloaded>(None, &mut Fixed::default()).unwrap();
    assert_eq!(built.origin, "default");
  }

  #[test]
  fn constructors_ignoring_the_caller_parameter_are_skipped() {
    // The parameterless constructor would fit, but it cannot consume the u8.
    let result = construct::<Overloaded>(Some(&Parameter::new(7_u8)), &mut Fixed::default());
    assert!(matches!(result, Err(Error::NoMatchingConstructor { .. })));

    let built = construct::<Overloaded>(Some(&Parameter::new(String::new())), &mut Fixed::default()).unwrap();
    assert_eq!(built.origin, "empty");
  }

  struct Pooled {
    size: usize,
  }

  impl Injectable for Pooled {
    fn constructors() -> Vec<Constructor<Self>> {
      vec![Constructor::new(|args| Ok(Pooled { size: *args.take::<usize>()? })).param_or(|| 8_usize)]
    }
  }

  #[test]
  fn declared_default_binds_when_resolution_fails() {
    let built = construct::<Pooled>(None, &mut Fixed::default()).unwrap();
    assert_eq!(built.size, 8);

    let built = construct::<Pooled>(None, &mut Fixed::default().with(Arc::new(32_usize))).unwrap();
    assert_eq!(built.size, 32);
  }

  #[test]
  fn parameter_views_extend_compatibility() {
    let registered = Arc::new(Registered);
    let parameter = Parameter::new(5_i32).also::<dyn Service>(registered);
    assert!(parameter.accepts(&TypeKey::of::<dyn Service>()));

    // Each view binds the parameter of its own type; the registry is never asked.
    let mut resolver = Fixed::default();
    let built = construct::<Calculator>(Some(&parameter), &mut resolver).unwrap();
    assert_eq!(built.x, 5);
    assert_eq!(built.service.name(), "registered");
    assert!(resolver.asked.is_empty());
  }

  struct Abstract;
  impl Injectable for Abstract {
    fn constructors() -> Vec<Constructor<Self>> {
      Vec::new()
    }
  }

  #[test]
  fn a_type_without_constructors_is_abstract() {
    let result = construct::<Abstract>(None, &mut Fixed::default());
    assert!(matches!(result, Err(Error::AbstractType { .. })));
  }

  #[test]
  fn unsatisfied_parameters_report_no_matching_constructor() {
    let result = construct::<Calculator>(None, &mut Fixed::default());
    match result {
      Err(Error::NoMatchingConstructor { type_name }) => assert!(type_name.contains("Calculator")),
      _ => panic!("expected NoMatchingConstructor"),
    }
  }

  struct Sloppy;
  impl Injectable for Sloppy {
    fn constructors() -> Vec<Constructor<Self>> {
      vec![Constructor::new(|args| {
        args.take::<u64>()?;
        Ok(Sloppy)
      })
      .param::<u32>()]
    }
  }

  #[test]
  fn taking_an_argument_as_the_wrong_type_is_reported() {
    let result = construct::<Sloppy>(None, &mut Fixed::default().with(Arc::new(1_u32)));
    assert!(matches!(
      result,
      Err(Error::ArgumentMismatch { index: 0, .. })
    ));
  }
}
