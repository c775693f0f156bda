//! Public macros for ergonomic service resolution.

/// Resolves a required instance from a container, panicking if it is missing.
///
/// Use it where a missing service is a wiring bug rather than a runtime
/// condition. For a non-panicking lookup use [`Container::get`](crate::Container::get)
/// or [`Container::try_get`](crate::Container::try_get).
///
/// # Panics
///
/// Panics if the service cannot be resolved.
///
/// # Examples
///
/// ```
/// use lattice_ioc::resolve;
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///   fn greet(&self) -> String;
/// }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter {
///   fn greet(&self) -> String {
///     "Hello!".to_string()
///   }
/// }
///
/// let mut builder = lattice_ioc::builder();
/// builder.with_instance(Arc::new(String::from("hello"))).unwrap();
/// builder
///   .with_instance::<dyn Greeter>(Arc::new(EnglishGreeter))
///   .unwrap();
/// let container = builder.build().unwrap();
///
/// let message = resolve!(container, String);
/// assert_eq!(*message, "hello");
///
/// let greeter = resolve!(container, trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
  // Arm for resolving a trait object: resolve!(container, trait MyTrait)
  ($container:expr, trait $trait_ident:ident) => {
    $container
      .get::<dyn $trait_ident>()
      .unwrap_or_else(|error| {
        panic!(
          "Failed to resolve required trait service {}: {}",
          ::std::any::type_name::<dyn $trait_ident>(),
          error
        )
      })
  };

  // Arm for resolving a type: resolve!(container, MyService)
  ($container:expr, $type:ty) => {
    $container.get::<$type>().unwrap_or_else(|error| {
      panic!(
        "Failed to resolve required service {}: {}",
        ::std::any::type_name::<$type>(),
        error
      )
    })
  };
}

/// Constructs a transient value from a container, panicking on failure.
///
/// `construct!(container, Type)` builds a concrete [`Injectable`](crate::Injectable);
/// `construct!(container, trait MyTrait)` builds the implementation registered
/// for `dyn MyTrait`. An optional trailing expression is passed as the caller
/// [`Parameter`](crate::Parameter).
#[macro_export]
macro_rules! construct {
  (@parameter) => {
    ::std::option::Option::None
  };
  (@parameter $parameter:expr) => {
    ::std::option::Option::Some($crate::Parameter::new($parameter))
  };

  ($container:expr, trait $trait_ident:ident $(, $parameter:expr)?) => {
    $container
      .construct_as::<dyn $trait_ident>($crate::construct!(@parameter $($parameter)?))
      .unwrap_or_else(|error| {
        panic!(
          "Failed to construct trait service {}: {}",
          ::std::any::type_name::<dyn $trait_ident>(),
          error
        )
      })
  };

  ($container:expr, $type:ty $(, $parameter:expr)?) => {
    $container
      .construct::<$type>($crate::construct!(@parameter $($parameter)?))
      .unwrap_or_else(|error| {
        panic!(
          "Failed to construct service {}: {}",
          ::std::any::type_name::<$type>(),
          error
        )
      })
  };
}
