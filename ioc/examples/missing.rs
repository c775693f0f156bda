use lattice_ioc::{builder, resolve, Constructor, Error, Injectable};
use std::panic::{self, AssertUnwindSafe};

struct UnregisteredService;

struct Mailer;
impl Injectable for Mailer {
  fn constructors() -> Vec<Constructor<Self>> {
    // Needs an SMTP host nobody registers.
    vec![Constructor::new(|_| Ok(Mailer)).param::<String>()]
  }
}

fn main() {
  // --- Validation at build time ---
  println!("Building a container with an unsatisfiable singleton...");
  let mut invalid = builder();
  invalid
    .with_singleton::<Mailer, Mailer>(|mailer| mailer, None)
    .unwrap();

  match invalid.build() {
    Err(Error::UnsatisfiedSingleton { failures }) => {
      for failure in &failures {
        println!("  {}", failure);
      }
    }
    Err(other) => panic!("Unexpected error: {}", other),
    Ok(_) => panic!("The build should have failed!"),
  }

  let container = builder().build().unwrap();

  // --- Using the panicking `resolve!` macro ---
  println!("\nAttempting to resolve a service that was never registered...");

  let result = panic::catch_unwind(AssertUnwindSafe(|| {
    // This line will panic!
    let _service = resolve!(container, UnregisteredService);
  }));

  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Successfully caught the expected panic from resolve!.");

  // --- Using the non-panicking `try_get()` method ---
  println!("\nNow, attempting to resolve using the fallible `try_get()` method...");

  match container.try_get::<UnregisteredService>() {
    Some(_) => panic!("Should not have found the service!"),
    None => println!("Correctly received `None` for the missing service."),
  }
}
