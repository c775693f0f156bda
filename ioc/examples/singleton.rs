use lattice_ioc::{builder, Constructor, Injectable};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

impl Injectable for RequestTracker {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|_| {
      println!("Creating RequestTracker...");
      Ok(RequestTracker {
        id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
      })
    })]
  }
}

fn main() -> lattice_ioc::Result<()> {
  // --- Singleton Registration ---
  // The constructor runs ONCE, while the container is built.
  let mut builder = builder();
  builder.with_singleton::<RequestTracker, RequestTracker>(|tracker| tracker, None)?;
  println!("--- Building ---");
  let container = builder.build()?;

  println!("--- Resolving Singletons ---");
  let s1 = container.get::<RequestTracker>()?;
  let s2 = container.get::<RequestTracker>()?;
  println!("Singleton 1 ID: {}, Singleton 2 ID: {}", s1.id, s2.id);
  assert_eq!(s1.id, 0);
  assert_eq!(s2.id, 0);
  assert!(
    Arc::ptr_eq(&s1, &s2),
    "Singleton instances should be identical"
  );
  println!("Singleton instances are the same pointer, as expected.\n");

  // --- Transient Construction ---
  // The constructor runs EVERY time, and the caller owns the result.
  println!("--- Constructing Transients ---");
  let t1 = container.construct::<RequestTracker>(None)?;
  let t2 = container.construct::<RequestTracker>(None)?;
  println!("Transient 1 ID: {}, Transient 2 ID: {}", t1.id, t2.id);
  assert_eq!(t1.id, 1);
  assert_eq!(t2.id, 2);
  println!("Transient instances are distinct, as expected.");
  Ok(())
}
