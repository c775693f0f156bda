use lattice_ioc::{builder, Constructor, Error, Injectable};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// --- Test Fixtures ---

// The trait must be Send + Sync for the container to accept it.
trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

struct EnglishGreeter;
impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    "Hello!".to_string()
  }
}
impl Injectable for EnglishGreeter {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|_| Ok(EnglishGreeter))]
  }
}

struct GermanGreeter;
impl Greeter for GermanGreeter {
  fn greet(&self) -> String {
    "Hallo!".to_string()
  }
}
impl Injectable for GermanGreeter {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|_| Ok(GermanGreeter))]
  }
}

// A simple struct for testing.
#[derive(Debug, PartialEq, Eq)]
struct SimpleService {
  id: u32,
}

// Counts how often it has been constructed.
static TICKETS_ISSUED: AtomicUsize = AtomicUsize::new(0);

struct Ticket {
  serial: usize,
}
impl Injectable for Ticket {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|_| {
      Ok(Ticket {
        serial: TICKETS_ISSUED.fetch_add(1, Ordering::SeqCst),
      })
    })]
  }
}

// --- Basic Tests ---

#[test]
fn test_instance_get() {
  // Arrange
  let instance = Arc::new(SimpleService { id: 101 });
  let mut builder = builder();
  builder.with_instance(instance.clone()).unwrap();
  let container = builder.build().unwrap();

  // Act
  let r1 = container.get::<SimpleService>().unwrap();
  let r2 = container.get::<SimpleService>().unwrap();

  // Assert
  assert_eq!(r1.id, 101);
  // The registered Arc itself is handed out.
  assert!(Arc::ptr_eq(&r1, &instance));
  assert!(Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_get_unregistered_is_not_found() {
  let container = builder().build().unwrap();

  let result = container.get::<SimpleService>();

  match result {
    Err(Error::NotFound { type_name, key }) => {
      assert!(type_name.contains("SimpleService"));
      assert_eq!(key, None);
    }
    other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
  }
  assert!(container.try_get::<SimpleService>().is_none());
  assert!(!container.contains::<SimpleService>());
}

#[test]
fn test_trait_instance_resolution() {
  // Arrange
  let mut builder = builder();
  builder
    .with_instance::<dyn Greeter>(Arc::new(EnglishGreeter))
    .unwrap();
  let container = builder.build().unwrap();

  // Act
  let greeter = container.get::<dyn Greeter>().unwrap();

  // Assert
  assert_eq!(greeter.greet(), "Hello!");
  // The concrete type was never registered on its own.
  assert!(container.try_get::<EnglishGreeter>().is_none());
}

#[test]
fn test_same_instance_under_several_types() {
  let shared = Arc::new(EnglishGreeter);
  let mut builder = builder();
  builder
    .with_instance(shared.clone())
    .unwrap()
    .with_instance::<dyn Greeter>(shared.clone())
    .unwrap();
  let container = builder.build().unwrap();

  let concrete = container.get::<EnglishGreeter>().unwrap();
  let greeter = container.get::<dyn Greeter>().unwrap();

  assert!(Arc::ptr_eq(&concrete, &shared));
  assert_eq!(
    Arc::as_ptr(&greeter) as *const (),
    Arc::as_ptr(&shared) as *const ()
  );
}

#[test]
fn test_duplicate_instance_rejected_first_kept() {
  // Arrange
  let mut builder = builder();
  builder.with_instance(Arc::new(SimpleService { id: 1 })).unwrap();

  // Act
  let second = builder.with_instance(Arc::new(SimpleService { id: 2 }));

  // Assert
  assert!(matches!(second, Err(Error::DuplicateRegistration { .. })));
  let container = builder.build().unwrap();
  assert_eq!(*container.get::<SimpleService>().unwrap(), SimpleService { id: 1 });
}

#[test]
fn test_duplicate_implementation_rejected_first_kept() {
  let mut builder = builder();
  builder
    .with_implementation::<dyn Greeter, EnglishGreeter>(|greeter| greeter)
    .unwrap();

  let second = builder.with_implementation::<dyn Greeter, GermanGreeter>(|greeter| greeter);

  assert!(matches!(
    second,
    Err(Error::DuplicateRegistration { key: None, .. })
  ));
  let container = builder.build().unwrap();
  assert_eq!(container.construct_as::<dyn Greeter>(None).unwrap().greet(), "Hello!");
}

#[test]
fn test_duplicate_singleton_rejected() {
  let mut builder = builder();
  builder
    .with_singleton::<dyn Greeter, EnglishGreeter>(|greeter| greeter, None)
    .unwrap();

  let second = builder.with_singleton::<dyn Greeter, GermanGreeter>(|greeter| greeter, None);

  assert!(matches!(second, Err(Error::DuplicateRegistration { .. })));
}

#[test]
fn test_instance_and_singleton_share_one_slot() {
  // Either order is rejected.
  let mut builder = builder();
  builder
    .with_instance::<dyn Greeter>(Arc::new(EnglishGreeter))
    .unwrap();
  let result = builder.with_singleton::<dyn Greeter, GermanGreeter>(|greeter| greeter, None);
  assert!(matches!(result, Err(Error::DuplicateRegistration { .. })));

  let mut builder = lattice_ioc::builder();
  builder
    .with_singleton::<dyn Greeter, GermanGreeter>(|greeter| greeter, None)
    .unwrap();
  let result = builder.with_instance::<dyn Greeter>(Arc::new(EnglishGreeter));
  assert!(matches!(result, Err(Error::DuplicateRegistration { .. })));
}

#[test]
fn test_singleton_identity() {
  // Arrange
  let mut builder = builder();
  builder
    .with_singleton::<dyn Greeter, GermanGreeter>(|greeter| greeter, None)
    .unwrap();
  let container = builder.build().unwrap();

  // Act
  let r1 = container.get::<dyn Greeter>().unwrap();
  let r2 = container.get::<dyn Greeter>().unwrap();

  // Assert
  assert_eq!(r1.greet(), "Hallo!");
  assert!(Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_transient_construction_is_never_cached() {
  // Arrange
  let mut builder = builder();
  builder
    .with_implementation::<dyn Greeter, EnglishGreeter>(|greeter| greeter)
    .unwrap();
  let container = builder.build().unwrap();

  // Act
  let r1 = container.construct_as::<dyn Greeter>(None).unwrap();
  let r2 = container.construct_as::<dyn Greeter>(None).unwrap();

  // Assert
  assert_eq!(r1.greet(), "Hello!");
  assert!(!Arc::ptr_eq(&r1, &r2));
  // An implementation mapping is not an instance.
  assert!(container.try_get::<dyn Greeter>().is_none());
}

#[test]
fn test_concrete_construction_runs_constructor_each_time() {
  let container = builder().build().unwrap();

  let first = container.construct::<Ticket>(None).unwrap();
  let second = container.construct::<Ticket>(None).unwrap();

  assert!(second.serial > first.serial);
  assert!(container.try_get::<Ticket>().is_none());
}

#[test]
fn test_construct_unmapped_abstract_is_not_found() {
  let container = builder().build().unwrap();

  let result = container.construct_as::<dyn Greeter>(None);

  assert!(matches!(result, Err(Error::NotFound { key: None, .. })));
}

#[test]
fn test_is_registered() {
  let mut builder = builder();
  builder
    .with_instance(Arc::new(SimpleService { id: 7 }))
    .unwrap()
    .with_implementation::<dyn Greeter, EnglishGreeter>(|greeter| greeter)
    .unwrap()
    .with_singleton::<Ticket, Ticket>(|ticket| ticket, None)
    .unwrap();

  assert!(builder.is_registered::<SimpleService>());
  assert!(builder.is_registered::<dyn Greeter>());
  assert!(builder.is_registered::<Ticket>());
  assert!(!builder.is_registered::<GermanGreeter>());
}

#[test]
fn test_keyed_implementations_are_separate() {
  // Arrange
  let mut builder = builder();
  builder
    .with_implementation::<dyn Greeter, EnglishGreeter>(|greeter| greeter)
    .unwrap()
    .with_keyed_implementation::<dyn Greeter, GermanGreeter>("german", |greeter| greeter)
    .unwrap();
  let container = builder.build().unwrap();

  // Act
  let plain = container.construct_as::<dyn Greeter>(None).unwrap();
  let german = container.construct_keyed::<dyn Greeter>("german", None).unwrap();
  let french = container.construct_keyed::<dyn Greeter>("french", None);

  // Assert
  assert_eq!(plain.greet(), "Hello!");
  assert_eq!(german.greet(), "Hallo!");
  // A keyed lookup never falls back to the unkeyed mapping.
  match french {
    Err(Error::NotFound { key, .. }) => assert_eq!(key.as_deref(), Some("french")),
    Err(other) => panic!("expected NotFound, got {}", other),
    Ok(_) => panic!("expected NotFound"),
  }
}

#[test]
fn test_keyed_duplicates_are_per_key() {
  let mut builder = builder();
  builder
    .with_keyed_implementation::<dyn Greeter, EnglishGreeter>("a", |greeter| greeter)
    .unwrap()
    .with_keyed_implementation::<dyn Greeter, GermanGreeter>("b", |greeter| greeter)
    .unwrap();

  let result = builder.with_keyed_implementation::<dyn Greeter, GermanGreeter>("a", |greeter| greeter);

  match result {
    Err(Error::DuplicateRegistration { key, .. }) => assert_eq!(key.as_deref(), Some("a")),
    _ => panic!("expected DuplicateRegistration"),
  }
}

#[test]
fn test_resolve_implementation_names_the_concrete_type() {
  let mut builder = builder();
  builder
    .with_implementation::<dyn Greeter, EnglishGreeter>(|greeter| greeter)
    .unwrap()
    .with_keyed_implementation::<dyn Greeter, GermanGreeter>("german", |greeter| greeter)
    .unwrap();
  let container = builder.build().unwrap();

  let plain = container.resolve_implementation::<dyn Greeter>(None).unwrap();
  let german = container.resolve_implementation::<dyn Greeter>(Some("german")).unwrap();

  assert!(plain.is::<EnglishGreeter>());
  assert!(german.is::<GermanGreeter>());
  // Resolution is deterministic.
  assert_eq!(plain, container.resolve_implementation::<dyn Greeter>(None).unwrap());
}
