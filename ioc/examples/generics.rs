use lattice_ioc::{builder, Constructor, Generic, Implementation, Injectable, TypeKey};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Mutex;

struct Customer;
struct Invoice;

trait Store<T>: Send + Sync {
  fn put(&self, id: u64, label: &str);
  fn count(&self) -> usize;
}

// Marker for the open `dyn Store<_>` definition.
struct StoreDefinition;

struct InMemoryStore<T> {
  rows: Mutex<HashMap<u64, String>>,
  _entity: PhantomData<fn() -> T>,
}
struct InMemoryStoreDefinition;

impl<T: 'static> Store<T> for InMemoryStore<T> {
  fn put(&self, id: u64, label: &str) {
    self.rows.lock().unwrap().insert(id, label.to_string());
  }

  fn count(&self) -> usize {
    self.rows.lock().unwrap().len()
  }
}

impl<T: 'static> Injectable for InMemoryStore<T> {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|_| {
      Ok(InMemoryStore {
        rows: Mutex::new(HashMap::new()),
        _entity: PhantomData,
      })
    })]
  }
}

impl<T: 'static> Generic for dyn Store<T> {
  type Definition = StoreDefinition;

  fn specialize(definition: &TypeKey) -> Option<Implementation<Self>> {
    definition
      .is::<InMemoryStoreDefinition>()
      .then(|| Implementation::<Self>::of::<InMemoryStore<T>>(|store| store))
  }
}

fn main() -> lattice_ioc::Result<()> {
  // One registration covers every `dyn Store<T>`.
  let mut builder = builder();
  builder.with_generic_implementation::<StoreDefinition, InMemoryStoreDefinition>()?;
  let container = builder.build()?;

  let customers = container.construct_generic::<dyn Store<Customer>>(None)?;
  let invoices = container.construct_generic::<dyn Store<Invoice>>(None)?;

  customers.put(1, "Ada");
  customers.put(2, "Grace");
  invoices.put(100, "INV-100");

  println!(
    "customers: {} rows via {}",
    customers.count(),
    container.resolve_generic_implementation::<dyn Store<Customer>>(None)?
  );
  println!(
    "invoices: {} rows via {}",
    invoices.count(),
    container.resolve_generic_implementation::<dyn Store<Invoice>>(None)?
  );
  assert_eq!(customers.count(), 2);
  assert_eq!(invoices.count(), 1);
  Ok(())
}
