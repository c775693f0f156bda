use lattice_ioc::{builder, Container, ContainerBuilder};
use std::sync::Arc;

struct Database(&'static str);
struct RequestId(u64);

// A function that depends only on what its container can provide.
// By accepting a `&Container`, it can be tested with a controlled environment.
fn process_request(container: &Container) -> String {
  let database = container.get::<Database>().expect("Database not found in container");
  let request = container.get::<RequestId>().expect("Request id not found in container");
  format!("Request #{} served by {}", request.0, database.0)
}

fn main() -> lattice_ioc::Result<()> {
  // --- Application-wide container ---
  let mut app_builder = builder();
  app_builder.with_instance(Arc::new(Database("postgres")))?;
  let app = app_builder.build()?;

  // --- One child container per request ---
  for id in 1..=2 {
    let mut request_builder = ContainerBuilder::child(&app);
    request_builder.with_instance(Arc::new(RequestId(id)))?;
    let request = request_builder.build()?;

    let result = process_request(&request);
    println!("Result: {}", result);
    assert_eq!(result, format!("Request #{} served by postgres", id));
  }

  // --- Verify Isolation ---
  // Instances registered in a child never leak into the parent.
  assert!(
    app.try_get::<RequestId>().is_none(),
    "Request state should not have leaked into the application container!"
  );
  println!("\nVerified that child containers are isolated from their parent.");
  Ok(())
}
