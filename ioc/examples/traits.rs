use lattice_ioc::{builder, resolve, Constructor, Injectable, Parameter};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define concrete implementations
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}
impl Injectable for ConsoleLogger {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|_| Ok(ConsoleLogger))]
  }
}

struct AuditLogger;
impl Logger for AuditLogger {
  fn log(&self, message: &str) {
    println!("[AUDIT LOG]: {}", message);
  }
}
impl Injectable for AuditLogger {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|_| Ok(AuditLogger))]
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    // ... logic to generate report ...
    self.logger.log("Finished report generation.");
  }
}

// ReportService declares what it needs; the container decides what it gets.
impl Injectable for ReportService {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|args| {
      Ok(ReportService {
        logger: args.take::<dyn Logger>()?,
      })
    })
    .param::<dyn Logger>()]
  }
}

fn main() -> lattice_ioc::Result<()> {
  // --- Registration ---

  // ConsoleLogger is the singleton served as `dyn Logger`.
  // AuditLogger is only available under the "audit" key.
  let mut builder = builder();
  builder
    .with_singleton::<dyn Logger, ConsoleLogger>(|logger| logger, None)?
    .with_keyed_implementation::<dyn Logger, AuditLogger>("audit", |logger| logger)?
    .with_singleton::<ReportService, ReportService>(|service| service, None)?;
  let container = builder.build()?;

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = resolve!(container, ReportService);

  println!("Using the service...");
  report_service.generate_report();

  println!("\nConstructing a one-off report with the audit logger...");
  let audit: Arc<dyn Logger> = container.construct_keyed::<dyn Logger>("audit", None)?;
  let audited = container.construct::<ReportService>(Some(Parameter::shared(audit)))?;
  audited.generate_report();
  Ok(())
}
