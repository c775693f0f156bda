//! # Lattice IoC
//!
//! A hierarchical Inversion of Control (IoC) container for Rust.
//!
//! Registrations are collected on a [`ContainerBuilder`] and frozen into an
//! immutable [`Container`] by [`ContainerBuilder::build`]. Building realizes every
//! declared singleton, so a missing dependency or a dependency cycle is reported
//! before the container is ever used.
//!
//! ## Core Concepts
//!
//! - **Instances**: already-constructed values registered for a type, returned
//!   by [`Container::get`]. One instance per type and container.
//! - **Implementations**: mappings from an abstract type (usually `dyn Trait`),
//!   optionally qualified by a string key, to a concrete [`Injectable`] type.
//!   Open generic implementations cover every closed form of a [`Generic`].
//! - **Constructors**: [`Injectable`] types declare their constructors and
//!   parameters. The first constructor whose parameters can all be bound wins;
//!   a caller-supplied [`Parameter`] takes precedence over registered services.
//! - **Singletons**: constructed at most once per container, then served as
//!   instances.
//! - **Transients**: [`Container::construct`] and friends build a fresh,
//!   uncached value the caller owns.
//! - **Parents**: a child container falls back to its parent for instances and
//!   implementations, and may shadow the parent's registrations.
//! - **Disposal**: instances with a [`Dispose`] capability are released in
//!   reverse registration order.
//!
//! ## Quick Start
//!
//! ```
//! use lattice_ioc::{builder, Constructor, Injectable, Parameter};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct Greeting(String);
//!
//! struct EnglishGreeter {
//!   greeting: Arc<Greeting>,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     self.greeting.0.clone()
//!   }
//! }
//!
//! impl Injectable for EnglishGreeter {
//!   fn constructors() -> Vec<Constructor<Self>> {
//!     vec![Constructor::new(|args| {
//!       Ok(EnglishGreeter {
//!         greeting: args.take::<Greeting>()?,
//!       })
//!     })
//!     .param::<Greeting>()]
//!   }
//! }
//!
//! # fn main() -> lattice_ioc::Result<()> {
//! let mut builder = builder();
//! builder
//!   .with_instance(Arc::new(Greeting("Hello, World!".to_string())))?
//!   .with_singleton::<dyn Greeter, EnglishGreeter>(|greeter| greeter, None)?;
//! let container = builder.build()?;
//!
//! // Singletons are served from the container.
//! assert_eq!(container.get::<dyn Greeter>()?.greet(), "Hello, World!");
//!
//! // Transient construction with a caller parameter.
//! let custom = container.construct::<EnglishGreeter>(Some(Parameter::new(Greeting("Hi!".to_string()))))?;
//! assert_eq!(custom.greet(), "Hi!");
//! # Ok(())
//! # }
//! ```
//!
//! ## Threading
//!
//! Builders are configured through `&mut` access and containers do no internal
//! locking. Sharing a builder across threads requires external synchronization.

mod builder;
mod construct;
mod container;
mod core;
mod error;
mod macros;
mod resolver;
mod singleton;
mod store;

pub use builder::ContainerBuilder;
pub use construct::{Arguments, Constructor, Injectable, Parameter};
pub use container::Container;
pub use crate::core::TypeKey;
pub use error::{Error, Result, SingletonFailure};
pub use resolver::{Generic, Implementation, ImplementationMapper, ResolveRequest, Resolved};
pub use store::Dispose;

/// Creates a new, empty [`ContainerBuilder`].
pub fn builder<'p>() -> ContainerBuilder<'p> {
  ContainerBuilder::new()
}
