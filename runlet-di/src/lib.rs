//! Discovery, configuration injection and lifecycle dispatch for small, single-purpose
//! applications.
//!
//! An application is a type marked as such, which declares up to three lifecycle methods:
//! *init*, *exec* and *term*. Before each method is called, an instance of the application is
//! created and fields bound to configuration keys get their values from an external `key=value`
//! configuration resource, coerced to the declared primitive kind. Other types can take part in
//! injection too, by being marked as managed and materialized through the
//! [ApplicationContext](context::ApplicationContext).
//!
//! Types register themselves in a [TypeRegistry](type_registry::TypeRegistry), usually with the
//! provided derive macros:
//!
//! ```
//! use runlet_di::{lifecycle, Managed};
//!
//! #[derive(Managed)]
//! #[managed(application, config_file = "config/demo.properties")]
//! struct DemoApplication {
//!     #[property(name = "demo.nameOfOwner")]
//!     owner_name: String,
//!     #[property(name = "demo.maxRetryAttempts", optional)]
//!     retries: i32,
//!     #[property(name = "demo.isDebugEnabled", kind = "boolean")]
//!     debug: bool,
//! }
//!
//! #[lifecycle]
//! impl DemoApplication {
//!     #[app_init]
//!     fn initialize(&mut self) {
//!         self.retries += 1;
//!     }
//!
//!     #[app_exec]
//!     fn execute(&self) {
//!         println!("Hello {} ({}, {})", self.owner_name, self.retries, self.debug);
//!     }
//! }
//! ```
//!
//! The runtime is driven by the `runlet` crate, but every step can be performed manually:
//! discovering types with [TypeRegistry::discover](type_registry::TypeRegistry::discover),
//! resolving the application with
//! [resolve_application_type](resolver::resolve_application_type), loading configuration with
//! [load_configuration](config_source::load_configuration) and dispatching the lifecycle with
//! the [LifecycleDispatcher](lifecycle::LifecycleDispatcher).
//!
//! ### Features
//!
//! * `derive` (default) - the `Managed` derive and `lifecycle` attribute macros

pub mod coercion;
pub mod config_source;
pub mod context;
pub mod error;
pub mod injector;
pub mod lifecycle;
pub mod managed;
pub mod marker;
pub mod resolver;
pub mod type_registry;

#[cfg(feature = "derive")]
pub use runlet_di_derive::{lifecycle, Managed};
