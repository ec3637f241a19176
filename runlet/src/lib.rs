//! Application runner based on [runlet_di] discovery and configuration injection.
//!
//! Small utilities often consist of the same steps: read some configuration, prepare resources,
//! do the actual work and clean up. This crate provides an entrypoint for such applications in
//! the form of [Application](application::Application). It finds the single type marked as the
//! application, loads the configuration resource the type declares, and calls its lifecycle
//! methods in order: *init*, *exec* and *term*. It also configures additional supporting
//! infrastructure, e.g. logging.
//!
//! ```no_run
//! use runlet::application;
//! use runlet_di::{lifecycle, Managed};
//!
//! #[derive(Managed)]
//! #[managed(application, config_file = "config/demo.properties")]
//! struct HelloApplication {
//!     #[property(name = "demo.nameOfOwner")]
//!     owner_name: String,
//! }
//!
//! #[lifecycle]
//! impl HelloApplication {
//!     #[app_exec]
//!     fn execute(&self) {
//!         println!("Hello {}!", self.owner_name);
//!     }
//! }
//!
//! let application = application::create_default().expect("unable to create application");
//! assert!(application.run().is_success());
//! ```

pub mod application;
pub mod config;
