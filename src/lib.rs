//! # One-Time Initialization Hazard
//!
//! Lazily built singletons and what happens when their one-time guards are
//! shared.
//!
//! ## Pieces
//!
//! - [`LazyCell`] - a value, a one-time guard and the initializer that fills it
//! - [`InitDomain`] - a re-entrant guard several cells can initialize under
//! - [`Services`] - owns the `Logger` and `Duke` cells; Duke's slow
//!   constructor also forces Logger
//! - [`Timeline`] - whole-line, timestamped "Entered"/"Exiting" output
//! - [`driver::run`] - one thread asks for Duke, one for Logger
//!
//! With [`GuardMode::Shared`] the thread asking for Logger waits for all of
//! Duke's construction. With [`GuardMode::Isolated`] it waits for Logger only.
//!
//! ```bash
//! cargo run --bin call_once_hazard
//! ```

pub mod config;
pub mod domain;
pub mod driver;
pub mod error;
pub mod lazy;
pub mod services;
pub mod timeline;

pub use config::{GuardMode, HazardConfig};
pub use domain::{DomainGuard, InitDomain};
pub use driver::DriverReport;
pub use error::{HazardError, Result};
pub use lazy::{Initializer, LazyCell};
pub use services::{Duke, Logger, Services};
pub use timeline::Timeline;
