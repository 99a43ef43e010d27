// #![forbid(unsafe_code)]
// #![deny(missing_docs)]

//! Class-based test discovery and execution.
//!
//! Test classes are declared in manifest files or registered from Rust,
//! composed from their roles and ancestors, filtered by name and tag, and run
//! through a startup / setup / test / teardown / shutdown lifecycle. The
//! outcome is collected in an [`ExecutionReport`](app::report::ExecutionReport)
//! that the [`reporter`] module renders as TAP, JSON or a summary.

#[macro_use]
extern crate log;

#[macro_use]
extern crate derive_builder;

pub mod app;
pub mod configuration;
pub mod error;
pub mod reporter;
pub mod time;

pub use self::error::{Error, Result};
