//! tapewheel manager library crate.
//!
//! This module exposes the scheduling and execution pipeline for
//! integration testing; the `tapewheel` binary is a thin CLI wrapper
//! around [`scheduler::Scheduler`].

pub mod cli;
pub mod context;
pub mod error;
pub mod executor;
pub mod logging;
pub mod notifier;
pub mod ping;
pub mod results;
pub mod scheduler;
pub mod sink;
pub mod transport;
pub mod worker;

pub use error::{Error, Result};
