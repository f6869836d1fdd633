//! Core domain model for the tapewheel backup manager.
//!
//! This crate holds everything the manager needs to reason about an archive
//! without touching the network or spawning processes:
//! - the typed archive record ([`archive::ArchiveRecord`]),
//! - the scheduling rules and calendar predicates ([`rule`]),
//! - the rotating destination-set counters ([`rotation`]),
//! - label and file-name synthesis ([`label`]),
//! - the per-target / per-archive outcome model ([`status`]),
//! - the document codec ([`persist`]): canonical YAML plus a read-only
//!   importer for the legacy line-oriented format.

pub mod archive;
pub mod error;
pub mod label;
pub mod persist;
pub mod rotation;
pub mod rule;
pub mod status;

pub use archive::{ArchiveRecord, Target};
pub use error::{Error, Result};
pub use rotation::SetCounters;
pub use rule::Rule;
pub use status::ArchiveStatus;
