//! # Firkin Core
//!
//! Log-structured key-value engine for firkin.
//!
//! Writes are appended to on-disk segment files; an in-memory index maps
//! each key to the location of its most recent value.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   Engine                     │
//! │  put / get / compact  (one global mutex)     │
//! │                                              │
//! │  index: key -> (segment seq, byte offset)    │
//! └──────┬─────────────┬─────────────┬───────────┘
//!        │             │             │
//!        ▼             ▼             ▼
//!  segment-…00.log  segment-…01.log  segment-…02.log
//!  (sealed)         (sealed)         (active)
//! ```
//!
//! The index is never persisted: it is rebuilt on open by replaying every
//! segment in creation order. Compaction rewrites only live values into a
//! fresh segment and retires the old ones.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;

pub use config::Config;
pub use engine::{CompactionStats, Engine};
pub use error::{EngineError, EngineResult};

/// Current version of firkin_core.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
