//! Configuration layer for agent-sync
//!
//! Discovers and merges system, user, and project config files, validates
//! the composite, reads and writes the lockfile, and maps symbolic tool
//! names to destinations.

pub mod discover;
pub mod error;
pub mod loader;
pub mod lockfile;
pub mod merge;
pub mod model;
pub mod toolmap;

pub use discover::{ConfigLayer, ConfigLevel};
pub use error::{Error, Result};
pub use lockfile::{FileHash, LockedSource, Lockfile, ResolvedState};
pub use model::{Config, Override, Source, Target, ToolDefinition, Transform};
pub use toolmap::{ResolvedTarget, ToolMap};
