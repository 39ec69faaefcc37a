//! Operations engine and transform pipeline for agent-sync
//!
//! Composes the resolvers, cache, sandbox, and configuration layers into
//! the six operations: update, sync, check, verify, prune, and status.

pub mod engine;
pub mod error;
pub mod transform;

pub use engine::{
    CheckResult, DriftEntry, Engine, FileAction, PruneOptions, PruneResult, SourceDelta,
    SourceFailure, SourceState, SourceStatus, SourceUpdate, SyncOptions, SyncResult, UpdateOptions,
    UpdateResult, VerifyResult,
};
pub use error::{Error, Result};
