//! Deterministic synchronization of agent configuration files.
//!
//! agent-sync pins heterogeneous upstream sources (git repositories, HTTP
//! URLs, local directories) immutably in a lockfile and materializes them
//! into project-relative destinations, optionally transformed. Given
//! identical configuration, lockfile, source content, and overlay files,
//! the output is byte-for-byte identical across runs and machines.
//!
//! # Basic usage
//!
//! ```no_run
//! use agent_sync::{CancelToken, Client, ClientOptions, SyncOptions, UpdateOptions};
//!
//! # fn main() -> agent_sync::Result<()> {
//! let client = Client::new(ClientOptions {
//!     project_root: Some("/path/to/project".into()),
//!     ..Default::default()
//! })?;
//! let cancel = CancelToken::new();
//!
//! // Pin upstream state in the lockfile, then materialize it.
//! let update = client.update(&UpdateOptions::default(), &cancel)?;
//! println!("updated {} sources", update.updated.len());
//!
//! let sync = client.sync(&SyncOptions::default(), &cancel)?;
//! println!("wrote {} files", sync.written.len());
//! # Ok(())
//! # }
//! ```

mod client;

pub use client::{Client, ClientOptions, UpdateReport, UpdateSummary};
pub use sync_core::engine::{
    CheckResult, DriftEntry, FileAction, PruneOptions, PruneResult, SourceDelta, SourceFailure,
    SourceState, SourceStatus, SyncOptions, SyncResult, UpdateOptions, VerifyResult,
};
pub use sync_core::{Error, Result};
pub use sync_source::{CancelToken, Cancelled};
