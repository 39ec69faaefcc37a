//! Sandboxed filesystem primitives for agent-sync
//!
//! Provides root-confined atomic writes, SHA-256 checksum helpers, and the
//! content-addressed blob cache shared by the source resolvers and the sync
//! engine.

pub mod cache;
pub mod checksum;
pub mod error;
pub mod io;
pub mod sandbox;

pub use cache::ContentCache;
pub use error::{Error, Result};
pub use sandbox::Sandbox;
