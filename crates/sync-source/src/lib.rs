//! Source resolvers for agent-sync
//!
//! Each source kind (git, url, local) implements the Resolve/Fetch
//! capability contract; a registry keyed by kind string dispatches
//! operations.

pub mod cancel;
pub mod error;
pub mod git;
pub mod local;
pub mod resolver;
pub mod url;

pub use cancel::{CancelToken, Cancelled};
pub use error::{Error, Result};
pub use git::GitResolver;
pub use local::LocalResolver;
pub use resolver::{FetchedFile, Registry, ResolvedSource, SourceResolver};
pub use url::{HttpClient, HttpResponse, ReqwestClient, UrlResolver};
