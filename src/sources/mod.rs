//! Data sources
//!
//! Each source knows how to produce a complete `Dataset`:
//! - `MergedSource`: the hosted backend, topped up with snapshot posts it
//!   does not know about yet
//! - `SnapshotSource`: the static JSON snapshot (URL or file)
//! - `LocalSource`: whatever was last persisted to the local store
//!
//! The reconciler tries them in that order and keeps the first success.

mod hosted;
mod local;
mod snapshot;

use async_trait::async_trait;
use std::time::Duration;

use crate::backend::BackendError;
use crate::models::Dataset;

pub use hosted::{merge_snapshot_posts, HostedSource, MergedSource};
pub use local::LocalSource;
pub use snapshot::{materialize_post, SnapshotSource};

/// Error types for source loads
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The tier has nothing configured
    #[error("Source is not configured")]
    NotConfigured,

    /// Hosted backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Transport or I/O failure
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Document did not have the expected shape
    #[error("Malformed data: {0}")]
    Shape(#[from] serde_json::Error),

    /// The source answered but had no usable post list
    #[error("Source returned no data")]
    Empty,

    /// The load did not finish in time
    #[error("Timed out after {0}s")]
    Timeout(u64),
}

/// Which fallback tier a source belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTier {
    Hosted,
    Snapshot,
    Local,
}

impl SourceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTier::Hosted => "hosted",
            SourceTier::Snapshot => "snapshot",
            SourceTier::Local => "local",
        }
    }
}

impl std::fmt::Display for SourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A place a complete data set can be loaded from
#[async_trait]
pub trait DataSource: Send + Sync {
    fn tier(&self) -> SourceTier;

    /// Load posts, categories and tags in one go
    async fn load_all(&self) -> Result<Dataset, SourceError>;

    /// `load_all` bounded by `timeout`
    async fn load_within(&self, timeout: Duration) -> Result<Dataset, SourceError> {
        match tokio::time::timeout(timeout, self.load_all()).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(timeout.as_secs())),
        }
    }
}
