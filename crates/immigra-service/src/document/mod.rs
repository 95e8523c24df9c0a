//! Document analysis persistence.
//!
//! The gateway hands successful document reviews to a [`DocumentSink`] and
//! never waits for the outcome. Sinks therefore report failures through their
//! own logging; the returned error is only observed by the spawned task.

mod memory;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::memory::{DEFAULT_DOCUMENT_CAPACITY, MemoryDocumentStore};
pub use crate::{Error, ErrorKind, Result};

/// Tracing target for document sink operations.
pub const TRACING_TARGET: &str = "immigra_service::document";

/// Analysis produced for an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    pub document_id: Uuid,
    /// Account that requested the analysis.
    pub owner_id: Uuid,
    /// Model that produced the analysis.
    pub model: String,
    pub content: String,
    pub analyzed_at: Timestamp,
}

impl DocumentAnalysis {
    /// Creates a new analysis stamped with the current time.
    pub fn new(
        document_id: Uuid,
        owner_id: Uuid,
        model: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            document_id,
            owner_id,
            model: model.into(),
            content: content.into(),
            analyzed_at: Timestamp::now(),
        }
    }
}

/// Receives document analyses keyed by document identifier.
#[async_trait::async_trait]
pub trait DocumentSink: Send + Sync {
    /// Stores the analysis, replacing any previous one for the same document.
    async fn store(&self, analysis: DocumentAnalysis) -> Result<()>;
}
