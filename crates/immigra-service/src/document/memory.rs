//! In-process document sink.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentAnalysis, DocumentSink, Result, TRACING_TARGET};

/// Number of documents kept by [`MemoryDocumentStore::new`].
pub const DEFAULT_DOCUMENT_CAPACITY: usize = 1024;

/// Document sink keeping the latest analysis per document in memory.
///
/// Holds at most `capacity` documents. Storing a new document into a full
/// store evicts the analysis with the oldest `analyzed_at`.
#[derive(Debug, Clone)]
pub struct MemoryDocumentStore {
    analyses: Arc<RwLock<HashMap<Uuid, DocumentAnalysis>>>,
    capacity: usize,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_DOCUMENT_CAPACITY)
    }
}

impl MemoryDocumentStore {
    /// Creates an empty store with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store holding at most `capacity` documents (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            analyses: Arc::default(),
            capacity: capacity.max(1),
        }
    }

    /// Returns the maximum number of documents kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the stored analysis for a document.
    pub async fn get(&self, document_id: Uuid) -> Option<DocumentAnalysis> {
        self.analyses.read().await.get(&document_id).cloned()
    }

    /// Returns the number of documents with a stored analysis.
    pub async fn len(&self) -> usize {
        self.analyses.read().await.len()
    }

    /// Returns true if nothing has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.analyses.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl DocumentSink for MemoryDocumentStore {
    async fn store(&self, analysis: DocumentAnalysis) -> Result<()> {
        let document_id = analysis.document_id;
        let mut analyses = self.analyses.write().await;

        let mut evicted = None;
        if !analyses.contains_key(&document_id) && analyses.len() >= self.capacity {
            evicted = analyses
                .values()
                .min_by_key(|stored| stored.analyzed_at)
                .map(|oldest| oldest.document_id);
            if let Some(oldest) = evicted {
                analyses.remove(&oldest);
            }
        }

        let replaced = analyses.insert(document_id, analysis).is_some();
        drop(analyses);

        tracing::debug!(
            target: TRACING_TARGET,
            document_id = %document_id,
            replaced,
            evicted = ?evicted,
            "Stored document analysis"
        );

        Ok(())
    }
}
