use std::sync::Arc;

use taxrag_core::error::Result;
use taxrag_core::store::ChunkStore;
use taxrag_core::traits::{CorpusLoader, LoadedCorpus, VectorIndex};
use taxrag_vector::Catalog;

/// Whether a session can actually retrieve anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusStatus {
    Ready,
    /// Serving continues, but every retrieval comes back empty.
    Degraded(String),
}

/// The (index, chunk store) pair one session serves from.
pub struct Corpus {
    document_id: String,
    index: Option<Arc<dyn VectorIndex>>,
    store: ChunkStore,
    source_name: Option<String>,
    status: CorpusStatus,
}

impl Corpus {
    pub fn from_loaded(document_id: impl Into<String>, loaded: LoadedCorpus) -> Self {
        let document_id = document_id.into();
        let status = if loaded.index.is_empty() || loaded.store.is_empty() {
            CorpusStatus::Degraded(format!("store for '{document_id}' is empty"))
        } else {
            CorpusStatus::Ready
        };
        Self { document_id, index: Some(loaded.index), store: loaded.store, source_name: loaded.source_name, status }
    }

    pub fn degraded(document_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            index: None,
            store: ChunkStore::new(),
            source_name: None,
            status: CorpusStatus::Degraded(reason.into()),
        }
    }

    /// Resolve `requested` through the catalog and load it.
    ///
    /// Only a catalog with no store at all is an error; a store that fails to
    /// load yields a degraded corpus.
    pub fn open(catalog: &Catalog, loader: &dyn CorpusLoader, requested: &str) -> Result<Self> {
        let location = catalog.resolve(requested)?;
        let corpus = match loader.load(&location) {
            Ok(loaded) => Self::from_loaded(location.document_id.clone(), loaded),
            Err(e) => {
                tracing::warn!(document = %location.document_id, loader = loader.name(), error = %e, "store failed to load, serving degraded");
                Self::degraded(location.document_id.clone(), e.to_string())
            }
        };
        if let CorpusStatus::Degraded(reason) = &corpus.status {
            tracing::warn!(document = %corpus.document_id, reason = %reason, "corpus degraded");
        } else {
            tracing::info!(document = %corpus.document_id, chunks = corpus.store.len(), loader = loader.name(), "corpus ready");
        }
        Ok(corpus)
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn index(&self) -> Option<&dyn VectorIndex> {
        self.index.as_deref()
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn status(&self) -> &CorpusStatus {
        &self.status
    }
}
