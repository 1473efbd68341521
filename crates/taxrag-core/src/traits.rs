use std::sync::Arc;

use crate::store::ChunkStore;
use crate::types::{DocumentLocation, SearchHit};

/// Maps text to a fixed-dimension vector. Must be deterministic for a given model.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Read-only nearest-neighbour search over stored chunk vectors.
///
/// Hits come back closest first; equal distances keep insertion order.
pub trait VectorIndex: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

/// A vector index paired with the chunk texts it was built from.
pub struct LoadedCorpus {
    pub index: Arc<dyn VectorIndex>,
    pub store: ChunkStore,
    /// Original file name recorded at ingestion, when known.
    pub source_name: Option<String>,
}

/// Strategy for reading one persisted document store from disk.
pub trait CorpusLoader: Send + Sync {
    fn name(&self) -> &'static str;
    fn load(&self, location: &DocumentLocation) -> anyhow::Result<LoadedCorpus>;
}
