//! In-memory chunk store keyed by the integer id the vector index returns.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::types::{Chunk, ChunkId};

#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    chunks: BTreeMap<ChunkId, Arc<Chunk>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_chunks<I: IntoIterator<Item = Chunk>>(chunks: I) -> Self {
        let mut store = Self::new();
        for chunk in chunks {
            store.insert(chunk);
        }
        store
    }

    /// Later inserts with the same id replace earlier ones.
    pub fn insert(&mut self, chunk: Chunk) {
        self.chunks.insert(chunk.id, Arc::new(chunk));
    }

    pub fn get(&self, id: ChunkId) -> Option<&Arc<Chunk>> {
        self.chunks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Chunk>> {
        self.chunks.values()
    }
}
