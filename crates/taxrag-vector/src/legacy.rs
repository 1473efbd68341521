//! Legacy JSON layout: `<doc>_vectors/index.json` holds the chunk texts and
//! `<doc>_vectors/vectors.json` the embedding rows, both in index order.
//!
//! `index.json` is either a plain list of texts or a docstore map:
//! `{"docstore": {"<uuid>": "text"}, "index_to_id": {"0": "<uuid>"}}`.
//! A chunk file that cannot be parsed yields placeholder texts (`Chunk <i>`)
//! so the session still serves, with reduced fidelity.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use taxrag_core::store::ChunkStore;
use taxrag_core::traits::{CorpusLoader, LoadedCorpus};
use taxrag_core::types::DocumentLocation;

use crate::flat::FlatIndex;
use crate::metadata::{assemble_chunks, read_metadata_lenient, DocumentMetadata};

pub const CHUNKS_FILE: &str = "index.json";
pub const VECTORS_FILE: &str = "vectors.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkLayout {
    Plain(Vec<String>),
    Docstore { docstore: HashMap<String, String>, index_to_id: HashMap<String, String> },
}

impl ChunkLayout {
    /// Texts in index order; `rows` bounds the docstore walk.
    pub fn into_texts(self, rows: usize) -> Vec<String> {
        match self {
            ChunkLayout::Plain(texts) => texts,
            ChunkLayout::Docstore { docstore, index_to_id } => (0..rows)
                .map(|i| {
                    index_to_id
                        .get(&i.to_string())
                        .and_then(|id| docstore.get(id))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyLoader;

impl LegacyLoader {
    pub fn new() -> Self {
        Self
    }
}

fn read_texts(path: &Path, rows: usize) -> Vec<String> {
    let parsed = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|raw| Ok(serde_json::from_str::<ChunkLayout>(&raw)?));
    match parsed {
        Ok(layout) => layout.into_texts(rows),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "chunk texts unreadable, using placeholders");
            (0..rows).map(|i| format!("Chunk {i}")).collect()
        }
    }
}

impl CorpusLoader for LegacyLoader {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn load(&self, location: &DocumentLocation) -> Result<LoadedCorpus> {
        let vectors_path = location.vector_dir.join(VECTORS_FILE);
        let raw = std::fs::read_to_string(&vectors_path)
            .with_context(|| format!("reading {}", vectors_path.display()))?;
        let vectors: Vec<Vec<f32>> =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", vectors_path.display()))?;
        let rows = vectors.len();
        let index = FlatIndex::from_vectors(vectors)?;

        let texts = read_texts(&location.vector_dir.join(CHUNKS_FILE), rows);
        let metadata = read_metadata_lenient(&location.metadata_file);
        let chunks = assemble_chunks(texts, metadata.as_ref());
        tracing::info!(document = %location.document_id, chunks = chunks.len(), vectors = rows, "loaded legacy store");

        Ok(LoadedCorpus {
            index: Arc::new(index),
            store: ChunkStore::from_chunks(chunks),
            source_name: metadata.and_then(|m| m.filename),
        })
    }
}

/// Persist a legacy store; used by fixtures and ingestion hosts.
pub fn write_store(
    location: &DocumentLocation,
    texts: &[String],
    vectors: &[Vec<f32>],
    metadata: Option<&DocumentMetadata>,
) -> Result<()> {
    std::fs::create_dir_all(&location.vector_dir)?;
    std::fs::write(location.vector_dir.join(CHUNKS_FILE), serde_json::to_string(texts)?)?;
    std::fs::write(location.vector_dir.join(VECTORS_FILE), serde_json::to_string(vectors)?)?;
    if let Some(meta) = metadata {
        if let Some(parent) = location.metadata_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&location.metadata_file, serde_json::to_string_pretty(meta)?)?;
    }
    Ok(())
}
