//! `<doc>_metadata.json` side files written at ingestion time.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use taxrag_core::types::{Chunk, ContentType, Page, DEFAULT_SECTION};
use taxrag_text::{classify_content, extract_section_label};

/// Chunks per page assumed when no metadata file was written.
const DEFAULT_CHUNKS_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub chunks_metadata: Vec<ChunkMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default)]
    pub page: Page,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Read the side file; a missing file is `Ok(None)`, a malformed one is an error.
pub fn read_metadata(path: &Path) -> Result<Option<DocumentMetadata>> {
    if !path.exists() { return Ok(None); }
    let raw = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Like `read_metadata`, but a malformed file degrades to `None` with a warning.
pub fn read_metadata_lenient(path: &Path) -> Option<DocumentMetadata> {
    match read_metadata(path) {
        Ok(meta) => meta,
        Err(e) => { tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable metadata file"); None }
    }
}

/// Attach page/section/content-type metadata to chunk texts by position.
///
/// Without a metadata file pages are estimated as `index / 10`, the section is
/// `General` and the content type is inferred from the text. With one, missing
/// fields are inferred from the text and positions it does not cover get an
/// unknown page.
pub fn assemble_chunks(texts: Vec<String>, metadata: Option<&DocumentMetadata>) -> Vec<Chunk> {
    texts.into_iter().enumerate().map(|(id, text)| {
        let (page, section, content_type) = match metadata {
            None => (page_estimate(id), Some(DEFAULT_SECTION.to_string()), None),
            Some(meta) => match meta.chunks_metadata.get(id) {
                Some(m) => (m.page, m.section.clone(), m.content_type.as_deref().map(ContentType::parse_lenient)),
                None => (Page::Unknown, None, None),
            },
        };
        let section = section.unwrap_or_else(|| extract_section_label(&text));
        let content_type = content_type.unwrap_or_else(|| classify_content(&text));
        Chunk { id, text, page, section, content_type }
    }).collect()
}

fn page_estimate(id: usize) -> Page {
    u32::try_from(id / DEFAULT_CHUNKS_PER_PAGE).map_or(Page::Unknown, Page::Number)
}
