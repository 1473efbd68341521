//! Domain types used by the retriever, the answer composer and the storage backends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Position of a chunk inside its vector store. Stable for the lifetime of an index.
pub type ChunkId = usize;

pub const DEFAULT_SECTION: &str = "General";

/// Coarse tag describing what kind of legal text a chunk holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Definition,
    Exemption,
    Penalty,
    Procedure,
    Calculation,
    Deduction,
    #[default]
    General,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Definition => "definition",
            ContentType::Exemption => "exemption",
            ContentType::Penalty => "penalty",
            ContentType::Procedure => "procedure",
            ContentType::Calculation => "calculation",
            ContentType::Deduction => "deduction",
            ContentType::General => "general",
        }
    }

    /// Lenient parse used for persisted metadata; unknown tags become `General`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "definition" => ContentType::Definition,
            "exemption" => ContentType::Exemption,
            "penalty" => ContentType::Penalty,
            "procedure" => ContentType::Procedure,
            "calculation" => ContentType::Calculation,
            "deduction" => ContentType::Deduction,
            _ => ContentType::General,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page a chunk was extracted from. Persisted metadata stores either an integer
/// or a label such as `"N/A"`, which maps to `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawPage", into = "RawPage")]
pub enum Page {
    Number(u32),
    #[default]
    Unknown,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawPage {
    Number(u32),
    Text(String),
}

impl From<RawPage> for Page {
    fn from(raw: RawPage) -> Self {
        match raw {
            RawPage::Number(n) => Page::Number(n),
            RawPage::Text(s) => s.trim().parse().map(Page::Number).unwrap_or(Page::Unknown),
        }
    }
}

impl From<Page> for RawPage {
    fn from(page: Page) -> Self {
        match page {
            Page::Number(n) => RawPage::Number(n),
            Page::Unknown => RawPage::Text("unknown".to_string()),
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Number(n) => write!(f, "{n}"),
            Page::Unknown => f.write_str("unknown"),
        }
    }
}

/// An immutable unit of corpus text plus the metadata captured at ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    #[serde(default)]
    pub page: Page,
    #[serde(default = "default_section")]
    pub section: String,
    #[serde(default)]
    pub content_type: ContentType,
}

fn default_section() -> String {
    DEFAULT_SECTION.to_string()
}

impl Chunk {
    pub fn new(id: ChunkId, text: impl Into<String>) -> Self {
        Self { id, text: text.into(), page: Page::Unknown, section: default_section(), content_type: ContentType::General }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Page::Number(page);
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }
}

/// One nearest-neighbour candidate returned by a vector index.
///
/// `distance` is index-specific (squared L2 for the bundled backends); lower is closer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub distance: f32,
}

/// A chunk that survived deduplication and thresholding for one query.
///
/// `score = base_similarity * (1 + keyword_boost * boost_weight)`. The chunk is
/// shared with the store, so it doubles as the metadata snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub chunk: Arc<Chunk>,
    pub base_similarity: f32,
    pub keyword_boost: f32,
    pub score: f32,
}

impl RankedResult {
    pub fn chunk_id(&self) -> ChunkId {
        self.chunk.id
    }

    pub fn text(&self) -> &str {
        &self.chunk.text
    }
}

/// Where a named document's persisted artifacts live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLocation {
    pub document_id: String,
    /// Directory holding the vector store (`<doc>_vectors`).
    pub vector_dir: PathBuf,
    /// Optional `<doc>_metadata.json` side file.
    pub metadata_file: PathBuf,
}
