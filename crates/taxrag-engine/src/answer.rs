use serde::Serialize;

use taxrag_core::types::{ChunkId, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Greeting or off-topic input; answered with the help prompt.
    Vague,
    NoResults,
    LowConfidence,
    Answered,
}

impl AnswerKind {
    pub fn is_fallback(self) -> bool {
        matches!(self, AnswerKind::NoResults | AnswerKind::LowConfidence)
    }
}

/// One retrieved chunk as cited in an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    /// 1-based position in the citation list.
    pub number: usize,
    pub chunk_id: ChunkId,
    pub page: Page,
    pub section: String,
    pub score: f32,
    pub base_similarity: f32,
    pub keyword_boost: f32,
    pub confidence: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResult {
    pub kind: AnswerKind,
    pub text: String,
    pub sources: Vec<SourceRef>,
    /// Mean final score of `sources`; zero when nothing is cited.
    pub confidence_avg: f32,
    pub chunks_used: usize,
    /// Query text after context fusion, as sent to retrieval.
    pub query: String,
}
