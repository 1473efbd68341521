//! Embedding search plus keyword-boost fusion.

use std::collections::HashSet;
use std::sync::Arc;

use taxrag_core::config::RetrievalSettings;
use taxrag_core::traits::Embedder;
use taxrag_core::types::RankedResult;
use taxrag_text::{KeywordScorer, QueryEnhancer};

use crate::corpus::Corpus;

/// Result of one retrieval call, before it reaches the answer composer.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// Ranked chunks, best first. May be empty.
    Ranked(Vec<RankedResult>),
    /// The session has no usable index.
    NoIndex,
    /// A collaborator failed; the message is for logs only.
    Failed(String),
}

/// Distance to similarity. Negative distances are degenerate and count as a perfect match.
pub fn similarity_from_distance(distance: f32) -> f32 {
    if distance.is_nan() {
        0.0
    } else if distance >= 0.0 {
        1.0 / (1.0 + distance)
    } else {
        1.0
    }
}

fn text_prefix(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

pub struct ScoredRetriever {
    embedder: Arc<dyn Embedder>,
    enhancer: QueryEnhancer,
    scorer: KeywordScorer,
    settings: RetrievalSettings,
}

impl ScoredRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, settings: RetrievalSettings) -> Self {
        Self { embedder, enhancer: QueryEnhancer::new(), scorer: KeywordScorer::new(), settings }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    pub fn retrieve(&self, corpus: &Corpus, query: &str, top_k: usize) -> RetrievalOutcome {
        let Some(index) = corpus.index().filter(|i| !i.is_empty()) else {
            return RetrievalOutcome::NoIndex;
        };
        if top_k == 0 {
            return RetrievalOutcome::Ranked(Vec::new());
        }

        let enhanced = self.enhancer.enhance(query);
        let embedding = match self.embedder.embed(&enhanced) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "query embedding failed");
                return RetrievalOutcome::Failed(e.to_string());
            }
        };
        let fetch = top_k.saturating_mul(self.settings.overfetch).min(index.len());
        let hits = match index.search(&embedding, fetch) {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "vector search failed");
                return RetrievalOutcome::Failed(e.to_string());
            }
        };

        let terms = self.scorer.prepare(query);
        tracing::debug!(terms = ?terms.terms(), candidates = hits.len(), "scoring candidates");
        let mut seen: HashSet<String> = HashSet::new();
        let mut results: Vec<RankedResult> = Vec::with_capacity(top_k);
        for hit in hits {
            let Some(chunk) = corpus.store().get(hit.id) else {
                tracing::debug!(id = hit.id, "hit has no stored chunk");
                continue;
            };
            if !seen.insert(text_prefix(&chunk.text, self.settings.dedup_prefix_chars)) {
                continue;
            }
            let base_similarity = similarity_from_distance(hit.distance);
            if base_similarity < self.settings.similarity_threshold {
                continue;
            }
            let keyword_boost = terms.boost(&chunk.text);
            let score = base_similarity * (1.0 + keyword_boost * self.settings.boost_weight);
            results.push(RankedResult { chunk: Arc::clone(chunk), base_similarity, keyword_boost, score });
            if results.len() >= top_k {
                break;
            }
        }

        // stable: equal scores keep index order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);
        tracing::debug!(query, results = results.len(), best = results.first().map(|r| r.score), "retrieval done");
        RetrievalOutcome::Ranked(results)
    }
}
