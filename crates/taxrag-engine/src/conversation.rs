use chrono::{DateTime, Utc};
use serde::Serialize;

use taxrag_text::TermAnalyzer;

/// Words that mark a query as leaning on earlier turns.
pub const FOLLOW_UP_WORDS: [&str; 7] = ["it", "this", "that", "these", "those", "also", "more"];

const FUSED_TURNS: usize = 2;
const SUMMARY_TURNS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub chunks_used: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationSummary {
    pub total_queries: usize,
    pub avg_chunks_used: f32,
    pub recent_queries: Vec<String>,
    pub first_timestamp: Option<DateTime<Utc>>,
}

/// Ordered history of answered queries for one conversation.
#[derive(Clone, Default)]
pub struct ConversationState {
    turns: Vec<ConversationTurn>,
    words: TermAnalyzer,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, query: &str, chunks_used: usize) {
        self.turns.push(ConversationTurn { query: query.to_string(), timestamp: Utc::now(), chunks_used });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn summarize(&self) -> ConversationSummary {
        if self.turns.is_empty() {
            return ConversationSummary::default();
        }
        let total_chunks: usize = self.turns.iter().map(|t| t.chunks_used).sum();
        let start = self.turns.len().saturating_sub(SUMMARY_TURNS);
        ConversationSummary {
            total_queries: self.turns.len(),
            avg_chunks_used: total_chunks as f32 / self.turns.len() as f32,
            recent_queries: self.turns[start..].iter().map(|t| t.query.clone()).collect(),
            first_timestamp: self.turns.first().map(|t| t.timestamp),
        }
    }

    /// Append the two most recent queries when `query` refers back to them.
    pub fn fuse(&self, query: &str) -> String {
        if self.turns.is_empty() || !self.words.contains_word(query, &FOLLOW_UP_WORDS) {
            return query.to_string();
        }
        let start = self.turns.len().saturating_sub(FUSED_TURNS);
        let recent: Vec<&str> = self.turns[start..].iter().map(|t| t.query.as_str()).collect();
        format!("{} (previous context: {})", query, recent.join("; "))
    }
}
