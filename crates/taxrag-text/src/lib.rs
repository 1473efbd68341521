//! taxrag-text
//!
//! Lexical side of retrieval: tantivy-based term analysis, query enhancement
//! with domain hints, keyword boost scoring and chunk classification helpers.

pub mod analyzer;
pub mod boost;
pub mod classify;
pub mod enhance;

pub use analyzer::TermAnalyzer;
pub use boost::{KeywordScorer, QueryTerms};
pub use classify::{classify_content, extract_section_label};
pub use enhance::QueryEnhancer;
