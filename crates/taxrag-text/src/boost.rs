use crate::analyzer::TermAnalyzer;

/// Bonus added when the whole query appears verbatim in a chunk.
pub const PHRASE_BONUS: f32 = 0.3;

/// Literal-overlap scoring between a query and candidate chunk texts.
#[derive(Clone, Default)]
pub struct KeywordScorer {
	analyzer: TermAnalyzer,
}

/// Query side of the keyword boost, computed once per retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTerms {
	terms: Vec<String>,
	phrase: String,
}

impl KeywordScorer {
	pub fn new() -> Self { Self::default() }

	pub fn prepare(&self, query: &str) -> QueryTerms {
		QueryTerms { terms: self.analyzer.content_terms(query), phrase: query.to_lowercase() }
	}

	pub fn boost(&self, query: &str, chunk_text: &str) -> f32 { self.prepare(query).boost(chunk_text) }
}

impl QueryTerms {
	pub fn terms(&self) -> &[String] { &self.terms }

	/// Fraction of query terms found as substrings of the chunk, plus the phrase
	/// bonus, clamped to `[0, 1]`. Zero when the query has no content terms.
	pub fn boost(&self, chunk_text: &str) -> f32 {
		if self.terms.is_empty() { return 0.0; }
		let chunk_lower = chunk_text.to_lowercase();
		let matches = self.terms.iter().filter(|t| chunk_lower.contains(t.as_str())).count();
		let mut boost = matches as f32 / self.terms.len() as f32;
		if chunk_lower.contains(&self.phrase) { boost += PHRASE_BONUS; }
		boost.clamp(0.0, 1.0)
	}
}
