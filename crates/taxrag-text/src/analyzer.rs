use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

/// Function words ignored when measuring literal term overlap.
pub const QUERY_STOP_WORDS: [&str; 13] = [
	"is", "are", "the", "a", "an", "what", "how", "why", "when", "where", "can", "do", "does",
];

pub fn build_query_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(QUERY_STOP_WORDS.iter().map(|s| s.to_string())))
		.build()
}

pub fn build_word_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build()
}

/// Splits text into lowercase alphanumeric word tokens.
#[derive(Clone)]
pub struct TermAnalyzer {
	content: TextAnalyzer,
	words: TextAnalyzer,
}

impl Default for TermAnalyzer {
	fn default() -> Self { Self::new() }
}

impl TermAnalyzer {
	pub fn new() -> Self { Self { content: build_query_analyzer(), words: build_word_analyzer() } }

	/// Unique content terms (stop words removed), first occurrence order.
	pub fn content_terms(&self, text: &str) -> Vec<String> {
		let mut analyzer = self.content.clone();
		let mut terms: Vec<String> = Vec::new();
		collect(&mut analyzer, text, |t| { if !terms.iter().any(|x| x == t) { terms.push(t.to_string()); } });
		terms
	}

	/// Every lowercase word token, duplicates kept.
	pub fn words(&self, text: &str) -> Vec<String> {
		let mut analyzer = self.words.clone();
		let mut out = Vec::new();
		collect(&mut analyzer, text, |t| out.push(t.to_string()));
		out
	}

	pub fn contains_word(&self, text: &str, candidates: &[&str]) -> bool {
		self.words(text).iter().any(|w| candidates.contains(&w.as_str()))
	}
}

fn collect<F: FnMut(&str)>(analyzer: &mut TextAnalyzer, text: &str, mut sink: F) {
	let mut stream = analyzer.token_stream(text);
	while stream.advance() { sink(&stream.token().text); }
}
