use regex::Regex;
use std::sync::OnceLock;

/// Domain categories and the substrings that signal them in a query.
pub const TAX_CATEGORIES: &[(&str, &[&str])] = &[
	("deduction", &["80c", "80d", "80e", "80g", "24b", "deduction", "exemption"]),
	("income", &["salary", "income", "earnings", "revenue", "profit"]),
	("regime", &["old regime", "new regime", "tax regime", "regime comparison"]),
	("calculation", &["calculate", "computation", "formula", "how to compute"]),
	("filing", &["itr", "return", "filing", "form 16", "form 26as"]),
	("penalty", &["penalty", "late fee", "interest", "default"]),
	("assessment", &["assessment", "notice", "scrutiny"]),
];

fn section_pattern() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"section\s+(\d+[a-z]*)").expect("section pattern is valid"))
}

/// Appends category and section-number hints to a query before embedding.
///
/// Call once per request path: enhancing an enhanced query matches its own
/// hints again and duplicates them.
#[derive(Debug, Clone)]
pub struct QueryEnhancer {
	categories: &'static [(&'static str, &'static [&'static str])],
}

impl Default for QueryEnhancer {
	fn default() -> Self { Self { categories: TAX_CATEGORIES } }
}

impl QueryEnhancer {
	pub fn new() -> Self { Self::default() }

	pub fn hints(&self, query: &str) -> Vec<String> {
		let lower = query.to_lowercase();
		let mut hints: Vec<String> = self.categories.iter()
			.filter(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
			.map(|(category, _)| category.to_string())
			.collect();
		hints.extend(section_pattern().captures_iter(&lower).filter_map(|c| c.get(1)).map(|m| m.as_str().to_string()));
		hints
	}

	pub fn enhance(&self, query: &str) -> String {
		let hints = self.hints(query);
		if hints.is_empty() { query.to_string() } else { format!("{} context: {}", query, hints.join(" ")) }
	}
}
