use regex::Regex;
use std::sync::OnceLock;

use taxrag_core::types::{ContentType, DEFAULT_SECTION};

const CONTENT_RULES: &[(ContentType, &[&str])] = &[
	(ContentType::Definition, &["definition", "means", "shall mean"]),
	(ContentType::Exemption, &["exemption", "exempt", "not taxable"]),
	(ContentType::Penalty, &["penalty", "fine", "punishment"]),
	(ContentType::Procedure, &["procedure", "process", "filing"]),
	(ContentType::Calculation, &["rate", "percentage", "calculation"]),
	(ContentType::Deduction, &["deduction", "allowance", "relief"]),
];

/// Infer a content-type tag from chunk text; first matching rule wins.
pub fn classify_content(text: &str) -> ContentType {
	let lower = text.to_lowercase();
	CONTENT_RULES.iter()
		.find(|(_, words)| words.iter().any(|w| lower.contains(w)))
		.map(|(kind, _)| *kind)
		.unwrap_or(ContentType::General)
}

fn section_patterns() -> &'static [Regex] {
	static RES: OnceLock<Vec<Regex>> = OnceLock::new();
	RES.get_or_init(|| {
		[
			r"(?i)Section\s+(\d+[A-Z]*)",
			r"(?i)Chapter\s+([IVX]+)",
			r"(?i)Rule\s+(\d+)",
			r"(?i)Sub-section\s+\((\d+)\)",
			r"(?i)Clause\s+\(([a-z])\)",
		]
		.iter()
		.map(|p| Regex::new(p).expect("section label pattern is valid"))
		.collect()
	})
}

/// First legal-structure reference in the text (e.g. `Section 80C`), or `General`.
pub fn extract_section_label(text: &str) -> String {
	section_patterns().iter()
		.find_map(|re| re.find(text))
		.map(|m| m.as_str().to_string())
		.unwrap_or_else(|| DEFAULT_SECTION.to_string())
}
