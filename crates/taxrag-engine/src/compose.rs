//! Turns ranked chunks into a user-facing answer.
//!
//! Classification runs in two steps. Greetings, stock phrases and longer
//! queries with no tax vocabulary are rejected before retrieval. After
//! retrieval the order is: no results, low confidence, single word, answered.
//! A single word is vague whatever it is, tax terms included.

use taxrag_core::config::AnswerSettings;
use taxrag_core::types::RankedResult;

use crate::answer::{AnswerKind, AnswerResult};
use crate::format::{average_score, build_sources, disclaimer, format_sources};

const GREETINGS: &[&str] = &["hi", "hello", "hey", "good morning", "good evening", "good afternoon"];

const GENERIC_PHRASES: &[&str] = &["hello world", "test", "testing", "thanks", "thank you", "ok", "okay"];

/// Substrings that mark a query as tax related.
pub const TAX_KEYWORDS: &[&str] = &[
    "tax", "section", "deduction", "exemption", "income", "itr", "filing", "return", "assessment", "tds", "hra",
    "lta", "salary", "business", "capital gains", "investment", "calculation", "rate", "regime", "cess",
    "surcharge", "rebate", "refund", "notice", "audit", "80c", "80d", "10", "24", "form 16", "pan", "aadhaar",
];

/// Chunks shorter than this are skipped when stitching a general answer.
const MIN_GENERAL_CHARS: usize = 30;
/// Chunks shorter than this are not added as extra definition context.
const MIN_ADDITIONAL_CHARS: usize = 50;

/// How an answered query is laid out, picked from the wording of the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Definition,
    Process,
    Example,
    Calculation,
    Benefit,
    General,
}

const STRATEGY_KEYWORDS: &[(Strategy, &[&str])] = &[
    (Strategy::Definition, &["what is", "define", "definition", "meaning"]),
    (Strategy::Process, &["how to", "how do", "procedure", "steps", "process"]),
    (Strategy::Example, &["example", "instance"]),
    (Strategy::Calculation, &["calculate", "computation", "formula"]),
    (Strategy::Benefit, &["benefit", "advantage", "exemption", "deduction"]),
];

impl Strategy {
    pub fn detect(query: &str) -> Self {
        let lower = query.to_lowercase();
        STRATEGY_KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map_or(Strategy::General, |(s, _)| *s)
    }

    fn render(self, results: &[RankedResult]) -> String {
        let Some(top) = results.first() else { return String::new() };
        let top_text = top.text().trim();
        match self {
            Strategy::Definition => {
                let lines: Vec<&str> = top_text
                    .lines()
                    .map(str::trim)
                    .filter(|l| {
                        let lower = l.to_lowercase();
                        !l.is_empty() && ["is defined as", "means", "includes", "refers to"].iter().any(|p| lower.contains(p))
                    })
                    .collect();
                let mut answer = if lines.is_empty() {
                    format!("**Answer:**\n\n{top_text}")
                } else {
                    format!("**Definition:**\n\n{}", lines.join("\n"))
                };
                let extra: Vec<&str> = results
                    .iter()
                    .skip(1)
                    .take(2)
                    .map(|r| r.text().trim())
                    .filter(|t| t.chars().count() > MIN_ADDITIONAL_CHARS)
                    .collect();
                if !extra.is_empty() {
                    answer.push_str(&format!("\n\n**Additional Information:**\n\n{}", extra.join("\n")));
                }
                answer
            }
            Strategy::Process => {
                let steps: Vec<&str> = results
                    .iter()
                    .flat_map(|r| r.text().lines())
                    .map(str::trim)
                    .filter(|l| is_step_line(l))
                    .collect();
                if steps.is_empty() {
                    format!("**Procedure:**\n\n{top_text}")
                } else {
                    let bullets: Vec<String> = steps.iter().map(|s| format!("• {s}")).collect();
                    format!("**Process/Steps:**\n\n{}", bullets.join("\n"))
                }
            }
            Strategy::Example => collect_matching(
                results,
                |t| contains_any(t, &["example", "for instance", "such as", "like"]),
                "**Examples:**",
                "**Relevant Information:**",
            ),
            Strategy::Calculation => collect_matching(
                results,
                |t| {
                    t.chars().any(|c| matches!(c, '%' | '₹' | '$' | '=' | '×' | '÷'))
                        || contains_any(t, &["calculate", "formula", "rate", "percentage", "amount"])
                },
                "**Calculation Information:**",
                "**Related Information:**",
            ),
            Strategy::Benefit => collect_matching(
                results,
                |t| contains_any(t, &["benefit", "exemption", "deduction", "allowance", "relief"]),
                "**Benefits/Exemptions:**",
                "**Relevant Information:**",
            ),
            Strategy::General => {
                let parts: Vec<&str> = results
                    .iter()
                    .map(|r| r.text().trim())
                    .filter(|t| t.chars().count() > MIN_GENERAL_CHARS)
                    .collect();
                if parts.is_empty() {
                    format!("**Answer:**\n\n{top_text}")
                } else {
                    format!("**Answer:**\n\n{}", parts.join("\n\n"))
                }
            }
        }
    }
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    let lower = text.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

fn is_step_line(line: &str) -> bool {
    if line.is_empty() {
        return false;
    }
    let lower = line.to_lowercase();
    line.starts_with(|c: char| c.is_ascii_digit())
        || line.starts_with('•')
        || line.starts_with('-')
        || lower.starts_with("step")
        || lower.contains("must")
        || lower.contains("should")
}

fn collect_matching(results: &[RankedResult], keep: impl Fn(&str) -> bool, heading: &str, fallback: &str) -> String {
    let matched: Vec<&str> = results.iter().map(|r| r.text().trim()).filter(|t| keep(*t)).collect();
    if matched.is_empty() {
        let top = results.first().map_or("", |r| r.text().trim());
        format!("{fallback}\n\n{top}")
    } else {
        format!("{heading}\n\n{}", matched.join("\n\n"))
    }
}

fn word_count(query: &str) -> usize {
    query.split_whitespace().count()
}

pub fn has_tax_keyword(query: &str) -> bool {
    contains_any(query, TAX_KEYWORDS)
}

/// Up to four canned follow-up questions for a previous query.
pub fn suggest_followups(query: &str) -> Vec<&'static str> {
    let lower = query.to_lowercase();
    let suggestions: &[&'static str] = if lower.contains("80c") || lower.contains("deduction") {
        &[
            "What are the investment options under Section 80C?",
            "How to claim 80C deductions?",
            "What is the maximum limit for Section 80C?",
            "Can I claim 80C for my children's tuition fees?",
        ]
    } else if lower.contains("regime") {
        &[
            "Which regime is better for salaried employees?",
            "Can I switch between tax regimes every year?",
            "What deductions are not available in new regime?",
            "How to calculate tax under both regimes?",
        ]
    } else if lower.contains("hra") {
        &[
            "How is HRA exemption calculated?",
            "Can I claim HRA and home loan together?",
            "What documents are needed for HRA?",
            "When is HRA not available?",
        ]
    } else if lower.contains("calculate") || lower.contains("tax") {
        &[
            "What are the tax slabs for this year?",
            "How to reduce my tax liability?",
            "What is standard deduction?",
            "How is cess calculated on income tax?",
        ]
    } else {
        &[
            "What are the major tax deductions available?",
            "How do I file my income tax return?",
            "What is the difference between old and new tax regime?",
            "What documents do I need for tax filing?",
        ]
    };
    suggestions.iter().take(4).copied().collect()
}

#[derive(Debug, Clone)]
pub struct AnswerComposer {
    settings: AnswerSettings,
}

impl Default for AnswerComposer {
    fn default() -> Self {
        Self::new(AnswerSettings::default())
    }
}

impl AnswerComposer {
    pub fn new(settings: AnswerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AnswerSettings {
        &self.settings
    }

    /// Vague checks that need no retrieval: greetings, stock phrases and
    /// queries of three or more words without any tax vocabulary.
    pub fn is_vague(&self, query: &str) -> bool {
        let lower = query.trim().to_lowercase();
        if lower.is_empty() || GREETINGS.contains(&lower.as_str()) || GENERIC_PHRASES.contains(&lower.as_str()) {
            return true;
        }
        word_count(&lower) > 2 && !has_tax_keyword(&lower)
    }

    pub fn help_prompt(&self) -> String {
        format!(
            "Hello! I'm your tax assistant. I can help you with questions about:\n\n\
             • Income Tax Sections (e.g., \"What is Section 80C?\")\n\
             • Tax Deductions (e.g., \"How to claim HRA exemption?\")\n\
             • Tax Calculations (e.g., \"Calculate capital gains tax\")\n\
             • Filing Procedures (e.g., \"How to file ITR online?\")\n\
             • Tax Regimes (e.g., \"Compare old vs new tax regime\")\n\n\
             Please ask a specific tax-related question, and I'll answer from the {}.",
            self.settings.corpus_title
        )
    }

    pub fn fallback_text(&self, kind: AnswerKind, query: &str) -> String {
        let title = &self.settings.corpus_title;
        match kind {
            AnswerKind::LowConfidence => format!(
                "I found only loosely related passages for \"{query}\" in the {title}, not enough to answer reliably.\n\n\
                 Try rephrasing your question:\n\
                 • Use specific terms like \"Section 80C\", \"deduction\" or \"tax calculation\"\n\
                 • Ask about one provision or scenario at a time\n\n\
                 Example questions:\n\
                 • \"What is Section 80C?\"\n\
                 • \"How to calculate HRA exemption?\"\n\
                 • \"What are the tax slabs for new regime?\""
            ),
            _ => format!(
                "I couldn't find specific information about \"{query}\" in the {title}.\n\n\
                 Try asking about:\n\
                 • Specific sections: \"What is Section 80C?\" or \"Explain Section 10\"\n\
                 • Deductions: \"HRA exemption rules\" or \"80D deduction limit\"\n\
                 • Procedures: \"How to file ITR?\" or \"ITR filing deadline\"\n\
                 • Calculations: \"Calculate capital gains\" or \"Tax on salary income\"\n\n\
                 Please ask a specific tax-related question."
            ),
        }
    }

    pub fn vague(&self, fused: &str) -> AnswerResult {
        AnswerResult {
            kind: AnswerKind::Vague,
            text: self.help_prompt(),
            sources: Vec::new(),
            confidence_avg: 0.0,
            chunks_used: 0,
            query: fused.to_string(),
        }
    }

    fn fallback(&self, kind: AnswerKind, user_query: &str, fused: &str, chunks_used: usize) -> AnswerResult {
        AnswerResult {
            kind,
            text: self.fallback_text(kind, user_query),
            sources: Vec::new(),
            confidence_avg: 0.0,
            chunks_used,
            query: fused.to_string(),
        }
    }

    /// Compose the answer for ranked `results` (best first).
    ///
    /// `user_query` is what the user typed and drives the layout; `fused` is
    /// the text retrieval ran on.
    pub fn compose(&self, user_query: &str, fused: &str, results: &[RankedResult]) -> AnswerResult {
        let Some(best) = results.first() else {
            return self.fallback(AnswerKind::NoResults, user_query, fused, 0);
        };
        if best.score < self.settings.low_confidence {
            return self.fallback(AnswerKind::LowConfidence, user_query, fused, results.len());
        }
        if word_count(fused) <= 1 {
            return self.vague(fused);
        }

        let top = &results[..results.len().min(self.settings.max_sources)];
        let strategy = Strategy::detect(user_query);
        let sources = build_sources(results, self.settings.max_sources);
        let confidence_avg = average_score(&sources);

        let mut text = strategy.render(top);
        text.push_str(&format_sources(&sources, &self.settings.corpus_title));
        if confidence_avg < self.settings.disclaimer_below {
            text.push_str(&disclaimer(&self.settings.corpus_title));
        }
        AnswerResult {
            kind: AnswerKind::Answered,
            text,
            sources,
            confidence_avg,
            chunks_used: results.len(),
            query: fused.to_string(),
        }
    }
}
