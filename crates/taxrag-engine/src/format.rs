//! Confidence labels and source attribution lines.

use taxrag_core::types::{Page, RankedResult};

use crate::answer::SourceRef;

/// Score at or above which a lone source is cited with the short form.
const SINGLE_SOURCE_MIN: f32 = 0.6;

pub fn confidence_label(score: f32) -> &'static str {
    if score >= 0.8 {
        "Very High"
    } else if score >= 0.6 {
        "High"
    } else if score >= 0.4 {
        "Medium"
    } else {
        "Low"
    }
}

pub fn build_sources(results: &[RankedResult], max_sources: usize) -> Vec<SourceRef> {
    results
        .iter()
        .take(max_sources)
        .enumerate()
        .map(|(i, r)| SourceRef {
            number: i + 1,
            chunk_id: r.chunk_id(),
            page: r.chunk.page,
            section: r.chunk.section.clone(),
            score: r.score,
            base_similarity: r.base_similarity,
            keyword_boost: r.keyword_boost,
            confidence: confidence_label(r.score),
        })
        .collect()
}

pub fn average_score(sources: &[SourceRef]) -> f32 {
    if sources.is_empty() {
        return 0.0;
    }
    sources.iter().map(|s| s.score).sum::<f32>() / sources.len() as f32
}

pub fn format_sources(sources: &[SourceRef], title: &str) -> String {
    match sources {
        [] => String::new(),
        [only] if only.score >= SINGLE_SOURCE_MIN => match only.page {
            Page::Number(n) => format!("\n\n*Source: {title}, Page {n}*"),
            Page::Unknown => format!("\n\n*Source: {title}*"),
        },
        _ => {
            let listed: Vec<String> = sources.iter().map(|s| format!("Page {} ({})", s.page, s.confidence)).collect();
            format!("\n\n*Sources: {title} - {}*", listed.join(", "))
        }
    }
}

pub fn disclaimer(title: &str) -> String {
    format!("\n\n*Please verify with the complete {title} or consult a tax professional for accurate advice.*")
}
