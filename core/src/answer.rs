//! Turn a ranked list into a short cited answer.

use crate::tokenizer::{split_sentences, tokenize};
use crate::{Answer, Document, ScoredDocument, Source};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_MIN_SCORE: f32 = 0.12;
pub const DEFAULT_MAX_SENTENCES: usize = 2;
pub const FALLBACK_MESSAGE: &str =
    "I can help with Kien's portfolio only (skills, projects, experience, contact). Please ask something related.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOptions {
    /// Maximum number of cited documents.
    pub top_k: usize,
    /// Documents scoring below this are never cited.
    pub min_score: f32,
    /// Sentences quoted per cited document.
    pub max_sentences: usize,
    /// Reply used when nothing clears `min_score`.
    pub fallback: String,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
            max_sentences: DEFAULT_MAX_SENTENCES,
            fallback: FALLBACK_MESSAGE.to_string(),
        }
    }
}

pub fn compose(query: &str, ranked: &[ScoredDocument], documents: &[Document], top_k: usize, min_score: f32) -> Answer {
    let opts = AnswerOptions { top_k, min_score, ..AnswerOptions::default() };
    compose_with(query, ranked, documents, &opts)
}

pub fn compose_with(query: &str, ranked: &[ScoredDocument], documents: &[Document], opts: &AnswerOptions) -> Answer {
    let top: Vec<(&ScoredDocument, &Document)> = ranked
        .iter()
        .filter(|s| s.score >= opts.min_score)
        .take(opts.top_k)
        .filter_map(|s| documents.get(s.document_index).map(|d| (s, d)))
        .collect();

    let Some(&(_, best)) = top.first() else {
        return Answer { text: opts.fallback.clone(), sources: Vec::new() };
    };

    let q_terms: HashSet<String> = tokenize(query).into_iter().collect();
    let mut sources = Vec::with_capacity(top.len());
    let mut lines = Vec::with_capacity(top.len());
    for (scored, doc) in &top {
        sources.push(Source { title: doc.title.clone(), id: doc.id.clone(), score: round3(scored.score) });
        let picked = pick_sentences(&doc.text, &q_terms, opts.max_sentences);
        if !picked.is_empty() {
            lines.push(format!("• {}", picked.join(" ")));
        }
    }

    let text = if lines.is_empty() { best.text.clone() } else { lines.join("\n") };
    Answer { text, sources }
}

/// Up to `max` sentences sharing a term with the query, or the first sentence
/// when none overlap.
fn pick_sentences(text: &str, q_terms: &HashSet<String>, max: usize) -> Vec<String> {
    let sentences = split_sentences(text);
    let mut picked: Vec<String> = Vec::new();
    for s in &sentences {
        if picked.len() >= max { break; }
        if tokenize(s).iter().any(|t| q_terms.contains(t)) {
            picked.push(s.clone());
        }
    }
    if picked.is_empty() {
        if let Some(first) = sentences.into_iter().next() {
            picked.push(first);
        }
    }
    picked
}

/// Rounded in `f64` so half-way cases land where a double-precision `toFixed(3)` puts them.
fn round3(score: f32) -> f32 {
    ((f64::from(score) * 1000.0).round() / 1000.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str) -> Document { Document::new(id, id, text) }

    #[test]
    fn below_threshold_falls_back() {
        let docs = vec![doc("a", "Anything.")];
        let ranked = vec![ScoredDocument { document_index: 0, score: 0.11 }];
        let answer = compose("anything", &ranked, &docs, 3, 0.12);
        assert_eq!(answer.text, FALLBACK_MESSAGE);
        assert!(answer.sources.is_empty());
    }

    #[test]
    fn picks_at_most_two_overlapping_sentences() {
        let docs = vec![doc("a", "Rust one. Python two. Rust three. Rust four.")];
        let ranked = vec![ScoredDocument { document_index: 0, score: 0.5 }];
        let answer = compose("rust", &ranked, &docs, 3, 0.12);
        assert_eq!(answer.text, "• Rust one. Rust three.");
    }

    #[test]
    fn first_sentence_when_nothing_overlaps() {
        let docs = vec![doc("a", "Intro here. More detail.")];
        let ranked = vec![ScoredDocument { document_index: 0, score: 0.3 }];
        let answer = compose("unrelated", &ranked, &docs, 3, 0.12);
        assert_eq!(answer.text, "• Intro here.");
    }

    #[test]
    fn respects_top_k_and_rounds_scores() {
        let docs = vec![doc("a", "A."), doc("b", "B."), doc("c", "C.")];
        let ranked = vec![
            ScoredDocument { document_index: 2, score: 0.98765 },
            ScoredDocument { document_index: 0, score: 0.5 },
            ScoredDocument { document_index: 1, score: 0.4 },
        ];
        let answer = compose("q", &ranked, &docs, 2, 0.12);
        let ids: Vec<&str> = answer.sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert!((answer.sources[0].score - 0.988).abs() < 1e-6);
        assert_eq!(answer.text, "• C.\n• A.");
    }

    #[test]
    fn rounding_uses_the_stored_value() {
        // 0.0025f32 is 0.00249999994..., which must not round up to 0.003
        assert_eq!(round3(0.0025), 0.002);
        assert_eq!(round3(0.5), 0.5);
        assert_eq!(round3(0.98765), 0.988);
    }

    #[test]
    fn blank_text_falls_back_to_top_document() {
        let docs = vec![doc("a", "   ")];
        let ranked = vec![ScoredDocument { document_index: 0, score: 0.9 }];
        let answer = compose("a", &ranked, &docs, 3, 0.12);
        assert_eq!(answer.text, "   ");
        assert_eq!(answer.sources.len(), 1);
    }
}
