use crate::index::{cosine, Index};
use crate::tokenizer::tokenize;
use crate::ScoredDocument;
use std::cmp::Ordering;

/// Score `text` against every indexed document and return them all, best first.
/// Equal scores keep corpus order.
pub fn query(text: &str, index: &Index) -> Vec<ScoredDocument> {
    let q_tokens = tokenize(text);
    let qv = index.vectorize(q_tokens.as_slice());
    let mut scored: Vec<ScoredDocument> = index
        .vectors()
        .iter()
        .enumerate()
        .map(|(document_index, dv)| ScoredDocument { document_index, score: cosine(&qv, dv) })
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}
