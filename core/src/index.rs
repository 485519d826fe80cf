use crate::tokenizer::tokenize;
use crate::{Document, TermId};
use std::collections::{HashMap, HashSet};

/// Dense TF-IDF index over a fixed corpus. Vectors are aligned with the
/// documents passed to [`Index::build`] and all have `vocabulary_len()` entries.
#[derive(Debug, Clone, Default)]
pub struct Index {
    dictionary: HashMap<String, TermId>,
    df: Vec<u32>,
    idf: Vec<f32>,
    vectors: Vec<Vec<f32>>,
}

impl Index {
    pub fn build(documents: &[Document]) -> Self {
        let token_docs: Vec<Vec<String>> = documents
            .iter()
            .map(|d| tokenize(&format!("{} {}", d.title, d.text)))
            .collect();

        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut df: Vec<u32> = Vec::new();
        for tokens in &token_docs {
            let mut seen_in_doc: HashSet<TermId> = HashSet::new();
            for term in tokens {
                let next = dictionary.len();
                let tid = *dictionary.entry(term.clone()).or_insert(next);
                if df.len() <= tid { df.resize(tid + 1, 0); }
                if seen_in_doc.insert(tid) {
                    df[tid] += 1;
                }
            }
        }

        let n = documents.len() as f32;
        let idf: Vec<f32> = df.iter().map(|&d| smoothed_idf(n, d)).collect();

        let mut index = Self { dictionary, df, idf, vectors: Vec::new() };
        let vectors = token_docs.iter().map(|tokens| index.vectorize(tokens.as_slice())).collect();
        index.vectors = vectors;
        tracing::debug!(num_docs = documents.len(), num_terms = index.dictionary.len(), "built tf-idf index");
        index
    }

    /// Embed a token sequence in the index's vocabulary space. Unknown terms
    /// contribute nothing; a sequence with no known terms maps to the zero vector.
    pub fn vectorize<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.idf.len()];
        if tokens.is_empty() { return vec; }

        // dense counts keep the norm summed in vocabulary order
        let mut tf = vec![0u32; self.idf.len()];
        for t in tokens {
            if let Some(&tid) = self.dictionary.get(t.as_ref()) {
                tf[tid] += 1;
            }
        }

        let total = tokens.len() as f32;
        let mut norm = 0.0f32;
        for (tid, &count) in tf.iter().enumerate() {
            if count == 0 { continue; }
            let w = (count as f32 / total) * self.idf[tid];
            vec[tid] = w;
            norm += w * w;
        }
        let norm = norm.sqrt();
        if norm > 0.0 {
            for w in vec.iter_mut() { *w /= norm; }
        }
        vec
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    /// Number of documents containing `term`, 0 when the term is unknown.
    pub fn document_frequency(&self, term: &str) -> u32 {
        self.term_id(term).map_or(0, |tid| self.df[tid])
    }

    pub fn idf(&self) -> &[f32] { &self.idf }

    pub fn vectors(&self) -> &[Vec<f32>] { &self.vectors }

    pub fn vocabulary_len(&self) -> usize { self.dictionary.len() }

    pub fn num_docs(&self) -> usize { self.vectors.len() }

    pub fn is_empty(&self) -> bool { self.vectors.is_empty() }
}

/// `ln((N + 1) / (df + 0.5)) + 1`, strictly positive even when every document has the term.
fn smoothed_idf(n: f32, df: u32) -> f32 {
    ((n + 1.0) / (df as f32 + 0.5)).ln() + 1.0
}

/// Cosine similarity of two unit (or zero) vectors, i.e. their dot product.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Document> {
        vec![
            Document::new("a", "Rust", "rust tooling and rust crates"),
            Document::new("b", "Python", "python scripts"),
            Document::new("c", "Empty", ""),
        ]
    }

    #[test]
    fn vocabulary_follows_first_occurrence() {
        let index = Index::build(&docs());
        assert_eq!(index.term_id("rust"), Some(0));
        assert_eq!(index.term_id("tooling"), Some(1));
        assert_eq!(index.term_id("python"), Some(3));
        assert_eq!(index.term_id("and"), None);
    }

    #[test]
    fn df_counts_once_per_document() {
        let index = Index::build(&docs());
        // "rust" occurs three times in doc a (title + twice in text)
        assert_eq!(index.document_frequency("rust"), 1);
        assert_eq!(index.document_frequency("empty"), 1);
        assert_eq!(index.document_frequency("missing"), 0);
    }

    #[test]
    fn idf_is_positive_even_for_ubiquitous_terms() {
        let corpus = vec![Document::new("x", "t", "common"), Document::new("y", "t", "common")];
        let index = Index::build(&corpus);
        let tid = index.term_id("common").unwrap();
        let expected = (3.0f32 / 2.5).ln() + 1.0;
        assert!((index.idf()[tid] - expected).abs() < 1e-6);
        assert!(index.idf().iter().all(|&w| w > 0.0));
    }

    #[test]
    fn vectors_are_unit_length_and_aligned() {
        let index = Index::build(&docs());
        assert_eq!(index.vectors().len(), 3);
        for v in index.vectors() {
            assert_eq!(v.len(), index.vocabulary_len());
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn unknown_tokens_vectorize_to_zero() {
        let index = Index::build(&docs());
        let v = index.vectorize(&["quantum", "computing"]);
        assert!(v.iter().all(|&w| w == 0.0));
        let empty: [&str; 0] = [];
        assert!(index.vectorize(&empty).iter().all(|&w| w == 0.0));
    }

    #[test]
    fn identical_documents_get_identical_vectors() {
        let text = (0..30).map(|i| format!("t{i}")).collect::<Vec<_>>().join(" ");
        let corpus = vec![Document::new("a", "same", text.clone()), Document::new("b", "same", text)];
        for _ in 0..20 {
            let index = Index::build(&corpus);
            assert_eq!(index.vectors()[0], index.vectors()[1]);
        }
    }

    #[test]
    fn empty_corpus_builds() {
        let index = Index::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.vocabulary_len(), 0);
        assert!(index.vectorize(&["anything"]).is_empty());
    }
}
