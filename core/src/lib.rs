use serde::{Deserialize, Serialize};

pub mod answer;
pub mod collector;
pub mod index;
pub mod loader;
pub mod retriever;
pub mod tokenizer;

pub use answer::AnswerOptions;
pub use collector::{collect, ContentSource};
pub use index::Index;

/// Position of a term in the index vocabulary.
pub type TermId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), title: title.into(), text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document_index: usize,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub id: String,
    /// Cosine score rounded to three decimals.
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Source>,
}

pub fn build_index(documents: &[Document]) -> Index { Index::build(documents) }

/// Rank `documents` for `query` and compose a cited answer with default options.
pub fn answer(query: &str, index: &Index, documents: &[Document]) -> Answer {
    let ranked = retriever::query(query, index);
    answer::compose_with(query, &ranked, documents, &AnswerOptions::default())
}

/// A corpus snapshot together with its index. Immutable once built; rebuild
/// by constructing a new one.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    documents: Vec<Document>,
    index: Index,
}

impl KnowledgeBase {
    pub fn build(documents: Vec<Document>) -> Self {
        let index = Index::build(&documents);
        tracing::info!(num_docs = documents.len(), num_terms = index.vocabulary_len(), "knowledge base ready");
        Self { documents, index }
    }

    pub fn from_source<S: ContentSource + ?Sized>(source: &S) -> Self {
        Self::build(collect(source))
    }

    pub fn documents(&self) -> &[Document] { &self.documents }

    pub fn index(&self) -> &Index { &self.index }

    pub fn len(&self) -> usize { self.documents.len() }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Top `k` documents with a positive score, best first.
    pub fn search(&self, query: &str, k: usize) -> Vec<(&Document, f32)> {
        retriever::query(query, &self.index)
            .into_iter()
            .filter(|s| s.score > 0.0)
            .take(k)
            .filter_map(|s| self.documents.get(s.document_index).map(|d| (d, s.score)))
            .collect()
    }

    pub fn answer(&self, query: &str) -> Answer {
        self.answer_with(query, &AnswerOptions::default())
    }

    pub fn answer_with(&self, query: &str, opts: &AnswerOptions) -> Answer {
        let ranked = retriever::query(query, &self.index);
        let answer = answer::compose_with(query, &ranked, &self.documents, opts);
        tracing::debug!(query, cited = answer.sources.len(), "answered");
        answer
    }
}
