use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use kb_core::loader::load_corpus;
use kb_core::tokenizer::{split_sentences, tokenize};
use kb_core::{AnswerOptions, Document, KnowledgeBase, Source};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod session;

use session::{SessionStore, Turn};

type ApiError = (StatusCode, Json<Value>);

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub score: f32,
    pub snippet: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub sources: Vec<Source>,
    pub session_id: String,
}

#[derive(Clone)]
pub struct AppState {
    pub corpus_path: PathBuf,
    pub kb: Arc<RwLock<Arc<KnowledgeBase>>>,
    pub sessions: Arc<SessionStore>,
    pub options: Arc<AnswerOptions>,
    pub admin_token: Option<String>,
}

impl AppState {
    fn snapshot(&self) -> Arc<KnowledgeBase> { self.kb.read().clone() }
}

pub fn build_app(corpus: String) -> Result<Router> {
    build_app_with_options(corpus, AnswerOptions::default())
}

pub fn build_app_with_options(corpus: String, options: AnswerOptions) -> Result<Router> {
    // Collect and index once at startup
    let kb = KnowledgeBase::build(load_corpus(&corpus)?);
    let admin_token = std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty());
    let app_state = AppState {
        corpus_path: PathBuf::from(&corpus),
        kb: Arc::new(RwLock::new(Arc::new(kb))),
        sessions: Arc::new(SessionStore::default()),
        options: Arc::new(options),
        admin_token,
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/search", get(search_handler))
        .route("/doc/:id", get(doc_handler))
        .route("/session/:id", get(session_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Backend is running",
        "documents": state.snapshot().len(),
    }))
}

pub async fn chat_handler(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Result<Json<ChatResponse>, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        tracing::warn!("empty message received");
        return Err(error(StatusCode::BAD_REQUEST, "Message is required"));
    }
    let session_id = req
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| state.sessions.new_id());

    let answer = state.snapshot().answer_with(message, &state.options);
    state.sessions.record(&session_id, message, &answer.text);
    tracing::info!(session = %session_id, cited = answer.sources.len(), "chat reply");
    Ok(Json(ChatResponse { reply: answer.text, sources: answer.sources, session_id }))
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let kb = state.snapshot();
    let k = params.k.clamp(1, 100);
    let hits = kb.search(&params.q, kb.len());
    let total_hits = hits.len();

    let q_terms = tokenize(&params.q);
    let results = hits
        .into_iter()
        .take(k)
        .map(|(doc, score)| SearchHit {
            id: doc.id.clone(),
            title: doc.title.clone(),
            score,
            snippet: snippet(doc, &q_terms),
        })
        .collect();

    let elapsed = start.elapsed();
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results })
}

pub async fn doc_handler(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Document>, ApiError> {
    state
        .snapshot()
        .document(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "not found"))
}

pub async fn session_handler(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Vec<Turn>>, ApiError> {
    state.sessions.history(&id).map(Json).ok_or_else(|| error(StatusCode::NOT_FOUND, "not found"))
}

/// Re-collect the corpus from disk and swap in a freshly built index.
async fn rebuild_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;
    let docs = load_corpus(&state.corpus_path).map_err(|e| {
        tracing::error!(error = %e, "rebuild failed");
        error(StatusCode::INTERNAL_SERVER_ERROR, &format!("{e:#}"))
    })?;
    let kb = KnowledgeBase::build(docs);
    let documents = kb.len();
    *state.kb.write() = Arc::new(kb);
    Ok(Json(json!({ "documents": documents })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(error(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(error(StatusCode::UNAUTHORIZED, "invalid admin token"))
    }
}

fn error(status: StatusCode, msg: &str) -> ApiError {
    (status, Json(json!({ "error": msg })))
}

/// First sentence mentioning a query term (or the first sentence), with the
/// matching words wrapped in `<em>`.
fn snippet(doc: &Document, q_terms: &[String]) -> Option<String> {
    let sentences = split_sentences(&doc.text);
    let best = sentences
        .iter()
        .find(|s| tokenize(s).iter().any(|t| q_terms.contains(t)))
        .or_else(|| sentences.first())?;
    Some(highlight_terms(best, q_terms))
}

fn highlight_terms(snippet: &str, terms: &[String]) -> String {
    let alternation = terms
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    if alternation.is_empty() {
        return snippet.to_string();
    }
    // one pass, so inserted markup is never matched again
    let Ok(pat) = regex::RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
        .case_insensitive(true)
        .build()
    else {
        return snippet.to_string();
    };
    pat.replace_all(snippet, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn state_for(corpus: PathBuf, token: Option<&str>) -> AppState {
        let kb = KnowledgeBase::build(load_corpus(&corpus).unwrap());
        AppState {
            corpus_path: corpus,
            kb: Arc::new(RwLock::new(Arc::new(kb))),
            sessions: Arc::new(SessionStore::default()),
            options: Arc::new(AnswerOptions::default()),
            admin_token: token.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn rebuild_swaps_in_new_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("docs.jsonl");
        fs::write(&file, r#"{"id":"a","title":"A","text":"Rust tools."}"#).unwrap();
        let state = state_for(file.clone(), Some("secret"));
        assert_eq!(state.snapshot().len(), 1);

        fs::write(&file, "{\"id\":\"a\",\"title\":\"A\",\"text\":\"Rust tools.\"}\n{\"id\":\"b\",\"title\":\"B\",\"text\":\"Go services.\"}").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("X-ADMIN-TOKEN", "secret".parse().unwrap());
        let Json(body) = rebuild_handler(State(state.clone()), headers).await.unwrap();
        assert_eq!(body["documents"], 2);
        assert_eq!(state.snapshot().len(), 2);
        assert!(state.snapshot().document("b").is_some());
    }

    #[test]
    fn authorize_checks_header() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("docs.json");
        fs::write(&file, "[]").unwrap();
        let state = state_for(file.clone(), Some("secret"));
        let mut headers = HeaderMap::new();
        assert!(authorize(&state, &headers).is_err());
        headers.insert("X-ADMIN-TOKEN", "secret".parse().unwrap());
        assert!(authorize(&state, &headers).is_ok());
        let unset = state_for(file, None);
        assert_eq!(authorize(&unset, &headers).unwrap_err().0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn highlights_whole_words_only() {
        let terms = vec!["rust".to_string()];
        assert_eq!(highlight_terms("Rust and rusty Rust.", &terms), "<em>Rust</em> and rusty <em>Rust</em>.");
    }

    #[test]
    fn markup_is_not_rehighlighted() {
        let terms = vec!["python".to_string(), "em".to_string()];
        assert_eq!(
            highlight_terms("Python and em dashes.", &terms),
            "<em>Python</em> and <em>em</em> dashes."
        );
        assert_eq!(highlight_terms("Nothing here.", &[]), "Nothing here.");
    }

    #[test]
    fn snippet_prefers_matching_sentence() {
        let doc = Document::new("a", "A", "Intro line. Python scripts here.");
        assert_eq!(snippet(&doc, &["python".to_string()]).as_deref(), Some("<em>Python</em> scripts here."));
        assert_eq!(snippet(&doc, &["go".to_string()]).as_deref(), Some("Intro line."));
    }
}
