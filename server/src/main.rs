use anyhow::Result;
use axum::Router;
use clap::Parser;
use kb_core::answer::{DEFAULT_MIN_SCORE, DEFAULT_TOP_K};
use kb_core::AnswerOptions;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use server::build_app_with_options;
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Corpus path (.json/.jsonl file, *.content.json section map, or directory)
    #[arg(long, default_value = "./data")]
    corpus: String,
    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 5000)]
    port: u16,
    /// Maximum number of cited documents per answer
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
    /// Minimum cosine score for a document to be cited
    #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
    min_score: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let options = AnswerOptions { top_k: args.top_k.max(1), min_score: args.min_score, ..AnswerOptions::default() };
    let app: Router = build_app_with_options(args.corpus.clone(), options)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, corpus = %args.corpus, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
