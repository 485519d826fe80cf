use anyhow::Result;
use clap::{Parser, Subcommand};
use kb_core::answer::{DEFAULT_MIN_SCORE, DEFAULT_TOP_K};
use kb_core::loader::load_corpus;
use kb_core::{Answer, AnswerOptions, KnowledgeBase};
use tracing_subscriber::{fmt, EnvFilter};

use std::io::{self, BufRead, Write};

#[derive(Parser)]
#[command(name = "ask")]
#[command(about = "Answer questions against a small document corpus", long_about = None)]
struct Cli {
    /// Corpus path: .json/.jsonl file, *.content.json section map, or a directory
    #[arg(long)]
    input: String,
    /// Maximum number of cited documents
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
    /// Minimum cosine score for a document to be cited
    #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
    min_score: f32,
    /// Print answers as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Query {
        /// The question
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Read questions from stdin, one per line, until EOF
    Repl,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    let docs = load_corpus(&cli.input)?;
    if docs.is_empty() {
        tracing::warn!(input = %cli.input, "corpus is empty, every answer will be the fallback");
    }
    let kb = KnowledgeBase::build(docs);
    tracing::info!(input = %cli.input, num_docs = kb.len(), top_k = cli.top_k, min_score = cli.min_score, "knowledge base loaded");
    let opts = AnswerOptions { top_k: cli.top_k.max(1), min_score: cli.min_score, ..AnswerOptions::default() };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Query { text } => {
            let q = text.join(" ");
            print_answer(&mut out, &kb.answer_with(&q, &opts), cli.json)?;
        }
        Commands::Repl => {
            for line in io::stdin().lock().lines() {
                let line = line?;
                let q = line.trim();
                if q.is_empty() { continue; }
                tracing::debug!(question = q, "answering");
                print_answer(&mut out, &kb.answer_with(q, &opts), cli.json)?;
                out.flush()?;
            }
        }
    }
    Ok(())
}

fn print_answer<W: Write>(out: &mut W, answer: &Answer, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer(&mut *out, answer)?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(out, "{}", answer.text)?;
    if !answer.sources.is_empty() {
        let cited = answer
            .sources
            .iter()
            .map(|s| format!("{} [{}] {:.3}", s.title, s.id, s.score))
            .collect::<Vec<_>>()
            .join("; ");
        writeln!(out, "sources: {cited}")?;
    }
    writeln!(out)?;
    Ok(())
}
