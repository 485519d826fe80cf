use anyhow::{Context, Result};
use clap::Parser;
use harvester::HtmlPage;
use kb_core::collector::{collect, StaticContent};
use reqwest::{header, Client, Url};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(about = "Extract knowledge-base documents from a portfolio page into JSONL")]
struct Cli {
    /// HTML file path or http(s) URL of the page
    #[arg(long)]
    page: String,
    /// Output JSONL file path
    #[arg(long, default_value = "./data/docs.jsonl")]
    output: String,
    /// Also write the raw section map (loadable as `*.content.json`)
    #[arg(long)]
    sections: Option<String>,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string used when fetching over HTTP
    #[arg(long, default_value = "kb-harvester/0.1")]
    user_agent: String,
}

#[derive(Serialize)]
struct OutDoc<'a> {
    id: &'a str,
    title: &'a str,
    text: &'a str,
    harvested_at: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let (html, base) = match Url::parse(&args.page) {
        Ok(url) if url.scheme().starts_with("http") => (fetch(&args, &url).await?, Some(url)),
        _ => {
            let html = fs::read_to_string(&args.page).with_context(|| format!("reading {}", args.page))?;
            (html, None)
        }
    };

    let page = HtmlPage::parse(&html, base);
    let docs = collect(&page);
    tracing::info!(page = %args.page, num_docs = docs.len(), "harvested documents");

    ensure_parent(&args.output)?;
    let ts = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
    let mut out = BufWriter::new(File::create(&args.output)?);
    for d in &docs {
        let rec = OutDoc { id: &d.id, title: &d.title, text: &d.text, harvested_at: &ts };
        serde_json::to_writer(&mut out, &rec)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    if let Some(path) = &args.sections {
        ensure_parent(path)?;
        let content = StaticContent::capture(&page);
        fs::write(path, serde_json::to_string_pretty(&content)?)?;
        tracing::info!(path = %path, sections = content.sections.len(), "wrote section map");
    }

    tracing::info!(output = %args.output, "done");
    Ok(())
}

async fn fetch(args: &Cli, url: &Url) -> Result<String> {
    let client = Client::builder()
        .user_agent(args.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;
    let resp = client.get(url.clone()).send().await?.error_for_status()?;
    if let Some(ct) = resp.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        if !ct.starts_with("text/html") {
            tracing::warn!(content_type = ct, "page is not text/html, parsing anyway");
        }
    }
    Ok(resp.text().await?)
}

fn ensure_parent(path: &str) -> Result<()> {
    if let Some(dir) = Path::new(path).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}
