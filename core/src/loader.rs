//! Load a corpus snapshot from disk.
//!
//! Accepts `.json` files (a single record or an array), `.jsonl` files, or a
//! directory walked recursively for both. A `*.content.json` file is read as a
//! section map and run through the collector instead.

use crate::collector::{collect, StaticContent};
use crate::Document;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default, alias = "body")]
    text: String,
}

/// Load documents from `path`, keeping the first record for each id and
/// dropping records with blank text.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        anyhow::bail!("corpus path {} does not exist", path.display());
    }

    let mut docs = Vec::new();
    for file in files {
        let loaded = if is_content_map(&file) {
            load_content(&file)?
        } else if extension(&file) == Some("jsonl") {
            load_jsonl(&file)?
        } else {
            load_json(&file)?
        };
        docs.extend(loaded);
    }

    let mut seen: HashSet<String> = HashSet::new();
    docs.retain(|d: &Document| {
        if d.text.trim().is_empty() {
            return false;
        }
        if !seen.insert(d.id.clone()) {
            tracing::warn!(id = %d.id, "duplicate document id, keeping the first");
            return false;
        }
        true
    });
    tracing::info!(path = %path.display(), num_docs = docs.len(), "loaded corpus");
    Ok(docs)
}

/// Read a JSON section map and collect documents from it.
pub fn load_content<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let content: StaticContent = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing content map {}", path.display()))?;
    Ok(collect(&content))
}

fn load_jsonl(path: &Path) -> Result<Vec<Document>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut docs = Vec::new();
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
        docs.push(doc.into_document());
    }
    Ok(docs)
}

fn load_json(path: &Path) -> Result<Vec<Document>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing {}", path.display()))?;
    let docs = match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(|v| serde_json::from_value::<InputDoc>(v).map(InputDoc::into_document))
            .collect::<Result<Vec<_>, _>>()?,
        serde_json::Value::Object(_) => vec![serde_json::from_value::<InputDoc>(json)?.into_document()],
        _ => Vec::new(),
    };
    Ok(docs)
}

impl InputDoc {
    fn into_document(self) -> Document {
        Document { id: self.id, title: self.title, text: self.text }
    }
}

fn extension(p: &Path) -> Option<&str> { p.extension().and_then(|s| s.to_str()) }

fn is_content_map(p: &Path) -> bool {
    p.file_name().and_then(|s| s.to_str()).is_some_and(|n| n.ends_with(".content.json"))
}
