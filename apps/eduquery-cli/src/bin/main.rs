use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use eduquery_core::chunker::TextChunker;
use eduquery_core::config::{Config, RetrievalSettings};
use eduquery_retrieval::{DocumentBatch, RetrievalIndex};

const USAGE: &str = "Usage: eduquery <ingest|query|context|stats> [args...]
  ingest <path>...          chunk .txt files/dirs, add .json batches, save the index
  query \"<question>\" [k]    print the top-k passages as JSON records
  context \"<question>\" [k]  print the top-k passages joined for a prompt
  stats                     print chunk count and index state";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn parse_top_k(raw: &str) -> anyhow::Result<usize> {
    let k: usize = raw.parse().with_context(|| format!("top_k must be a positive integer, got '{raw}'"))?;
    if k == 0 { anyhow::bail!("top_k must be a positive integer, got '{raw}'"); }
    Ok(k)
}

fn top_k_arg(args: &[String], settings: &RetrievalSettings) -> anyhow::Result<usize> {
    match args.get(1) {
        Some(k) => parse_top_k(k),
        None => Ok(settings.default_top_k),
    }
}

fn query_arg(args: &[String], cmd: &str) -> String {
    args.first().cloned().unwrap_or_else(|| {
        eprintln!("Usage: eduquery {cmd} \"<question>\" [k]"); std::process::exit(1)
    })
}

fn ingest(index: &mut RetrievalIndex, chunker: &TextChunker, paths: &[String]) -> anyhow::Result<usize> {
    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} inputs {msg}")?.progress_chars("#>-"));
    let mut added = 0usize;
    for p in paths {
        let path = Path::new(p);
        pb.set_message(p.clone());
        added += if path.extension().and_then(|e| e.to_str()) == Some("json") {
            let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)
                .with_context(|| format!("{} is not valid JSON", path.display()))?;
            index.add_documents(DocumentBatch::from_json(value))
        } else {
            index.add_documents(chunker.process_path(path)?)
        };
        pb.inc(1);
    }
    pb.finish_with_message("done");
    Ok(added)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let mut settings = config.retrieval()?;
    if settings.snapshot_path.is_none() {
        settings.snapshot_path = Some(PathBuf::from("data/index.json"));
    }
    let (cmd, args) = parse_args();
    let mut index = RetrievalIndex::with_default_capabilities(settings.clone());
    match cmd.as_str() {
        "ingest" => {
            if args.is_empty() { eprintln!("Usage: eduquery ingest <path>..."); std::process::exit(1); }
            let chunker = TextChunker::new(settings.chunking.clone())?;
            let added = ingest(&mut index, &chunker, &args)?;
            let mode = index.build_index();
            index.save()?;
            info!(added, total = index.len(), mode = ?mode, "ingest complete");
        }
        "query" => {
            let query = query_arg(&args, "query");
            let k = top_k_arg(&args, &settings)?;
            let result = index.retrieve(&query, k);
            info!(source = %result.source, used_fallback = result.used_fallback, hits = result.len(), "retrieved");
            let records: Vec<serde_json::Value> = result.hits.iter().map(|h| serde_json::Value::Object(h.to_record())).collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        "context" => {
            let query = query_arg(&args, "context");
            let k = top_k_arg(&args, &settings)?;
            let result = index.retrieve(&query, k);
            info!(source = %result.source, used_fallback = result.used_fallback, "retrieved");
            println!("{}", result.context());
        }
        "stats" => {
            let stats = serde_json::json!({
                "chunks": index.len(),
                "state": index.state(),
                "mode": index.mode().map(|m| m.source()),
                "snapshot_path": settings.snapshot_path,
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        _ => { eprintln!("Unknown command: {}\n{USAGE}", cmd); std::process::exit(1); }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_must_be_positive() {
        assert_eq!(parse_top_k("5").unwrap(), 5);
        assert!(parse_top_k("0").is_err());
        assert!(parse_top_k("-1").is_err());
        assert!(parse_top_k("three").is_err());
    }

    #[test]
    fn missing_top_k_uses_configured_default() {
        let settings = RetrievalSettings { default_top_k: 4, ..RetrievalSettings::default() };
        assert_eq!(top_k_arg(&["question".to_string()], &settings).unwrap(), 4);
        assert!(top_k_arg(&["question".to_string(), "0".to_string()], &settings).is_err());
    }
}
