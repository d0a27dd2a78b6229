//! Tag whitespace-tokenized sentences read from stdin with a trained model.
//!
//! Writes one JSON object per input line: `{"words": [...], "tags": [...]}`.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use candle_core::Device;
use clap::Parser;
use postag_core::Tagger;
use serde::Serialize;

/// Lines tagged per forward pass.
const CHUNK: usize = 64;

#[derive(Parser)]
#[command(name = "postag-tag")]
#[command(about = "Tag pre-tokenized sentences from stdin")]
struct Cli {
    /// Directory written by the train binary
    #[arg(short, long, env = "POSTAG_MODEL", default_value = "/tmp/postag-model")]
    model: PathBuf,

    /// Run on the CPU even when a GPU is available
    #[arg(long)]
    cpu: bool,
}

#[derive(Debug, Serialize)]
struct TaggedLine<'a> {
    words: &'a [String],
    tags: &'a [String],
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let cli = Cli::parse();

    let device = if cli.cpu {
        Device::Cpu
    } else {
        Device::cuda_if_available(0)?
    };
    let tagger = Tagger::load(&cli.model, &device)
        .with_context(|| format!("failed to load model from {}", cli.model.display()))?;

    let stdout = io::stdout();
    let lines = tag_lines(&tagger, io::stdin().lock(), &mut stdout.lock())?;

    tracing::info!(lines, "tagging finished");
    Ok(())
}

/// Tag every line of `input` in chunks of [`CHUNK`]; returns the line count.
fn tag_lines<R: BufRead, W: Write>(tagger: &Tagger, input: R, out: &mut W) -> Result<usize> {
    let mut pending: Vec<Vec<String>> = Vec::with_capacity(CHUNK);
    let mut lines = 0usize;

    for line in input.lines() {
        let line = line?;
        lines += 1;
        pending.push(line.split_whitespace().map(str::to_string).collect());
        if pending.len() == CHUNK {
            flush(tagger, &mut pending, out)?;
        }
    }
    flush(tagger, &mut pending, out)?;
    Ok(lines)
}

fn flush<W: Write>(tagger: &Tagger, pending: &mut Vec<Vec<String>>, out: &mut W) -> Result<()> {
    if pending.is_empty() {
        return Ok(());
    }
    let tags = tagger.tag(pending.as_slice())?;
    for (words, tags) in pending.iter().zip(&tags) {
        let line = TaggedLine { words, tags };
        writeln!(out, "{}", serde_json::to_string(&line)?)?;
    }
    pending.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use postag_core::{TagMap, TaggerConfig};
    use serde_json::Value;

    fn tagger() -> Tagger {
        let config = TaggerConfig {
            width: 8,
            vector_length: 6,
            lower_rows: 20,
            shape_rows: 10,
            prefix_rows: 10,
            suffix_rows: 10,
            n_tags: 3,
            ..Default::default()
        };
        let tags = TagMap::from(vec!["DET".to_string(), "NOUN".to_string(), "VERB".to_string()]);
        Tagger::new(config, tags, &Device::Cpu).unwrap()
    }

    fn parse(out: &[u8]) -> Vec<Value> {
        std::str::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_flush_writes_one_object_per_line() {
        let tagger = tagger();
        let mut pending = vec![
            vec!["el".to_string(), "perro".to_string(), "come".to_string()],
            Vec::new(),
            vec!["Madrid".to_string()],
        ];
        let mut out = Vec::new();
        flush(&tagger, &mut pending, &mut out).unwrap();

        assert!(pending.is_empty());
        let lines = parse(&out);
        assert_eq!(lines.len(), 3);
        for line in &lines {
            let keys: Vec<&str> = line.as_object().unwrap().keys().map(String::as_str).collect();
            assert_eq!(keys.len(), 2);
            assert!(keys.contains(&"words") && keys.contains(&"tags"));
            assert_eq!(line["words"].as_array().unwrap().len(), line["tags"].as_array().unwrap().len());
            for tag in line["tags"].as_array().unwrap() {
                assert!(["DET", "NOUN", "VERB"].contains(&tag.as_str().unwrap()));
            }
        }
        assert_eq!(lines[0]["words"], serde_json::json!(["el", "perro", "come"]));
        assert_eq!(lines[1], serde_json::json!({"words": [], "tags": []}));
    }

    #[test]
    fn test_tag_lines_spans_chunks() {
        let tagger = tagger();
        let input: String = (0..CHUNK * 2 + 5)
            .map(|i| if i % 10 == 0 { "\n".to_string() } else { format!("palabra {i}\n") })
            .collect();
        let mut out = Vec::new();
        let lines = tag_lines(&tagger, input.as_bytes(), &mut out).unwrap();

        assert_eq!(lines, CHUNK * 2 + 5);
        let tagged = parse(&out);
        assert_eq!(tagged.len(), lines);
        assert_eq!(tagged[0]["words"], serde_json::json!([]));
        assert_eq!(tagged[CHUNK + 1]["words"], serde_json::json!(["palabra", format!("{}", CHUNK + 1)]));
    }

    #[test]
    fn test_flush_without_pending_writes_nothing() {
        let tagger = tagger();
        let mut out = Vec::new();
        flush(&tagger, &mut Vec::new(), &mut out).unwrap();
        assert!(out.is_empty());
    }
}
