//! Train a part-of-speech tagger on a CoNLL-U treebank.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use candle_core::Device;
use clap::Parser;
use postag_core::data::TagColumn;
use postag_core::{Corpus, FeatureExtractor, Tagger};
use postag_trainer::fetch::{default_data_dir, ensure_ancora};
use postag_trainer::{TrainConfig, Trainer};

/// File with the training hyperparameters, written next to the model.
const TRAIN_CONFIG_FILE: &str = "train.json";

#[derive(Parser)]
#[command(name = "train")]
#[command(about = "Train a hashed-embedding BiLSTM part-of-speech tagger")]
struct Cli {
    #[command(flatten)]
    config: TrainConfig,

    /// Training treebank (CoNLL-U); downloads UD AnCora when omitted
    #[arg(long, env = "POSTAG_TRAIN", requires = "dev")]
    train: Option<PathBuf>,

    /// Development treebank (CoNLL-U)
    #[arg(long, env = "POSTAG_DEV", requires = "train")]
    dev: Option<PathBuf>,

    /// Tag column to learn: upos or xpos
    #[arg(long, default_value = "upos")]
    tag_column: TagColumn,

    /// Cache directory for downloaded treebanks
    #[arg(long, env = "POSTAG_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory the trained model is written to
    #[arg(short, long, default_value = "/tmp/postag-model")]
    output: PathBuf,

    /// Run on the CPU even when a GPU is available
    #[arg(long)]
    cpu: bool,
}

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Training failed: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    cli.config.validate()?;
    println!("{}", serde_json::to_string(&cli.config)?);

    let device = if cli.cpu {
        Device::Cpu
    } else {
        Device::cuda_if_available(0)?
    };
    tracing::info!(gpu = device.is_cuda(), "selected device");

    let (train_path, dev_path) = match (cli.train, cli.dev) {
        (Some(train), Some(dev)) => (train, dev),
        _ => {
            let dir = cli.data_dir.unwrap_or_else(default_data_dir);
            let files = ensure_ancora(&dir)?;
            (files.train, files.dev)
        }
    };

    let corpus = load_corpus(&train_path, &dev_path, cli.tag_column)?;
    tracing::info!(
        train = corpus.train.len(),
        dev = corpus.dev.len(),
        tags = corpus.tags.len(),
        "loaded corpus"
    );

    let tagger = Tagger::new(
        cli.config.tagger_config(corpus.tags.len()),
        corpus.tags.clone(),
        &device,
    )?;

    let mut trainer = Trainer::new(cli.config.clone());
    trainer.on_epoch(|report| println!("{report}"));
    let summary = trainer.train(&tagger, &corpus)?;

    println!("{:.3}", summary.final_accuracy.value());

    tagger
        .save(&cli.output)
        .with_context(|| format!("failed to save model to {}", cli.output.display()))?;
    std::fs::write(
        cli.output.join(TRAIN_CONFIG_FILE),
        serde_json::to_string_pretty(&cli.config)?,
    )?;
    tracing::info!(path = %cli.output.display(), "model saved");

    Ok(())
}

fn load_corpus(train: &Path, dev: &Path, column: TagColumn) -> Result<Corpus> {
    Corpus::from_files(train, dev, column, &FeatureExtractor::default()).with_context(|| {
        format!(
            "failed to load corpus from {} and {}",
            train.display(),
            dev.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTENCE: &str = "1\tEl\tel\tDET\t_\t_\t2\tdet\t_\t_\n2\tgato\tgato\tNOUN\t_\t_\t0\troot\t_\t_\n\n";

    #[test]
    fn test_load_error_names_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let train = dir.path().join("train.conllu");
        let dev = dir.path().join("missing-dev.conllu");
        std::fs::write(&train, SENTENCE).unwrap();

        let message = format!("{:#}", load_corpus(&train, &dev, TagColumn::Upos).unwrap_err());
        assert!(message.contains(&train.display().to_string()));
        assert!(message.contains(&dev.display().to_string()));
    }

    #[test]
    fn test_load_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let train = dir.path().join("train.conllu");
        std::fs::write(&train, SENTENCE).unwrap();

        let corpus = load_corpus(&train, &train, TagColumn::Upos).unwrap();
        assert_eq!(corpus.train.len(), 1);
        assert_eq!(corpus.tags.len(), 2);
    }
}
