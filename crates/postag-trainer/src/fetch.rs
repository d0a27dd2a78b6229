//! Downloads the UD Spanish-AnCora treebank on first use.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

/// Raw-file root of the UD Spanish-AnCora repository.
pub const ANCORA_BASE_URL: &str =
    "https://raw.githubusercontent.com/UniversalDependencies/UD_Spanish-AnCora/master";

pub const TRAIN_FILE: &str = "es_ancora-ud-train.conllu";
pub const DEV_FILE: &str = "es_ancora-ud-dev.conllu";

/// Default cache directory for downloaded treebanks.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("postag")
        .join("ud-ancora")
}

/// Local paths of the train and dev files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreebankFiles {
    pub train: PathBuf,
    pub dev: PathBuf,
}

impl TreebankFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            train: dir.join(TRAIN_FILE),
            dev: dir.join(DEV_FILE),
        }
    }

    pub fn exist(&self) -> bool {
        self.train.exists() && self.dev.exists()
    }
}

/// Make sure the AnCora train and dev files are present in `dir`, fetching
/// whichever is missing.
pub fn ensure_ancora(dir: &Path) -> Result<TreebankFiles> {
    let files = TreebankFiles::in_dir(dir);
    if files.exist() {
        info!(dir = %dir.display(), "using cached treebank");
        return Ok(files);
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    for (name, dest) in [(TRAIN_FILE, &files.train), (DEV_FILE, &files.dev)] {
        if !dest.exists() {
            download(&format!("{ANCORA_BASE_URL}/{name}"), dest)?;
        }
    }

    Ok(files)
}

fn download(url: &str, dest: &Path) -> Result<()> {
    info!(url, dest = %dest.display(), "downloading");

    let response = reqwest::blocking::get(url)
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()
        .with_context(|| format!("server rejected {url}"))?;
    let body = response
        .bytes()
        .with_context(|| format!("failed to read body of {url}"))?;

    // Write to a sibling file first so an interrupted download is not cached
    let partial = dest.with_extension("part");
    std::fs::write(&partial, &body)
        .with_context(|| format!("failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("failed to move download to {}", dest.display()))?;

    info!(bytes = body.len(), dest = %dest.display(), "download complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_files_are_reused() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TRAIN_FILE), "").unwrap();
        std::fs::write(dir.path().join(DEV_FILE), "").unwrap();

        let files = ensure_ancora(dir.path()).unwrap();
        assert_eq!(files, TreebankFiles::in_dir(dir.path()));
    }

    #[test]
    fn test_default_dir_layout() {
        let dir = default_data_dir();
        assert!(dir.ends_with("postag/ud-ancora"));
    }
}
