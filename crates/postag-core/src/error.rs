use thiserror::Error;

/// Errors that can occur while building, training or loading a tagger.
#[derive(Debug, Error)]
pub enum TaggerError {
    /// A CoNLL-U line could not be parsed.
    #[error("malformed CoNLL-U at line {line}: {reason}")]
    Conllu {
        /// 1-based line number in the source file.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// A tag was seen that the tag inventory does not contain.
    #[error("unknown tag {0:?}")]
    UnknownTag(String),

    /// A batch was empty or contained an empty sentence.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// The model configuration is inconsistent.
    #[error("invalid model config: {0}")]
    InvalidConfig(String),

    /// The model directory could not be loaded.
    #[error("failed to load model from {path}: {reason}")]
    ModelLoad {
        /// Directory that was being loaded.
        path: String,
        /// Underlying reason.
        reason: String,
    },

    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for tagger operations.
pub type Result<T> = std::result::Result<T, TaggerError>;
