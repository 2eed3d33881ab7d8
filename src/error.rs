use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed raw resource at line {line}: {message}")]
    MalformedRaw { line: usize, message: String },

    #[error("Table '{0}' does not exist")]
    MissingTable(&'static str),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Extraction failed: {0}")]
    Extract(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Stage '{0}' started without its upstream output")]
    MissingUpstream(&'static str),

    #[error("Load pool closed")]
    PoolClosed,

    #[error("Transform failed: {0}")]
    TransformFailure(#[source] Box<PipelineError>),
}

impl PipelineError {
    pub fn transform(err: PipelineError) -> Self {
        match err {
            already @ PipelineError::TransformFailure(_) => already,
            other => PipelineError::TransformFailure(Box::new(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
