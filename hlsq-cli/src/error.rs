use std::io;
use std::path::PathBuf;

use hlsq_core::QueryError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("could not open file `{}`: {source}", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("request failed with HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl AppError {
    /// The consumer of stdout went away (e.g. `hlsq ... | head`).
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, AppError::Io(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
