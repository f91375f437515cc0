use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use tracing::debug;
use url::Url;

use crate::error::{AppError, Result};

/// Where the manifest text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
    Url(Url),
}

impl InputSource {
    /// Resolves the positional INPUT argument.
    ///
    /// An explicit value always wins and `-` selects stdin. Without one, stdin
    /// is only read when something is piped into it.
    pub fn resolve(input: Option<&str>, stdin_is_terminal: bool) -> Result<Self> {
        let source = match input {
            Some("-") => Self::Stdin,
            Some(value) => match parse_url(value) {
                Some(url) => Self::Url(url),
                None => Self::File(PathBuf::from(value)),
            },
            None if stdin_is_terminal => {
                return Err(AppError::InvalidInput(
                    "no INPUT given and nothing piped to stdin".to_string(),
                ));
            }
            None => Self::Stdin,
        };
        debug!(?source, "Resolved input");
        Ok(source)
    }

    pub fn is_url(&self) -> bool {
        matches!(self, Self::Url(_))
    }

    /// Opens a local source for line-by-line reading. URLs are fetched
    /// separately.
    pub fn open(&self) -> Result<Box<dyn BufRead>> {
        match self {
            Self::Stdin => Ok(Box::new(io::stdin().lock())),
            Self::File(path) => {
                let file = File::open(path).map_err(|source| AppError::OpenFile {
                    path: path.clone(),
                    source,
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            Self::Url(url) => Err(AppError::InvalidInput(format!(
                "{url} must be fetched, not opened"
            ))),
        }
    }
}

fn parse_url(value: &str) -> Option<Url> {
    let url = Url::parse(value).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}
