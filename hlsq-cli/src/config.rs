use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::Args;
use crate::error::{AppError, Result};
use crate::output::ColorName;

pub const DEFAULT_USER_AGENT: &str = concat!("hlsq/", env!("CARGO_PKG_VERSION"));

/// Settings read from `config.toml`; every section and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub colors: ColorConfig,
    pub fetch: FetchConfig,
    pub poll: PollConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_tag_color")]
    pub tag: ColorName,
    #[serde(default = "default_attr_color")]
    pub attr: ColorName,
    /// Set to false to never colorize output
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_tag_color() -> ColorName {
    ColorName::LightBlue
}

fn default_attr_color() -> ColorName {
    ColorName::Cyan
}

fn default_enabled() -> bool {
    true
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            tag: default_tag_color(),
            attr: default_attr_color(),
            enabled: default_enabled(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Overall request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between manifest refreshes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Consecutive failed refreshes tolerated before giving up
    #[serde(default = "default_max_refresh_retries")]
    pub max_refresh_retries: u32,
    /// Number of segment identities remembered for de-duplication
    #[serde(default = "default_seen_capacity")]
    pub seen_capacity: u64,
}

fn default_interval_secs() -> u64 {
    2
}

fn default_max_refresh_retries() -> u32 {
    5
}

fn default_seen_capacity() -> u64 {
    4096
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_refresh_retries: default_max_refresh_retries(),
            seen_capacity: default_seen_capacity(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl AppConfig {
    /// Loads the configuration from `path`, or from the default location when
    /// no path is given. A missing default file yields the built-in defaults;
    /// a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| AppError::OpenFile {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&text)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Command line flags take precedence over file values.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(color) = args.color_tag {
            self.colors.tag = color;
        }
        if let Some(color) = args.color_attr {
            self.colors.attr = color;
        }
        if args.no_color {
            self.colors.enabled = false;
        }
        if let Some(secs) = args.interval {
            self.poll.interval_secs = secs;
        }
        if let Some(secs) = args.timeout {
            self.fetch.timeout_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll.interval_secs == 0 {
            return Err(AppError::Config(
                "poll interval must be at least 1 second".to_string(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::Config(
                "fetch timeout must be at least 1 second".to_string(),
            ));
        }
        if self.poll.seen_capacity == 0 {
            return Err(AppError::Config(
                "poll seen_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hlsq").join("config.toml"))
}
