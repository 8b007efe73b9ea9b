use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use session::Respondent;

/// Looked for next to the quiz file when no `--config` is given.
pub const FILE_NAME: &str = "quiz.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where score reports are POSTed. Without one, nothing is sent.
    pub endpoint: Option<String>,

    /// Seed for attempt generation; unset means fresh entropy per run.
    pub seed: Option<u64>,

    pub respondent: RespondentConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RespondentConfig {
    pub name: Option<String>,
    pub email: Option<String>,
    pub group: Option<String>,
}

impl RespondentConfig {
    /// The configured respondent, if a usable name is set.
    pub fn respondent(&self) -> Option<Respondent> {
        let name = self.name.as_deref().map(str::trim).filter(|name| !name.is_empty())?;
        Some(Respondent {
            name: name.to_string(),
            email: self.email.clone(),
            group: self.group.clone(),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "cannot read config '{}': {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid config '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

impl Config {
    pub fn parse(path: &Path, content: &str) -> Result<Config, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Config::parse(path, &content)
    }

    /// An explicit path must exist. Otherwise `quiz.toml` beside the quiz
    /// file is used when present, and defaults when not.
    pub fn load(explicit: Option<&Path>, quiz_file: &Path) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading config");
            return Config::from_file(path);
        }

        let beside = quiz_file
            .parent()
            .map(|dir| dir.join(FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(FILE_NAME));
        if beside.is_file() {
            debug!(path = %beside.display(), "loading config");
            Config::from_file(&beside)
        } else {
            debug!("no config file; using defaults");
            Ok(Config::default())
        }
    }
}
