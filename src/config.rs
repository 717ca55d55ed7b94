//! Optional `mangagrab.toml`. The working directory wins over the user config dir
//! ($XDG_CONFIG_HOME/mangagrab/config.toml or ~/.config/mangagrab/config.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const FILE_NAME: &str = "mangagrab.toml";

/// Defaults for the CLI. Every key is optional; flags take precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Preferred language code for titles and chapter feeds (e.g. "es", "pt-br").
    pub language: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("Cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Candidate files, most specific first.
fn candidate_paths() -> Result<Vec<PathBuf>, ConfigError> {
    let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
    let mut paths = vec![cwd.join(FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("mangagrab").join("config.toml"));
    }
    Ok(paths)
}

/// Load the first candidate that exists. None when no file is present.
fn load_first(paths: &[PathBuf]) -> Result<Option<Config>, ConfigError> {
    match paths.iter().find(|p| p.exists()) {
        Some(path) => load_file(path).map(Some),
        None => Ok(None),
    }
}

fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Search the working directory, then the user config dir.
pub fn load_config() -> Result<Option<Config>, ConfigError> {
    load_first(&candidate_paths()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "mangagrab-config-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn parse_empty_config() {
        let c: Config = toml::from_str("").unwrap();
        assert!(c.language.is_none());
        assert!(c.user_agent.is_none());
        assert!(c.timeout_secs.is_none());
    }

    #[test]
    fn parse_full_config() {
        let s = r#"
            language = "es-la"
            user_agent = "Custom/1.0"
            timeout_secs = 60
        "#;
        let c: Config = toml::from_str(s).unwrap();
        assert_eq!(c.language.as_deref(), Some("es-la"));
        assert_eq!(c.user_agent.as_deref(), Some("Custom/1.0"));
        assert_eq!(c.timeout_secs, Some(60));
    }

    #[test]
    fn missing_files_yield_none() {
        let dir = scratch_dir("missing");
        let found = load_first(&[dir.join("absent.toml"), dir.join("also-absent.toml")]).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn first_existing_file_wins() {
        let dir = scratch_dir("order");
        let first = dir.join("first.toml");
        let second = dir.join("second.toml");
        std::fs::write(&first, "language = \"fr\"").unwrap();
        std::fs::write(&second, "language = \"de\"").unwrap();
        let found = load_first(&[dir.join("absent.toml"), first, second]).unwrap();
        assert_eq!(found.and_then(|c| c.language).as_deref(), Some("fr"));
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = scratch_dir("invalid");
        let path = dir.join(FILE_NAME);
        std::fs::write(&path, "timeout_secs = \"soon\"").unwrap();
        match load_first(&[path.clone()]) {
            Err(e @ ConfigError::Parse { .. }) => {
                assert!(e.to_string().contains(&path.display().to_string()));
            }
            other => panic!("expected Parse error, got {:?}", other),
        }
    }
}
