//! User configuration loaded from `$XDG_CONFIG_HOME/prdeck/config.toml`.
//!
//! Every field is optional in the file. Config problems are soft failures: a missing file yields
//! the defaults and a malformed one is logged and ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_THEME: &str = "catppuccin-mocha";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_GH_BINARY: &str = "gh";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: String,
    pub poll_interval_secs: u64,
    pub gh_binary: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_owned(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            gh_binary: PathBuf::from(DEFAULT_GH_BINARY),
        }
    }
}

impl Config {
    /// Poll interval for the watch loop, never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Base directory under an XDG variable, falling back to `$HOME/<fallback>`.
pub(crate) fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(fallback)))
        .unwrap_or_else(|| PathBuf::from(fallback))
}

/// Prefers `$XDG_CONFIG_HOME/prdeck/config.toml`; falls back to `~/.config/prdeck/config.toml`.
pub fn config_path() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
        .join("prdeck")
        .join("config.toml")
}

pub fn load() -> Config {
    load_from(&config_path())
}

pub fn load_from(path: &Path) -> Config {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Config::default(),
    };
    match toml::from_str(&raw) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "config parse error, using defaults");
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert_eq!(load_from(&dir.path().join("absent.toml")), Config::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let file = write_config("theme = \"dark\"\npoll_interval_secs = 30\n");
        let config = load_from(file.path());
        assert_eq!(config.theme, "dark");
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.gh_binary, PathBuf::from("gh"));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let file = write_config("theme = [unterminated");
        assert_eq!(load_from(file.path()), Config::default());
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let config = Config {
            poll_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }
}
