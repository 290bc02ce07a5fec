use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::codec::DEFAULT_MAX_CHUNK_CHARS;
use crate::util::paths::{config_path, sessions_dir};

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory the session chunks are stored in
    pub storage_dir: PathBuf,
    /// Largest chunk written to storage, in characters
    pub max_chunk_chars: usize,
    /// Cadence of the built-in playback ticker
    pub tick_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: sessions_dir(),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            tick_interval: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlStorageConfig {
    pub dir: Option<PathBuf>,
    pub max_chunk_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlPlaybackConfig {
    pub tick_interval_ms: Option<u64>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub storage: Option<TomlStorageConfig>,
    pub playback: Option<TomlPlaybackConfig>,
}

impl Config {
    /// Load configuration from the data directory, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        Self::load_from(&config_file)
    }

    /// Load a specific config file. A missing or malformed file yields the
    /// defaults.
    pub fn load_from(path: &Path) -> Self {
        let mut config = Config::default();

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No config file, using defaults");
                return config;
            }
        };

        match toml::from_str::<TomlConfig>(&contents) {
            Ok(toml_config) => config.merge(toml_config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed config file");
            }
        }

        config
    }

    /// Overlay the keys present in `toml_config`
    pub fn merge(&mut self, toml_config: TomlConfig) {
        if let Some(storage) = toml_config.storage {
            if let Some(dir) = storage.dir {
                self.storage_dir = dir;
            }
            if let Some(max_chunk_chars) = storage.max_chunk_chars {
                self.max_chunk_chars = max_chunk_chars.max(1);
            }
        }

        if let Some(playback) = toml_config.playback {
            if let Some(ms) = playback.tick_interval_ms {
                self.tick_interval = Duration::from_millis(ms.max(1));
            }
        }
    }

    pub fn with_storage_dir(mut self, dir: PathBuf) -> Self {
        self.storage_dir = dir;
        self
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!(error = %e, "Failed to create config directory");
                    return;
                }
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }
}
