mod settings;

pub use settings::{Config, TomlConfig, TomlPlaybackConfig, TomlStorageConfig, EXAMPLE_CONFIG};
