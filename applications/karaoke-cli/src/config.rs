/// CLI configuration
use karaoke_api_client::ApiConfig;
use karaoke_playback::ControllerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file, read from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "karaoke.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    pub api: ApiConfig,
    pub player: ControllerConfig,
    pub storage: StorageSettings,
    pub engine: EngineSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Local playlist catalog
    pub playlists_path: PathBuf,
    /// Playlist ids written to a freshly created catalog
    pub seed_playlists: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Length the simulated engine gives every track, in seconds
    pub track_length_secs: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            playlists_path: PathBuf::from("./data/playlists.json"),
            seed_playlists: Vec::new(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            track_length_secs: 180,
        }
    }
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// `path` overrides the default `karaoke.toml`; an explicit path must
    /// exist. Environment variables prefixed with `KARAOKE_` win over the
    /// file, with `__` between nesting levels (`KARAOKE_API__BASE_URL`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("KARAOKE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?.try_deserialize::<Self>()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.engine.track_length_secs == 0 {
            anyhow::bail!("engine.track_length_secs must be positive");
        }
        if self.player.progress_interval.is_zero() {
            anyhow::bail!("player.progress_interval must be positive");
        }
        Ok(())
    }
}
