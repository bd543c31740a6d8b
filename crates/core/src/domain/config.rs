//! Configuration management for the sound pool
//!
//! This module provides:
//! - Configuration structs for playback, pool sizing and sound resources
//! - TOML serialization with async file loading and saving
//! - Overrides from `key=value` settings (command line or ini file)

use crate::domain::args::ArgTable;
use crate::domain::controller::PlaybackSettings;
use crate::domain::pool::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Playback levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Highest content tier played; 0 disables sound
    pub sound_level: u8,

    /// Global volume multiplier in `[0, 1]`
    pub master_volume: f32,

    /// Distance at which a sound becomes silent
    pub max_audible_distance: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sound_level: 1,
            master_volume: 1.0,
            max_audible_distance: 30.0,
        }
    }
}

/// Channel pool sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Where sound files come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Folder holding `<name>.wav` files
    pub folder: PathBuf,

    /// Optional file listing one sound name per line
    pub list_file: Option<PathBuf>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("sounds"),
            list_file: None,
        }
    }
}

/// Complete sound pool configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundpoolConfig {
    pub audio: AudioConfig,
    pub pool: PoolConfig,
    pub resources: ResourceConfig,
}

impl SoundpoolConfig {
    /// Load configuration from TOML file
    #[instrument(skip(path))]
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Save configuration to TOML file
    #[instrument(skip(self, path))]
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "Saving configuration");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str).await?;

        debug!("Configuration saved successfully");
        Ok(())
    }

    /// Default config file location
    ///
    /// `~/.config/soundpool/config.toml` on Linux, `%APPDATA%\soundpool\config.toml`
    /// on Windows.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("soundpool").join("config.toml"))
            .ok_or_else(|| ConfigError::Invalid("Could not determine config directory".to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool.capacity == 0 {
            return Err(ConfigError::Invalid("pool capacity must be at least 1".to_string()));
        }
        let distance = self.audio.max_audible_distance;
        if distance.is_nan() || distance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_audible_distance must be positive, got {distance}"
            )));
        }
        if !(0.0..=1.0).contains(&self.audio.master_volume) {
            return Err(ConfigError::Invalid(format!(
                "master_volume must be within [0, 1], got {}",
                self.audio.master_volume
            )));
        }
        Ok(())
    }

    /// Override fields from `soundlevel`, `mastervolume`, `channels` and
    /// `maxaudibledistance` entries
    pub fn apply_args(&mut self, args: &ArgTable) {
        let audio = &mut self.audio;
        let level = args.int_val("soundlevel", 0, i64::from(audio.sound_level));
        audio.sound_level = level.clamp(0, i64::from(u8::MAX)) as u8;
        audio.master_volume = args.float_val("mastervolume", 0, audio.master_volume);
        audio.max_audible_distance =
            args.float_val("maxaudibledistance", 0, audio.max_audible_distance);

        let capacity = args.int_val("channels", 0, self.pool.capacity as i64);
        self.pool.capacity = usize::try_from(capacity).unwrap_or(0);

        debug!(?self, "Applied setting overrides");
    }

    /// Controller settings, once the configuration is valid
    pub fn playback_settings(&self) -> Result<PlaybackSettings> {
        self.validate()?;
        let capacity = NonZeroUsize::new(self.pool.capacity)
            .ok_or_else(|| ConfigError::Invalid("pool capacity must be at least 1".to_string()))?;
        Ok(PlaybackSettings {
            sound_level: self.audio.sound_level,
            master_volume: self.audio.master_volume,
            max_audible_distance: self.audio.max_audible_distance,
            capacity,
        })
    }
}
