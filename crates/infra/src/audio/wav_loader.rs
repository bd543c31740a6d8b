//! Loading sound resources from WAV files
//!
//! Sound names come from the configured list file (one name per line, `#`
//! and `;` comments allowed) or, without one, from every `*.wav` file in the
//! sound folder. Each name resolves to `<folder>/<name>.wav`.
//!
//! A missing or unreadable file does not fail the load: it is recorded in the
//! [`LoadReport`] and the remaining sounds are still loaded.

use serde::Serialize;
use soundpool_core::domain::audio::{SoundBank, SoundResource};
use soundpool_core::domain::config::ResourceConfig;
use soundpool_core::domain::lines::{read_lines, skip_comments};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

pub type Result<T> = std::result::Result<T, LoadError>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV decoding error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Sound file has no samples: {0}")]
    Empty(String),

    #[error("Decoding task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Outcome of loading a sound folder
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    /// Sound name and the reason it could not be loaded
    pub failed: Vec<(String, String)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SoundLoader {
    folder: PathBuf,
    list_file: Option<PathBuf>,
}

impl SoundLoader {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            list_file: None,
        }
    }

    pub fn from_config(config: &ResourceConfig) -> Self {
        Self {
            folder: config.folder.clone(),
            list_file: config.list_file.clone(),
        }
    }

    pub fn with_list_file(mut self, list_file: impl Into<PathBuf>) -> Self {
        self.list_file = Some(list_file.into());
        self
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Names of the sounds to load, in load order
    pub async fn sound_names(&self) -> Result<Vec<String>> {
        if let Some(list_file) = &self.list_file {
            let lines = read_lines(list_file, skip_comments).await?;
            return Ok(lines.iter().map(|line| line.trim().to_string()).collect());
        }

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e.eq_ignore_ascii_case("wav")).unwrap_or(false) {
                if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.folder.join(format!("{name}.wav"))
    }

    /// Load every listed sound into a bank
    #[instrument(skip(self), fields(folder = %self.folder.display()))]
    pub async fn load(&self) -> Result<(SoundBank, LoadReport)> {
        let names = self.sound_names().await?;
        let jobs: Vec<(String, PathBuf)> = names
            .into_iter()
            .map(|name| {
                let path = self.path_for(&name);
                (name, path)
            })
            .collect();

        let (bank, report) = tokio::task::spawn_blocking(move || {
            let mut bank = SoundBank::new();
            let mut report = LoadReport::default();
            for (name, path) in jobs {
                match decode_wav(&name, &path) {
                    Ok(resource) => {
                        debug!(name, frames = resource.frames(), "Loaded sound");
                        bank.insert(resource);
                        report.loaded.push(name);
                    }
                    Err(error) => {
                        warn!(name, path = %path.display(), %error, "Couldn't load sound");
                        report.failed.push((name, error.to_string()));
                    }
                }
            }
            (bank, report)
        })
        .await?;

        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Sound folder loaded"
        );
        Ok((bank, report))
    }
}

/// Decode a WAV file into interleaved `f32` samples
pub fn decode_wav(name: &str, path: &Path) -> Result<SoundResource> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    if samples.is_empty() {
        return Err(LoadError::Empty(name.to_string()));
    }

    Ok(SoundResource::new(name, spec.sample_rate, spec.channels, samples))
}
