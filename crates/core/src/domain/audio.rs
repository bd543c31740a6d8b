//! Playback device and sound resource abstractions
//!
//! This module defines the boundary between the channel allocator and the
//! outside world: preloaded sound data shared by every channel that plays it,
//! the table those sounds are looked up in, and the per-channel device that
//! actually renders them. Concrete devices and loaders live in the `infra`
//! crate.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Highest volume level a device accepts by default
pub const MAX_VOLUME: u8 = 128;

/// Highest per-ear panning level
pub const MAX_PANNING: u8 = 255;

/// Errors reported by a playback device
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The device declined to start playback
    #[error("Device refused playback: {0}")]
    Refused(String),

    /// The resource holds no audio frames
    #[error("Resource '{0}' contains no audio")]
    EmptyResource(String),
}

pub type Result<T> = std::result::Result<T, DeviceError>;

/// Decoded sound data, shared read-only by every channel bound to it
#[derive(Debug, Clone, PartialEq)]
pub struct SoundResource {
    name: String,
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

impl SoundResource {
    pub fn new(name: impl Into<String>, sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            sample_rate,
            channels: channels.max(1),
            samples,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of frames (one sample per interleaved channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Length of a single pass in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }
}

/// Lookup of preloaded sounds by name
///
/// The table is filled once at setup; the allocator only ever reads from it.
pub trait ResourceTable: Send {
    fn find(&self, name: &str) -> Option<Arc<SoundResource>>;
}

/// In-memory resource table
#[derive(Debug, Clone, Default)]
pub struct SoundBank {
    sounds: HashMap<String, Arc<SoundResource>>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource under its own name, replacing any previous entry
    pub fn insert(&mut self, resource: SoundResource) {
        self.sounds
            .insert(resource.name().to_string(), Arc::new(resource));
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// Names of all loaded sounds, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sounds.keys().cloned().collect();
        names.sort();
        names
    }
}

impl ResourceTable for SoundBank {
    fn find(&self, name: &str) -> Option<Arc<SoundResource>> {
        self.sounds.get(name).cloned()
    }
}

/// One playback slot of the underlying audio output
///
/// Every channel of the pool owns exactly one device. Volume and panning are
/// expressed in device levels (`0..=max_volume()` and `0..=MAX_PANNING`).
pub trait Device: Send {
    /// Start playing `resource`; `loops < 0` repeats forever, otherwise the
    /// sound plays `loops + 1` times
    fn play(&mut self, resource: &Arc<SoundResource>, loops: i32) -> Result<()>;

    /// Halt playback immediately
    fn stop(&mut self);

    /// Fade the current sound out over `duration_ms`
    fn fade_out(&mut self, duration_ms: u64);

    fn set_volume(&mut self, level: u8);

    fn set_panning(&mut self, left: u8, right: u8);

    /// Whether the device is still producing sound
    fn is_playing(&self) -> bool;

    fn max_volume(&self) -> u8 {
        MAX_VOLUME
    }
}
