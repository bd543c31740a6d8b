//! A single playback slot of the channel pool

use crate::domain::audio::{Device, DeviceError, SoundResource, MAX_PANNING};
use crate::domain::spatial::Vec3;
use crate::domain::volume::{Mix, Panning};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, trace};

/// Stable identifier of a pool channel, `0..capacity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(usize);

impl ChannelId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller supplied identity of whatever emitted a sound
///
/// There is no null owner: un-owned emissions pass `None`, which never
/// matches anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(NonZeroUsize);

impl OwnerId {
    /// `None` for the raw value 0
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

/// Playback slot owning one device
pub struct Channel {
    id: ChannelId,
    name: String,
    resource: Option<Arc<SoundResource>>,
    owner: Option<OwnerId>,
    position: Vec3,
    start_time: u64,
    end_time: Option<u64>,
    volume: f32,
    serial: u64,
    gain: f32,
    panning: Option<Panning>,
    device: Box<dyn Device>,
}

impl Channel {
    pub fn new(id: ChannelId, device: Box<dyn Device>) -> Self {
        Self {
            id,
            name: String::new(),
            resource: None,
            owner: None,
            position: Vec3::ZERO,
            start_time: 0,
            end_time: None,
            volume: 1.0,
            serial: 0,
            gain: 0.0,
            panning: None,
            device,
        }
    }

    /// Attach a sound to this channel. Does nothing without a resource.
    pub fn bind(
        &mut self,
        resource: Option<Arc<SoundResource>>,
        name: &str,
        owner: Option<OwnerId>,
        position: Vec3,
        volume: f32,
        start_time: u64,
    ) {
        let Some(resource) = resource else {
            return;
        };
        self.resource = Some(resource);
        self.name = name.to_string();
        self.owner = owner;
        self.position = position;
        self.volume = volume.clamp(0.0, 1.0);
        self.start_time = start_time;
        self.end_time = None;
    }

    /// Start the bound sound on the device
    pub fn play(&mut self, loops: i32) -> Result<(), DeviceError> {
        let Some(resource) = self.resource.as_ref() else {
            return Err(DeviceError::Refused(format!("channel {} has no sound bound", self.id)));
        };
        self.device.play(resource, loops)?;
        debug!(channel = %self.id, name = %self.name, loops, "Playing");
        Ok(())
    }

    /// Halt playback and return to idle. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.device.stop();
        self.name.clear();
        self.resource = None;
        self.owner = None;
        self.end_time = None;
        self.panning = None;
        self.gain = 0.0;
    }

    /// Let the sound fade out and expire `duration_ms` after `now`
    pub fn schedule_fade_out(&mut self, now: u64, duration_ms: u64) {
        if !self.is_bound() {
            return;
        }
        self.end_time = Some(now.saturating_add(duration_ms));
        self.device.fade_out(duration_ms);
        debug!(channel = %self.id, name = %self.name, duration_ms, "Fading out");
    }

    /// Whether the device is still playing this channel's sound
    pub fn is_busy(&self) -> bool {
        self.device.is_playing()
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.end_time.is_some_and(|end| now >= end)
    }

    /// Set the channel gain, `1.0` being the device maximum
    pub fn set_volume(&mut self, gain: f32) {
        let max = self.device.max_volume();
        let level = (gain.max(0.0) * f32::from(max)).min(f32::from(max)) as u8;
        self.gain = gain.max(0.0);
        self.device.set_volume(level);
        trace!(channel = %self.id, gain, level, "Volume set");
    }

    pub fn set_panning(&mut self, left: f32, right: f32) {
        let to_level = |ear: f32| (ear.clamp(0.0, 1.0) * f32::from(MAX_PANNING)) as u8;
        self.panning = Some(Panning { left, right });
        self.device.set_panning(to_level(left), to_level(right));
    }

    /// Apply an evaluated volume model result
    pub fn apply_mix(&mut self, mix: &Mix) {
        self.set_volume(mix.gain);
        if let Some(panning) = mix.panning {
            self.set_panning(panning.left, panning.right);
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource(&self) -> Option<&Arc<SoundResource>> {
        self.resource.as_ref()
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn end_time(&self) -> Option<u64> {
        self.end_time
    }

    /// Base volume of the bound emission
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Last gain sent to the device
    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn panning(&self) -> Option<Panning> {
        self.panning
    }

    /// Allocation order stamp; larger means allocated later
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub(crate) fn set_serial(&mut self, serial: u64) {
        self.serial = serial;
    }

    /// Whether a sound is attached (busy as far as the pool is concerned)
    pub fn is_bound(&self) -> bool {
        self.resource.is_some()
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            id: self.id,
            name: self.name.clone(),
            owner: self.owner,
            position: self.position,
            start_time: self.start_time,
            end_time: self.end_time,
            volume: self.volume,
            gain: self.gain,
            panning: self.panning,
            serial: self.serial,
            playing: self.is_busy(),
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("position", &self.position)
            .field("end_time", &self.end_time)
            .field("serial", &self.serial)
            .finish_non_exhaustive()
    }
}

/// Serializable view of a busy channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub id: ChannelId,
    pub name: String,
    pub owner: Option<OwnerId>,
    pub position: Vec3,
    pub start_time: u64,
    pub end_time: Option<u64>,
    pub volume: f32,
    pub gain: f32,
    pub panning: Option<Panning>,
    pub serial: u64,
    pub playing: bool,
}
