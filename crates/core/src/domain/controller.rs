//! Playback orchestration
//!
//! The controller is the only entry point into the channel machinery. It
//! filters start requests, deduplicates repeated triggers, allocates channels
//! (evicting the oldest when the pool is full) and keeps busy channels'
//! volumes in step with the listener through its [`Spatializer`].
//!
//! It is constructed explicitly by whoever owns the audio subsystem and
//! dropping it tears the channel pool down. All operations take `&mut self`
//! and are bounded by the pool capacity; callers on other threads go through
//! a command queue instead of sharing the controller.

use crate::domain::audio::{Device, DeviceError, ResourceTable};
use crate::domain::channel::{Channel, ChannelId, OwnerId};
use crate::domain::clock::Clock;
use crate::domain::command::{Command, CommandResult};
use crate::domain::pool::{ChannelPool, PoolSnapshot};
use crate::domain::spatial::{Listener, Spatializer, StereoSpatializer, Vec3};
use crate::domain::volume::VolumeModel;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Why a start request did not produce a channel
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StartError {
    #[error("Sound output is disabled")]
    SoundDisabled,

    #[error("Sound level {requested} exceeds configured level {allowed}")]
    LevelFiltered { requested: u8, allowed: u8 },

    #[error("Sound '{0}' has no valid position")]
    NoPosition(String),

    #[error("Unknown sound: {0}")]
    UnknownResource(String),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Per-emission playback parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundParams {
    /// Base volume in `[0, 1]`
    pub volume: f32,
    /// `-1` loops forever, `n` plays the sound `n + 1` times
    pub loops: i32,
    /// Content tier; sounds above the configured level are filtered out
    pub level: u8,
}

impl Default for SoundParams {
    fn default() -> Self {
        Self {
            volume: 1.0,
            loops: 0,
            level: 1,
        }
    }
}

/// Static parameters the controller is built with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    /// 0 disables all sound
    pub sound_level: u8,
    pub master_volume: f32,
    pub max_audible_distance: f32,
    pub capacity: NonZeroUsize,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            sound_level: 1,
            master_volume: 1.0,
            max_audible_distance: 30.0,
            capacity: NonZeroUsize::new(crate::domain::pool::DEFAULT_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

pub struct PlaybackController {
    pool: ChannelPool,
    resources: Box<dyn ResourceTable>,
    spatializer: Box<dyn Spatializer>,
    volume: VolumeModel,
    clock: Arc<dyn Clock>,
    sound_level: u8,
}

impl PlaybackController {
    /// Build the controller and its channel pool
    ///
    /// `make_device` is called once per channel. Spatial updates default to
    /// a [`StereoSpatializer`] around a listener at the origin.
    pub fn new<R, F>(
        settings: PlaybackSettings,
        resources: R,
        clock: Arc<dyn Clock>,
        make_device: F,
    ) -> Self
    where
        R: ResourceTable + 'static,
        F: FnMut(ChannelId) -> Box<dyn Device>,
    {
        info!(
            sound_level = settings.sound_level,
            master_volume = settings.master_volume,
            max_audible_distance = settings.max_audible_distance,
            "Starting playback controller"
        );

        Self {
            pool: ChannelPool::new(settings.capacity, make_device),
            resources: Box::new(resources),
            spatializer: Box::new(StereoSpatializer::default()),
            volume: VolumeModel::new(settings.max_audible_distance, settings.master_volume),
            clock,
            sound_level: settings.sound_level,
        }
    }

    /// Replace the spatial update strategy
    pub fn with_spatializer(mut self, spatializer: Box<dyn Spatializer>) -> Self {
        self.spatializer = spatializer;
        self
    }

    /// Start a sound, returning the channel playing it
    ///
    /// Rejections are not errors for the caller: they just mean no sound is
    /// played, and are traced at debug level.
    pub fn start(
        &mut self,
        name: &str,
        params: &SoundParams,
        start_time: u64,
        position: Option<Vec3>,
        owner: Option<OwnerId>,
    ) -> Option<ChannelId> {
        match self.try_start(name, params, start_time, position, owner) {
            Ok(id) => Some(id),
            Err(StartError::Device(_)) => None,
            Err(reason) => {
                debug!(name, %reason, "Sound not started");
                None
            }
        }
    }

    /// Like [`start`](Self::start) but reports why nothing was started
    pub fn try_start(
        &mut self,
        name: &str,
        params: &SoundParams,
        start_time: u64,
        position: Option<Vec3>,
        owner: Option<OwnerId>,
    ) -> Result<ChannelId, StartError> {
        if self.sound_level == 0 {
            return Err(StartError::SoundDisabled);
        }
        if params.level > self.sound_level {
            return Err(StartError::LevelFiltered {
                requested: params.level,
                allowed: self.sound_level,
            });
        }
        let position = position
            .filter(Vec3::is_valid)
            .ok_or_else(|| StartError::NoPosition(name.to_string()))?;

        if let Some(active) = self.pool.registry().find_by_owner_and_name(owner, name) {
            trace!(channel = %active.id(), name, "Sound already playing for owner");
            return Ok(active.id());
        }

        let resource = Some(name)
            .filter(|name| !name.is_empty())
            .and_then(|name| self.resources.find(name))
            .ok_or_else(|| StartError::UnknownResource(name.to_string()))?;

        let channel = self.pool.allocate();
        let id = channel.id();
        channel.bind(Some(resource), name, owner, position, params.volume, start_time);
        channel.set_volume(params.volume);
        self.spatializer.on_sound_update(channel, &self.volume);

        if let Err(error) = channel.play(params.loops) {
            warn!(channel = %id, name, %error, "Couldn't play sound");
            self.pool.release_where(|c| c.id() == id);
            return Err(error.into());
        }

        debug!(channel = %id, name, owner = ?owner.map(|o| o.get()), "Sound started");
        Ok(id)
    }

    /// Stop the sound on channel `id`
    pub fn stop(&mut self, id: ChannelId) -> usize {
        self.pool.release_where(|c| c.id() == id)
    }

    /// Stop every sound started by `owner`; un-owned sounds are never bulk-stopped
    pub fn stop_by_owner(&mut self, owner: Option<OwnerId>) -> usize {
        let Some(owner) = owner else {
            return 0;
        };
        self.pool.release_where(|c| c.owner() == Some(owner))
    }

    /// Fade out the sound on channel `id` over `duration_ms`
    ///
    /// Returns whether a playing channel was found.
    pub fn fade_out(&mut self, id: ChannelId, duration_ms: u64) -> bool {
        let now = self.clock.now_ms();
        let found = self
            .pool
            .busy_channels()
            .find(|c| c.id() == id && c.is_busy())
            .map(Channel::id);

        match found.and_then(|id| self.pool.channel_mut(id)) {
            Some(channel) => {
                channel.schedule_fade_out(now, duration_ms);
                true
            }
            None => false,
        }
    }

    /// Release finished channels and re-spatialize the rest
    ///
    /// Meant to run on a fixed cadence. Returns how many channels were released.
    pub fn update(&mut self) -> usize {
        let released = self.pool.cleanup(self.clock.now_ms());

        let spatializer = &self.spatializer;
        let volume = &self.volume;
        self.pool
            .for_each_busy(|channel| spatializer.on_sound_update(channel, volume));

        released
    }

    /// Move the emitter of a busy channel; picked up by the next update
    pub fn move_emitter(&mut self, id: ChannelId, position: Vec3) -> bool {
        if !position.is_valid() || !self.pool.is_busy_channel(id) {
            return false;
        }
        match self.pool.channel_mut(id) {
            Some(channel) => {
                channel.set_position(position);
                true
            }
            None => false,
        }
    }

    pub fn set_listener(&mut self, listener: Listener) {
        self.spatializer.set_listener(listener);
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.volume.set_master_volume(volume);
        debug!(master_volume = self.volume.master_volume(), "Master volume changed");
    }

    pub fn master_volume(&self) -> f32 {
        self.volume.master_volume()
    }

    pub fn set_sound_level(&mut self, level: u8) {
        self.sound_level = level;
        debug!(sound_level = level, "Sound level changed");
    }

    pub fn sound_level(&self) -> u8 {
        self.sound_level
    }

    pub fn volume_model(&self) -> &VolumeModel {
        &self.volume
    }

    pub fn pool(&self) -> &ChannelPool {
        &self.pool
    }

    pub fn busy_count(&self) -> usize {
        self.pool.busy_len()
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.pool.snapshot()
    }

    /// Apply a queued command
    pub fn execute(&mut self, command: Command) -> CommandResult {
        match command {
            Command::Start {
                name,
                params,
                position,
                owner,
            } => {
                let now = self.clock.now_ms();
                match self.try_start(&name, &params, now, position, owner) {
                    Ok(id) => CommandResult::Started { id },
                    Err(reason) => CommandResult::Rejected { name, reason },
                }
            }
            Command::Stop { id } => CommandResult::Stopped {
                count: self.stop(id),
            },
            Command::StopByOwner { owner } => CommandResult::Stopped {
                count: self.stop_by_owner(owner),
            },
            Command::FadeOut { id, duration_ms } => CommandResult::FadeScheduled {
                id,
                scheduled: self.fade_out(id, duration_ms),
            },
            Command::MoveEmitter { id, position } => CommandResult::EmitterMoved {
                id,
                moved: self.move_emitter(id, position),
            },
            Command::SetListener { listener } => {
                self.set_listener(listener);
                CommandResult::ListenerUpdated
            }
            Command::SetMasterVolume { volume } => {
                self.set_master_volume(volume);
                CommandResult::MasterVolumeChanged {
                    volume: self.master_volume(),
                }
            }
            Command::SetSoundLevel { level } => {
                self.set_sound_level(level);
                CommandResult::SoundLevelChanged { level }
            }
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        info!(busy = self.pool.busy_len(), "Shutting down playback controller");
    }
}
