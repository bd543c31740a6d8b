//! Clock-driven stand-in for a hardware mixer channel
//!
//! A `VirtualDevice` produces no sound. It knows how long the bound resource
//! lasts and reports itself as playing until that time has passed on the
//! shared clock, which is all the allocator needs to run simulations and
//! integration tests deterministically.

use soundpool_core::domain::audio::{Device, DeviceError, Result, SoundResource, MAX_VOLUME};
use soundpool_core::domain::channel::ChannelId;
use soundpool_core::domain::clock::Clock;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Playback {
    Idle,
    Until(u64),
    Forever,
}

pub struct VirtualDevice {
    id: ChannelId,
    clock: Arc<dyn Clock>,
    playback: Playback,
    resource: Option<String>,
    volume: u8,
    panning: (u8, u8),
}

impl VirtualDevice {
    pub fn new(id: ChannelId, clock: Arc<dyn Clock>) -> Self {
        Self {
            id,
            clock,
            playback: Playback::Idle,
            resource: None,
            volume: MAX_VOLUME,
            panning: (u8::MAX, u8::MAX),
        }
    }

    /// Device constructor for [`PlaybackController::new`](soundpool_core::domain::PlaybackController::new)
    pub fn factory(clock: Arc<dyn Clock>) -> impl FnMut(ChannelId) -> Box<dyn Device> {
        move |id| Box::new(VirtualDevice::new(id, Arc::clone(&clock))) as Box<dyn Device>
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Name of the last resource played
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn panning(&self) -> (u8, u8) {
        self.panning
    }

    /// Time at which playback ends, `None` when idle or looping forever
    pub fn ends_at(&self) -> Option<u64> {
        match self.playback {
            Playback::Until(end) => Some(end),
            Playback::Idle | Playback::Forever => None,
        }
    }
}

impl Device for VirtualDevice {
    fn play(&mut self, resource: &Arc<SoundResource>, loops: i32) -> Result<()> {
        if resource.is_empty() {
            return Err(DeviceError::EmptyResource(resource.name().to_string()));
        }

        let now = self.clock.now_ms();
        self.playback = match u64::try_from(loops) {
            Ok(loops) => Playback::Until(now.saturating_add(
                resource.duration_ms().saturating_mul(loops.saturating_add(1)),
            )),
            Err(_) => Playback::Forever,
        };
        self.resource = Some(resource.name().to_string());

        trace!(channel = %self.id, resource = resource.name(), ?self.playback, "Virtual playback");
        Ok(())
    }

    fn stop(&mut self) {
        self.playback = Playback::Idle;
    }

    fn fade_out(&mut self, duration_ms: u64) {
        if !self.is_playing() {
            return;
        }
        let end = self.clock.now_ms().saturating_add(duration_ms);
        self.playback = match self.playback {
            Playback::Until(current) if current < end => Playback::Until(current),
            _ => Playback::Until(end),
        };
    }

    fn set_volume(&mut self, level: u8) {
        self.volume = level.min(MAX_VOLUME);
    }

    fn set_panning(&mut self, left: u8, right: u8) {
        self.panning = (left, right);
    }

    fn is_playing(&self) -> bool {
        match self.playback {
            Playback::Idle => false,
            Playback::Forever => true,
            Playback::Until(end) => self.clock.now_ms() < end,
        }
    }
}
