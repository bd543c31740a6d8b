//! Commands for driving a controller through a queue

use crate::domain::channel::{ChannelId, OwnerId};
use crate::domain::controller::{SoundParams, StartError};
use crate::domain::spatial::{Listener, Vec3};

/// Command types accepted by [`PlaybackController::execute`](crate::domain::PlaybackController::execute)
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start {
        name: String,
        params: SoundParams,
        position: Option<Vec3>,
        owner: Option<OwnerId>,
    },
    Stop {
        id: ChannelId,
    },
    StopByOwner {
        owner: Option<OwnerId>,
    },
    FadeOut {
        id: ChannelId,
        duration_ms: u64,
    },
    MoveEmitter {
        id: ChannelId,
        position: Vec3,
    },
    SetListener {
        listener: Listener,
    },
    SetMasterVolume {
        volume: f32,
    },
    SetSoundLevel {
        level: u8,
    },
}

/// Result of command execution
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Started {
        id: ChannelId,
    },
    Rejected {
        name: String,
        reason: StartError,
    },
    Stopped {
        count: usize,
    },
    FadeScheduled {
        id: ChannelId,
        scheduled: bool,
    },
    EmitterMoved {
        id: ChannelId,
        moved: bool,
    },
    ListenerUpdated,
    MasterVolumeChanged {
        volume: f32,
    },
    SoundLevelChanged {
        level: u8,
    },
}
