//! Command queue in front of a playback controller
//!
//! The controller itself is single-threaded. Game logic, network handlers or
//! scripting threads send [`Command`]s through cloneable [`ServiceHandle`]s,
//! and whoever owns the [`PlaybackService`] applies them in arrival order on
//! each [`tick`](PlaybackService::tick), followed by the periodic update pass.

use crossbeam::channel::{unbounded, Receiver, Sender};
use soundpool_core::domain::channel::{ChannelId, OwnerId};
use soundpool_core::domain::command::{Command, CommandResult};
use soundpool_core::domain::controller::{PlaybackController, SoundParams};
use soundpool_core::domain::spatial::{Listener, Vec3};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Playback service has shut down")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Sending side of the command queue
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    sender: Sender<Command>,
}

impl ServiceHandle {
    pub fn send(&self, command: Command) -> Result<()> {
        self.sender
            .send(command)
            .map_err(|_| ServiceError::Disconnected)
    }

    pub fn start(
        &self,
        name: impl Into<String>,
        params: SoundParams,
        position: Option<Vec3>,
        owner: Option<OwnerId>,
    ) -> Result<()> {
        self.send(Command::Start {
            name: name.into(),
            params,
            position,
            owner,
        })
    }

    pub fn stop(&self, id: ChannelId) -> Result<()> {
        self.send(Command::Stop { id })
    }

    pub fn stop_by_owner(&self, owner: Option<OwnerId>) -> Result<()> {
        self.send(Command::StopByOwner { owner })
    }

    pub fn fade_out(&self, id: ChannelId, duration_ms: u64) -> Result<()> {
        self.send(Command::FadeOut { id, duration_ms })
    }

    pub fn move_emitter(&self, id: ChannelId, position: Vec3) -> Result<()> {
        self.send(Command::MoveEmitter { id, position })
    }

    pub fn set_listener(&self, listener: Listener) -> Result<()> {
        self.send(Command::SetListener { listener })
    }
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Results of the drained commands, in arrival order
    pub results: Vec<CommandResult>,
    /// Channels released by the update pass
    pub released: usize,
}

pub struct PlaybackService {
    controller: PlaybackController,
    sender: Sender<Command>,
    commands: Receiver<Command>,
}

impl PlaybackService {
    pub fn new(controller: PlaybackController) -> Self {
        let (sender, commands) = unbounded();
        info!(capacity = controller.pool().capacity(), "Playback service ready");
        Self {
            controller,
            sender,
            commands,
        }
    }

    pub fn handle(&self) -> ServiceHandle {
        ServiceHandle {
            sender: self.sender.clone(),
        }
    }

    /// Number of commands waiting for the next tick
    pub fn pending(&self) -> usize {
        self.commands.len()
    }

    /// Apply queued commands without running the update pass
    pub fn drain(&mut self) -> Vec<CommandResult> {
        let mut results = Vec::with_capacity(self.commands.len());
        while let Ok(command) = self.commands.try_recv() {
            let result = self.controller.execute(command);
            if let CommandResult::Rejected { name, reason } = &result {
                debug!(name, %reason, "Queued start rejected");
            }
            results.push(result);
        }
        results
    }

    /// Apply queued commands, then release finished channels and refresh volumes
    pub fn tick(&mut self) -> TickReport {
        let results = self.drain();
        let released = self.controller.update();
        TickReport { results, released }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController {
        &mut self.controller
    }
}
