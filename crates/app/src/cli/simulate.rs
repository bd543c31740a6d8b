//! Running a script against the playback service with virtual devices

use crate::script::{Script, Step};
use anyhow::Context;
use soundpool_core::domain::audio::{SoundBank, SoundResource};
use soundpool_core::domain::clock::{Clock, ManualClock, SystemClock};
use soundpool_core::domain::command::CommandResult;
use soundpool_core::domain::config::SoundpoolConfig;
use soundpool_core::domain::controller::PlaybackController;
use soundpool_infra::audio::{PlaybackService, SoundLoader, TickReport, VirtualDevice};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Update cadence in real-time mode
const UPDATE_PERIOD_MS: u64 = 20;

enum Timeline {
    /// `tick <ms>` jumps the clock and runs a single update
    Stepped(ManualClock),
    /// `tick <ms>` waits for real and updates every period
    Realtime,
}

pub struct Simulation {
    service: PlaybackService,
    clock: Arc<dyn Clock>,
    timeline: Timeline,
}

impl Simulation {
    pub async fn new(config: &SoundpoolConfig, script: &Script, realtime: bool) -> anyhow::Result<Self> {
        let mut bank = match SoundLoader::from_config(&config.resources).load().await {
            Ok((bank, report)) => {
                if !report.is_complete() {
                    warn!(failed = report.failed.len(), "Some sounds failed to load");
                }
                bank
            }
            Err(error) if script.sounds().next().is_some() => {
                warn!(%error, "Sound folder unavailable, using script sounds only");
                SoundBank::new()
            }
            Err(error) => return Err(error).context("loading sounds"),
        };
        for (name, duration_ms) in script.sounds() {
            // Silent mono at 1 kHz, one sample per millisecond
            let samples = vec![0.0; usize::try_from(duration_ms).unwrap_or(usize::MAX)];
            bank.insert(SoundResource::new(name, 1000, 1, samples));
        }

        let (clock, timeline): (Arc<dyn Clock>, Timeline) = if realtime {
            (Arc::new(SystemClock::new()), Timeline::Realtime)
        } else {
            let manual = ManualClock::new(0);
            (Arc::new(manual.clone()), Timeline::Stepped(manual))
        };

        let controller = PlaybackController::new(
            config.playback_settings()?,
            bank,
            Arc::clone(&clock),
            VirtualDevice::factory(Arc::clone(&clock)),
        );

        Ok(Self {
            service: PlaybackService::new(controller),
            clock,
            timeline,
        })
    }

    pub async fn run(&mut self, script: &Script) -> anyhow::Result<()> {
        let handle = self.service.handle();
        info!(steps = script.steps().len(), "Running simulation");

        for (line, step) in script.steps() {
            match step {
                Step::Sound { .. } => {}
                Step::Send(command) => handle
                    .send(command.clone())
                    .with_context(|| format!("line {line}"))?,
                Step::Tick { ms } => {
                    for report in self.advance(*ms).await {
                        self.print_report(&report);
                    }
                }
                Step::Status => {
                    let results = self.service.drain();
                    self.print_report(&TickReport {
                        results,
                        released: 0,
                    });
                    let snapshot = self.service.controller().snapshot();
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                }
            }
        }
        Ok(())
    }

    async fn advance(&mut self, ms: u64) -> Vec<TickReport> {
        match &self.timeline {
            Timeline::Stepped(clock) => {
                clock.advance(ms);
                vec![self.service.tick()]
            }
            Timeline::Realtime => {
                let mut reports = vec![self.service.tick()];
                let deadline = self.clock.now_ms().saturating_add(ms);
                let mut interval = tokio::time::interval(Duration::from_millis(UPDATE_PERIOD_MS));
                interval.tick().await;
                while self.clock.now_ms() < deadline {
                    interval.tick().await;
                    reports.push(self.service.tick());
                }
                reports
            }
        }
    }

    fn print_report(&self, report: &TickReport) {
        let now = self.clock.now_ms();
        for result in &report.results {
            println!("[{now:>7}] {}", describe(result));
        }
        if report.released > 0 {
            println!("[{now:>7}] released {} channel(s)", report.released);
        }
    }
}

fn describe(result: &CommandResult) -> String {
    match result {
        CommandResult::Started { id } => format!("playing on channel {id}"),
        CommandResult::Rejected { name, reason } => format!("not started {name}: {reason}"),
        CommandResult::Stopped { count } => format!("stopped {count} channel(s)"),
        CommandResult::FadeScheduled { id, scheduled: true } => format!("fading channel {id}"),
        CommandResult::FadeScheduled { id, scheduled: false } => {
            format!("channel {id} is not playing, nothing to fade")
        }
        CommandResult::EmitterMoved { id, moved: true } => format!("moved channel {id}"),
        CommandResult::EmitterMoved { id, moved: false } => format!("channel {id} not moved"),
        CommandResult::ListenerUpdated => "listener updated".to_string(),
        CommandResult::MasterVolumeChanged { volume } => format!("master volume {volume:.2}"),
        CommandResult::SoundLevelChanged { level } => format!("sound level {level}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundpool_core::domain::channel::ChannelId;
    use soundpool_core::domain::controller::StartError;

    #[test]
    fn test_describe() {
        let id = ChannelId::new(3);
        assert_eq!(describe(&CommandResult::Started { id }), "playing on channel 3");
        assert_eq!(
            describe(&CommandResult::Rejected {
                name: "horn".to_string(),
                reason: StartError::UnknownResource("horn".to_string()),
            }),
            "not started horn: Unknown sound: horn"
        );
    }

    #[tokio::test]
    async fn test_stepped_simulation() {
        let script = Script::parse(
            "sound engine 1000\n\
             start engine 1,0,0 owner=1\n\
             start engine 1,0,0 owner=1\n\
             tick 10\n\
             tick 1000\n",
        )
        .unwrap();
        let mut config = SoundpoolConfig::default();
        config.resources.folder = std::env::temp_dir().join("soundpool-no-such-folder");
        config.pool.capacity = 2;

        let mut simulation = Simulation::new(&config, &script, false).await.unwrap();
        let handle = simulation.service.handle();
        for (_, step) in script.steps() {
            if let Step::Send(command) = step {
                handle.send(command.clone()).unwrap();
            }
        }

        let reports = simulation.advance(10).await;
        assert_eq!(reports[0].results.len(), 2);
        assert_eq!(reports[0].results[0], reports[0].results[1]);
        assert_eq!(simulation.service.controller().busy_count(), 1);

        let reports = simulation.advance(1_000).await;
        assert_eq!(reports[0].released, 1);
    }
}
