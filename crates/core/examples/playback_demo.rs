//! Example walking through allocation, deduplication and eviction
//!
//! Run with: cargo run --package soundpool-core --example playback_demo

use soundpool_core::domain::*;
use std::sync::Arc;

/// Device that keeps playing until stopped
struct LoopDevice {
    playing: bool,
}

impl Device for LoopDevice {
    fn play(&mut self, _resource: &Arc<SoundResource>, _loops: i32) -> Result<(), DeviceError> {
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn fade_out(&mut self, _duration_ms: u64) {}

    fn set_volume(&mut self, _level: u8) {}

    fn set_panning(&mut self, _left: u8, _right: u8) {}

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("soundpool_core=debug,info")
        .init();

    println!("=== Sound Pool Demo ===\n");

    let mut config = SoundpoolConfig::default();
    config.apply_args(&ArgTable::from_args(["channels=2"]));
    let settings = config.playback_settings()?;
    println!("1. Pool of {} channels", settings.capacity);

    let mut bank = SoundBank::new();
    for name in ["engine", "horn", "siren"] {
        bank.insert(SoundResource::new(name, 22050, 1, vec![0.0; 22050]));
    }

    let clock = ManualClock::new(0);
    let mut controller = PlaybackController::new(settings, bank, Arc::new(clock.clone()), |_| {
        Box::new(LoopDevice { playing: false }) as Box<dyn Device>
    });

    let params = SoundParams::default();
    let car = OwnerId::from_raw(1);
    let here = Some(Vec3::new(15.0, 0.0, 0.0));

    println!("\n2. Starting 'engine' twice for the same owner");
    let first = controller.start("engine", &params, clock.now_ms(), here, car);
    let second = controller.start("engine", &params, clock.now_ms(), here, car);
    println!("   first={first:?} second={second:?} busy={}", controller.busy_count());

    println!("\n3. Filling the pool and evicting the oldest sound");
    controller.start("horn", &params, clock.now_ms(), here, OwnerId::from_raw(2));
    controller.start("siren", &params, clock.now_ms(), here, OwnerId::from_raw(3));
    for channel in controller.pool().busy_channels() {
        println!("   {} -> {} (gain {:.2})", channel.id(), channel.name(), channel.gain());
    }

    println!("\n4. Stopping everything owned by #3");
    let stopped = controller.stop_by_owner(OwnerId::from_raw(3));
    println!("   stopped={stopped} busy={}", controller.busy_count());

    println!("\n=== Demo Complete ===");
    Ok(())
}
