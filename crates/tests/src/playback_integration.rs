//! Integration tests for the playback pipeline
//!
//! These tests drive the core controller with clock-driven virtual devices,
//! covering allocation, eviction, deduplication, the update pass and the
//! distance model, plus the full path from WAV files and settings on disk to
//! a ticking playback service.

use proptest::prelude::*;
use soundpool_core::domain::{
    ArgTable, Channel, ChannelId, Clock, Listener, ManualClock, OwnerId, PlaybackController,
    PlaybackSettings, SoundBank, SoundParams, SoundResource, SoundpoolConfig, Vec3,
};
use soundpool_infra::audio::{PlaybackService, SoundLoader, VirtualDevice};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Silent mono sound at 1 kHz lasting `duration_ms`
fn sound(name: &str, duration_ms: usize) -> SoundResource {
    SoundResource::new(name, 1000, 1, vec![0.0; duration_ms])
}

fn rig(capacity: usize, sounds: &[(&str, usize)]) -> (PlaybackController, ManualClock) {
    let mut bank = SoundBank::new();
    for (name, duration_ms) in sounds {
        bank.insert(sound(name, *duration_ms));
    }
    let settings = PlaybackSettings {
        capacity: NonZeroUsize::new(capacity).unwrap(),
        ..PlaybackSettings::default()
    };
    let clock = ManualClock::new(0);
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let controller =
        PlaybackController::new(settings, bank, Arc::clone(&shared), VirtualDevice::factory(shared));
    (controller, clock)
}

fn owner(raw: usize) -> Option<OwnerId> {
    OwnerId::from_raw(raw)
}

fn busy_names(controller: &PlaybackController) -> Vec<String> {
    controller
        .pool()
        .busy_channels()
        .map(|channel| channel.name().to_string())
        .collect()
}

fn at(x: f32, y: f32, z: f32) -> Option<Vec3> {
    Some(Vec3::new(x, y, z))
}

// ============================================================================
// ALLOCATION TESTS
// ============================================================================

#[test]
fn test_capacity_two_evicts_oldest() {
    let (mut controller, _clock) = rig(2, &[("a", 1000), ("b", 1000), ("c", 1000)]);
    let params = SoundParams::default();

    let a = controller.start("a", &params, 0, at(1.0, 0.0, 0.0), owner(1)).unwrap();
    controller.start("b", &params, 1, at(1.0, 0.0, 0.0), owner(2)).unwrap();
    let c = controller.start("c", &params, 2, at(1.0, 0.0, 0.0), owner(3)).unwrap();

    assert_eq!(busy_names(&controller), vec!["b", "c"]);
    // The evicted channel is the one reused
    assert_eq!(a, c);
    assert_eq!(controller.busy_count(), 2);
    assert_eq!(controller.pool().idle_len(), 0);
}

#[test]
fn test_repeated_trigger_is_deduplicated() {
    let (mut controller, _clock) = rig(4, &[("x", 1000)]);
    let params = SoundParams::default();

    let first = controller.start("x", &params, 0, at(0.0, 0.0, -1.0), owner(7));
    let second = controller.start("x", &params, 0, at(0.0, 0.0, -1.0), owner(7));

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(controller.busy_count(), 1);
}

#[test]
fn test_restart_after_stop_is_fresh_allocation() {
    let (mut controller, _clock) = rig(4, &[("x", 1000)]);
    let params = SoundParams::default();

    let first = controller.start("x", &params, 0, at(0.0, 0.0, -1.0), owner(7)).unwrap();
    let first_serial = controller.pool().channel(first).map(Channel::serial).unwrap();
    assert_eq!(controller.stop(first), 1);

    let third = controller.start("x", &params, 0, at(0.0, 0.0, -1.0), owner(7)).unwrap();
    let third_serial = controller.pool().channel(third).map(Channel::serial).unwrap();
    assert!(third_serial > first_serial);
    assert_eq!(controller.busy_count(), 1);
}

#[test]
fn test_unowned_sounds_stack_and_survive_owner_stop() {
    let (mut controller, _clock) = rig(4, &[("wind", 1000), ("horn", 1000)]);
    let params = SoundParams::default();

    controller.start("wind", &params, 0, at(0.0, 0.0, -1.0), None);
    controller.start("wind", &params, 0, at(0.0, 0.0, -1.0), None);
    controller.start("horn", &params, 0, at(0.0, 0.0, -1.0), owner(3));

    assert_eq!(controller.stop_by_owner(None), 0);
    assert_eq!(controller.busy_count(), 3);

    assert_eq!(controller.stop_by_owner(owner(3)), 1);
    assert_eq!(busy_names(&controller), vec!["wind", "wind"]);
}

#[test]
fn test_positionless_and_filtered_starts_leave_pool_untouched() {
    let (mut controller, _clock) = rig(2, &[("x", 1000)]);
    controller.set_sound_level(1);

    assert!(controller.start("x", &SoundParams::default(), 0, None, owner(1)).is_none());
    let loud = SoundParams {
        level: 2,
        ..SoundParams::default()
    };
    assert!(controller.start("x", &loud, 0, at(0.0, 0.0, 0.0), owner(1)).is_none());
    assert!(controller
        .start("missing", &SoundParams::default(), 0, at(0.0, 0.0, 0.0), owner(1))
        .is_none());

    assert_eq!(controller.busy_count(), 0);
    assert_eq!(controller.pool().idle_len(), 2);
}

// ============================================================================
// UPDATE PASS TESTS
// ============================================================================

#[test]
fn test_update_releases_finished_sounds() {
    let (mut controller, clock) = rig(4, &[("short", 100), ("long", 1000)]);
    let params = SoundParams::default();
    controller.start("short", &params, 0, at(1.0, 0.0, 0.0), None);
    controller.start("long", &params, 0, at(1.0, 0.0, 0.0), None);

    clock.advance(99);
    assert_eq!(controller.update(), 0);

    clock.advance(1);
    assert_eq!(controller.update(), 1);
    assert_eq!(busy_names(&controller), vec!["long"]);

    clock.advance(900);
    assert_eq!(controller.update(), 1);
    assert_eq!(controller.busy_count(), 0);
}

#[test]
fn test_looping_sound_released_after_fade() {
    let (mut controller, clock) = rig(4, &[("engine", 500)]);
    let looping = SoundParams {
        loops: -1,
        ..SoundParams::default()
    };
    let id = controller.start("engine", &looping, 0, at(2.0, 0.0, 0.0), owner(1)).unwrap();

    clock.advance(10_000);
    assert_eq!(controller.update(), 0);

    assert!(controller.fade_out(id, 300));
    clock.advance(299);
    assert_eq!(controller.update(), 0);
    clock.advance(1);
    assert_eq!(controller.update(), 1);

    // A finished channel can no longer be faded
    assert!(!controller.fade_out(id, 300));
}

#[test]
fn test_loops_extend_lifetime() {
    let (mut controller, clock) = rig(2, &[("blip", 100)]);
    let thrice = SoundParams {
        loops: 2,
        ..SoundParams::default()
    };
    controller.start("blip", &thrice, 0, at(1.0, 0.0, 0.0), None);

    clock.set(299);
    assert_eq!(controller.update(), 0);
    clock.set(300);
    assert_eq!(controller.update(), 1);
}

// ============================================================================
// VOLUME MODEL TESTS
// ============================================================================

#[test]
fn test_half_distance_gives_quarter_gain() {
    let (mut controller, _clock) = rig(2, &[("x", 1000)]);
    let id = controller
        .start("x", &SoundParams::default(), 0, at(15.0, 0.0, 0.0), None)
        .unwrap();

    let channel = controller.pool().channel(id).unwrap();
    assert!((channel.gain() - 0.25).abs() < 1e-6);

    // Source on the right of a listener facing -Z
    let panning = channel.panning().unwrap();
    assert!((panning.left - 0.275).abs() < 1e-5);
    assert!((panning.right - 0.725).abs() < 1e-5);
}

#[test]
fn test_gain_boundaries() {
    let (mut controller, _clock) = rig(4, &[("x", 1000)]);
    controller.set_master_volume(0.5);
    let params = SoundParams {
        volume: 0.8,
        ..SoundParams::default()
    };

    let near = controller.start("x", &params, 0, at(0.0, 0.0, 0.0), None).unwrap();
    let edge = controller.start("x", &params, 0, at(30.0, 0.0, 0.0), None).unwrap();
    let beyond = controller.start("x", &params, 0, at(0.0, 0.0, 90.0), None).unwrap();

    let gain = |id: ChannelId| controller.pool().channel(id).unwrap().gain();
    assert!((gain(near) - 0.4).abs() < 1e-6);
    assert_eq!(gain(edge), 0.0);
    assert_eq!(gain(beyond), 0.0);
    // Out of range sources still hold their channel
    assert_eq!(controller.busy_count(), 3);
}

#[test]
fn test_listener_movement_updates_busy_channels() {
    let (mut controller, _clock) = rig(2, &[("x", 1000)]);
    let id = controller
        .start("x", &SoundParams::default(), 0, at(0.0, 0.0, -40.0), None)
        .unwrap();
    assert_eq!(controller.pool().channel(id).unwrap().gain(), 0.0);

    controller.set_listener(Listener::new(
        Vec3::new(0.0, 0.0, -25.0),
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.0, 1.0, 0.0),
    ));
    controller.update();

    let channel = controller.pool().channel(id).unwrap();
    let expected = (15.0f32 / 30.0).powi(2);
    assert!((channel.gain() - expected).abs() < 1e-6);
    // Straight ahead sits in the centre
    let panning = channel.panning().unwrap();
    assert!((panning.left - panning.right).abs() < 1e-6);
}

#[test]
fn test_emitter_movement_picked_up_by_update() {
    let (mut controller, _clock) = rig(2, &[("x", 1000)]);
    let id = controller
        .start("x", &SoundParams::default(), 0, at(-15.0, 0.0, 0.0), None)
        .unwrap();
    let before = controller.pool().channel(id).unwrap().panning().unwrap();
    assert!(before.left > before.right);

    assert!(controller.move_emitter(id, Vec3::new(15.0, 0.0, 0.0)));
    controller.update();

    let after = controller.pool().channel(id).unwrap().panning().unwrap();
    assert!(after.right > after.left);
}

// ============================================================================
// FULL STACK TESTS
// ============================================================================

fn write_wav(path: &Path, frames: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 1000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..frames {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[tokio::test]
async fn test_files_to_service() {
    let dir = TempDir::new().unwrap();
    let sounds = dir.path().join("sounds");
    std::fs::create_dir_all(&sounds).unwrap();
    write_wav(&sounds.join("engine.wav"), 400);
    write_wav(&sounds.join("horn.wav"), 200);
    write_wav(&sounds.join("siren.wav"), 200);

    let mut config = SoundpoolConfig::default();
    config.resources.folder = sounds;
    let config_path = dir.path().join("config.toml");
    config.save_to_file(&config_path).await.unwrap();

    let ini = dir.path().join("game.ini");
    std::fs::write(&ini, "# overrides\nchannels=2\nmastervolume=0.5\n").unwrap();

    let mut config = SoundpoolConfig::load_from_file(&config_path).await.unwrap();
    let mut args = ArgTable::new();
    args.load_file(&ini).await.unwrap();
    config.apply_args(&args);
    let settings = config.playback_settings().unwrap();
    assert_eq!(settings.capacity.get(), 2);

    let (bank, report) = SoundLoader::from_config(&config.resources).load().await.unwrap();
    assert!(report.is_complete());
    assert_eq!(bank.names(), vec!["engine", "horn", "siren"]);

    let clock = ManualClock::new(0);
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let controller =
        PlaybackController::new(settings, bank, Arc::clone(&shared), VirtualDevice::factory(shared));
    let mut service = PlaybackService::new(controller);
    let handle = service.handle();

    for (name, raw) in [("engine", 1), ("horn", 2), ("siren", 3)] {
        handle
            .start(name, SoundParams::default(), at(0.0, 0.0, 0.0), owner(raw))
            .unwrap();
    }
    let report = service.tick();
    assert_eq!(report.results.len(), 3);
    assert_eq!(busy_names(service.controller()), vec!["horn", "siren"]);
    assert!((service.controller().master_volume() - 0.5).abs() < 1e-6);

    clock.advance(200);
    assert_eq!(service.tick().released, 2);
    assert_eq!(service.controller().busy_count(), 0);
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Start { sound: usize, owner: usize },
    Stop { channel: usize },
    StopOwner { owner: usize },
    Advance { ms: u64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, 0usize..4).prop_map(|(sound, owner)| Op::Start { sound, owner }),
        (0usize..6).prop_map(|channel| Op::Stop { channel }),
        (0usize..4).prop_map(|owner| Op::StopOwner { owner }),
        (0u64..300).prop_map(|ms| Op::Advance { ms }),
    ]
}

proptest! {
    #[test]
    fn prop_pool_accounting_holds(ops in prop::collection::vec(op(), 1..60)) {
        let names = ["a", "b", "c"];
        let (mut controller, clock) = rig(4, &[("a", 100), ("b", 250), ("c", 500)]);
        let params = SoundParams::default();

        for op in ops {
            match op {
                Op::Start { sound, owner: raw } => {
                    let now = clock.now_ms();
                    controller.start(names[sound], &params, now, at(1.0, 0.0, 0.0), owner(raw));
                }
                Op::Stop { channel } => {
                    controller.stop(ChannelId::new(channel));
                }
                Op::StopOwner { owner: raw } => {
                    controller.stop_by_owner(owner(raw));
                }
                Op::Advance { ms } => {
                    clock.advance(ms);
                    controller.update();
                }
            }

            let pool = controller.pool();
            prop_assert_eq!(pool.busy_len() + pool.idle_len(), pool.capacity());

            let ids: HashSet<ChannelId> = pool.busy_ids().collect();
            prop_assert_eq!(ids.len(), pool.busy_len());

            // No owner ever plays the same sound twice
            let mut seen = HashSet::new();
            for channel in pool.busy_channels() {
                if let Some(owner) = channel.owner() {
                    prop_assert!(seen.insert((owner, channel.name().to_string())));
                }
            }
        }
    }
}
