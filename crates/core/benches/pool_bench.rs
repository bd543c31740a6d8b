// Performance benchmarks for channel allocation and the update pass
//
// Run with: cargo bench --bench pool_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use soundpool_core::domain::*;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Device that plays forever and discards everything
struct NullDevice {
    playing: bool,
}

impl Device for NullDevice {
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

fn null_device(_id: ChannelId) -> Box<dyn Device> {
    Box::new(NullDevice { playing: false })
}

fn controller(capacity: usize) -> PlaybackController {
    let mut bank = SoundBank::new();
    for i in 0..16 {
        bank.insert(SoundResource::new(format!("sound{i}"), 22050, 1, vec![0.0; 2205]));
    }
    let settings = PlaybackSettings {
        capacity: NonZeroUsize::new(capacity).unwrap(),
        ..PlaybackSettings::default()
    };
    PlaybackController::new(settings, bank, Arc::new(ManualClock::new(0)), null_device)
}

fn bench_volume_mix(c: &mut Criterion) {
    let model = VolumeModel::default();

    c.bench_function("volume_mix", |b| {
        b.iter(|| black_box(model.mix(black_box(12.5), black_box(-0.3), black_box(0.8))));
    });
}

fn bench_start_with_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("start_full_pool");

    for capacity in [32usize, 128, 512].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), capacity, |b, &capacity| {
            let mut controller = controller(capacity);
            let params = SoundParams::default();
            let position = Some(Vec3::new(3.0, 0.0, -4.0));
            for i in 0..capacity {
                controller.start("sound0", &params, 0, position, OwnerId::from_raw(i + 1));
            }

            let mut owner = capacity;
            b.iter(|| {
                owner += 1;
                black_box(controller.start("sound1", &params, 0, position, OwnerId::from_raw(owner)));
            });
        });
    }

    group.finish();
}

fn bench_dedup_lookup(c: &mut Criterion) {
    let mut controller = controller(128);
    let params = SoundParams::default();
    let position = Some(Vec3::new(1.0, 0.0, 0.0));
    for i in 0..128 {
        controller.start(&format!("sound{}", i % 16), &params, 0, position, OwnerId::from_raw(i + 1));
    }

    c.bench_function("dedup_hit_128_busy", |b| {
        b.iter(|| black_box(controller.start("sound15", &params, 0, position, OwnerId::from_raw(128))));
    });
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_busy_channels");

    for busy in [16usize, 128].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(busy), busy, |b, &busy| {
            let mut controller = controller(busy);
            let params = SoundParams::default();
            for i in 0..busy {
                let position = Some(Vec3::new(i as f32 * 0.2, 0.0, -1.0));
                controller.start("sound0", &params, 0, position, None);
            }

            b.iter(|| black_box(controller.update()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_volume_mix,
    bench_start_with_eviction,
    bench_dedup_lookup,
    bench_update
);
criterion_main!(benches);
