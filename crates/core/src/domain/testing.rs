//! Test doubles shared by the unit tests

use crate::domain::audio::{Device, DeviceError, Result, SoundResource};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct FakeState {
    pub playing: bool,
    pub refuse: bool,
    pub plays: usize,
    pub stops: usize,
    pub loops: i32,
    pub volume: u8,
    pub panning: (u8, u8),
    pub fade: Option<u64>,
}

/// Device whose playing state is flipped by the test
pub struct FakeDevice {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDevice {
    pub fn new() -> (Self, Arc<Mutex<FakeState>>) {
        let state = Arc::new(Mutex::new(FakeState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl Device for FakeDevice {
    fn play(&mut self, resource: &Arc<SoundResource>, loops: i32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.refuse {
            return Err(DeviceError::Refused(resource.name().to_string()));
        }
        state.playing = true;
        state.plays += 1;
        state.loops = loops;
        state.fade = None;
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.playing = false;
        state.stops += 1;
    }

    fn fade_out(&mut self, duration_ms: u64) {
        self.state.lock().unwrap().fade = Some(duration_ms);
    }

    fn set_volume(&mut self, level: u8) {
        self.state.lock().unwrap().volume = level;
    }

    fn set_panning(&mut self, left: u8, right: u8) {
        self.state.lock().unwrap().panning = (left, right);
    }

    fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }
}

/// Builds fake devices for a pool and keeps their state handles by channel index
#[derive(Default)]
pub struct FakeRack {
    pub states: Vec<Arc<Mutex<FakeState>>>,
}

impl FakeRack {
    pub fn device(&mut self) -> Box<dyn Device> {
        let (device, state) = FakeDevice::new();
        self.states.push(state);
        Box::new(device)
    }

    pub fn state(&self, index: usize) -> std::sync::MutexGuard<'_, FakeState> {
        self.states[index].lock().unwrap()
    }
}
