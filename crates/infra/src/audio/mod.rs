//! Audio-side implementations of the core traits
//!
//! - [`virtual_device`]: clock-driven devices for simulation and tests
//! - [`wav_loader`]: WAV decoding into a sound bank
//! - [`service`]: cross-thread command queue in front of the controller

pub mod service;
pub mod virtual_device;
pub mod wav_loader;

pub use service::{PlaybackService, ServiceError, ServiceHandle, TickReport};
pub use virtual_device::VirtualDevice;
pub use wav_loader::{decode_wav, LoadError, LoadReport, SoundLoader};
