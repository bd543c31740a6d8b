//! Runtime pieces around the core allocator: devices, sound loading and the
//! command queue that feeds a controller from other threads

pub mod audio;

pub use audio::*;
