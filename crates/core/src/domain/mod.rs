//! Domain entities and business rules

pub mod args;
pub mod audio;
pub mod channel;
pub mod clock;
pub mod command;
pub mod config;
pub mod controller;
pub mod lines;
pub mod pool;
pub mod registry;
pub mod spatial;
pub mod volume;

#[cfg(test)]
mod testing;

// Re-export specific items to avoid ambiguous glob imports
pub use args::{ArgTable, ArgValue};
pub use audio::{Device, DeviceError, ResourceTable, SoundBank, SoundResource, MAX_PANNING, MAX_VOLUME};
pub use channel::{Channel, ChannelId, ChannelSnapshot, OwnerId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, CommandResult};
pub use config::{AudioConfig, ConfigError, PoolConfig, ResourceConfig, SoundpoolConfig};
pub use controller::{PlaybackController, PlaybackSettings, SoundParams, StartError};
pub use pool::{ChannelPool, PoolSnapshot, DEFAULT_CAPACITY};
pub use registry::Registry;
pub use spatial::{FlatSpatializer, Listener, Spatializer, StereoSpatializer, Vec3};
pub use volume::{Mix, Panning, VolumeModel};
