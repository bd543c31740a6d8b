//! Listener geometry and spatial update strategies

use crate::domain::channel::Channel;
use crate::domain::volume::VolumeModel;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// A position is usable only if every component is finite
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, `None` for a zero vector
    pub fn normalized(self) -> Option<Vec3> {
        let length = self.length();
        if length <= f32::EPSILON {
            None
        } else {
            Some(self * (1.0 / length))
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Where the listener is and which way is right
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Listener {
    pub position: Vec3,
    pub right: Vec3,
}

impl Listener {
    /// Build from a view direction; falls back to +X as right when the
    /// vectors are degenerate
    pub fn new(position: Vec3, forward: Vec3, up: Vec3) -> Self {
        let right = forward
            .cross(up)
            .normalized()
            .unwrap_or(Vec3::new(1.0, 0.0, 0.0));
        Self { position, right }
    }
}

impl Default for Listener {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 1.0, 0.0))
    }
}

/// How busy channels react to listener and emitter movement
pub trait Spatializer: Send {
    /// Pan factor in `[-1, 1]` for a source at `position`
    fn pan(&self, position: Vec3) -> f32;

    /// Recompute the channel's device parameters
    fn on_sound_update(&self, channel: &mut Channel, model: &VolumeModel);

    fn set_listener(&mut self, _listener: Listener) {}
}

/// Distance attenuation with left/right bias around a single listener
#[derive(Debug, Clone, Default)]
pub struct StereoSpatializer {
    listener: Listener,
}

impl StereoSpatializer {
    pub fn new(listener: Listener) -> Self {
        Self { listener }
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }
}

impl Spatializer for StereoSpatializer {
    fn pan(&self, position: Vec3) -> f32 {
        match (position - self.listener.position).normalized() {
            Some(direction) => direction.dot(self.listener.right).clamp(-1.0, 1.0),
            None => 0.0,
        }
    }

    fn on_sound_update(&self, channel: &mut Channel, model: &VolumeModel) {
        let position = channel.position();
        let distance = self.listener.position.distance(position);
        let mix = model.mix(distance, self.pan(position), channel.volume());
        channel.apply_mix(&mix);
    }

    fn set_listener(&mut self, listener: Listener) {
        self.listener = listener;
    }
}

/// Leaves channels at their base volume
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatSpatializer;

impl Spatializer for FlatSpatializer {
    fn pan(&self, _position: Vec3) -> f32 {
        0.0
    }

    fn on_sound_update(&self, _channel: &mut Channel, _model: &VolumeModel) {}
}
