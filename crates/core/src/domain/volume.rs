//! Distance based gain and stereo bias
//!
//! Gain falls off with the square of the linear attenuation factor, which
//! gives a steeper, more natural sounding falloff than plain linear
//! attenuation. The stereo bias shrinks with distance so far away sources sit
//! closer to the centre.

use serde::{Deserialize, Serialize};

/// Share of the pan angle used for stereo separation
const PAN_SPREAD: f32 = 0.5;

/// Keeps the remote ear from going fully silent
const EAR_BLEED: f32 = 0.9;

/// Per-ear volume in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Panning {
    pub left: f32,
    pub right: f32,
}

impl Panning {
    pub const CENTER: Panning = Panning {
        left: 0.5,
        right: 0.5,
    };
}

/// Result of evaluating the model for one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mix {
    pub gain: f32,
    /// `None` when the source is out of range and panning is left untouched
    pub panning: Option<Panning>,
}

impl Mix {
    pub const SILENT: Mix = Mix {
        gain: 0.0,
        panning: None,
    };
}

/// Clamp to `[0, 1]`; non-finite input is silence
fn unit(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeModel {
    max_audible_distance: f32,
    master_volume: f32,
}

impl VolumeModel {
    pub fn new(max_audible_distance: f32, master_volume: f32) -> Self {
        Self {
            max_audible_distance,
            master_volume: unit(master_volume),
        }
    }

    pub fn max_audible_distance(&self) -> f32 {
        self.max_audible_distance
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = unit(volume);
    }

    /// Linear falloff factor in `[0, 1]`
    pub fn attenuation(&self, distance: f32) -> f32 {
        if !self.is_audible(distance) {
            return 0.0;
        }
        ((self.max_audible_distance - distance) / self.max_audible_distance).clamp(0.0, 1.0)
    }

    pub fn is_audible(&self, distance: f32) -> bool {
        distance < self.max_audible_distance
    }

    /// Channel gain for a source at `distance` with base volume `base`
    pub fn gain(&self, distance: f32, base: f32) -> f32 {
        let attenuation = self.attenuation(distance);
        attenuation * attenuation * base * self.master_volume
    }

    /// Stereo bias for pan factor `pan` in `[-1, 1]`
    pub fn panning(&self, pan: f32, attenuation: f32) -> Panning {
        let pan = pan.clamp(-1.0, 1.0) * PAN_SPREAD * EAR_BLEED * attenuation;
        Panning {
            left: (pan - 0.5).abs(),
            right: pan + 0.5,
        }
    }

    pub fn mix(&self, distance: f32, pan: f32, base: f32) -> Mix {
        if !self.is_audible(distance) {
            return Mix::SILENT;
        }
        let attenuation = self.attenuation(distance);
        Mix {
            gain: self.gain(distance, base),
            panning: Some(self.panning(pan, attenuation)),
        }
    }
}

impl Default for VolumeModel {
    fn default() -> Self {
        Self::new(30.0, 1.0)
    }
}
