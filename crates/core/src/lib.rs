//! Bounded playback-channel allocation for positional sound effects
//!
//! The [`domain`] module holds the channel pool, the emission registry, the
//! distance volume model and the [`PlaybackController`](domain::PlaybackController)
//! that ties them together. Audio output and file decoding live in
//! `soundpool-infra`.

pub mod domain;

pub use domain::*;
