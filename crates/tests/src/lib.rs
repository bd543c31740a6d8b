//! Cross-crate integration tests

#[cfg(test)]
mod playback_integration;
