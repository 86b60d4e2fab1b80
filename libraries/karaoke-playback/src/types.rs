//! Core types for playback control

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop (or autoplay) when queue ends
    #[default]
    Off,

    /// Loop current track only
    One,

    /// Loop entire queue
    All,
}

impl RepeatMode {
    /// Next mode in the UI cycle: Off → All → One → Off
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// Engine playback state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EngineState {
    /// Nothing loaded (or released)
    #[default]
    Idle,

    /// Loading/buffering media
    Buffering,

    /// Able to play immediately from the current position
    Ready,

    /// Reached the end of the media list
    Ended,
}

/// Configuration for the playback controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Interval between progress samples while playing (default: 250ms)
    #[serde(with = "millis")]
    pub progress_interval: Duration,

    /// "Previous" restarts the current track past this position (default: 3s)
    #[serde(with = "millis")]
    pub restart_threshold: Duration,

    /// How long fallback autoplay waits for a catalog load started
    /// elsewhere (default: 10s)
    #[serde(with = "millis")]
    pub autoplay_wait_timeout: Duration,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_millis(250),
            restart_threshold: Duration::from_secs(3),
            autoplay_wait_timeout: Duration::from_secs(10),
            repeat: RepeatMode::Off,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ControllerConfig::default();
        assert_eq!(config.progress_interval, Duration::from_millis(250));
        assert_eq!(config.restart_threshold, Duration::from_secs(3));
        assert_eq!(config.autoplay_wait_timeout, Duration::from_secs(10));
        assert_eq!(config.repeat, RepeatMode::Off);
    }

    #[test]
    fn repeat_mode_cycles_off_all_one() {
        let mut mode = RepeatMode::Off;
        let mut seen = Vec::new();
        for _ in 0..4 {
            mode = mode.cycle();
            seen.push(mode);
        }
        assert_eq!(
            seen,
            vec![RepeatMode::All, RepeatMode::One, RepeatMode::Off, RepeatMode::All]
        );
    }
}
