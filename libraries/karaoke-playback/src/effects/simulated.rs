use super::{BassBoost, EffectsBackend, Equalizer, MAX_BASS_BOOST_STRENGTH};
use crate::error::{PlaybackError, Result};
use std::sync::{Arc, Mutex, PoisonError};

const CENTER_FREQUENCIES_MHZ: [u32; 5] = [60_000, 230_000, 910_000, 3_600_000, 14_000_000];
const LEVEL_RANGE_MB: (i16, i16) = (-1500, 1500);

const PRESETS: [(&str, [i16; 5]); 6] = [
    ("Normal", [300, 0, 0, 0, 300]),
    ("Classical", [500, 300, -200, 400, 400]),
    ("Dance", [600, 0, 200, 400, 100]),
    ("Flat", [0, 0, 0, 0, 0]),
    ("Pop", [-100, 200, 500, 100, -200]),
    ("Rock", [500, 300, -100, 300, 500]),
];

/// In-memory effects for engines without a real output session
///
/// Stores levels without processing audio. Clones share the record of opened
/// sessions.
#[derive(Debug, Clone, Default)]
pub struct SimulatedEffectsBackend {
    opened: Arc<Mutex<Vec<i32>>>,
    no_equalizer: bool,
}

impl SimulatedEffectsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to create equalizers, as some output devices do
    #[must_use]
    pub fn without_equalizer(mut self) -> Self {
        self.no_equalizer = true;
        self
    }

    /// Sessions an equalizer or bass boost was opened for, deduplicated
    pub fn opened_sessions(&self) -> Vec<i32> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, session_id: i32) {
        let mut opened = self.opened.lock().unwrap_or_else(PoisonError::into_inner);
        if opened.last() != Some(&session_id) {
            opened.push(session_id);
        }
    }
}

impl EffectsBackend for SimulatedEffectsBackend {
    fn open_equalizer(&mut self, session_id: i32) -> Result<Box<dyn Equalizer>> {
        if self.no_equalizer {
            return Err(PlaybackError::Effects(format!(
                "equalizer not supported for session {session_id}"
            )));
        }
        self.record(session_id);
        Ok(Box::new(SimulatedEqualizer::default()))
    }

    fn open_bass_boost(&mut self, session_id: i32) -> Result<Box<dyn BassBoost>> {
        self.record(session_id);
        Ok(Box::new(SimulatedBassBoost::default()))
    }
}

#[derive(Debug, Default)]
struct SimulatedEqualizer {
    enabled: bool,
    levels: [i16; 5],
    released: bool,
}

impl SimulatedEqualizer {
    fn check(&self) -> Result<()> {
        if self.released {
            Err(PlaybackError::Effects("equalizer released".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Equalizer for SimulatedEqualizer {
    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.check()?;
        self.enabled = enabled;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn band_count(&self) -> u16 {
        CENTER_FREQUENCIES_MHZ.len() as u16
    }

    fn center_frequency_mhz(&self, band: u16) -> u32 {
        CENTER_FREQUENCIES_MHZ
            .get(usize::from(band))
            .copied()
            .unwrap_or_default()
    }

    fn level_range(&self) -> (i16, i16) {
        LEVEL_RANGE_MB
    }

    fn band_level(&self, band: u16) -> i16 {
        self.levels.get(usize::from(band)).copied().unwrap_or_default()
    }

    fn set_band_level(&mut self, band: u16, level_mb: i16) -> Result<()> {
        self.check()?;
        let slot = self
            .levels
            .get_mut(usize::from(band))
            .ok_or_else(|| PlaybackError::Effects(format!("no band {band}")))?;
        *slot = level_mb.clamp(LEVEL_RANGE_MB.0, LEVEL_RANGE_MB.1);
        Ok(())
    }

    fn preset_names(&self) -> Vec<String> {
        PRESETS.iter().map(|(name, _)| (*name).to_string()).collect()
    }

    fn use_preset(&mut self, preset: u16) -> Result<()> {
        self.check()?;
        let (_, levels) = PRESETS
            .get(usize::from(preset))
            .ok_or_else(|| PlaybackError::Effects(format!("no preset {preset}")))?;
        self.levels = *levels;
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[derive(Debug, Default)]
struct SimulatedBassBoost {
    enabled: bool,
    strength: u16,
    released: bool,
}

impl BassBoost for SimulatedBassBoost {
    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if self.released {
            return Err(PlaybackError::Effects("bass boost released".to_string()));
        }
        self.enabled = enabled;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn strength_supported(&self) -> bool {
        true
    }

    fn strength(&self) -> u16 {
        self.strength
    }

    fn set_strength(&mut self, strength: u16) -> Result<()> {
        if self.released {
            return Err(PlaybackError::Effects("bass boost released".to_string()));
        }
        self.strength = strength.min(MAX_BASS_BOOST_STRENGTH);
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
    }
}
