//! Audio effects bound to the engine's output session
//!
//! An equalizer and a bass boost are attached to whatever audio session the
//! engine currently reports. User settings survive session changes: when a
//! new session appears the effects are recreated and the last requested
//! settings re-applied. Each effect is optional; a platform that cannot create
//! one still gets the other.

mod simulated;

pub use simulated::SimulatedEffectsBackend;

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Highest bass boost strength
pub const MAX_BASS_BOOST_STRENGTH: u16 = 1000;

/// One equalizer band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualizerBand {
    pub index: u16,
    pub center_frequency_mhz: u32,
    pub min_level_mb: i16,
    pub max_level_mb: i16,
    pub current_level_mb: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualizerPreset {
    pub index: u16,
    pub name: String,
}

/// Published effects state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioEffectsState {
    pub is_enabled: bool,
    pub bands: Vec<EqualizerBand>,
    pub presets: Vec<EqualizerPreset>,
    /// `None` after manual band edits
    pub current_preset: Option<u16>,
    pub is_available: bool,
    pub bass_boost_enabled: bool,
    /// 0..=1000
    pub bass_boost_strength: u16,
    pub bass_boost_available: bool,
}

/// Platform equalizer attached to one audio session
pub trait Equalizer: Send {
    fn set_enabled(&mut self, enabled: bool) -> Result<()>;
    fn is_enabled(&self) -> bool;
    fn band_count(&self) -> u16;
    fn center_frequency_mhz(&self, band: u16) -> u32;
    /// (min, max) band level in millibels
    fn level_range(&self) -> (i16, i16);
    fn band_level(&self, band: u16) -> i16;
    fn set_band_level(&mut self, band: u16, level_mb: i16) -> Result<()>;
    fn preset_names(&self) -> Vec<String>;
    fn use_preset(&mut self, preset: u16) -> Result<()>;
    fn release(&mut self);
}

/// Platform bass boost attached to one audio session
pub trait BassBoost: Send {
    fn set_enabled(&mut self, enabled: bool) -> Result<()>;
    fn is_enabled(&self) -> bool;
    fn strength_supported(&self) -> bool;
    fn strength(&self) -> u16;
    fn set_strength(&mut self, strength: u16) -> Result<()>;
    fn release(&mut self);
}

/// Creates effect instances for an audio session
pub trait EffectsBackend: Send {
    fn open_equalizer(&mut self, session_id: i32) -> Result<Box<dyn Equalizer>>;
    fn open_bass_boost(&mut self, session_id: i32) -> Result<Box<dyn BassBoost>>;
}

/// Effects manager shared between the controller and the UI
pub type SharedEffects = Arc<Mutex<AudioEffectsManager>>;

/// Owns the effect instances for the current audio session
pub struct AudioEffectsManager {
    backend: Box<dyn EffectsBackend>,
    equalizer: Option<Box<dyn Equalizer>>,
    bass_boost: Option<Box<dyn BassBoost>>,
    session_id: Option<i32>,
    state: watch::Sender<AudioEffectsState>,
}

impl AudioEffectsManager {
    pub fn new(backend: Box<dyn EffectsBackend>) -> Self {
        let (state, _) = watch::channel(AudioEffectsState::default());
        Self {
            backend,
            equalizer: None,
            bass_boost: None,
            session_id: None,
            state,
        }
    }

    /// Wrap a manager for sharing
    pub fn shared(backend: Box<dyn EffectsBackend>) -> SharedEffects {
        Arc::new(Mutex::new(Self::new(backend)))
    }

    pub fn subscribe(&self) -> watch::Receiver<AudioEffectsState> {
        self.state.subscribe()
    }

    /// Current state snapshot
    pub fn state(&self) -> AudioEffectsState {
        self.state.borrow().clone()
    }

    /// Session the effects are attached to
    pub fn session_id(&self) -> Option<i32> {
        self.session_id
    }

    /// Attach effects to an audio session
    ///
    /// No-op when already attached to `session_id`. Effects that fail to open
    /// are reported unavailable; the other one is still set up.
    pub fn initialize(&mut self, session_id: i32) {
        if self.session_id == Some(session_id) && self.equalizer.is_some() {
            return;
        }
        let desired = self.state();
        self.release();
        self.session_id = Some(session_id);

        match self.backend.open_equalizer(session_id) {
            Ok(mut eq) => {
                if let Err(e) = eq.set_enabled(desired.is_enabled) {
                    warn!(session_id, error = %e, "Failed to restore equalizer enabled state");
                }
                let restored = match desired.current_preset {
                    Some(preset) => eq.use_preset(preset),
                    None => desired
                        .bands
                        .iter()
                        .try_for_each(|b| eq.set_band_level(b.index, b.current_level_mb)),
                };
                if let Err(e) = restored {
                    warn!(session_id, error = %e, "Failed to restore equalizer levels");
                }
                self.equalizer = Some(eq);
            }
            Err(e) => warn!(session_id, error = %e, "Equalizer unavailable"),
        }

        match self.backend.open_bass_boost(session_id) {
            Ok(mut bb) => {
                if let Err(e) = bb.set_enabled(desired.bass_boost_enabled) {
                    warn!(session_id, error = %e, "Failed to restore bass boost enabled state");
                }
                if bb.strength_supported() {
                    if let Err(e) = bb.set_strength(desired.bass_boost_strength) {
                        warn!(session_id, error = %e, "Failed to restore bass boost strength");
                    }
                }
                self.bass_boost = Some(bb);
            }
            Err(e) => warn!(session_id, error = %e, "Bass boost unavailable"),
        }

        info!(
            session_id,
            equalizer = self.equalizer.is_some(),
            bass_boost = self.bass_boost.is_some(),
            "Audio effects attached"
        );
        self.refresh();
    }

    /// Rebuild the published state from the live effect instances
    ///
    /// While detached the last known bands and presets are kept so that the
    /// next `initialize` can restore the levels.
    fn refresh(&mut self) {
        let previous = self.state();
        let mut next = AudioEffectsState {
            bands: previous.bands,
            presets: previous.presets,
            current_preset: previous.current_preset,
            is_enabled: previous.is_enabled,
            bass_boost_enabled: previous.bass_boost_enabled,
            bass_boost_strength: previous.bass_boost_strength,
            ..AudioEffectsState::default()
        };

        if let Some(eq) = &self.equalizer {
            let (min, max) = eq.level_range();
            next.bands = (0..eq.band_count())
                .map(|band| EqualizerBand {
                    index: band,
                    center_frequency_mhz: eq.center_frequency_mhz(band),
                    min_level_mb: min,
                    max_level_mb: max,
                    current_level_mb: eq.band_level(band),
                })
                .collect();
            next.presets = eq
                .preset_names()
                .into_iter()
                .enumerate()
                .map(|(index, name)| EqualizerPreset {
                    index: u16::try_from(index).unwrap_or(u16::MAX),
                    name,
                })
                .collect();
            next.is_available = true;
            next.is_enabled = eq.is_enabled();
        }

        if let Some(bb) = &self.bass_boost {
            next.bass_boost_available = bb.strength_supported();
            next.bass_boost_enabled = bb.is_enabled();
            next.bass_boost_strength = bb.strength();
        }

        self.state.send_replace(next);
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if let Some(eq) = self.equalizer.as_mut() {
            eq.set_enabled(enabled)?;
        }
        self.state.send_modify(|s| s.is_enabled = enabled);
        Ok(())
    }

    /// Set one band; the preset becomes custom
    pub fn set_band_level(&mut self, band: u16, level_mb: i16) -> Result<()> {
        if let Some(eq) = self.equalizer.as_mut() {
            eq.set_band_level(band, level_mb)?;
        }
        self.state.send_modify(|s| {
            for b in s.bands.iter_mut().filter(|b| b.index == band) {
                b.current_level_mb = level_mb;
            }
            s.current_preset = None;
        });
        Ok(())
    }

    pub fn use_preset(&mut self, preset: u16) -> Result<()> {
        if let Some(eq) = self.equalizer.as_mut() {
            eq.use_preset(preset)?;
        }
        self.state.send_modify(|s| s.current_preset = Some(preset));
        self.refresh();
        Ok(())
    }

    /// Zero every band
    pub fn reset_to_flat(&mut self) -> Result<()> {
        let Some(eq) = self.equalizer.as_mut() else {
            return Ok(());
        };
        for band in 0..eq.band_count() {
            eq.set_band_level(band, 0)?;
        }
        self.state.send_modify(|s| s.current_preset = None);
        self.refresh();
        Ok(())
    }

    pub fn set_bass_boost_enabled(&mut self, enabled: bool) -> Result<()> {
        if let Some(bb) = self.bass_boost.as_mut() {
            bb.set_enabled(enabled)?;
        }
        self.state.send_modify(|s| s.bass_boost_enabled = enabled);
        Ok(())
    }

    /// Set bass boost strength, clamped to 0..=1000
    pub fn set_bass_boost_strength(&mut self, strength: i32) -> Result<()> {
        let clamped = u16::try_from(strength.clamp(0, i32::from(MAX_BASS_BOOST_STRENGTH)))
            .map_err(|e| PlaybackError::Effects(e.to_string()))?;
        if let Some(bb) = self.bass_boost.as_mut() {
            bb.set_strength(clamped)?;
        }
        self.state.send_modify(|s| s.bass_boost_strength = clamped);
        Ok(())
    }

    /// Detach from the current session
    ///
    /// Requested settings are kept for the next `initialize`.
    pub fn release(&mut self) {
        if let Some(mut eq) = self.equalizer.take() {
            eq.release();
        }
        if let Some(mut bb) = self.bass_boost.take() {
            bb.release();
        }
        if let Some(session_id) = self.session_id.take() {
            debug!(session_id, "Audio effects released");
            self.refresh();
        }
    }
}

impl Drop for AudioEffectsManager {
    fn drop(&mut self) {
        self.release();
    }
}

/// Format a band center frequency, e.g. `60Hz` or `14kHz`
pub fn format_frequency(milli_hertz: u32) -> String {
    let hz = milli_hertz / 1000;
    if hz >= 1000 {
        format!("{}kHz", hz / 1000)
    } else {
        format!("{hz}Hz")
    }
}

/// Format a level in whole decibels, e.g. `+3dB` or `-12dB`
pub fn format_level(milli_bels: i32) -> String {
    let db = milli_bels / 100;
    if milli_bels >= 0 {
        format!("+{db}dB")
    } else {
        format!("{db}dB")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (AudioEffectsManager, SimulatedEffectsBackend) {
        let backend = SimulatedEffectsBackend::new();
        (AudioEffectsManager::new(Box::new(backend.clone())), backend)
    }

    #[test]
    fn initialize_publishes_bands_and_presets() {
        let (mut effects, _) = manager();
        effects.initialize(7);

        let state = effects.state();
        assert!(state.is_available);
        assert!(state.bass_boost_available);
        assert_eq!(state.bands.len(), 5);
        assert_eq!(state.bands[0].center_frequency_mhz, 60_000);
        assert_eq!(state.bands[0].min_level_mb, -1500);
        assert!(!state.presets.is_empty());
        assert_eq!(effects.session_id(), Some(7));
    }

    #[test]
    fn same_session_is_not_reopened() {
        let (mut effects, backend) = manager();
        effects.initialize(3);
        effects.initialize(3);
        assert_eq!(backend.opened_sessions(), vec![3]);

        effects.initialize(4);
        assert_eq!(backend.opened_sessions(), vec![3, 4]);
    }

    #[test]
    fn settings_survive_session_change() {
        let (mut effects, _) = manager();
        effects.initialize(1);
        effects.set_enabled(true).unwrap();
        effects.set_bass_boost_enabled(true).unwrap();
        effects.set_bass_boost_strength(650).unwrap();

        effects.initialize(2);

        let state = effects.state();
        assert!(state.is_enabled);
        assert!(state.bass_boost_enabled);
        assert_eq!(state.bass_boost_strength, 650);
    }

    #[test]
    fn levels_survive_session_change() {
        let (mut effects, _) = manager();
        effects.initialize(1);
        effects.use_preset(5).unwrap();
        let rock = effects.state().bands;

        effects.initialize(2);
        assert_eq!(effects.state().current_preset, Some(5));
        assert_eq!(effects.state().bands, rock);

        effects.set_band_level(0, -700).unwrap();
        effects.initialize(3);
        assert_eq!(effects.state().current_preset, None);
        assert_eq!(effects.state().bands[0].current_level_mb, -700);
    }

    #[test]
    fn band_edit_clears_preset() {
        let (mut effects, _) = manager();
        effects.initialize(1);
        effects.use_preset(2).unwrap();
        assert_eq!(effects.state().current_preset, Some(2));

        effects.set_band_level(1, 300).unwrap();

        let state = effects.state();
        assert_eq!(state.current_preset, None);
        assert_eq!(state.bands[1].current_level_mb, 300);
    }

    #[test]
    fn reset_to_flat_zeroes_bands() {
        let (mut effects, _) = manager();
        effects.initialize(1);
        effects.use_preset(1).unwrap();

        effects.reset_to_flat().unwrap();

        let state = effects.state();
        assert!(state.bands.iter().all(|b| b.current_level_mb == 0));
        assert_eq!(state.current_preset, None);
    }

    #[test]
    fn bass_strength_is_clamped() {
        let (mut effects, _) = manager();
        effects.initialize(1);

        effects.set_bass_boost_strength(5_000).unwrap();
        assert_eq!(effects.state().bass_boost_strength, 1000);

        effects.set_bass_boost_strength(-3).unwrap();
        assert_eq!(effects.state().bass_boost_strength, 0);
    }

    #[test]
    fn missing_equalizer_keeps_bass_boost() {
        let backend = SimulatedEffectsBackend::new().without_equalizer();
        let mut effects = AudioEffectsManager::new(Box::new(backend));
        effects.initialize(9);

        let state = effects.state();
        assert!(!state.is_available);
        assert!(state.bands.is_empty());
        assert!(state.bass_boost_available);
    }

    #[test]
    fn release_marks_effects_unavailable() {
        let (mut effects, _) = manager();
        effects.initialize(1);
        effects.set_enabled(true).unwrap();

        effects.release();

        let state = effects.state();
        assert!(!state.is_available);
        assert!(state.is_enabled);
        assert_eq!(effects.session_id(), None);
    }

    #[test]
    fn band_levels_survive_release() {
        let (mut effects, backend) = manager();
        effects.initialize(1);
        effects.set_band_level(2, 450).unwrap();

        effects.release();
        assert_eq!(effects.state().bands[2].current_level_mb, 450);

        effects.initialize(2);

        let state = effects.state();
        assert!(state.is_available);
        assert_eq!(state.current_preset, None);
        assert_eq!(state.bands[2].current_level_mb, 450);
        assert_eq!(backend.opened_sessions(), vec![1, 2]);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_frequency(60_000), "60Hz");
        assert_eq!(format_frequency(3_600_000), "3kHz");
        assert_eq!(format_frequency(14_000_000), "14kHz");
        assert_eq!(format_level(0), "+0dB");
        assert_eq!(format_level(300), "+3dB");
        assert_eq!(format_level(-1200), "-12dB");
        assert_eq!(format_level(-50), "0dB");
    }
}
