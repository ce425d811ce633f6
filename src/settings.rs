//! Game settings and preferences
//!
//! Loaded from a JSON file next to the binary; every field has a default so a
//! partial file is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{GAME_DURATION_SECS, WIN_COLLECT_THRESHOLD, WIN_COUNTDOWN_SECS};
use crate::error::{FlowError, Result};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live emitters for this preset.
    ///
    /// A full firework volley at High is 60 rockets plus one spark emitter per
    /// proxy vertex each, so only High never drops sparks.
    pub fn max_emitters(&self) -> usize {
        match self {
            QualityPreset::Low => 256,
            QualityPreset::Medium => 1024,
            QualityPreset::High => 4096,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Particle effects (pickup bursts, firework sparks)
    pub particles: bool,
    /// Live emitter cap, set from the quality preset
    pub emitter_cap: usize,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Silence everything
    pub muted: bool,

    // === Gameplay ===
    /// Round length in seconds
    pub game_duration_secs: f32,
    /// Collectibles required for the destination to count
    pub win_collect_threshold: u32,
    /// Seconds between the win trigger and the win overlay
    pub win_countdown_secs: u64,
    /// Seed for firework layout and spark colours
    pub seed: u64,

    // === Diagnostics ===
    /// Warn once when a phase has been current this long without progress
    pub stuck_phase_warn_secs: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            emitter_cap: QualityPreset::Medium.max_emitters(),

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,

            game_duration_secs: GAME_DURATION_SECS,
            win_collect_threshold: WIN_COLLECT_THRESHOLD,
            win_countdown_secs: WIN_COUNTDOWN_SECS,
            seed: 0x5eed,

            stuck_phase_warn_secs: 30,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
        self.emitter_cap = preset.max_emitters();
        self.particles = true;
    }

    /// Effective emitter cap
    pub fn max_emitters(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.emitter_cap
        }
    }

    /// Read settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FlowError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&json).map_err(|source| FlowError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Read settings, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| FlowError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| FlowError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
