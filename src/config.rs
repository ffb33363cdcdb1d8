//! Configuration System for Tone Field
//! Field physics, tone slot bindings and visual settings

use std::path::Path;

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

/// Environment variable naming an alternative config file
pub const CONFIG_ENV: &str = "TONE_FIELD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "tone_field.json";

// ============================================================================
// Enums
// ============================================================================

/// What a trigger does while muted
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum MuteBehavior {
    /// Glyph still pulses; no sound, no perturbation
    PulseOnly,
    /// The whole trigger is ignored
    SuppressAll,
}

impl Default for MuteBehavior {
    fn default() -> Self {
        Self::PulseOnly
    }
}

// ============================================================================
// Color Scheme
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ColorScheme {
    pub name: String,
    pub particles: Vec<[u8; 3]>,
    pub background: [u8; 3],
    pub glyph: [u8; 3],
    pub glyph_active: [u8; 3],
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::cosmic()
    }
}

impl ColorScheme {
    pub fn cosmic() -> Self {
        Self {
            name: "Cosmic".to_string(),
            particles: vec![
                [255, 100, 150],
                [100, 150, 255],
                [150, 255, 200],
                [255, 200, 100],
            ],
            background: [5, 5, 15],
            glyph: [120, 110, 170],
            glyph_active: [255, 255, 255],
        }
    }

    pub fn ocean() -> Self {
        Self {
            name: "Ocean".to_string(),
            particles: vec![[0, 150, 255], [0, 200, 200], [100, 220, 255]],
            background: [0, 5, 15],
            glyph: [60, 120, 160],
            glyph_active: [200, 255, 255],
        }
    }

    pub fn neon() -> Self {
        Self {
            name: "Neon".to_string(),
            particles: vec![[255, 0, 255], [0, 255, 255], [255, 255, 0], [0, 255, 0]],
            background: [5, 0, 10],
            glyph: [150, 60, 160],
            glyph_active: [255, 200, 255],
        }
    }

    pub fn all_schemes() -> Vec<ColorScheme> {
        vec![Self::cosmic(), Self::ocean(), Self::neon()]
    }
}

// ============================================================================
// Field Configuration
// ============================================================================

/// Particle field parameters. Positions live in percent of the viewport.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct FieldConfig {
    pub count: usize,
    pub min_size: f32,
    pub max_size: f32,
    /// Per-axis bound for the initial velocity, in percent per frame
    pub max_speed: f32,
    pub base_intensity_min: f32,
    pub base_intensity_max: f32,
    pub peak_intensity: f32,
    /// Subtracted from every vy on perturb
    pub perturb_impulse: f32,
    pub intensity_reset_ms: u64,
    pub min_period: f32,
    pub max_period: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            count: 50,
            min_size: 2.0,
            max_size: 6.0,
            max_speed: 0.1,
            base_intensity_min: 0.2,
            base_intensity_max: 0.5,
            peak_intensity: 0.8,
            perturb_impulse: 0.3,
            intensity_reset_ms: 200,
            min_period: 3.0,
            max_period: 5.0,
        }
    }
}

// ============================================================================
// Tone Configuration
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ToneSlotConfig {
    /// Glyph drawn for the slot
    pub label: String,
    pub sample: String,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct ToneConfig {
    pub slots: [ToneSlotConfig; 3],
    pub volume: f32,
    pub pulse_ms: u64,
    pub mute_behavior: MuteBehavior,
}

impl Default for ToneConfig {
    fn default() -> Self {
        let slot = |label: &str, sample: &str| ToneSlotConfig {
            label: label.to_string(),
            sample: sample.to_string(),
        };
        Self {
            slots: [
                slot("4", "assets/sounds/note-low.mp3"),
                slot("0", "assets/sounds/note-mid.mp3"),
                slot("4", "assets/sounds/note-high.mp3"),
            ],
            volume: 0.5,
            pulse_ms: 300,
            mute_behavior: MuteBehavior::default(),
        }
    }
}

// ============================================================================
// Visual Configuration
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct VisualConfig {
    pub color_scheme_index: usize,
    /// Glow radius is size * (1 + intensity * glow_scale)
    pub glow_scale: f32,
    /// Bob amplitude in points
    pub bob_amplitude: f32,
    pub show_key_hints: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            color_scheme_index: 0,
            glow_scale: 3.0,
            bob_amplitude: 6.0,
            show_key_hints: true,
        }
    }
}

// ============================================================================
// App Configuration
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub tones: ToneConfig,
    #[serde(default)]
    pub visual: VisualConfig,
}

impl AppConfig {
    pub fn get_color_scheme(&self) -> ColorScheme {
        let schemes = ColorScheme::all_schemes();
        schemes
            .get(self.visual.color_scheme_index)
            .cloned()
            .unwrap_or_default()
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Path named by `TONE_FIELD_CONFIG`, else `tone_field.json`
    pub fn config_path() -> String {
        std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Config from `config_path()`, defaults when it does not exist or the
    /// file is unusable.
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(Self::config_path())
    }

    pub fn load_or_default_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let f = &self.field;
        let floats = [
            ("min_size", f.min_size),
            ("max_size", f.max_size),
            ("max_speed", f.max_speed),
            ("base_intensity_min", f.base_intensity_min),
            ("base_intensity_max", f.base_intensity_max),
            ("peak_intensity", f.peak_intensity),
            ("perturb_impulse", f.perturb_impulse),
            ("min_period", f.min_period),
            ("max_period", f.max_period),
            ("volume", self.tones.volume),
            ("glow_scale", self.visual.glow_scale),
            ("bob_amplitude", self.visual.bob_amplitude),
        ];
        for (name, value) in floats {
            ensure!(value.is_finite(), "{} must be finite, got {}", name, value);
        }

        ensure!(
            f.min_size > 0.0 && f.min_size <= f.max_size,
            "size range {}..{} is invalid",
            f.min_size,
            f.max_size
        );
        ensure!(f.max_speed >= 0.0, "max_speed must not be negative");
        ensure!(
            0.0 <= f.base_intensity_min
                && f.base_intensity_min <= f.base_intensity_max
                && f.base_intensity_max <= 1.0,
            "baseline intensity range {}..{} is invalid",
            f.base_intensity_min,
            f.base_intensity_max
        );
        ensure!(
            (0.0..=1.0).contains(&f.peak_intensity),
            "peak intensity {} outside 0..1",
            f.peak_intensity
        );
        ensure!(
            f.min_period > 0.0 && f.min_period <= f.max_period,
            "oscillation period range {}..{} is invalid",
            f.min_period,
            f.max_period
        );
        ensure!(
            (0.0..=1.0).contains(&self.tones.volume),
            "volume {} outside 0..1",
            self.tones.volume
        );
        Ok(())
    }
}
