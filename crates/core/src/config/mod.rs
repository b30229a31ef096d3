use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Palette, Result};

/// Top-level configuration structure for the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub timing: TimingConfig,
    pub fader: FaderConfig,
    pub output: OutputConfig,
    pub text: TextConfig,
    /// Replaces the stock controller palette when present.
    pub palette: Option<Palette>,
    /// Fixed seed for randomized effects; entropy when absent.
    pub seed: Option<u64>,
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn palette(&self) -> Palette {
        self.palette.clone().unwrap_or_default()
    }
}

/// Timing of the effects whose lifetime is not fully set by a trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Upper bound on how long a held pad keeps its light.
    pub max_hold_ms: f64,
    /// Fade-out applied when a held effect is released.
    pub release_fade_ms: f64,
    pub strobe_cycles: usize,
    /// Portion of each strobe cycle spent lit.
    pub strobe_on_fraction: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            max_hold_ms: 10_000.0,
            release_fade_ms: 150.0,
            strobe_cycles: 4,
            strobe_on_fraction: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaderConfig {
    /// Share of a standard fade spent rising towards the target color.
    pub attack_fraction: f64,
}

impl Default for FaderConfig {
    fn default() -> Self {
        Self {
            attack_fraction: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Alpha used when mirroring the grid on screen.
    pub screen_alpha: f32,
    /// Color of the selected page / mode indicator on the control strip.
    pub indicator_color: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            screen_alpha: 0.85,
            indicator_color: "white".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Extra words registered as `text_<word>` / `scroll_<word>` effects.
    pub words: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{ "timing": { "strobe_cycles": 6 }, "seed": 7 }"#)
                .unwrap();
        assert_eq!(config.timing.strobe_cycles, 6);
        assert_eq!(config.timing.max_hold_ms, 10_000.0);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.palette().lp_color("red"), Some(5));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = EngineConfig::from_json_str("{ nope").unwrap_err();
        assert!(format!("{err}").contains("invalid json"));
    }
}
