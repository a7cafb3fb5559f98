use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticHub;
use crate::error::{FidelityError, Result};

/// Thresholds for the adaptive stepping loop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveTuning {
    /// Rolling average below which quality drops one rank.
    pub downgrade_below_fps: f32,
    /// Rolling average above which an upgrade is considered.
    pub upgrade_above_fps: f32,
    /// Every sample in a full window must exceed this for an upgrade.
    pub sustained_floor_fps: f32,
    /// Number of one-window samples kept in history.
    pub history_len: usize,
    /// Length of one measurement window in milliseconds.
    pub window_ms: f64,
}

impl Default for AdaptiveTuning {
    fn default() -> Self {
        Self {
            downgrade_below_fps: 25.0,
            upgrade_above_fps: 55.0,
            sustained_floor_fps: 50.0,
            history_len: 10,
            window_ms: 1000.0,
        }
    }
}

impl AdaptiveTuning {
    /// Parse tuning from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Self = serde_json::from_str(json)
            .map_err(|e| FidelityError::InvalidTuning(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse tuning, or report the failure to `diagnostics` and fall back
    /// to the defaults. Subscribe sinks before calling this.
    pub fn from_json_or_default(json: &str, diagnostics: &DiagnosticHub) -> Self {
        Self::from_json(json).unwrap_or_else(|err| {
            diagnostics.report(&err);
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_len == 0 {
            return Err(FidelityError::InvalidTuning("history_len must be > 0".into()));
        }
        if !(self.window_ms.is_finite() && self.window_ms > 0.0) {
            return Err(FidelityError::InvalidTuning("window_ms must be > 0".into()));
        }
        if self.downgrade_below_fps >= self.upgrade_above_fps {
            return Err(FidelityError::InvalidTuning(format!(
                "downgrade threshold {} must sit below upgrade threshold {}",
                self.downgrade_below_fps, self.upgrade_above_fps
            )));
        }
        if self.sustained_floor_fps > self.upgrade_above_fps {
            return Err(FidelityError::InvalidTuning(
                "sustained floor must not exceed the upgrade threshold".into(),
            ));
        }
        Ok(())
    }
}

/// Scene values a preset scales rather than replaces.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneBaseline {
    /// Fog density at multiplier 1.0.
    pub fog_density: f32,
}

impl Default for SceneBaseline {
    fn default() -> Self {
        Self { fog_density: 0.015 }
    }
}
