use serde::Serialize;

use crate::consumers::RenderCounters;
use crate::controller::QualityController;

/// What the developer overlay shows.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceSnapshot {
    pub fps: u32,
    pub average_fps: f32,
    pub preset: &'static str,
    pub gpu_tier: u8,
    pub gpu_renderer: Option<String>,
    pub is_mobile: bool,
    pub adaptive: bool,
    pub transitions: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renderer: Option<RenderCounters>,
}

impl PerformanceSnapshot {
    pub fn capture(controller: &QualityController) -> Self {
        let profile = controller.profile();
        Self {
            fps: controller.fps(),
            average_fps: controller.average_fps(),
            preset: controller.current_name(),
            gpu_tier: profile.gpu_tier.level(),
            gpu_renderer: profile.gpu_renderer.clone(),
            is_mobile: profile.is_mobile,
            adaptive: controller.is_adaptive(),
            transitions: controller.transitions(),
            renderer: controller.render_counters(),
        }
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys; serialization can't fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Re-captures a snapshot at most once per refresh interval.
#[derive(Clone, Debug)]
pub struct TelemetryPanel {
    refresh_ms: f64,
    last_refresh_ms: Option<f64>,
    latest: Option<PerformanceSnapshot>,
}

pub const DEFAULT_REFRESH_MS: f64 = 1000.0;

impl Default for TelemetryPanel {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_MS)
    }
}

impl TelemetryPanel {
    /// `refresh_ms` of 0 refreshes on every poll; negative or non-finite
    /// values fall back to [`DEFAULT_REFRESH_MS`].
    pub fn new(refresh_ms: f64) -> Self {
        let refresh_ms = if refresh_ms.is_finite() && refresh_ms >= 0.0 {
            refresh_ms
        } else {
            log::warn!("invalid telemetry refresh {}ms, using {}ms", refresh_ms, DEFAULT_REFRESH_MS);
            DEFAULT_REFRESH_MS
        };
        Self {
            refresh_ms,
            last_refresh_ms: None,
            latest: None,
        }
    }

    /// Latest snapshot, refreshed first if the interval has elapsed.
    pub fn poll(&mut self, now_ms: f64, controller: &QualityController) -> &PerformanceSnapshot {
        let due = match self.last_refresh_ms {
            Some(last) => now_ms - last >= self.refresh_ms,
            None => true,
        };
        if due {
            self.last_refresh_ms = Some(now_ms);
            self.latest = Some(PerformanceSnapshot::capture(controller));
        }
        self.latest.get_or_insert_with(|| PerformanceSnapshot::capture(controller))
    }

    pub fn latest(&self) -> Option<&PerformanceSnapshot> {
        self.latest.as_ref()
    }

    pub fn refresh_ms(&self) -> f64 {
        self.refresh_ms
    }
}
