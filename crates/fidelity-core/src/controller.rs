use glam::Vec3;

use crate::config::{AdaptiveTuning, SceneBaseline};
use crate::consumers::{Consumers, RenderCounters};
use crate::culling::{cull_by_distance, CullReport, Cullable, MaybeSend};
use crate::device::{DeviceProfile, GpuTier};
use crate::diagnostics::{Diagnostic, DiagnosticHub, DiagnosticKind};
use crate::effects::{pass_enabled, EffectParams, EffectPass};
use crate::error::{FidelityError, Result};
use crate::monitor::{FpsHistory, FrameRateMonitor};
use crate::preset::{PresetTable, QualityPreset, QualityRank};

/// Pick the starting rank for a device. First matching rule wins.
pub fn initial_rank_for(profile: &DeviceProfile) -> QualityRank {
    if profile.is_mobile {
        if profile.estimated_memory_gb < 4.0 {
            return QualityRank::Low;
        }
        if profile.is_headset || profile.estimated_memory_gb >= 6.0 {
            return QualityRank::Medium;
        }
        return QualityRank::Low;
    }
    if profile.is_headset {
        return QualityRank::Medium;
    }
    match profile.gpu_tier {
        GpuTier::Low => QualityRank::Low,
        GpuTier::Medium => QualityRank::Medium,
        GpuTier::High => QualityRank::High,
        GpuTier::Ultra => QualityRank::Ultra,
    }
}

/// Construction-time knobs for [`QualityController`].
#[derive(Clone, Debug)]
pub struct ControllerOptions {
    pub table: PresetTable,
    pub tuning: AdaptiveTuning,
    pub baseline: SceneBaseline,
    /// Preset name to start with; derived from the device profile if unset.
    pub initial_preset: Option<String>,
    pub adaptive: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            table: PresetTable::standard(),
            tuning: AdaptiveTuning::default(),
            baseline: SceneBaseline::default(),
            initial_preset: None,
            adaptive: true,
        }
    }
}

/// A rank change made by the adaptive loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub from: QualityRank,
    pub to: QualityRank,
    pub average_fps: f32,
}

/// Owns the live quality state and keeps frame rate inside the target band
/// by stepping between adjacent presets.
///
/// All methods are meant to be called from the frame loop; nothing here
/// defers work, so a preset change is fully pushed before the call returns.
pub struct QualityController {
    table: PresetTable,
    tuning: AdaptiveTuning,
    baseline: SceneBaseline,
    profile: DeviceProfile,
    consumers: Consumers,
    diagnostics: DiagnosticHub,
    current: QualityRank,
    /// Live copy of the current preset, with runtime overrides applied.
    active: QualityPreset,
    monitor: FrameRateMonitor,
    history: FpsHistory,
    adaptive: bool,
    transitions: u32,
}

impl QualityController {
    pub fn new(
        profile: DeviceProfile,
        consumers: Consumers,
        diagnostics: DiagnosticHub,
        options: ControllerOptions,
    ) -> Self {
        let tuning = match options.tuning.validate() {
            Ok(()) => options.tuning,
            Err(err) => {
                diagnostics.report(&err);
                AdaptiveTuning::default()
            }
        };

        let derived = initial_rank_for(&profile);
        let initial = match options.initial_preset.as_deref() {
            Some(name) => options.table.rank_of(name).unwrap_or_else(|err| {
                diagnostics.report(&err);
                derived
            }),
            None => derived,
        };

        let mut controller = Self {
            active: options.table.get(initial).clone(),
            table: options.table,
            tuning,
            baseline: options.baseline,
            profile,
            consumers,
            diagnostics,
            current: initial,
            monitor: FrameRateMonitor::new(tuning.window_ms),
            history: FpsHistory::new(tuning.history_len),
            adaptive: options.adaptive,
            transitions: 0,
        };
        log::info!(
            "quality controller starting at '{}' (gpu tier {:?}, mobile {})",
            initial,
            controller.profile.gpu_tier,
            controller.profile.is_mobile
        );
        controller.apply_rank(initial);
        controller
    }

    /// Switch to the named preset. Unknown names are reported and ignored.
    pub fn apply_preset(&mut self, name: &str) {
        if let Err(err) = self.try_apply_preset(name) {
            self.diagnostics.report(&err);
        }
    }

    /// Like [`apply_preset`](Self::apply_preset) but hands the failure back.
    pub fn try_apply_preset(&mut self, name: &str) -> Result<()> {
        let rank = self.table.rank_of(name)?;
        self.apply_rank(rank);
        Ok(())
    }

    pub fn apply_rank(&mut self, rank: QualityRank) {
        self.active = self.table.get(rank).clone();
        self.current = rank;
        self.push_all();
    }

    /// Feed one frame's duration. Returns the transition if this frame
    /// closed a window and the adaptive loop changed rank.
    pub fn record_frame(&mut self, delta_ms: f64) -> Option<Transition> {
        if !delta_ms.is_finite() || delta_ms < 0.0 {
            self.diagnostics.report(&FidelityError::InvalidFrameTime(delta_ms));
            return None;
        }
        let fps = self.monitor.tick(delta_ms)?;
        self.history.push(fps);
        log::debug!(
            "fps window closed: {} (avg {:?}, {} samples)",
            fps,
            self.history.average(),
            self.history.len()
        );
        if self.adaptive {
            self.step()
        } else {
            None
        }
    }

    /// Toggle automatic stepping. History is kept.
    pub fn enable_adaptive(&mut self, enabled: bool) {
        self.adaptive = enabled;
    }

    /// Override bloom strength until the next preset application.
    pub fn set_bloom_strength(&mut self, strength: f32) {
        let strength = if strength.is_finite() { strength.max(0.0) } else { 0.0 };
        self.active.bloom_strength = strength;
        if let Some(effects) = self.consumers.effects.as_mut() {
            if effects.has_pass(EffectPass::Bloom) {
                effects.set_bloom_strength(strength);
            } else {
                self.diagnostics.report(&FidelityError::UnsupportedCapability(
                    "bloom pass".into(),
                ));
            }
        }
    }

    fn step(&mut self) -> Option<Transition> {
        let average_fps = self.history.average()?;
        let from = self.current;

        if average_fps < self.tuning.downgrade_below_fps {
            let to = from.lower()?;
            log::info!("average {:.1} fps, dropping quality {} -> {}", average_fps, from, to);
            self.apply_rank(to);
            self.transitions += 1;
            return Some(Transition { from, to, average_fps });
        }

        if average_fps > self.tuning.upgrade_above_fps
            && self.history.is_full()
            && self.history.all_above(self.tuning.sustained_floor_fps)
        {
            let to = from.higher()?;
            log::info!("average {:.1} fps, raising quality {} -> {}", average_fps, from, to);
            self.apply_rank(to);
            self.history.clear();
            self.transitions += 1;
            return Some(Transition { from, to, average_fps });
        }

        None
    }

    fn fog_density(&self) -> f32 {
        self.baseline.fog_density * self.active.fog_density_multiplier
    }

    fn push_all(&mut self) {
        let fog = self.fog_density();
        let preset = &self.active;

        if let Some(renderer) = self.consumers.renderer.as_mut() {
            renderer.set_pixel_ratio(preset.render_pixel_ratio);
            let resolution = if preset.shadows_enabled { preset.shadow_resolution } else { 0 };
            renderer.set_shadows(preset.shadows_enabled, resolution);
            renderer.set_antialiasing(preset.antialiasing_enabled);
        }

        if let Some(effects) = self.consumers.effects.as_mut() {
            for pass in EffectPass::ALL {
                let wanted = pass_enabled(preset, pass);
                if effects.has_pass(pass) {
                    effects.set_pass_enabled(pass, wanted);
                } else if wanted {
                    self.diagnostics.emit(Diagnostic::new(
                        DiagnosticKind::UnsupportedCapability,
                        format!("effect pass '{}' unavailable, skipped", pass.key()),
                    ));
                }
            }
            if effects.has_pass(EffectPass::Bloom) {
                effects.set_bloom_strength(preset.bloom_strength);
            }
        }

        if let Some(scene) = self.consumers.scene.as_mut() {
            scene.set_fog_density(fog);
            scene.set_draw_distance(preset.draw_distance);
        }
    }

    pub fn current_rank(&self) -> QualityRank {
        self.current
    }

    pub fn current_name(&self) -> &'static str {
        self.current.name()
    }

    pub fn active_preset(&self) -> &QualityPreset {
        &self.active
    }

    pub fn table(&self) -> &PresetTable {
        &self.table
    }

    pub fn tuning(&self) -> &AdaptiveTuning {
        &self.tuning
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn diagnostics(&self) -> &DiagnosticHub {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticHub {
        &mut self.diagnostics
    }

    pub fn history(&self) -> &FpsHistory {
        &self.history
    }

    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    /// Rate of the last closed window.
    pub fn fps(&self) -> u32 {
        self.monitor.last_fps()
    }

    /// Rolling average over the history, 0 before the first window closes.
    pub fn average_fps(&self) -> f32 {
        self.history.average().unwrap_or(0.0)
    }

    /// Number of adaptive rank changes so far.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    pub fn render_counters(&self) -> Option<RenderCounters> {
        self.consumers.stats.as_ref().map(|s| s.counters())
    }

    /// Distance-cull `objects`, defaulting to the active draw distance.
    pub fn cull<T: Cullable + MaybeSend>(
        &self,
        objects: &mut [T],
        viewpoint: Vec3,
        max_distance: Option<f32>,
    ) -> CullReport {
        cull_by_distance(
            objects,
            viewpoint,
            max_distance.unwrap_or(self.active.draw_distance),
        )
    }

    /// Live parameters packed for direct GPU upload.
    pub fn effect_params(&self) -> EffectParams {
        let ratio = self
            .active
            .render_pixel_ratio
            .resolve(self.profile.device_pixel_ratio);
        EffectParams::from_preset(&self.active, self.fog_density(), ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(mobile: bool, headset: bool, memory: f32, tier: GpuTier) -> DeviceProfile {
        DeviceProfile {
            is_mobile: mobile,
            is_desktop: !mobile && !headset,
            is_headset: headset,
            estimated_memory_gb: memory,
            gpu_tier: tier,
            ..DeviceProfile::default()
        }
    }

    #[test]
    fn test_initial_rank_table() {
        assert_eq!(initial_rank_for(&profile(true, false, 3.0, GpuTier::Ultra)), QualityRank::Low);
        assert_eq!(initial_rank_for(&profile(true, true, 4.0, GpuTier::Low)), QualityRank::Medium);
        assert_eq!(initial_rank_for(&profile(true, false, 8.0, GpuTier::Low)), QualityRank::Medium);
        assert_eq!(initial_rank_for(&profile(true, false, 4.0, GpuTier::Ultra)), QualityRank::Low);
        assert_eq!(initial_rank_for(&profile(false, true, 2.0, GpuTier::Low)), QualityRank::Medium);
        assert_eq!(initial_rank_for(&profile(false, false, 16.0, GpuTier::Low)), QualityRank::Low);
        assert_eq!(initial_rank_for(&profile(false, false, 16.0, GpuTier::Medium)), QualityRank::Medium);
        assert_eq!(initial_rank_for(&profile(false, false, 16.0, GpuTier::High)), QualityRank::High);
        assert_eq!(initial_rank_for(&profile(false, false, 16.0, GpuTier::Ultra)), QualityRank::Ultra);
    }

    #[test]
    fn test_low_memory_mobile_headset_still_low() {
        // rule 1 precedes rule 2
        assert_eq!(initial_rank_for(&profile(true, true, 2.0, GpuTier::Ultra)), QualityRank::Low);
    }

    #[test]
    fn test_unknown_initial_name_falls_back_to_profile() {
        let options = ControllerOptions {
            initial_preset: Some("cinematic".into()),
            ..ControllerOptions::default()
        };
        let c = QualityController::new(
            profile(false, false, 8.0, GpuTier::High),
            Consumers::none(),
            DiagnosticHub::new(),
            options,
        );
        assert_eq!(c.current_rank(), QualityRank::High);
    }

    #[test]
    fn test_invalid_tuning_replaced_by_default() {
        let options = ControllerOptions {
            tuning: AdaptiveTuning { history_len: 0, ..AdaptiveTuning::default() },
            ..ControllerOptions::default()
        };
        let c = QualityController::new(
            DeviceProfile::default(),
            Consumers::none(),
            DiagnosticHub::new(),
            options,
        );
        assert_eq!(c.tuning().history_len, 10);
    }

    #[test]
    fn test_negative_frame_time_ignored() {
        let mut c = QualityController::new(
            DeviceProfile::default(),
            Consumers::none(),
            DiagnosticHub::new(),
            ControllerOptions::default(),
        );
        assert_eq!(c.record_frame(-5.0), None);
        assert_eq!(c.record_frame(f64::NAN), None);
        assert!(c.history().is_empty());
    }

    #[test]
    fn test_effect_params_resolve_device_ratio() {
        let mut p = DeviceProfile::default();
        p.device_pixel_ratio = 2.0;
        p.gpu_tier = GpuTier::Ultra;
        let c = QualityController::new(p, Consumers::none(), DiagnosticHub::new(), ControllerOptions::default());
        assert_eq!(c.current_rank(), QualityRank::Ultra);
        assert_eq!(c.effect_params().pixel_ratio, 2.0);
    }
}
