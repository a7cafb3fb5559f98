use std::fmt;

use crate::effects::EffectSet;
use crate::error::{FidelityError, Result};

/// Fidelity ranks, ordered from cheapest to most expensive.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum QualityRank {
    Emergency = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Ultra = 4,
}

impl QualityRank {
    pub const ALL: [QualityRank; 5] = [
        QualityRank::Emergency,
        QualityRank::Low,
        QualityRank::Medium,
        QualityRank::High,
        QualityRank::Ultra,
    ];

    pub const LOWEST: QualityRank = QualityRank::Emergency;
    pub const HIGHEST: QualityRank = QualityRank::Ultra;

    pub fn name(self) -> &'static str {
        match self {
            QualityRank::Emergency => "emergency",
            QualityRank::Low => "low",
            QualityRank::Medium => "medium",
            QualityRank::High => "high",
            QualityRank::Ultra => "ultra",
        }
    }

    /// Next rank down, or `None` at the bottom.
    pub fn lower(self) -> Option<QualityRank> {
        Self::ALL.get((self as usize).checked_sub(1)?).copied()
    }

    /// Next rank up, or `None` at the top.
    pub fn higher(self) -> Option<QualityRank> {
        Self::ALL.get(self as usize + 1).copied()
    }
}

impl fmt::Display for QualityRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Render pixel ratio requested by a preset.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PixelRatio {
    Fixed(f32),
    /// The display's own ratio, but never below the given floor, so the
    /// top rank can't render coarser than a fixed rank under it.
    DeviceAtLeast(f32),
}

impl PixelRatio {
    /// Concrete ratio for a display with the given device pixel ratio.
    pub fn resolve(self, device_pixel_ratio: f32) -> f32 {
        match self {
            PixelRatio::Fixed(r) => r,
            PixelRatio::DeviceAtLeast(floor) => device_pixel_ratio.max(floor),
        }
    }

    fn is_valid(self) -> bool {
        let r = match self {
            PixelRatio::Fixed(r) | PixelRatio::DeviceAtLeast(r) => r,
        };
        r.is_finite() && r > 0.0
    }
}

/// Immutable bundle of rendering-fidelity parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct QualityPreset {
    pub rank: QualityRank,
    /// Shadow map size in pixels, 0 when shadows are off.
    pub shadow_resolution: u32,
    pub shadows_enabled: bool,
    pub particle_budget: u32,
    pub secondary_particle_budget: u32,
    pub post_processing_enabled: bool,
    pub bloom_enabled: bool,
    pub bloom_strength: f32,
    pub render_pixel_ratio: PixelRatio,
    pub antialiasing_enabled: bool,
    /// Scales the scene's base fog density, in [0, 1].
    pub fog_density_multiplier: f32,
    pub max_dynamic_lights: u32,
    /// World units.
    pub draw_distance: f32,
    /// Larger values simplify geometry sooner.
    pub lod_bias: f32,
    /// Passes enabled when post-processing is on.
    pub effects: EffectSet,
}

impl QualityPreset {
    pub fn name(&self) -> &'static str {
        self.rank.name()
    }

    /// Reject values a renderer can't take: non-positive pixel ratio, fog
    /// multiplier outside [0, 1], negative LOD bias or bloom, and a draw
    /// distance that isn't a positive finite number.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field| FidelityError::InvalidPreset { rank: self.rank, field };
        if !self.render_pixel_ratio.is_valid() {
            return Err(invalid("render_pixel_ratio"));
        }
        if !(0.0..=1.0).contains(&self.fog_density_multiplier) {
            return Err(invalid("fog_density_multiplier"));
        }
        if !(self.lod_bias.is_finite() && self.lod_bias >= 0.0) {
            return Err(invalid("lod_bias"));
        }
        if !(self.draw_distance.is_finite() && self.draw_distance > 0.0) {
            return Err(invalid("draw_distance"));
        }
        if !(self.bloom_strength.is_finite() && self.bloom_strength >= 0.0) {
            return Err(invalid("bloom_strength"));
        }
        Ok(())
    }

    pub const EMERGENCY: Self = Self {
        rank: QualityRank::Emergency,
        shadow_resolution: 0,
        shadows_enabled: false,
        particle_budget: 200,
        secondary_particle_budget: 50,
        post_processing_enabled: false,
        bloom_enabled: false,
        bloom_strength: 0.0,
        render_pixel_ratio: PixelRatio::Fixed(0.5),
        antialiasing_enabled: false,
        fog_density_multiplier: 0.3,
        max_dynamic_lights: 1,
        draw_distance: 40.0,
        lod_bias: 3.0,
        effects: EffectSet::EMPTY,
    };

    pub const LOW: Self = Self {
        rank: QualityRank::Low,
        shadow_resolution: 512,
        shadows_enabled: false,
        particle_budget: 800,
        secondary_particle_budget: 200,
        post_processing_enabled: false,
        bloom_enabled: false,
        bloom_strength: 0.0,
        render_pixel_ratio: PixelRatio::Fixed(0.75),
        antialiasing_enabled: false,
        fog_density_multiplier: 0.5,
        max_dynamic_lights: 2,
        draw_distance: 80.0,
        lod_bias: 2.0,
        effects: EffectSet::EMPTY,
    };

    pub const MEDIUM: Self = Self {
        rank: QualityRank::Medium,
        shadow_resolution: 1024,
        shadows_enabled: true,
        particle_budget: 2000,
        secondary_particle_budget: 500,
        post_processing_enabled: true,
        bloom_enabled: true,
        bloom_strength: 0.35,
        render_pixel_ratio: PixelRatio::Fixed(1.0),
        antialiasing_enabled: true,
        fog_density_multiplier: 0.8,
        max_dynamic_lights: 4,
        draw_distance: 150.0,
        lod_bias: 1.0,
        effects: EffectSet::MEDIUM,
    };

    pub const HIGH: Self = Self {
        rank: QualityRank::High,
        shadow_resolution: 2048,
        shadows_enabled: true,
        particle_budget: 5000,
        secondary_particle_budget: 1200,
        post_processing_enabled: true,
        bloom_enabled: true,
        bloom_strength: 0.5,
        render_pixel_ratio: PixelRatio::Fixed(1.5),
        antialiasing_enabled: true,
        fog_density_multiplier: 1.0,
        max_dynamic_lights: 8,
        draw_distance: 250.0,
        lod_bias: 0.5,
        effects: EffectSet::HIGH,
    };

    pub const ULTRA: Self = Self {
        rank: QualityRank::Ultra,
        shadow_resolution: 4096,
        shadows_enabled: true,
        particle_budget: 10000,
        secondary_particle_budget: 2500,
        post_processing_enabled: true,
        bloom_enabled: true,
        bloom_strength: 0.6,
        render_pixel_ratio: PixelRatio::DeviceAtLeast(1.5),
        antialiasing_enabled: true,
        fog_density_multiplier: 1.0,
        max_dynamic_lights: 16,
        draw_distance: 400.0,
        lod_bias: 0.0,
        effects: EffectSet::ULTRA,
    };
}

/// Read-only lookup from rank (or name) to preset.
///
/// Holds exactly one preset per rank; the controller receives one of these
/// instead of reaching for global constants, so tests can inject their own.
#[derive(Clone, Debug)]
pub struct PresetTable {
    presets: [QualityPreset; 5],
}

impl PresetTable {
    /// Build a table from arbitrary presets. Every rank must be covered and
    /// every preset must pass [`QualityPreset::validate`]; the last preset
    /// given for a rank wins.
    pub fn new(presets: impl IntoIterator<Item = QualityPreset>) -> Result<Self> {
        let mut slots: [Option<QualityPreset>; 5] = Default::default();
        for preset in presets {
            preset.validate()?;
            let idx = preset.rank as usize;
            slots[idx] = Some(preset);
        }
        let mut filled = Vec::with_capacity(5);
        for (rank, slot) in QualityRank::ALL.iter().zip(slots) {
            filled.push(slot.ok_or(FidelityError::IncompleteTable(*rank))?);
        }
        let presets: [QualityPreset; 5] = filled
            .try_into()
            .map_err(|_| FidelityError::IncompleteTable(QualityRank::LOWEST))?;
        Ok(Self { presets })
    }

    /// The built-in five presets.
    pub fn standard() -> Self {
        Self {
            presets: [
                QualityPreset::EMERGENCY,
                QualityPreset::LOW,
                QualityPreset::MEDIUM,
                QualityPreset::HIGH,
                QualityPreset::ULTRA,
            ],
        }
    }

    pub fn get(&self, rank: QualityRank) -> &QualityPreset {
        &self.presets[rank as usize]
    }

    /// Case-insensitive lookup by preset name.
    pub fn rank_of(&self, name: &str) -> Result<QualityRank> {
        let wanted = name.trim();
        QualityRank::ALL
            .iter()
            .copied()
            .find(|rank| rank.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FidelityError::UnknownPreset(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &QualityPreset> {
        self.presets.iter()
    }
}

impl Default for PresetTable {
    fn default() -> Self {
        Self::standard()
    }
}
