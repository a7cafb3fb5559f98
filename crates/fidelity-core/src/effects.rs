use bitflags::bitflags;

use crate::preset::QualityPreset;

/// Screen-space passes of the effect chain, in chain order.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EffectPass {
    AmbientOcclusion = 0,
    Bloom = 1,
    DepthOfField = 2,
    ToneMapping = 3,
    FilmGrain = 4,
    Vignette = 5,
    ColorGrading = 6,
}

impl EffectPass {
    pub const ALL: [EffectPass; 7] = [
        EffectPass::AmbientOcclusion,
        EffectPass::Bloom,
        EffectPass::DepthOfField,
        EffectPass::ToneMapping,
        EffectPass::FilmGrain,
        EffectPass::Vignette,
        EffectPass::ColorGrading,
    ];

    /// Identifier used on the JS side.
    pub fn key(self) -> &'static str {
        match self {
            EffectPass::AmbientOcclusion => "ssao",
            EffectPass::Bloom => "bloom",
            EffectPass::DepthOfField => "bokeh",
            EffectPass::ToneMapping => "toneMapping",
            EffectPass::FilmGrain => "filmGrain",
            EffectPass::Vignette => "vignette",
            EffectPass::ColorGrading => "colorGrading",
        }
    }

    /// The single-pass flag for this pass.
    pub const fn flag(self) -> EffectSet {
        match self {
            EffectPass::AmbientOcclusion => EffectSet::AMBIENT_OCCLUSION,
            EffectPass::Bloom => EffectSet::BLOOM,
            EffectPass::DepthOfField => EffectSet::DEPTH_OF_FIELD,
            EffectPass::ToneMapping => EffectSet::TONE_MAPPING,
            EffectPass::FilmGrain => EffectSet::FILM_GRAIN,
            EffectPass::Vignette => EffectSet::VIGNETTE,
            EffectPass::ColorGrading => EffectSet::COLOR_GRADING,
        }
    }
}

bitflags! {
    /// Set of [`EffectPass`]es, one bit per pass in chain order.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct EffectSet: u8 {
        const AMBIENT_OCCLUSION = 1 << 0;
        const BLOOM = 1 << 1;
        const DEPTH_OF_FIELD = 1 << 2;
        const TONE_MAPPING = 1 << 3;
        const FILM_GRAIN = 1 << 4;
        const VIGNETTE = 1 << 5;
        const COLOR_GRADING = 1 << 6;
    }
}

impl EffectSet {
    pub const EMPTY: Self = Self::empty();
    pub const MEDIUM: Self = Self::TONE_MAPPING.union(Self::BLOOM).union(Self::VIGNETTE);
    pub const HIGH: Self = Self::MEDIUM
        .union(Self::AMBIENT_OCCLUSION)
        .union(Self::COLOR_GRADING);
    pub const ULTRA: Self = Self::HIGH.union(Self::DEPTH_OF_FIELD).union(Self::FILM_GRAIN);

    pub const fn has(self, pass: EffectPass) -> bool {
        self.contains(pass.flag())
    }

    pub fn is_subset_of(self, other: EffectSet) -> bool {
        other.contains(self)
    }

    pub fn len(self) -> usize {
        self.bits().count_ones() as usize
    }

    pub fn passes(self) -> impl Iterator<Item = EffectPass> {
        EffectPass::ALL.into_iter().filter(move |p| self.has(*p))
    }
}

impl FromIterator<EffectPass> for EffectSet {
    fn from_iter<I: IntoIterator<Item = EffectPass>>(iter: I) -> Self {
        iter.into_iter().fold(EffectSet::EMPTY, |set, pass| set | pass.flag())
    }
}

/// Whether `pass` should run under `preset`. Nothing runs without
/// post-processing, and bloom additionally follows `bloom_enabled`.
pub fn pass_enabled(preset: &QualityPreset, pass: EffectPass) -> bool {
    if !preset.post_processing_enabled {
        return false;
    }
    match pass {
        EffectPass::Bloom => preset.bloom_enabled && preset.effects.has(pass),
        _ => preset.effects.has(pass),
    }
}

/// GPU-facing snapshot of live effect parameters: 32 bytes, one vec4 of
/// toggles and one vec4 of scalars.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EffectParams {
    /// Bitmask of enabled passes (as f32 for std140 friendliness).
    pub enabled_mask: f32,
    pub bloom_strength: f32,
    pub fog_density: f32,
    pub pixel_ratio: f32,
    pub draw_distance: f32,
    pub lod_bias: f32,
    pub shadow_resolution: f32,
    pub _pad: f32,
}

impl EffectParams {
    pub fn from_preset(preset: &QualityPreset, fog_density: f32, pixel_ratio: f32) -> Self {
        let mask: EffectSet = EffectPass::ALL
            .into_iter()
            .filter(|p| pass_enabled(preset, *p))
            .collect();
        Self {
            enabled_mask: mask.bits() as f32,
            bloom_strength: if pass_enabled(preset, EffectPass::Bloom) {
                preset.bloom_strength
            } else {
                0.0
            },
            fog_density,
            pixel_ratio,
            draw_distance: preset.draw_distance,
            lod_bias: preset.lod_bias,
            shadow_resolution: if preset.shadows_enabled {
                preset.shadow_resolution as f32
            } else {
                0.0
            },
            _pad: 0.0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
