use crate::effects::EffectPass;
use crate::preset::PixelRatio;

/// Renderer-level settings: pixel ratio and shadow mapping.
pub trait ShadowConsumer {
    fn set_pixel_ratio(&mut self, ratio: PixelRatio);

    /// `resolution` is 0 when `enabled` is false.
    fn set_shadows(&mut self, enabled: bool, resolution: u32);

    /// Antialiasing is usually fixed at context creation; hosts that can't
    /// change it at runtime ignore this.
    fn set_antialiasing(&mut self, _enabled: bool) {}
}

/// The post-processing chain.
pub trait PostEffectConsumer {
    /// Whether the host build provides this pass at all.
    fn has_pass(&self, pass: EffectPass) -> bool;

    fn set_pass_enabled(&mut self, pass: EffectPass, enabled: bool);

    fn set_bloom_strength(&mut self, strength: f32);
}

/// Scene-wide settings.
pub trait SceneConsumer {
    fn set_fog_density(&mut self, density: f32);

    /// Camera far clip.
    fn set_draw_distance(&mut self, distance: f32);
}

/// Optional renderer counters for the telemetry overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderCounters {
    pub draw_calls: u32,
    pub triangles: u32,
    pub textures: u32,
}

pub trait RendererStats {
    fn counters(&self) -> RenderCounters;
}

/// Everything the controller writes to. Each capability is optional and
/// checked once per push.
#[derive(Default)]
pub struct Consumers {
    pub renderer: Option<Box<dyn ShadowConsumer>>,
    pub effects: Option<Box<dyn PostEffectConsumer>>,
    pub scene: Option<Box<dyn SceneConsumer>>,
    pub stats: Option<Box<dyn RendererStats>>,
}

impl Consumers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_renderer(mut self, renderer: impl ShadowConsumer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn with_effects(mut self, effects: impl PostEffectConsumer + 'static) -> Self {
        self.effects = Some(Box::new(effects));
        self
    }

    pub fn with_scene(mut self, scene: impl SceneConsumer + 'static) -> Self {
        self.scene = Some(Box::new(scene));
        self
    }

    pub fn with_stats(mut self, stats: impl RendererStats + 'static) -> Self {
        self.stats = Some(Box::new(stats));
        self
    }
}
