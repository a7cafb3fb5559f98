#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use fidelity_core::consumers::{RenderCounters, RendererStats};
use fidelity_core::{
    EffectPass, PixelRatio, PostEffectConsumer, QualityController, SceneConsumer, ShadowConsumer,
};

/// Everything the consumers were told, in one shared place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Recorded {
    pub pixel_ratio: Option<PixelRatio>,
    pub shadows: Option<(bool, u32)>,
    pub antialiasing: Option<bool>,
    pub passes: Vec<(EffectPass, bool)>,
    pub bloom_strength: Option<f32>,
    pub fog_density: Option<f32>,
    pub draw_distance: Option<f32>,
    pub pushes: usize,
}

impl Recorded {
    pub fn pass(&self, pass: EffectPass) -> Option<bool> {
        self.passes.iter().rev().find(|(p, _)| *p == pass).map(|(_, on)| *on)
    }

    /// Final state, ignoring how many times it was written.
    pub fn state(&self) -> Recorded {
        let mut passes: Vec<(EffectPass, bool)> = EffectPass::ALL
            .iter()
            .filter_map(|p| self.pass(*p).map(|on| (*p, on)))
            .collect();
        passes.sort_by_key(|(p, _)| *p as u8);
        Recorded {
            passes,
            pushes: 0,
            ..self.clone()
        }
    }
}

pub type Shared = Rc<RefCell<Recorded>>;

pub struct MockRenderer(pub Shared);

impl ShadowConsumer for MockRenderer {
    fn set_pixel_ratio(&mut self, ratio: PixelRatio) {
        let mut r = self.0.borrow_mut();
        r.pixel_ratio = Some(ratio);
        r.pushes += 1;
    }

    fn set_shadows(&mut self, enabled: bool, resolution: u32) {
        self.0.borrow_mut().shadows = Some((enabled, resolution));
    }

    fn set_antialiasing(&mut self, enabled: bool) {
        self.0.borrow_mut().antialiasing = Some(enabled);
    }
}

/// Effect chain; passes in `missing` are absent from the host build.
pub struct MockEffects {
    pub log: Shared,
    pub missing: Vec<EffectPass>,
}

impl PostEffectConsumer for MockEffects {
    fn has_pass(&self, pass: EffectPass) -> bool {
        !self.missing.contains(&pass)
    }

    fn set_pass_enabled(&mut self, pass: EffectPass, enabled: bool) {
        self.log.borrow_mut().passes.push((pass, enabled));
    }

    fn set_bloom_strength(&mut self, strength: f32) {
        self.log.borrow_mut().bloom_strength = Some(strength);
    }
}

pub struct MockScene(pub Shared);

impl SceneConsumer for MockScene {
    fn set_fog_density(&mut self, density: f32) {
        self.0.borrow_mut().fog_density = Some(density);
    }

    fn set_draw_distance(&mut self, distance: f32) {
        self.0.borrow_mut().draw_distance = Some(distance);
    }
}

pub struct FixedStats(pub RenderCounters);

impl RendererStats for FixedStats {
    fn counters(&self) -> RenderCounters {
        self.0
    }
}

pub fn recording_consumers(missing: Vec<EffectPass>) -> (fidelity_core::Consumers, Shared) {
    let shared: Shared = Rc::new(RefCell::new(Recorded::default()));
    let consumers = fidelity_core::Consumers::none()
        .with_renderer(MockRenderer(shared.clone()))
        .with_effects(MockEffects {
            log: shared.clone(),
            missing,
        })
        .with_scene(MockScene(shared.clone()));
    (consumers, shared)
}

/// Feed one full measurement window that reports exactly `fps`.
pub fn run_window(controller: &mut QualityController, fps: u32) -> Option<fidelity_core::Transition> {
    let frame = 1000.0 / fps as f64;
    for _ in 0..fps - 1 {
        assert_eq!(controller.record_frame(frame), None, "window closed early");
    }
    // a slightly long final frame makes sure the window closes
    controller.record_frame(frame + 1.0)
}
