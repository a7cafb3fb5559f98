//! Consumers backed by plain JavaScript objects.
//!
//! The host passes `{ renderer, effects, scene, stats }`, each optional.
//! Methods are looked up by name on every call, so a host may attach them
//! late. A missing method is logged once per name and otherwise ignored.

use std::cell::RefCell;
use std::collections::HashSet;

use fidelity_core::consumers::{RenderCounters, RendererStats};
use fidelity_core::{
    Consumers, EffectPass, PixelRatio, PostEffectConsumer, SceneConsumer, ShadowConsumer,
};
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

/// A JS object plus the method names already reported missing.
struct JsTarget {
    label: &'static str,
    object: JsValue,
    reported: RefCell<HashSet<&'static str>>,
}

impl JsTarget {
    fn new(label: &'static str, object: JsValue) -> Self {
        Self {
            label,
            object,
            reported: RefCell::new(HashSet::new()),
        }
    }

    fn method(&self, name: &'static str) -> Option<Function> {
        let found = Reflect::get(&self.object, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.dyn_into::<Function>().ok());
        if found.is_none() && self.reported.borrow_mut().insert(name) {
            log::warn!("{} has no '{}' method; skipping", self.label, name);
        }
        found
    }

    fn has_method(&self, name: &str) -> bool {
        Reflect::get(&self.object, &JsValue::from_str(name))
            .map(|v| v.is_function())
            .unwrap_or(false)
    }

    fn call(&self, name: &'static str, args: &[JsValue]) -> Option<JsValue> {
        let method = self.method(name)?;
        let args: Array = args.iter().collect();
        match method.apply(&self.object, &args) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("{}.{} threw: {:?}", self.label, name, err);
                None
            }
        }
    }
}

/// Look up `key` on the consumers bag; `undefined` and `null` mean absent.
fn member(bag: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(bag, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

/// Build the consumer set from a JS bag of objects.
pub fn consumers_from_js(bag: &JsValue, device_pixel_ratio: f32) -> Consumers {
    let mut consumers = Consumers::none();
    if bag.is_undefined() || bag.is_null() {
        return consumers;
    }
    if let Some(obj) = member(bag, "renderer") {
        consumers = consumers.with_renderer(JsRenderer {
            target: JsTarget::new("renderer", obj),
            device_pixel_ratio,
        });
    }
    if let Some(obj) = member(bag, "effects") {
        consumers = consumers.with_effects(JsEffects {
            target: JsTarget::new("effects", obj),
        });
    }
    if let Some(obj) = member(bag, "scene") {
        consumers = consumers.with_scene(JsScene {
            target: JsTarget::new("scene", obj),
        });
    }
    if let Some(obj) = member(bag, "stats") {
        consumers = consumers.with_stats(JsStats {
            target: JsTarget::new("stats", obj),
        });
    }
    consumers
}

struct JsRenderer {
    target: JsTarget,
    device_pixel_ratio: f32,
}

impl ShadowConsumer for JsRenderer {
    fn set_pixel_ratio(&mut self, ratio: PixelRatio) {
        let value = ratio.resolve(self.device_pixel_ratio);
        self.target.call("setPixelRatio", &[JsValue::from_f64(value as f64)]);
    }

    fn set_shadows(&mut self, enabled: bool, resolution: u32) {
        self.target.call(
            "setShadows",
            &[JsValue::from_bool(enabled), JsValue::from_f64(resolution as f64)],
        );
    }

    fn set_antialiasing(&mut self, enabled: bool) {
        // Only honoured by hosts that can rebuild their context.
        if self.target.has_method("setAntialiasing") {
            self.target.call("setAntialiasing", &[JsValue::from_bool(enabled)]);
        }
    }
}

struct JsEffects {
    target: JsTarget,
}

impl PostEffectConsumer for JsEffects {
    fn has_pass(&self, pass: EffectPass) -> bool {
        self.target
            .call("hasPass", &[JsValue::from_str(pass.key())])
            .map(|v| v.is_truthy())
            .unwrap_or(false)
    }

    fn set_pass_enabled(&mut self, pass: EffectPass, enabled: bool) {
        self.target.call(
            "setPassEnabled",
            &[JsValue::from_str(pass.key()), JsValue::from_bool(enabled)],
        );
    }

    fn set_bloom_strength(&mut self, strength: f32) {
        self.target.call("setBloomStrength", &[JsValue::from_f64(strength as f64)]);
    }
}

struct JsScene {
    target: JsTarget,
}

impl SceneConsumer for JsScene {
    fn set_fog_density(&mut self, density: f32) {
        self.target.call("setFogDensity", &[JsValue::from_f64(density as f64)]);
    }

    fn set_draw_distance(&mut self, distance: f32) {
        self.target.call("setDrawDistance", &[JsValue::from_f64(distance as f64)]);
    }
}

struct JsStats {
    target: JsTarget,
}

fn count(obj: &JsValue, key: &str) -> u32 {
    Reflect::get(obj, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_f64())
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as u32)
        .unwrap_or(0)
}

impl RendererStats for JsStats {
    /// Expects `counters()` to return `{ drawCalls, triangles, textures }`.
    fn counters(&self) -> RenderCounters {
        match self.target.call("counters", &[]) {
            Some(obj) => RenderCounters {
                draw_calls: count(&obj, "drawCalls"),
                triangles: count(&obj, "triangles"),
                textures: count(&obj, "textures"),
            },
            None => RenderCounters::default(),
        }
    }
}
