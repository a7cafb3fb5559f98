use std::rc::Rc;

use fidelity_core::effects::EffectParams;
use fidelity_core::telemetry::TelemetryPanel;
use fidelity_core::{
    AdaptiveTuning, ControllerOptions, DeviceProfiler, Diagnostic, DiagnosticHub, DiagnosticKind,
    DiagnosticSink, Environment, QualityController,
};
use wasm_bindgen::prelude::*;

mod bridge;
mod env;

pub use env::BrowserEnvironment;

/// Panic messages and `log` records go to the browser console. Repeat
/// calls are no-ops.
fn init_runtime() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
}

/// Forward diagnostics to `callback(kind, context)`.
fn listener_sink(callback: js_sys::Function) -> Rc<dyn DiagnosticSink> {
    Rc::new(move |d: &Diagnostic| {
        let kind = JsValue::from_str(kind_name(d.kind));
        let context = JsValue::from_str(&d.context);
        if let Err(err) = callback.call2(&JsValue::NULL, &kind, &context) {
            log::error!("diagnostic listener threw: {:?}", err);
        }
    })
}

fn kind_name(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::UnknownPreset => "unknown-preset",
        DiagnosticKind::UnsupportedCapability => "unsupported-capability",
        DiagnosticKind::InvalidFrameTime => "invalid-frame-time",
        DiagnosticKind::MissingData => "missing-data",
        DiagnosticKind::InvalidConfig => "invalid-config",
    }
}

#[wasm_bindgen]
pub struct QualityManager {
    controller: QualityController,
    telemetry: TelemetryPanel,
    /// Live effect parameters, rewritten after every change so JS can read
    /// them straight out of linear memory.
    gpu_params: EffectParams,
}

#[wasm_bindgen]
impl QualityManager {
    /// `consumers` is `{ renderer?, effects?, scene?, stats? }`;
    /// `initial_preset` overrides the device-derived starting preset.
    /// Diagnostics raised while constructing (device detection) only reach
    /// the console; use [`with_tuning`](Self::with_tuning) with a listener
    /// to receive them.
    #[wasm_bindgen(constructor)]
    pub fn new(consumers: JsValue, initial_preset: Option<String>) -> QualityManager {
        init_runtime();
        Self::build(&consumers, initial_preset, AdaptiveTuning::default(), DiagnosticHub::new())
    }

    /// Same as the constructor, with adaptive thresholds parsed from JSON.
    /// `listener` is subscribed first, so it also sees a tuning parse
    /// failure (defaults are used then) and device detection fallbacks.
    #[wasm_bindgen]
    pub fn with_tuning(
        consumers: JsValue,
        initial_preset: Option<String>,
        tuning_json: &str,
        listener: Option<js_sys::Function>,
    ) -> QualityManager {
        init_runtime();
        let mut diagnostics = DiagnosticHub::new();
        if let Some(callback) = listener {
            diagnostics.subscribe(listener_sink(callback));
        }
        let tuning = AdaptiveTuning::from_json_or_default(tuning_json, &diagnostics);
        Self::build(&consumers, initial_preset, tuning, diagnostics)
    }

    /// Feed one frame. Returns the new preset name when the adaptive loop
    /// changed it on this frame.
    #[wasm_bindgen]
    pub fn record_frame(&mut self, delta_ms: f64) -> Option<String> {
        let transition = self.controller.record_frame(delta_ms)?;
        self.write_gpu_params();
        Some(transition.to.name().to_string())
    }

    #[wasm_bindgen]
    pub fn apply_preset(&mut self, name: &str) {
        self.controller.apply_preset(name);
        self.write_gpu_params();
    }

    #[wasm_bindgen]
    pub fn enable_adaptive(&mut self, enabled: bool) {
        self.controller.enable_adaptive(enabled);
    }

    #[wasm_bindgen]
    pub fn set_bloom_strength(&mut self, strength: f32) {
        self.controller.set_bloom_strength(strength);
        self.write_gpu_params();
    }

    #[wasm_bindgen]
    pub fn current_preset(&self) -> String {
        self.controller.current_name().to_string()
    }

    #[wasm_bindgen]
    pub fn average_fps(&self) -> f32 {
        self.controller.average_fps()
    }

    #[wasm_bindgen]
    pub fn gpu_tier(&self) -> u8 {
        self.controller.profile().gpu_tier.level()
    }

    #[wasm_bindgen]
    pub fn is_mobile(&self) -> bool {
        self.controller.profile().is_mobile
    }

    /// Overlay snapshot as JSON, refreshed at most once per second.
    #[wasm_bindgen]
    pub fn telemetry_json(&mut self, now_ms: f64) -> String {
        self.telemetry.poll(now_ms, &self.controller).to_json()
    }

    /// `callback(kind, context)` for every degradation event from now on.
    /// Earlier events were only logged.
    #[wasm_bindgen]
    pub fn set_diagnostic_listener(&mut self, callback: js_sys::Function) {
        self.controller.diagnostics_mut().subscribe(listener_sink(callback));
    }

    #[wasm_bindgen]
    pub fn effect_params_ptr(&self) -> *const f32 {
        &self.gpu_params as *const EffectParams as *const f32
    }

    #[wasm_bindgen]
    pub fn effect_params_byte_length(&self) -> usize {
        bytemuck::bytes_of(&self.gpu_params).len()
    }
}

impl QualityManager {
    fn build(
        consumers: &JsValue,
        initial_preset: Option<String>,
        tuning: AdaptiveTuning,
        diagnostics: DiagnosticHub,
    ) -> Self {
        let env = BrowserEnvironment::new();
        let profile = DeviceProfiler::detect(&env, &diagnostics);
        let consumers = bridge::consumers_from_js(consumers, profile.device_pixel_ratio);

        let controller = QualityController::new(
            profile,
            consumers,
            diagnostics,
            ControllerOptions {
                tuning,
                initial_preset,
                ..ControllerOptions::default()
            },
        );
        web_sys::console::log_1(
            &format!("QualityManager ready: preset '{}'", controller.current_name()).into(),
        );

        let gpu_params = controller.effect_params();
        Self {
            controller,
            telemetry: TelemetryPanel::default(),
            gpu_params,
        }
    }

    fn write_gpu_params(&mut self) {
        self.gpu_params = self.controller.effect_params();
    }
}

/// Device profile as JSON, without building a manager. Handy for a
/// "why is my quality low?" debug page.
#[wasm_bindgen]
pub fn detect_device_json() -> String {
    let env = BrowserEnvironment::new();
    let profile = DeviceProfiler::detect(&env, &DiagnosticHub::new());
    serde_json::json!({
        "user_agent": env.user_agent(),
        "is_mobile": profile.is_mobile,
        "is_tablet": profile.is_tablet,
        "is_desktop": profile.is_desktop,
        "is_headset": profile.is_headset,
        "memory_gb": profile.estimated_memory_gb,
        "cores": profile.logical_cores,
        "pixel_ratio": profile.device_pixel_ratio,
        "gpu_tier": profile.gpu_tier.level(),
        "gpu_renderer": profile.gpu_renderer,
    })
    .to_string()
}
