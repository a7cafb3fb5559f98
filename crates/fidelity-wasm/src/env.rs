use fidelity_core::device::GpuRendererInfo;
use fidelity_core::{Environment, ScratchGpuContext};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlCanvasElement, WebGlRenderingContext, WebglDebugRendererInfo, WebglLoseContext};

/// Host facts read from `window` and `navigator`. Works without a window
/// too (workers, tests); every hint then comes back empty.
pub struct BrowserEnvironment {
    window: Option<web_sys::Window>,
}

impl BrowserEnvironment {
    pub fn new() -> Self {
        Self {
            window: web_sys::window(),
        }
    }

    fn navigator(&self) -> Option<web_sys::Navigator> {
        self.window.as_ref().map(|w| w.navigator())
    }
}

impl Environment for BrowserEnvironment {
    fn user_agent(&self) -> String {
        self.navigator()
            .and_then(|n| n.user_agent().ok())
            .unwrap_or_default()
    }

    fn device_memory_gb(&self) -> Option<f32> {
        // Chromium only, and not in the web-sys bindings
        let navigator = self.navigator()?;
        js_sys::Reflect::get(&navigator, &JsValue::from_str("deviceMemory"))
            .ok()?
            .as_f64()
            .map(|gb| gb as f32)
    }

    fn hardware_concurrency(&self) -> Option<u32> {
        let cores = self.navigator()?.hardware_concurrency();
        (cores.is_finite() && cores >= 1.0).then_some(cores as u32)
    }

    fn max_touch_points(&self) -> u32 {
        self.navigator()
            .map(|n| n.max_touch_points().max(0) as u32)
            .unwrap_or(0)
    }

    fn device_pixel_ratio(&self) -> Option<f32> {
        self.window.as_ref().map(|w| w.device_pixel_ratio() as f32)
    }

    fn open_scratch_context(&self) -> Option<Box<dyn ScratchGpuContext + '_>> {
        let context = WebGlScratchContext::open(self.window.as_ref()?);
        if context.is_none() {
            log::debug!("could not create a WebGL context for the GPU query");
        }
        Some(Box::new(context?))
    }
}

/// Offscreen WebGL context that exists only to read the debug renderer
/// strings. The context is explicitly lost on drop; browsers cap live
/// contexts and evict the oldest, which could be the scene's own.
pub struct WebGlScratchContext {
    gl: WebGlRenderingContext,
}

impl WebGlScratchContext {
    fn open(window: &web_sys::Window) -> Option<Self> {
        let canvas: HtmlCanvasElement = window
            .document()?
            .create_element("canvas")
            .ok()?
            .dyn_into()
            .ok()?;
        let gl: WebGlRenderingContext = canvas
            .get_context("webgl")
            .ok()??
            .dyn_into()
            .ok()?;
        Some(Self { gl })
    }

    fn string_parameter(&self, name: u32) -> Option<String> {
        self.gl.get_parameter(name).ok()?.as_string()
    }
}

impl ScratchGpuContext for WebGlScratchContext {
    fn renderer_info(&self) -> Option<GpuRendererInfo> {
        self.gl.get_extension("WEBGL_debug_renderer_info").ok()??;
        Some(GpuRendererInfo {
            renderer: self.string_parameter(WebglDebugRendererInfo::UNMASKED_RENDERER_WEBGL)?,
            vendor: self
                .string_parameter(WebglDebugRendererInfo::UNMASKED_VENDOR_WEBGL)
                .unwrap_or_default(),
        })
    }
}

impl Drop for WebGlScratchContext {
    fn drop(&mut self) {
        if let Ok(Some(ext)) = self.gl.get_extension("WEBGL_lose_context") {
            ext.unchecked_into::<WebglLoseContext>().lose_context();
        }
    }
}
