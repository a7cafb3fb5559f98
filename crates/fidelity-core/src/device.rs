use crate::diagnostics::DiagnosticHub;
use crate::error::FidelityError;

/// Coarse graphics hardware class.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub enum GpuTier {
    Low = 0,
    #[default]
    Medium = 1,
    High = 2,
    Ultra = 3,
}

impl GpuTier {
    pub fn level(self) -> u8 {
        self as u8
    }
}

/// Renderer and vendor strings as reported by the graphics debug extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GpuRendererInfo {
    pub renderer: String,
    pub vendor: String,
}

/// A short-lived graphics context used only to read renderer strings.
///
/// Implementations release their native context in `Drop`, so holding the
/// context in a local binding pairs creation and release on every path out of
/// the caller.
pub trait ScratchGpuContext {
    /// `None` when the debug extension is not exposed.
    fn renderer_info(&self) -> Option<GpuRendererInfo>;
}

/// Ambient facts about the host, all optional except the identity string.
pub trait Environment {
    fn user_agent(&self) -> String;

    fn device_memory_gb(&self) -> Option<f32> {
        None
    }

    fn hardware_concurrency(&self) -> Option<u32> {
        None
    }

    fn max_touch_points(&self) -> u32 {
        0
    }

    fn device_pixel_ratio(&self) -> Option<f32> {
        None
    }

    /// Open a throwaway context for GPU inspection, if the host can.
    fn open_scratch_context(&self) -> Option<Box<dyn ScratchGpuContext + '_>> {
        None
    }
}

/// What we learned about the device, once per session.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceProfile {
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub is_desktop: bool,
    pub is_headset: bool,
    pub estimated_memory_gb: f32,
    pub logical_cores: u32,
    pub has_touch: bool,
    pub device_pixel_ratio: f32,
    pub gpu_tier: GpuTier,
    /// Lower-cased renderer string, when introspection worked.
    pub gpu_renderer: Option<String>,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            is_mobile: false,
            is_tablet: false,
            is_desktop: true,
            is_headset: false,
            estimated_memory_gb: DEFAULT_MEMORY_GB,
            logical_cores: DEFAULT_CORES,
            has_touch: false,
            device_pixel_ratio: 1.0,
            gpu_tier: GpuTier::Medium,
            gpu_renderer: None,
        }
    }
}

const DEFAULT_MEMORY_GB: f32 = 4.0;
const DEFAULT_CORES: u32 = 4;

/// Matched before the low-end table, so a string hitting both is high-end.
const HIGH_END_GPUS: &[&str] = &[
    "rtx 40", "rtx 30", "rtx 20", "rx 7", "rx 6",
    "apple m1 max", "apple m1 pro", "apple m2", "apple m3", "apple m4",
    "radeon pro", "quadro", "titan",
];

const LOW_END_GPUS: &[&str] = &[
    "intel hd", "intel(r) hd", "intel uhd 6", "mali-4", "mali-t",
    "adreno 3", "adreno 4", "adreno 5", "powervr",
    "swiftshader", "llvmpipe", "software",
];

const DISCRETE_VENDORS: &[&str] = &["nvidia", "geforce", "amd", "radeon", "ati technologies"];

const HEADSET_AGENTS: &[&str] = &["oculusbrowser", "quest", "visionos", "pico", "wolvic"];

/// Classify a GPU from its renderer/vendor strings.
pub fn classify_gpu(renderer: &str, vendor: &str) -> GpuTier {
    let renderer = renderer.to_lowercase();
    let vendor = vendor.to_lowercase();

    if HIGH_END_GPUS.iter().any(|p| renderer.contains(p)) {
        return GpuTier::Ultra;
    }
    if LOW_END_GPUS.iter().any(|p| renderer.contains(p)) {
        return GpuTier::Low;
    }

    let discrete = DISCRETE_VENDORS
        .iter()
        .any(|p| renderer.contains(p) || vendor.contains(p));
    if discrete {
        GpuTier::High
    } else {
        // integrated or unrecognized
        GpuTier::Medium
    }
}

/// Form factor guessed from the identity string.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FormFactor {
    Tablet,
    Mobile,
    Desktop,
}

/// Standalone headset browsers. Independent of form factor: some of them
/// also advertise a mobile identity.
pub fn is_headset_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    HEADSET_AGENTS.iter().any(|p| ua.contains(p))
}

/// Mobile and tablet are checked before desktop, which is the residual.
pub fn classify_form_factor(user_agent: &str, max_touch_points: u32) -> FormFactor {
    let ua = user_agent.to_lowercase();

    let android = ua.contains("android");
    let mobile_token = ua.contains("mobile");
    // iPadOS reports a desktop Safari identity; touch points give it away.
    let desktop_class_ipad = ua.contains("macintosh") && max_touch_points > 1;
    if ua.contains("ipad") || ua.contains("tablet") || (android && !mobile_token) || desktop_class_ipad {
        return FormFactor::Tablet;
    }
    if ua.contains("iphone") || ua.contains("ipod") || mobile_token {
        return FormFactor::Mobile;
    }
    FormFactor::Desktop
}

pub struct DeviceProfiler;

impl DeviceProfiler {
    /// Inspect the environment once. Never fails; anything missing falls
    /// back to a documented default and is reported through `diagnostics`.
    pub fn detect(env: &dyn Environment, diagnostics: &DiagnosticHub) -> DeviceProfile {
        let touch_points = env.max_touch_points();
        let user_agent = env.user_agent();
        let form = classify_form_factor(&user_agent, touch_points);
        let is_headset = is_headset_agent(&user_agent);

        let (gpu_tier, gpu_renderer) = match Self::query_gpu(env) {
            Ok(info) => {
                let tier = classify_gpu(&info.renderer, &info.vendor);
                log::info!("GPU '{}' ({}) classified as {:?}", info.renderer, info.vendor, tier);
                (tier, Some(info.renderer.to_lowercase()))
            }
            Err(err) => {
                diagnostics.report(&err);
                (GpuTier::Medium, None)
            }
        };

        let profile = DeviceProfile {
            is_mobile: form == FormFactor::Mobile,
            is_tablet: form == FormFactor::Tablet,
            is_desktop: form == FormFactor::Desktop && !is_headset,
            is_headset,
            estimated_memory_gb: env
                .device_memory_gb()
                .filter(|m| m.is_finite() && *m > 0.0)
                .unwrap_or(DEFAULT_MEMORY_GB),
            logical_cores: env
                .hardware_concurrency()
                .filter(|c| *c > 0)
                .unwrap_or(DEFAULT_CORES),
            has_touch: touch_points > 0,
            device_pixel_ratio: env
                .device_pixel_ratio()
                .filter(|r| r.is_finite() && *r > 0.0)
                .unwrap_or(1.0),
            gpu_tier,
            gpu_renderer,
        };
        log::debug!("device profile: {:?}", profile);
        profile
    }

    fn query_gpu(env: &dyn Environment) -> Result<GpuRendererInfo, FidelityError> {
        let context = env.open_scratch_context().ok_or_else(|| {
            FidelityError::UnsupportedCapability("graphics context for GPU query".into())
        })?;
        // Dropped on both branches, which releases the native context.
        context.renderer_info().ok_or_else(|| {
            FidelityError::UnsupportedCapability("renderer debug info extension".into())
        })
    }
}
