use std::cell::Cell;
use std::rc::Rc;

use fidelity_core::device::GpuRendererInfo;
use fidelity_core::diagnostics::DiagnosticLog;
use fidelity_core::{
    initial_rank_for, DeviceProfiler, DiagnosticHub, DiagnosticKind, Environment, ScratchGpuContext,
    GpuTier, QualityRank,
};

/// Counts how many scratch contexts were opened and how many were released.
#[derive(Default)]
struct ContextLedger {
    opened: Cell<u32>,
    released: Cell<u32>,
}

struct FakeScratchContext {
    ledger: Rc<ContextLedger>,
    info: Option<GpuRendererInfo>,
}

impl ScratchGpuContext for FakeScratchContext {
    fn renderer_info(&self) -> Option<GpuRendererInfo> {
        self.info.clone()
    }
}

impl Drop for FakeScratchContext {
    fn drop(&mut self) {
        self.ledger.released.set(self.ledger.released.get() + 1);
    }
}

struct FakeEnv {
    user_agent: &'static str,
    memory: Option<f32>,
    cores: Option<u32>,
    touch_points: u32,
    pixel_ratio: Option<f32>,
    /// `None`: no context at all. `Some(None)`: context without debug info.
    gpu: Option<Option<(&'static str, &'static str)>>,
    ledger: Rc<ContextLedger>,
}

impl FakeEnv {
    fn desktop() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0",
            memory: Some(16.0),
            cores: Some(12),
            touch_points: 0,
            pixel_ratio: Some(1.0),
            gpu: Some(Some(("ANGLE (NVIDIA GeForce RTX 3070)", "Google Inc. (NVIDIA)"))),
            ledger: Rc::new(ContextLedger::default()),
        }
    }
}

impl Environment for FakeEnv {
    fn user_agent(&self) -> String {
        self.user_agent.to_string()
    }

    fn device_memory_gb(&self) -> Option<f32> {
        self.memory
    }

    fn hardware_concurrency(&self) -> Option<u32> {
        self.cores
    }

    fn max_touch_points(&self) -> u32 {
        self.touch_points
    }

    fn device_pixel_ratio(&self) -> Option<f32> {
        self.pixel_ratio
    }

    fn open_scratch_context(&self) -> Option<Box<dyn ScratchGpuContext + '_>> {
        let gpu = self.gpu?;
        self.ledger.opened.set(self.ledger.opened.get() + 1);
        Some(Box::new(FakeScratchContext {
            ledger: self.ledger.clone(),
            info: gpu.map(|(renderer, vendor)| GpuRendererInfo {
                renderer: renderer.to_string(),
                vendor: vendor.to_string(),
            }),
        }))
    }
}

fn detect(env: &FakeEnv) -> (fidelity_core::DeviceProfile, Rc<DiagnosticLog>) {
    let log = DiagnosticLog::new();
    let mut hub = DiagnosticHub::new();
    hub.subscribe(log.clone());
    (DeviceProfiler::detect(env, &hub), log)
}

#[test]
fn test_desktop_with_high_end_gpu() {
    let env = FakeEnv::desktop();
    let (profile, log) = detect(&env);

    assert!(profile.is_desktop);
    assert!(!profile.is_mobile);
    assert_eq!(profile.gpu_tier, GpuTier::Ultra);
    assert_eq!(profile.gpu_renderer.as_deref(), Some("angle (nvidia geforce rtx 3070)"));
    assert_eq!(profile.logical_cores, 12);
    assert!(log.events().is_empty());
    assert_eq!(initial_rank_for(&profile), QualityRank::Ultra);
}

#[test]
fn test_scratch_context_released_after_success() {
    let env = FakeEnv::desktop();
    detect(&env);
    assert_eq!(env.ledger.opened.get(), 1);
    assert_eq!(env.ledger.released.get(), 1);
}

#[test]
fn test_scratch_context_released_when_extension_missing() {
    let env = FakeEnv {
        gpu: Some(None),
        ..FakeEnv::desktop()
    };
    let (profile, log) = detect(&env);

    assert_eq!(env.ledger.opened.get(), 1);
    assert_eq!(env.ledger.released.get(), 1);
    assert_eq!(profile.gpu_tier, GpuTier::Medium);
    assert_eq!(profile.gpu_renderer, None);
    assert_eq!(log.count(DiagnosticKind::UnsupportedCapability), 1);
}

#[test]
fn test_no_context_falls_back_to_medium() {
    let env = FakeEnv {
        gpu: None,
        ..FakeEnv::desktop()
    };
    let (profile, log) = detect(&env);

    assert_eq!(env.ledger.opened.get(), 0);
    assert_eq!(profile.gpu_tier, GpuTier::Medium);
    assert_eq!(log.count(DiagnosticKind::UnsupportedCapability), 1);
    assert_eq!(initial_rank_for(&profile), QualityRank::Medium);
}

#[test]
fn test_missing_hints_use_defaults() {
    let env = FakeEnv {
        memory: None,
        cores: Some(0),
        pixel_ratio: Some(f32::NAN),
        ..FakeEnv::desktop()
    };
    let (profile, _) = detect(&env);

    assert_eq!(profile.estimated_memory_gb, 4.0);
    assert_eq!(profile.logical_cores, 4);
    assert_eq!(profile.device_pixel_ratio, 1.0);
}

#[test]
fn test_budget_phone_starts_low() {
    let env = FakeEnv {
        user_agent: "Mozilla/5.0 (Linux; Android 11; SM-A125F) Mobile Safari/537.36",
        memory: Some(2.0),
        touch_points: 5,
        pixel_ratio: Some(2.0),
        gpu: Some(Some(("Mali-G52", "ARM"))),
        ..FakeEnv::desktop()
    };
    let (profile, _) = detect(&env);

    assert!(profile.is_mobile);
    assert!(profile.has_touch);
    assert!(!profile.is_desktop);
    assert_eq!(initial_rank_for(&profile), QualityRank::Low);
}

#[test]
fn test_standalone_headset_starts_medium() {
    let env = FakeEnv {
        user_agent: "Mozilla/5.0 (Linux; Android 12; Quest 3) OculusBrowser/30.0 Mobile VR",
        memory: Some(8.0),
        gpu: Some(Some(("Adreno (TM) 740", "Qualcomm"))),
        ..FakeEnv::desktop()
    };
    let (profile, _) = detect(&env);

    assert!(profile.is_headset);
    assert!(profile.is_mobile);
    assert!(!profile.is_desktop);
    assert_eq!(initial_rank_for(&profile), QualityRank::Medium);
}
