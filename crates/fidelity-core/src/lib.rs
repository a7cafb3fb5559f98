//! Adaptive rendering fidelity for the museum scene.
//!
//! Profiles the device once, picks a starting preset, then keeps the frame
//! rate in band by stepping between adjacent presets. Renderer, effect chain
//! and scene are reached only through the traits in [`consumers`].

pub mod config;
pub mod consumers;
pub mod controller;
pub mod culling;
pub mod device;
pub mod diagnostics;
pub mod effects;
pub mod error;
pub mod lod;
pub mod monitor;
pub mod preset;
pub mod raycast;
pub mod resources;
pub mod tasks;
pub mod telemetry;

pub use config::{AdaptiveTuning, SceneBaseline};
pub use consumers::{Consumers, PostEffectConsumer, SceneConsumer, ShadowConsumer};
pub use controller::{initial_rank_for, ControllerOptions, QualityController, Transition};
pub use device::{DeviceProfile, DeviceProfiler, Environment, ScratchGpuContext, GpuTier};
pub use diagnostics::{Diagnostic, DiagnosticHub, DiagnosticKind, DiagnosticSink};
pub use effects::{EffectPass, EffectSet};
pub use error::FidelityError;
pub use preset::{PixelRatio, PresetTable, QualityPreset, QualityRank};
