//! Gateway module - dispatch, health probing and image generation

pub mod dispatcher;
pub mod health_check;
pub mod image;
pub mod invoker;
pub mod types;

pub use dispatcher::{Dispatcher, DEFAULT_DISPATCH_TIMEOUT};
pub use health_check::{HealthCheckManager, HealthProber, HealthSummary, DEFAULT_PROBE_TIMEOUT};
pub use image::{GeneratedImage, ImageGenerator};
pub use invoker::{run_with_deadline, CompletionInvoker};
pub use types::{
    DispatchResult, GenerationParams, Message, ModelId, ProbeReport, ProbeResult, ProviderId, Role,
};
