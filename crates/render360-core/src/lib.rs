//! Render job orchestration for render360.
//!
//! This crate provides:
//! - Renderer executable resolution and versioned installation discovery
//! - Validated render requests and their JSON payload
//! - Renderer subprocess execution with cancellation
//! - Artifact resolution at the renderer's well-known output paths
//! - [`JobOrchestrator`], which ties the above into preview and animation jobs
//!
//! The renderer itself is an external program. Jobs are `async` and suspend
//! only while the renderer runs, so front-ends can drive them from a
//! background task and keep their own thread responsive.

pub mod artifact;
pub mod config;
pub mod error;
pub mod execute;
pub mod locate;
pub mod orchestrator;
pub mod paths;
pub mod request;
pub mod settings;

pub use artifact::{Artifact, ArtifactKind, ArtifactResolver};
pub use config::{ConfigOverrides, RenderConfig};
pub use error::{Error, Result};
pub use execute::{CancelHandle, JobContext, ProcessOutcome, ProcessRunner, RendererInvocation, Verdict};
pub use locate::{ExecutableDescriptor, ExecutableLocator};
pub use orchestrator::{JobOrchestrator, JobOutcome};
pub use paths::RenderDirs;
pub use request::{
    AnimationSettings, FormField, FormValues, Lighting, Quality, RenderMode, RenderRequest,
    RequestBuilder, ValidationError,
};
pub use settings::SettingsStore;
