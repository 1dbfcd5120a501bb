//! Renderer process execution.
//!
//! This module provides:
//! - [`ProcessRunner`] for launching the renderer and collecting its output
//! - [`ProcessOutcome`] and [`Verdict`] for classifying a finished run
//! - [`JobSlot`] and [`CancelHandle`] for the one-job-at-a-time policy

mod context;
mod outcome;
mod runner;

pub use context::{ActiveJob, CancelHandle, JobContext, JobSlot};
pub use outcome::{ProcessOutcome, Verdict};
pub use runner::{ProcessRunner, RendererInvocation};
