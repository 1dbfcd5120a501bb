//! Per-job context and the single in-flight job slot.

use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::artifact::ArtifactKind;
use crate::error::{Error, Result};
use crate::locate::ExecutableDescriptor;
use crate::request::RenderRequest;

/// Everything one job needs, gathered before the renderer is launched.
///
/// Created per job and passed down explicitly; nothing about a job lives in
/// shared state except its cancellation token (see [`JobSlot`]).
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Renderer to launch.
    pub executable: ExecutableDescriptor,
    /// Validated request.
    pub request: RenderRequest,
    /// Artifact the job is expected to produce.
    pub kind: ArtifactKind,
    /// Fires when the job is cancelled.
    pub cancel: CancellationToken,
}

/// Holds the cancellation token of the job currently in flight, if any.
///
/// At most one job may occupy the slot; a second [`acquire`](Self::acquire)
/// is rejected with [`Error::JobInFlight`].
#[derive(Debug, Clone, Default)]
pub struct JobSlot {
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for a new job.
    ///
    /// The returned guard frees the slot when dropped, whether the job
    /// finished, failed, or its future was abandoned.
    pub fn acquire(&self) -> Result<ActiveJob> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.is_some() {
            return Err(Error::JobInFlight);
        }

        let token = CancellationToken::new();
        *active = Some(token.clone());

        Ok(ActiveJob {
            slot: self.clone(),
            token,
        })
    }

    /// Cancel the job in flight. Returns `false` when there was none.
    pub fn cancel(&self) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match active.as_ref() {
            Some(token) => {
                tracing::info!("Cancelling active render job");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a job is in flight.
    pub fn is_busy(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Guard for the job occupying a [`JobSlot`].
#[derive(Debug)]
pub struct ActiveJob {
    slot: JobSlot,
    token: CancellationToken,
}

impl ActiveJob {
    /// Token that fires when this job is cancelled.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for ActiveJob {
    fn drop(&mut self) {
        let mut active = self.slot.active.lock().unwrap_or_else(PoisonError::into_inner);
        *active = None;
    }
}

/// Thread-safe handle for cancelling whatever job is running.
///
/// Cheap to clone; hand it to a UI thread or a signal handler.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    slot: JobSlot,
}

impl CancelHandle {
    pub(crate) fn new(slot: JobSlot) -> Self {
        Self { slot }
    }

    /// Cancel the job in flight. If nothing is running, this is a no-op
    /// and returns `false`.
    pub fn cancel(&self) -> bool {
        self.slot.cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let slot = JobSlot::new();
        let first = slot.acquire().unwrap();

        assert!(matches!(slot.acquire(), Err(Error::JobInFlight)));
        assert!(slot.is_busy());

        drop(first);
        assert!(!slot.is_busy());
        assert!(slot.acquire().is_ok());
    }

    #[test]
    fn test_cancel_reaches_active_token() {
        let slot = JobSlot::new();
        assert!(!slot.cancel());

        let job = slot.acquire().unwrap();
        let handle = CancelHandle::new(slot.clone());
        assert!(handle.cancel());
        assert!(job.token().is_cancelled());
    }

    #[test]
    fn test_new_job_gets_fresh_token() {
        let slot = JobSlot::new();
        let job = slot.acquire().unwrap();
        slot.cancel();
        drop(job);

        let next = slot.acquire().unwrap();
        assert!(!next.token().is_cancelled());
    }
}
