//! Render job orchestration.
//!
//! [`JobOrchestrator`] is the session object a front-end keeps for its
//! lifetime. Each job goes: validate request, resolve executable, run the
//! renderer, resolve the artifact. Only one job runs at a time; a second
//! request while one is in flight is rejected with [`Error::JobInFlight`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::artifact::{Artifact, ArtifactKind, ArtifactResolver};
use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::execute::{CancelHandle, JobContext, JobSlot, ProcessRunner, RendererInvocation, Verdict};
use crate::locate::{ExecutableDescriptor, ExecutableLocator};
use crate::paths::RenderDirs;
use crate::request::{RenderMode, RenderRequest, RequestBuilder};
use crate::settings::SettingsStore;

/// How a job ended, when it didn't fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The renderer finished and produced its artifact.
    Completed(Artifact),
    /// The job was cancelled and the renderer killed.
    Killed,
}

impl JobOutcome {
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            JobOutcome::Completed(artifact) => Some(artifact),
            JobOutcome::Killed => None,
        }
    }
}

/// Runs render jobs against the external renderer.
pub struct JobOrchestrator {
    dirs: RenderDirs,
    install_root: PathBuf,
    locator: Mutex<ExecutableLocator>,
    invocation: RendererInvocation,
    runner: ProcessRunner,
    resolver: ArtifactResolver,
    slot: JobSlot,
}

impl JobOrchestrator {
    /// Create an orchestrator for the given configuration.
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let dirs = RenderDirs::from_base_dir(&config.base_dir)?;
        let locator = ExecutableLocator::new(
            SettingsStore::new(&config.settings_path),
            config.product_name.clone(),
        );

        Ok(Self {
            invocation: RendererInvocation::from_dirs(&dirs),
            runner: ProcessRunner::new(&dirs.base_dir),
            resolver: ArtifactResolver::new(&dirs),
            install_root: config.install_root.clone(),
            locator: Mutex::new(locator),
            slot: JobSlot::new(),
            dirs,
        })
    }

    /// Render a still preview of a model.
    pub async fn run_preview(&self, source_file: impl AsRef<Path>) -> Result<JobOutcome> {
        let request = RequestBuilder::preview(source_file)?;
        self.run(request).await
    }

    /// Render an animation.
    ///
    /// A request in preview mode renders a still instead; the artifact kind
    /// always follows the request's mode.
    pub async fn run_animation(&self, request: RenderRequest) -> Result<JobOutcome> {
        self.run(request).await
    }

    async fn run(&self, request: RenderRequest) -> Result<JobOutcome> {
        let job = self.slot.acquire()?;

        let ctx = JobContext {
            executable: self.locator().resolve()?,
            kind: match request.mode {
                RenderMode::Preview => ArtifactKind::Image,
                RenderMode::Animation(_) => ArtifactKind::Video,
            },
            request,
            cancel: job.token().clone(),
        };

        match ctx.request.animation() {
            Some(anim) => tracing::info!(
                "Rendering {}x{} {} animation ({} frames) of {}",
                anim.width,
                anim.height,
                anim.quality.as_str(),
                anim.frame_count(),
                ctx.request.source_file.display()
            ),
            None => tracing::info!("Rendering preview of {}", ctx.request.source_file.display()),
        }

        let payload = ctx.request.to_json()?;
        tracing::debug!("Payload: {}", payload);

        self.resolver.clear(ctx.kind)?;

        let outcome = self
            .runner
            .run(
                &ctx.executable.path,
                &self.invocation.fixed_args(),
                &payload,
                &ctx.cancel,
            )
            .await?;

        for line in outcome.stdout.lines() {
            tracing::debug!("renderer: {}", line);
        }

        match outcome.verdict() {
            Verdict::Killed => {
                tracing::info!("Render job killed");
                Ok(JobOutcome::Killed)
            }
            Verdict::Failed { exit_code, stderr } => {
                tracing::warn!("Renderer reported an error:\n{}", stderr);
                Err(Error::RenderTool { exit_code, stderr })
            }
            Verdict::Succeeded => {
                let artifact = self.resolver.resolve(ctx.kind)?;
                tracing::info!("Render finished: {}", artifact.path.display());
                Ok(JobOutcome::Completed(artifact))
            }
        }
    }

    /// Cancel the job in flight, killing the renderer.
    ///
    /// Returns `false` if no job was running.
    pub fn cancel_active(&self) -> bool {
        self.slot.cancel()
    }

    /// Handle that cancels this orchestrator's jobs from another task or thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(self.slot.clone())
    }

    /// Whether a job is currently running.
    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    /// The configured renderer executable.
    pub fn executable(&self) -> Result<ExecutableDescriptor> {
        self.locator().resolve()
    }

    /// Persist an explicit renderer choice.
    pub fn select_executable(&self, path: impl AsRef<Path>) -> Result<ExecutableDescriptor> {
        self.locator().select(path)
    }

    /// Where the user should start browsing for a renderer.
    pub fn suggest_start_dir(&self) -> Option<PathBuf> {
        self.locator().suggest_start_dir(&self.install_root)
    }

    /// A renderer found on `PATH`, offered as a suggestion only.
    pub fn find_on_path(&self) -> Option<PathBuf> {
        self.locator().find_on_path()
    }

    /// Artifact locations.
    pub fn artifacts(&self) -> &ArtifactResolver {
        &self.resolver
    }

    /// Application directory layout.
    pub fn dirs(&self) -> &RenderDirs {
        &self.dirs
    }

    fn locator(&self) -> MutexGuard<'_, ExecutableLocator> {
        self.locator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
