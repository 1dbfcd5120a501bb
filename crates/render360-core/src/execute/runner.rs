//! Renderer subprocess execution.
//!
//! One invocation per job. Both output pipes are drained to EOF before the
//! runner waits for exit, so a chatty renderer can never block on a full pipe.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::paths::RenderDirs;

use super::outcome::ProcessOutcome;

/// `CREATE_NO_WINDOW`: keep the renderer from opening a console window.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// The fixed part of the renderer command line.
///
/// `-b --factory-startup <scene> -P <script> --`; the payload follows the
/// separator as one argument.
#[derive(Debug, Clone)]
pub struct RendererInvocation {
    /// Scene file opened in background mode.
    pub scene_file: PathBuf,
    /// Python driver script that reads the payload.
    pub driver_script: PathBuf,
}

impl RendererInvocation {
    /// Invocation using the scene and script from the application layout.
    pub fn from_dirs(dirs: &RenderDirs) -> Self {
        Self {
            scene_file: dirs.scene_file(),
            driver_script: dirs.driver_script(),
        }
    }

    /// Preamble plus separator, everything except the payload.
    pub fn fixed_args(&self) -> Vec<OsString> {
        vec![
            "-b".into(),
            "--factory-startup".into(),
            self.scene_file.clone().into_os_string(),
            "-P".into(),
            self.driver_script.clone().into_os_string(),
            "--".into(),
        ]
    }
}

/// Launches the renderer and collects its outcome.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    /// Working directory for the child; relative invocation paths resolve here.
    working_dir: PathBuf,
}

impl ProcessRunner {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    /// Run `executable fixed_args... payload` to completion.
    ///
    /// Returns once both output streams hit EOF and the process has exited,
    /// or once `cancel` fires and the child has been killed. A launch
    /// failure is an error; everything after a successful spawn is reported
    /// in the [`ProcessOutcome`].
    pub async fn run(
        &self,
        executable: &Path,
        fixed_args: &[OsString],
        payload: &str,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutcome> {
        if cancel.is_cancelled() {
            tracing::info!("Job cancelled before the renderer was launched");
            return Ok(killed_outcome());
        }

        let mut cmd = Command::new(executable);
        cmd.args(fixed_args)
            .arg(payload)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let launch_error = |source: io::Error| Error::Launch {
            executable: executable.to_path_buf(),
            source,
        };

        let mut child = cmd.spawn().map_err(launch_error)?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| launch_error(io::Error::other("stdout was not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| launch_error(io::Error::other("stderr was not captured")))?;

        tracing::info!(
            "Renderer started (pid {}): {}",
            child.id().unwrap_or_default(),
            executable.display()
        );

        let finished = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = drain_and_wait(&mut child, stdout, stderr) => Some(result),
        };

        let Some(result) = finished else {
            terminate(&mut child).await;
            return Ok(killed_outcome());
        };

        let (exit_code, stdout, stderr) = result?;
        tracing::info!("Renderer exited with code {:?}", exit_code);

        Ok(ProcessOutcome {
            exit_code,
            stdout,
            stderr,
            was_killed: false,
        })
    }
}

/// Read both pipes to EOF, then reap the child.
async fn drain_and_wait(
    child: &mut Child,
    stdout: impl AsyncRead + Unpin,
    stderr: impl AsyncRead + Unpin,
) -> io::Result<(Option<i32>, String, String)> {
    let (stdout, stderr) = tokio::try_join!(read_stream(stdout), read_stream(stderr))?;
    let status = child.wait().await?;
    Ok((status.code(), stdout, stderr))
}

async fn read_stream(mut reader: impl AsyncRead + Unpin) -> io::Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Forcefully stop the child. Failures are logged and otherwise ignored:
/// the process may already be gone.
async fn terminate(child: &mut Child) {
    tracing::info!("Killing renderer (pid {})", child.id().unwrap_or_default());

    if let Err(e) = child.start_kill() {
        tracing::warn!("Failed to kill renderer: {}", e);
    }

    // Reap so no zombie is left behind.
    match child.wait().await {
        Ok(status) => tracing::debug!("Killed renderer exited with {}", status),
        Err(e) => tracing::warn!("Failed to reap killed renderer: {}", e),
    }
}

fn killed_outcome() -> ProcessOutcome {
    ProcessOutcome {
        was_killed: true,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_fixed_args_layout() {
        let invocation = RendererInvocation {
            scene_file: PathBuf::from("Generator/PreviewModel.blend"),
            driver_script: PathBuf::from("Generator/PreviewModel.py"),
        };
        let args = invocation.fixed_args();
        assert_eq!(
            args,
            [
                "-b",
                "--factory-startup",
                "Generator/PreviewModel.blend",
                "-P",
                "Generator/PreviewModel.py",
                "--"
            ]
            .map(OsString::from)
        );
    }

    #[tokio::test]
    async fn test_missing_executable_is_launch_error() {
        let temp = TempDir::new().unwrap();
        let runner = ProcessRunner::new(temp.path());

        let err = runner
            .run(&temp.path().join("no-such-renderer"), &[], "{}", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Launch { .. }));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_never_launches() {
        let temp = TempDir::new().unwrap();
        let runner = ProcessRunner::new(temp.path());
        let cancel = CancellationToken::new();
        cancel.cancel();

        // The executable doesn't exist; a launch attempt would be an error.
        let outcome = runner
            .run(&temp.path().join("no-such-renderer"), &[], "{}", &cancel)
            .await
            .unwrap();
        assert!(outcome.was_killed);
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use crate::execute::Verdict;
        use std::os::unix::fs::PermissionsExt;

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-renderer.sh");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_payload_is_last_argument() {
            let temp = TempDir::new().unwrap();
            let exe = script(temp.path(), r#"for a in "$@"; do last="$a"; done; printf '%s' "$last""#);
            let args = RendererInvocation::from_dirs(&RenderDirs::from_base_dir(temp.path()).unwrap())
                .fixed_args();

            let outcome = ProcessRunner::new(temp.path())
                .run(&exe, &args, r#"{"fileName":"a b.glb"}"#, &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(outcome.stdout, r#"{"fileName":"a b.glb"}"#);
            assert_eq!(outcome.verdict(), Verdict::Succeeded);
        }

        #[tokio::test]
        async fn test_stderr_with_exit_zero_fails() {
            let temp = TempDir::new().unwrap();
            let exe = script(temp.path(), "echo 'Error: bad scene' >&2\nexit 0");

            let outcome = ProcessRunner::new(temp.path())
                .run(&exe, &[], "{}", &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(outcome.exit_code, Some(0));
            assert!(outcome.stdout.is_empty());
            assert!(matches!(outcome.verdict(), Verdict::Failed { .. }));
        }

        #[tokio::test]
        async fn test_large_stderr_does_not_deadlock() {
            let temp = TempDir::new().unwrap();
            // Well past a pipe buffer on both streams.
            let exe = script(
                temp.path(),
                "i=0; while [ $i -lt 4000 ]; do echo 'err line padding padding padding' >&2; echo out; i=$((i+1)); done",
            );

            let outcome = tokio::time::timeout(
                Duration::from_secs(30),
                ProcessRunner::new(temp.path()).run(&exe, &[], "{}", &CancellationToken::new()),
            )
            .await
            .expect("runner deadlocked")
            .unwrap();
            assert_eq!(outcome.stderr.lines().count(), 4000);
            assert_eq!(outcome.stdout.lines().count(), 4000);
        }

        #[tokio::test]
        async fn test_cancel_kills_child() {
            let temp = TempDir::new().unwrap();
            let exe = script(temp.path(), "exec sleep 30");
            let cancel = CancellationToken::new();

            let trigger = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                trigger.cancel();
            });

            let outcome = tokio::time::timeout(
                Duration::from_secs(10),
                ProcessRunner::new(temp.path()).run(&exe, &[], "{}", &cancel),
            )
            .await
            .expect("cancel did not stop the renderer")
            .unwrap();
            assert!(outcome.was_killed);
            assert_eq!(outcome.verdict(), Verdict::Killed);
        }

        #[tokio::test]
        async fn test_runs_in_working_dir() {
            let temp = TempDir::new().unwrap();
            let exe = script(temp.path(), "pwd");

            let outcome = ProcessRunner::new(temp.path())
                .run(&exe, &[], "{}", &CancellationToken::new())
                .await
                .unwrap();
            let reported = PathBuf::from(outcome.stdout.trim()).canonicalize().unwrap();
            assert_eq!(reported, temp.path().canonicalize().unwrap());
        }
    }
}
