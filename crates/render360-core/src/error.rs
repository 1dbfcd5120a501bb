//! Error types for render360-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::request::ValidationError;

/// Result type for render360-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can end a render job.
///
/// A cancelled job is not an error; see [`crate::JobOutcome::Killed`].
#[derive(Debug, Error)]
pub enum Error {
    /// No usable renderer executable has been configured.
    #[error("renderer executable not configured: {0}")]
    ExecutableNotConfigured(String),

    /// The request failed validation.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// The renderer process could not be started.
    #[error("failed to launch renderer '{}': {source}", executable.display())]
    Launch {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The renderer wrote to standard error.
    #[error("renderer reported an error{}:\n{stderr}", exit_code.map(|c| format!(" (exit code {c})")).unwrap_or_default())]
    RenderTool {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The renderer finished cleanly but its output file is not there.
    #[error("expected render output is missing: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// Another job is still running on this orchestrator.
    #[error("a render job is already in progress")]
    JobInFlight,

    /// The request could not be encoded for the renderer.
    #[error("failed to encode render payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The settings store could not be read or written.
    #[error("settings error: {0}")]
    Settings(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Recovery hint for the user, when one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::ExecutableNotConfigured(_) => Some(
                "select a renderer with `render360 renderer select <path>` \
                 (`render360 renderer discover` suggests where to look)",
            ),
            Error::JobInFlight => Some("wait for the running job to finish or cancel it"),
            Error::ArtifactMissing(_) => {
                Some("check that the Generator scene and driver script match this version")
            }
            _ => None,
        }
    }

    /// Error message followed by its hint, if any.
    pub fn with_hint(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{self}\nhint: {hint}"),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_tool_error_keeps_stderr_verbatim() {
        let err = Error::RenderTool {
            exit_code: Some(0),
            stderr: "Error: Not a blend file".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("(exit code 0)"));
        assert!(msg.ends_with("Error: Not a blend file"));
    }

    #[test]
    fn hint_only_for_actionable_errors() {
        assert!(Error::ExecutableNotConfigured("none".into()).hint().is_some());
        assert!(Error::Settings("bad".into()).hint().is_none());
        assert!(
            Error::ExecutableNotConfigured("none".into())
                .with_hint()
                .contains("renderer select")
        );
    }
}
