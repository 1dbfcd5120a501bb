//! Process outcome and its classification.

/// What one renderer invocation produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code, if the process exited normally. Informational only.
    pub exit_code: Option<i32>,
    /// Captured standard output. Diagnostic only.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process was terminated through cancellation.
    pub was_killed: bool,
}

/// Classification of a [`ProcessOutcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Succeeded,
    /// The renderer wrote to stderr; carries the text verbatim.
    Failed { exit_code: Option<i32>, stderr: String },
    Killed,
}

impl ProcessOutcome {
    /// Classify the run.
    ///
    /// Cancellation wins over everything else. Otherwise any stderr output
    /// means failure, whatever the exit code says.
    pub fn verdict(&self) -> Verdict {
        if self.was_killed {
            return Verdict::Killed;
        }

        if self.stderr.is_empty() {
            if self.exit_code != Some(0) {
                tracing::warn!(
                    "Renderer exited with {:?} but wrote nothing to stderr; treating as success",
                    self.exit_code
                );
            }
            Verdict::Succeeded
        } else {
            Verdict::Failed {
                exit_code: self.exit_code,
                stderr: self.stderr.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_fails_even_with_exit_code_zero() {
        let outcome = ProcessOutcome {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: "Error: cannot read file\n".into(),
            was_killed: false,
        };
        assert_eq!(
            outcome.verdict(),
            Verdict::Failed {
                exit_code: Some(0),
                stderr: "Error: cannot read file\n".into()
            }
        );
    }

    #[test]
    fn nonzero_exit_without_stderr_succeeds() {
        let outcome = ProcessOutcome {
            exit_code: Some(1),
            stdout: "Invalid quality setting\n".into(),
            ..Default::default()
        };
        assert_eq!(outcome.verdict(), Verdict::Succeeded);
    }

    #[test]
    fn killed_wins_over_stderr() {
        let outcome = ProcessOutcome {
            exit_code: None,
            stderr: "partial".into(),
            was_killed: true,
            ..Default::default()
        };
        assert_eq!(outcome.verdict(), Verdict::Killed);
    }
}
