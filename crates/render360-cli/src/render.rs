//! Preview and animate commands.
//!
//! Jobs run on the async runtime; Ctrl-C cancels the job in flight.

use std::future::Future;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use render360_core::{FormValues, JobOrchestrator, JobOutcome, RequestBuilder};

/// Exit status for a render cancelled with Ctrl-C.
const EXIT_CANCELLED: u8 = 130;

/// Render a still preview.
pub async fn preview(
    orchestrator: &JobOrchestrator,
    model: &Path,
    output: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let outcome = run_interruptible(orchestrator, orchestrator.run_preview(model)).await?;
    report(outcome, output)
}

/// Render a turntable animation.
pub async fn animate(
    orchestrator: &JobOrchestrator,
    form: &FormValues,
    output: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let request = RequestBuilder::build(form).map_err(render360_core::Error::from)?;
    let outcome = run_interruptible(orchestrator, orchestrator.run_animation(request)).await?;
    report(outcome, output)
}

/// Drive `job` to completion, cancelling it if the user hits Ctrl-C.
async fn run_interruptible(
    orchestrator: &JobOrchestrator,
    job: impl Future<Output = render360_core::Result<JobOutcome>>,
) -> render360_core::Result<JobOutcome> {
    let cancel = orchestrator.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling render...");
            cancel.cancel();
        }
    });

    let start = Instant::now();
    let result = job.await;
    interrupt.abort();

    tracing::debug!("Job finished in {:.2}s", start.elapsed().as_secs_f64());
    result
}

fn report(outcome: JobOutcome, output: Option<&Path>) -> anyhow::Result<ExitCode> {
    let artifact = match outcome {
        JobOutcome::Completed(artifact) => artifact,
        JobOutcome::Killed => {
            eprintln!("render cancelled");
            return Ok(ExitCode::from(EXIT_CANCELLED));
        }
    };

    println!("Rendered {}: {}", artifact.kind, artifact.path.display());

    if let Some(dest) = output {
        artifact.export_to(dest)?;
        println!("Saved copy to {}", dest.display());
    }

    Ok(ExitCode::SUCCESS)
}
