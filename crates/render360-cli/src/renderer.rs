//! Renderer executable commands.

use std::path::Path;

use render360_core::{ExecutableDescriptor, JobOrchestrator, RenderConfig};

/// Print the selected renderer.
pub fn show(orchestrator: &JobOrchestrator) -> anyhow::Result<()> {
    let descriptor = orchestrator.executable()?;
    println!("Renderer: {}", describe(&descriptor));
    Ok(())
}

/// Persist a renderer choice.
pub fn select(orchestrator: &JobOrchestrator, path: &Path) -> anyhow::Result<()> {
    let descriptor = orchestrator.select_executable(path)?;
    println!("Selected renderer: {}", describe(&descriptor));
    Ok(())
}

/// Suggest where to look for a renderer. Never selects anything.
pub fn discover(orchestrator: &JobOrchestrator, config: &RenderConfig) {
    match orchestrator.suggest_start_dir() {
        Some(dir) => println!("Start looking in: {}", dir.display()),
        None => println!(
            "No installation directory at {}",
            config.install_root.display()
        ),
    }

    if let Some(path) = orchestrator.find_on_path() {
        println!("Found on PATH: {}", path.display());
    }

    println!("Select one with: render360 renderer select <path>");
}

fn describe(descriptor: &ExecutableDescriptor) -> String {
    match &descriptor.version {
        Some(version) => format!("{} (version {}.{})", descriptor.path.display(), version.major, version.minor),
        None => format!("{} (version unknown)", descriptor.path.display()),
    }
}
