//! render360 CLI - turntable previews and videos of 3D models.

mod render;
mod renderer;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use render360_core::{ConfigOverrides, JobOrchestrator, RenderConfig};

#[derive(Parser)]
#[command(name = "render360")]
#[command(about = "Render previews and turntable videos of 3D models with Blender")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Application directory holding Generator/ and Resources/
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Settings file holding the selected renderer
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a still preview of a model
    Preview {
        /// Model file (.glb, .gltf, .blend, .fbx, .obj, .usd, .usdz, .usdc)
        model: PathBuf,

        /// Also copy the rendered image here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a turntable animation of a model
    Animate {
        /// Model file (.glb, .gltf, .blend, .fbx, .obj, .usd, .usdz, .usdc)
        model: PathBuf,

        /// Frames per second
        #[arg(long, default_value = "30", allow_hyphen_values = true)]
        fps: String,

        /// Length of the video in seconds
        #[arg(long, default_value = "5", allow_hyphen_values = true)]
        duration: String,

        /// Render quality (Low, Medium, High)
        #[arg(long, default_value = "Medium")]
        quality: String,

        /// Output width in pixels
        #[arg(long, default_value = "1920", allow_hyphen_values = true)]
        width: String,

        /// Output height in pixels
        #[arg(long, default_value = "1080", allow_hyphen_values = true)]
        height: String,

        /// Lighting preset (Studio, Soft, Dramatic, Outdoor)
        #[arg(long, default_value = "Studio")]
        lighting: String,

        /// Background color
        #[arg(long, default_value = "Black")]
        background: String,

        /// Also copy the rendered video here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, select or discover the renderer executable
    Renderer {
        #[command(subcommand)]
        command: RendererCommand,
    },
}

#[derive(Subcommand)]
enum RendererCommand {
    /// Show the selected renderer
    Show,

    /// Select the renderer executable to use from now on
    Select {
        /// Path to the renderer executable
        path: PathBuf,
    },

    /// Suggest where to find a renderer installation
    Discover {
        /// Directory holding versioned installations (e.g. "Blender 4.0")
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format render360-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<render360_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    let install_root = match &cli.command {
        Commands::Renderer {
            command: RendererCommand::Discover { root },
        } => root.clone(),
        _ => None,
    };
    let config = RenderConfig::resolve(ConfigOverrides {
        base_dir: cli.base_dir,
        settings_path: cli.settings,
        install_root,
    })
    .map_err(|e| format_error(e.into()))?;

    let orchestrator = JobOrchestrator::new(&config).map_err(|e| format_error(e.into()))?;

    let status = match cli.command {
        Commands::Preview { model, output } => {
            render::preview(&orchestrator, &model, output.as_deref())
                .await
                .map_err(format_error)?
        }

        Commands::Animate {
            model,
            fps,
            duration,
            quality,
            width,
            height,
            lighting,
            background,
            output,
        } => {
            let form = render360_core::FormValues {
                source_file: Some(model),
                fps,
                duration,
                quality,
                width,
                height,
                lighting,
                background_color: background,
            };
            render::animate(&orchestrator, &form, output.as_deref())
                .await
                .map_err(format_error)?
        }

        Commands::Renderer { command } => {
            match command {
                RendererCommand::Show => renderer::show(&orchestrator).map_err(format_error)?,
                RendererCommand::Select { path } => {
                    renderer::select(&orchestrator, &path).map_err(format_error)?
                }
                RendererCommand::Discover { .. } => renderer::discover(&orchestrator, &config),
            }
            ExitCode::SUCCESS
        }
    };

    Ok(status)
}
