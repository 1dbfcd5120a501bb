//! Application directory layout.
//!
//! Every path the renderer contract depends on is fixed relative to the
//! application base directory:
//!
//! ```text
//! <base>/
//! ├── Generator/
//! │   ├── PreviewModel.blend  # Scene loaded by the renderer
//! │   └── PreviewModel.py     # Driver script that consumes the payload
//! └── Resources/
//!     ├── PreviewBuffer.png   # Image artifact
//!     └── VideoBuffer.mp4     # Video artifact
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Directory holding the scene file and driver script.
pub const GENERATOR_DIR: &str = "Generator";

/// Directory the renderer writes artifacts into.
pub const RESOURCES_DIR: &str = "Resources";

/// Scene file name inside [`GENERATOR_DIR`].
pub const SCENE_FILE: &str = "PreviewModel.blend";

/// Driver script name inside [`GENERATOR_DIR`].
pub const DRIVER_SCRIPT: &str = "PreviewModel.py";

/// Directory structure rooted at the application base directory.
#[derive(Debug, Clone)]
pub struct RenderDirs {
    /// Application base directory; the renderer runs with this as its cwd.
    pub base_dir: PathBuf,

    /// Directory holding the scene file and driver script.
    pub generator_dir: PathBuf,

    /// Directory holding render artifacts.
    pub resources_dir: PathBuf,
}

impl RenderDirs {
    /// Create the layout for a base directory.
    ///
    /// Creates `Resources/` if it doesn't exist, so the renderer can write into it.
    ///
    /// # Errors
    /// Returns an error if directory creation fails.
    pub fn from_base_dir(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let generator_dir = base_dir.join(GENERATOR_DIR);
        let resources_dir = base_dir.join(RESOURCES_DIR);

        fs::create_dir_all(&resources_dir)?;

        Ok(Self {
            base_dir,
            generator_dir,
            resources_dir,
        })
    }

    /// Scene file path, relative to the base directory.
    ///
    /// Relative so the invocation reads the same on every machine; the
    /// process is started inside `base_dir`.
    pub fn scene_file(&self) -> PathBuf {
        Path::new(GENERATOR_DIR).join(SCENE_FILE)
    }

    /// Driver script path, relative to the base directory.
    pub fn driver_script(&self) -> PathBuf {
        Path::new(GENERATOR_DIR).join(DRIVER_SCRIPT)
    }
}
