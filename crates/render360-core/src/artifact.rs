//! Render artifacts at their well-known locations.
//!
//! The renderer always writes to the same two files, so every job overwrites
//! the previous one of its kind. Consumers get the bytes loaded into memory
//! and never keep the file open, which leaves it free for the next job.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths::RenderDirs;

/// Kind of output a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Still preview frame (PNG).
    Image,
    /// Animated render (MP4).
    Video,
}

impl ArtifactKind {
    /// File name inside the resources directory.
    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Image => "PreviewBuffer.png",
            ArtifactKind::Video => "VideoBuffer.mp4",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Image => f.write_str("image"),
            ArtifactKind::Video => f.write_str("video"),
        }
    }
}

/// A finished render output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

impl Artifact {
    /// Read the whole file into memory. The file is closed before returning.
    pub fn load(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ArtifactMissing(self.path.clone()),
            _ => Error::Io(e),
        })
    }

    /// Copy the artifact to `dest`, replacing any existing file.
    ///
    /// Returns the number of bytes copied.
    pub fn export_to(&self, dest: impl AsRef<Path>) -> Result<u64> {
        let dest = dest.as_ref();
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let bytes = fs::copy(&self.path, dest)?;
        tracing::info!("Exported {} to {} ({} bytes)", self.kind, dest.display(), bytes);
        Ok(bytes)
    }
}

/// Locates artifacts in the application's resources directory.
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    resources_dir: PathBuf,
}

impl ArtifactResolver {
    pub fn new(dirs: &RenderDirs) -> Self {
        Self {
            resources_dir: dirs.resources_dir.clone(),
        }
    }

    /// Where the renderer is expected to write an artifact of `kind`.
    pub fn expected_path(&self, kind: ArtifactKind) -> PathBuf {
        self.resources_dir.join(kind.file_name())
    }

    /// Remove the previous job's artifact of `kind` so a run that writes
    /// nothing cannot pass off the old file as its own.
    pub fn clear(&self, kind: ArtifactKind) -> Result<()> {
        let path = self.expected_path(kind);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed previous {}: {}", kind, path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Reference to the artifact of `kind`, if the renderer produced it.
    pub fn resolve(&self, kind: ArtifactKind) -> Result<Artifact> {
        let path = self.expected_path(kind);
        if !path.is_file() {
            return Err(Error::ArtifactMissing(path));
        }
        Ok(Artifact { kind, path })
    }
}
