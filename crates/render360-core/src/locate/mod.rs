//! Renderer executable resolution.
//!
//! The executable is always an explicit user choice, persisted in the
//! settings store. Discovery only suggests where to look; it never selects
//! an executable on its own.

mod discovery;

pub use discovery::{
    InstallCandidate, parse_install_version, select_latest_install, suggest_start_dir,
};

use std::path::{Path, PathBuf};

use semver::Version;

use crate::error::{Error, Result};
use crate::settings::{EXECUTABLE_PATH_KEY, SettingsStore};

/// A resolved renderer executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableDescriptor {
    /// Path to the renderer binary.
    pub path: PathBuf,
    /// Version parsed from the installation directory, when it has one.
    pub version: Option<Version>,
}

impl ExecutableDescriptor {
    fn for_path(path: PathBuf, product: &str) -> Self {
        let version = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .and_then(|name| parse_install_version(product, name));
        Self { path, version }
    }
}

/// Resolves and persists the renderer executable.
pub struct ExecutableLocator {
    settings: SettingsStore,
    product_name: String,
    /// Set after the first successful resolution or selection.
    cached: Option<ExecutableDescriptor>,
}

impl ExecutableLocator {
    /// Create a locator backed by `settings`.
    pub fn new(settings: SettingsStore, product_name: impl Into<String>) -> Self {
        Self {
            settings,
            product_name: product_name.into(),
            cached: None,
        }
    }

    /// Resolve the configured executable.
    ///
    /// Uses the cached descriptor while its path still exists; otherwise
    /// reads the persisted entry.
    pub fn resolve(&mut self) -> Result<ExecutableDescriptor> {
        if let Some(cached) = &self.cached {
            if cached.path.is_file() {
                return Ok(cached.clone());
            }
            tracing::warn!("Renderer at {} disappeared", cached.path.display());
            self.cached = None;
        }

        let Some(stored) = self.settings.get(EXECUTABLE_PATH_KEY)? else {
            return Err(Error::ExecutableNotConfigured(
                "no renderer has been selected".to_string(),
            ));
        };

        let path = PathBuf::from(stored);
        if !path.is_file() {
            return Err(Error::ExecutableNotConfigured(format!(
                "configured renderer '{}' no longer exists",
                path.display()
            )));
        }

        let descriptor = ExecutableDescriptor::for_path(path, &self.product_name);
        tracing::info!("Using renderer {}", descriptor.path.display());
        self.cached = Some(descriptor.clone());
        Ok(descriptor)
    }

    /// Accept an explicit user choice and persist it.
    pub fn select(&mut self, path: impl AsRef<Path>) -> Result<ExecutableDescriptor> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ExecutableNotConfigured(format!(
                "'{}' is not a file",
                path.display()
            )));
        }

        let path = path.canonicalize()?;
        let value = path.to_str().ok_or_else(|| {
            Error::Settings(format!("path '{}' is not valid UTF-8", path.display()))
        })?;
        self.settings.set(EXECUTABLE_PATH_KEY, value)?;

        let descriptor = ExecutableDescriptor::for_path(path, &self.product_name);
        tracing::info!("Selected renderer {}", descriptor.path.display());
        self.cached = Some(descriptor.clone());
        Ok(descriptor)
    }

    /// Directory to offer as the starting point when the user browses for
    /// an executable. See [`suggest_start_dir`].
    pub fn suggest_start_dir(&self, install_root: &Path) -> Option<PathBuf> {
        suggest_start_dir(install_root, &self.product_name)
    }

    /// Look for the renderer binary on `PATH`.
    ///
    /// Only a suggestion for the user; [`resolve`](Self::resolve) never
    /// falls back to it.
    pub fn find_on_path(&self) -> Option<PathBuf> {
        which::which(self.product_name.to_lowercase()).ok()
    }
}
