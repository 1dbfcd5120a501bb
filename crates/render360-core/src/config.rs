//! Process-wide configuration.
//!
//! Each path comes from an explicit override (e.g. a command-line flag), then
//! a `RENDER360_*` environment variable, then a platform default. Defaults are
//! only looked up for paths nothing else provides.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Overrides the application base directory.
pub const BASE_DIR_ENV: &str = "RENDER360_BASE_DIR";

/// Overrides the settings file location.
pub const SETTINGS_ENV: &str = "RENDER360_SETTINGS";

/// Overrides the renderer installation root used for discovery.
pub const INSTALL_ROOT_ENV: &str = "RENDER360_INSTALL_ROOT";

/// Product name used in installation directory names (`"Blender 4.0"`).
pub const DEFAULT_PRODUCT_NAME: &str = "Blender";

/// Paths a front-end sets explicitly, taking precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_dir: Option<PathBuf>,
    pub settings_path: Option<PathBuf>,
    pub install_root: Option<PathBuf>,
}

/// Configuration shared by every job of a session.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Application base directory (scene, driver script and artifacts live here).
    pub base_dir: PathBuf,
    /// JSON settings file holding the selected executable.
    pub settings_path: PathBuf,
    /// Directory scanned for versioned renderer installations.
    pub install_root: PathBuf,
    /// Renderer product name, as it appears in installation directory names.
    pub product_name: String,
}

impl RenderConfig {
    /// Build the configuration from defaults and the environment.
    pub fn from_env() -> Result<Self> {
        Self::resolve(ConfigOverrides::default())
    }

    /// Build the configuration, preferring explicit overrides.
    ///
    /// Resolution order for each path:
    /// 1. The override, if set
    /// 2. The corresponding `RENDER360_*` environment variable
    /// 3. The platform default
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let base_dir = match overrides.base_dir.or_else(|| env_path(BASE_DIR_ENV)) {
            Some(dir) => dir,
            None => default_base_dir()?,
        };

        let settings_path = match overrides.settings_path.or_else(|| env_path(SETTINGS_ENV)) {
            Some(path) => path,
            None => default_settings_path()?,
        };

        let install_root = overrides
            .install_root
            .or_else(|| env_path(INSTALL_ROOT_ENV))
            .unwrap_or_else(default_install_root);

        Ok(Self {
            base_dir,
            settings_path,
            install_root,
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
        })
    }

    /// Configuration rooted entirely under one directory.
    ///
    /// Useful for embedding and tests: settings live in `<base>/settings.json`
    /// and discovery scans `<base>/installs`.
    pub fn rooted_at(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        Self {
            settings_path: base_dir.join("settings.json"),
            install_root: base_dir.join("installs"),
            base_dir,
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
        }
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var).map(PathBuf::from)
}

/// Directory containing the running executable.
fn default_base_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::Settings(format!("executable '{}' has no parent", exe.display())))
}

fn default_settings_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("render360").join("settings.json"))
        .ok_or_else(|| {
            Error::Settings(format!(
                "no user configuration directory; set {SETTINGS_ENV}"
            ))
        })
}

/// Where the renderer's versioned installation directories usually live.
pub fn default_install_root() -> PathBuf {
    if cfg!(windows) {
        let program_files = std::env::var_os("ProgramFiles")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\Program Files"));
        program_files.join("Blender Foundation")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Applications")
    } else {
        PathBuf::from("/opt")
    }
}
