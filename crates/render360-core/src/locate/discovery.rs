//! Versioned installation discovery.
//!
//! Renderer installations sit side by side under one root, each in a
//! directory named `"<Name> <major>.<minor>"` (e.g. `Blender 4.0`). Selection
//! is a pure function over directory names so it can be tested without a
//! filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;

/// A directory name that parsed as a versioned installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCandidate<'a> {
    pub dir_name: &'a str,
    pub version: Version,
}

/// Parse the version out of an installation directory name.
///
/// `"Blender 4.0"` and `"Blender 4.0.2"` yield 4.0.0; anything after the
/// minor component is ignored. Returns `None` when the name doesn't start
/// with `"<product> "` followed by `<digits>.<digits>`.
pub fn parse_install_version(product: &str, dir_name: &str) -> Option<Version> {
    let rest = dir_name.strip_prefix(product)?.strip_prefix(' ')?;
    let token = rest.split_whitespace().next()?;

    let mut parts = token.split('.');
    let major = parse_component(parts.next()?)?;
    let minor = parse_component(parts.next()?)?;

    Some(Version::new(major, minor, 0))
}

/// Component must be non-empty ASCII digits; `u64::from_str` alone would
/// also accept a leading `+`.
fn parse_component(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Pick the highest-versioned installation among `dir_names`.
///
/// Names that fail to parse are skipped. On equal versions the first name in
/// input order wins.
pub fn select_latest_install<'a, I>(product: &str, dir_names: I) -> Option<InstallCandidate<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<InstallCandidate<'a>> = None;

    for dir_name in dir_names {
        let Some(version) = parse_install_version(product, dir_name) else {
            tracing::debug!("Skipping unversioned directory '{}'", dir_name);
            continue;
        };

        let is_better = best.as_ref().is_none_or(|b| version > b.version);
        if is_better {
            best = Some(InstallCandidate { dir_name, version });
        }
    }

    best
}

/// Suggest where the user should start browsing for the renderer executable.
///
/// Returns the newest versioned installation under `root`, or `root` itself
/// when nothing parses. Returns `None` when `root` is not a readable directory.
pub fn suggest_start_dir(root: &Path, product: &str) -> Option<PathBuf> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Install root {} not readable: {}", root.display(), e);
            return None;
        }
    };

    let names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();

    match select_latest_install(product, names.iter().map(String::as_str)) {
        Some(best) => {
            tracing::info!("Newest {} installation: {} ({})", product, best.dir_name, best.version);
            Some(root.join(best.dir_name))
        }
        None => Some(root.to_path_buf()),
    }
}
