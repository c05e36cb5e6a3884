use crate::error::{Red64Error, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RED64_DIR: &str = ".red64";
pub const PLUGINS_DIR: &str = "plugins";

pub const CONFIG_FILE: &str = ".red64/config.yaml";
pub const MISSION_FILE: &str = ".red64/product/mission.md";
pub const ROADMAP_FILE: &str = ".red64/product/roadmap.md";

pub const STANDARDS_MANIFEST: &str = "standards.json";
pub const SKILLS_DIR: &str = "skills";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn mission_path(root: &Path) -> PathBuf {
    root.join(MISSION_FILE)
}

pub fn roadmap_path(root: &Path) -> PathBuf {
    root.join(ROADMAP_FILE)
}

pub fn plugins_dir(root: &Path) -> PathBuf {
    root.join(PLUGINS_DIR)
}

pub fn standard_dir(plugins: &Path, identifier: &str) -> PathBuf {
    plugins.join(identifier)
}

pub fn standards_manifest(plugins: &Path, identifier: &str) -> PathBuf {
    standard_dir(plugins, identifier).join(STANDARDS_MANIFEST)
}

pub fn skills_dir(plugins: &Path, identifier: &str) -> PathBuf {
    standard_dir(plugins, identifier).join(SKILLS_DIR)
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Walk upward from `start` until a directory containing `.red64/config.yaml`
/// is found, and return that directory (the project root).
pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        if config_path(d).is_file() {
            return Ok(d.to_path_buf());
        }
        dir = d.parent();
    }
    Err(Red64Error::ConfigNotFound)
}
