//! Per-session Chrome profile directories
//!
//! Every lead runs in its own browser, and every browser gets its own
//! UUID-named profile directory so concurrent launches never contend for
//! Chrome's `SingletonLock`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Prefix of every profile directory created under the temp dir
pub const PROFILE_PREFIX: &str = "property_harvest_chrome";

/// RAII wrapper for a Chrome profile directory
///
/// The directory is removed on drop. Drop only after the browser process
/// has exited, otherwise Chrome may still hold files open.
#[derive(Debug)]
pub struct BrowserProfile {
    path: PathBuf,
}

impl BrowserProfile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BrowserProfile {
    fn drop(&mut self) {
        if self.path.exists() {
            debug!("Removing browser profile {}", self.path.display());
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!("Failed to remove profile directory {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Create a fresh profile directory under the system temp dir
pub fn create_unique_profile() -> Result<BrowserProfile> {
    create_profile_in(&std::env::temp_dir())
}

/// Create a fresh profile directory under `parent`
pub fn create_profile_in(parent: &Path) -> Result<BrowserProfile> {
    let path = parent.join(format!("{PROFILE_PREFIX}_{}", Uuid::new_v4()));

    // create_dir (not create_dir_all) fails if the directory already exists
    std::fs::create_dir(&path)
        .with_context(|| format!("Failed to create profile directory: {}", path.display()))?;

    debug!("Created browser profile {}", path.display());
    Ok(BrowserProfile { path })
}
