use crate::error::{BootstrapError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const LOGS_DIR: &str = "logs";
pub const SITES_DIR: &str = "sites";
pub const PUBLIC_DIR: &str = "public";
pub const EXTENSIONS_DIR: &str = "apps/de_bra_hostel";

pub const BOOTSTRAP_CONFIG_FILE: &str = "bootstrap.yaml";
pub const SITE_CONFIG_FILE: &str = "site_config.json";
pub const APPS_MANIFEST_FILE: &str = "sites/apps.txt";
pub const WEB_ENTRY_FILE: &str = "Procfile";

pub const DEFAULT_SITE_NAME: &str = "debrasite";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn bootstrap_config_path(root: &Path) -> PathBuf {
    root.join(BOOTSTRAP_CONFIG_FILE)
}

pub fn site_dir(root: &Path, site: &str) -> PathBuf {
    root.join(SITES_DIR).join(site)
}

pub fn site_config_path(root: &Path, site: &str) -> PathBuf {
    site_dir(root, site).join(SITE_CONFIG_FILE)
}

pub fn apps_manifest_path(root: &Path) -> PathBuf {
    root.join(APPS_MANIFEST_FILE)
}

/// Destination of an extension asset: the asset directory plus the source's base name.
/// Returns `None` when the source has no file name component (e.g. `..`).
pub fn extension_dest(asset_dir: &Path, source: &Path) -> Option<PathBuf> {
    source.file_name().map(|name| asset_dir.join(name))
}

// ---------------------------------------------------------------------------
// Site name validation
// ---------------------------------------------------------------------------

static SITE_RE: OnceLock<Regex> = OnceLock::new();

fn site_re() -> &'static Regex {
    SITE_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9._\-]*[a-z0-9]$|^[a-z0-9]$").expect("static regex")
    })
}

/// Site names become directory names under `sites/`, so they must not
/// contain separators or start with a dot.
pub fn validate_site_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !site_re().is_match(name) || name.contains("..") {
        return Err(BootstrapError::InvalidSiteName(name.to_string()));
    }
    Ok(())
}
