use crate::env::ResolvedConfig;
use crate::error::{BootstrapError, Result};
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DB_TYPE: &str = "postgres";

// ---------------------------------------------------------------------------
// SiteConfigFile
// ---------------------------------------------------------------------------

/// The per-site `site_config.json` read by the downstream application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfigFile {
    pub db_name: String,
    pub db_password: String,
    pub db_type: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub auto_update: bool,
    pub serve_default_site: bool,
    pub default_site: String,
    pub cache_endpoint: String,
    pub queue_endpoint: String,
    pub socket_endpoint: String,
}

impl SiteConfigFile {
    pub fn new(cfg: &ResolvedConfig, site_name: &str) -> Self {
        Self {
            db_name: cfg.db_name.clone(),
            db_password: cfg.db_password.clone(),
            db_type: DB_TYPE.to_string(),
            db_host: cfg.db_host.clone(),
            db_port: cfg.db_port,
            db_user: cfg.db_user.clone(),
            auto_update: true,
            serve_default_site: true,
            default_site: site_name.to_string(),
            cache_endpoint: cfg.cache_endpoint.clone(),
            queue_endpoint: cfg.queue_endpoint.clone(),
            socket_endpoint: cfg.socket_endpoint.clone(),
        }
    }

    pub fn load(root: &Path, site_name: &str) -> Result<Self> {
        let path = paths::site_config_path(root, site_name);
        let data =
            std::fs::read_to_string(&path).map_err(|e| BootstrapError::fs("read", &path, e))?;
        Ok(serde_json::from_str(&data)?)
    }
}

// ---------------------------------------------------------------------------
// Materialization
// ---------------------------------------------------------------------------

/// Files written by [`write_site_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub config_path: PathBuf,
    pub config_replaced: bool,
    pub manifest_path: PathBuf,
    pub manifest_replaced: bool,
}

/// Write `sites/<site>/site_config.json` and `sites/apps.txt`.
///
/// Both files are replaced wholesale; manual edits to either are lost.
pub fn write_site_config(
    root: &Path,
    cfg: &ResolvedConfig,
    site_name: &str,
    apps: &[String],
) -> Result<Materialized> {
    paths::validate_site_name(site_name)?;
    io::ensure_dir(&paths::site_dir(root, site_name))?;

    let config_path = paths::site_config_path(root, site_name);
    let config_replaced = config_path.exists();
    let mut data = serde_json::to_string_pretty(&SiteConfigFile::new(cfg, site_name))?;
    data.push('\n');
    io::atomic_write(&config_path, data.as_bytes())?;
    tracing::info!(path = %config_path.display(), "site config written");

    let manifest_path = paths::apps_manifest_path(root);
    let manifest_replaced = manifest_path.exists();
    io::atomic_write(&manifest_path, render_manifest(apps).as_bytes())?;

    Ok(Materialized {
        config_path,
        config_replaced,
        manifest_path,
        manifest_replaced,
    })
}

/// One application name per line, in the given order.
pub fn render_manifest(apps: &[String]) -> String {
    let mut out = String::new();
    for app in apps {
        out.push_str(app);
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
