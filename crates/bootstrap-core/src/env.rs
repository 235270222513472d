//! Environment resolution.
//!
//! Platform-provided connection variables are overlaid onto built-in
//! defaults to produce a [`ResolvedConfig`]. Resolution never fails and never
//! mutates the process environment: absent, empty, or unparsable variables
//! fall back to their defaults.

use crate::paths;
use serde::Serialize;
use std::collections::BTreeMap;

pub const PGHOST: &str = "PGHOST";
pub const PGPORT: &str = "PGPORT";
pub const PGDATABASE: &str = "PGDATABASE";
pub const PGUSER: &str = "PGUSER";
pub const PGPASSWORD: &str = "PGPASSWORD";
pub const REDIS_URL: &str = "REDIS_URL";
pub const DATABASE_URL: &str = "DATABASE_URL";
pub const PORT: &str = "PORT";
pub const SECRET_KEY: &str = "SECRET_KEY";

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_NAME: &str = "erpnext";
pub const DEFAULT_DB_USER: &str = "postgres";
pub const DEFAULT_DB_PASSWORD: &str = "";
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
pub const DEFAULT_WEB_PORT: u16 = 8000;
pub const DEFAULT_SECRET_KEY: &str = "de-bra-hostel-secret-key";

const MASK: &str = "********";

/// A resolved configuration value: either text or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Str(String),
    Int(i64),
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Str(s) => write!(f, "{s}"),
            ConfigValue::Int(n) => write!(f, "{n}"),
        }
    }
}

/// Environment-derived configuration for one bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub site_name: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub cache_endpoint: String,
    pub queue_endpoint: String,
    pub socket_endpoint: String,
    pub web_port: u16,
    /// Surfaced by `resolve` (masked) only. The status server keeps no
    /// sessions and never reads it.
    pub secret_key: String,
    /// Advisory only; its absence never changes control flow.
    pub database_url: Option<String>,
}

impl ResolvedConfig {
    /// Resolve from the current process environment.
    pub fn resolve() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve using an arbitrary variable lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let text = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let redis = text(REDIS_URL, DEFAULT_REDIS_URL);

        Self {
            site_name: paths::DEFAULT_SITE_NAME.to_string(),
            db_host: text(PGHOST, DEFAULT_DB_HOST),
            db_port: port(get(PGPORT), PGPORT, DEFAULT_DB_PORT),
            db_name: text(PGDATABASE, DEFAULT_DB_NAME),
            db_user: text(PGUSER, DEFAULT_DB_USER),
            db_password: text(PGPASSWORD, DEFAULT_DB_PASSWORD),
            cache_endpoint: redis_endpoint(&redis, 1),
            queue_endpoint: redis_endpoint(&redis, 2),
            socket_endpoint: redis_endpoint(&redis, 3),
            web_port: port(get(PORT), PORT, DEFAULT_WEB_PORT),
            secret_key: text(SECRET_KEY, DEFAULT_SECRET_KEY),
            database_url: get(DATABASE_URL),
        }
    }

    /// Replace the site identifier. Used once, before the value is shared.
    pub fn with_site_name(mut self, site_name: impl Into<String>) -> Self {
        self.site_name = site_name.into();
        self
    }

    /// Every resolved key with its value.
    pub fn entries(&self) -> BTreeMap<&'static str, ConfigValue> {
        let s = |v: &str| ConfigValue::Str(v.to_string());
        BTreeMap::from([
            ("site_name", s(&self.site_name)),
            ("db_host", s(&self.db_host)),
            ("db_port", ConfigValue::Int(i64::from(self.db_port))),
            ("db_name", s(&self.db_name)),
            ("db_user", s(&self.db_user)),
            ("db_password", s(&self.db_password)),
            ("cache_endpoint", s(&self.cache_endpoint)),
            ("queue_endpoint", s(&self.queue_endpoint)),
            ("socket_endpoint", s(&self.socket_endpoint)),
            ("web_port", ConfigValue::Int(i64::from(self.web_port))),
            ("secret_key", s(&self.secret_key)),
        ])
    }

    /// [`entries`](Self::entries) with secrets replaced, for display.
    pub fn masked_entries(&self) -> BTreeMap<&'static str, ConfigValue> {
        let mut entries = self.entries();
        for key in ["db_password", "secret_key"] {
            if let Some(ConfigValue::Str(v)) = entries.get_mut(key) {
                if !v.is_empty() {
                    *v = MASK.to_string();
                }
            }
        }
        entries
    }
}

fn port(raw: Option<String>, key: &str, default: u16) -> u16 {
    match raw {
        None => default,
        Some(v) => v.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{key}={v:?} is not a valid port, using {default}");
            default
        }),
    }
}

/// `url` pointed at database `index`. Any existing index is replaced and a
/// `?query` suffix is carried over unchanged.
fn redis_endpoint(url: &str, index: u8) -> String {
    match url.split_once('?') {
        Some((path, query)) => format!("{}/{index}?{query}", redis_base(path)),
        None => format!("{}/{index}", redis_base(url)),
    }
}

/// Strip a trailing `/N` database index so per-purpose indexes can be appended.
fn redis_base(url: &str) -> String {
    let url = url.trim_end_matches('/');
    let authority_start = url.find("://").map(|i| i + 3).unwrap_or(0);
    if let Some(slash) = url.rfind('/').filter(|&i| i >= authority_start) {
        let tail = &url[slash + 1..];
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            return url[..slash].to_string();
        }
    }
    url.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve_with(vars: &[(&str, &str)]) -> ResolvedConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ResolvedConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = resolve_with(&[]);
        assert_eq!(cfg.db_host, "localhost");
        assert_eq!(cfg.db_port, 5432);
        assert_eq!(cfg.db_name, "erpnext");
        assert_eq!(cfg.db_user, "postgres");
        assert_eq!(cfg.db_password, "");
        assert_eq!(cfg.site_name, "debrasite");
        assert_eq!(cfg.cache_endpoint, "redis://localhost:6379/1");
        assert_eq!(cfg.queue_endpoint, "redis://localhost:6379/2");
        assert_eq!(cfg.socket_endpoint, "redis://localhost:6379/3");
        assert_eq!(cfg.web_port, 8000);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn overrides_win_over_defaults() {
        let cfg = resolve_with(&[
            ("PGHOST", "dbhost"),
            ("PGPORT", "5433"),
            ("PGDATABASE", "erp"),
            ("PGUSER", "admin"),
            ("PGPASSWORD", "secret"),
            ("PORT", "9090"),
        ]);
        assert_eq!(cfg.db_host, "dbhost");
        assert_eq!(cfg.db_port, 5433);
        assert_eq!(cfg.db_name, "erp");
        assert_eq!(cfg.db_user, "admin");
        assert_eq!(cfg.db_password, "secret");
        assert_eq!(cfg.web_port, 9090);
    }

    #[test]
    fn every_subset_populates_every_key() {
        let all = [
            ("PGHOST", "h"),
            ("PGPORT", "1"),
            ("PGDATABASE", "d"),
            ("PGUSER", "u"),
            ("PGPASSWORD", "p"),
            ("REDIS_URL", "redis://r:1"),
        ];
        for mask in 0u32..(1 << all.len()) {
            let subset: Vec<(&str, &str)> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, kv)| *kv)
                .collect();
            let entries = resolve_with(&subset).entries();
            assert_eq!(entries.len(), 11, "subset {mask:#b}");
            for key in ["db_host", "db_port", "db_name", "db_user", "site_name"] {
                assert!(entries.contains_key(key), "missing {key} for {mask:#b}");
            }
        }
    }

    #[test]
    fn empty_and_invalid_values_fall_back() {
        let cfg = resolve_with(&[("PGHOST", ""), ("PGPORT", "not-a-port"), ("PORT", "70000")]);
        assert_eq!(cfg.db_host, "localhost");
        assert_eq!(cfg.db_port, 5432);
        assert_eq!(cfg.web_port, 8000);
    }

    #[test]
    fn redis_url_gets_distinct_indexes() {
        let cfg = resolve_with(&[("REDIS_URL", "redis://default:pw@cache.internal:6380")]);
        assert_eq!(cfg.cache_endpoint, "redis://default:pw@cache.internal:6380/1");
        assert_eq!(cfg.queue_endpoint, "redis://default:pw@cache.internal:6380/2");
        assert_eq!(cfg.socket_endpoint, "redis://default:pw@cache.internal:6380/3");
    }

    #[test]
    fn redis_base_strips_existing_index() {
        assert_eq!(redis_base("redis://host:6379/0"), "redis://host:6379");
        assert_eq!(redis_base("redis://host:6379/"), "redis://host:6379");
        assert_eq!(redis_base("redis://host:6379"), "redis://host:6379");
        assert_eq!(redis_base("redis://host:6379/cache"), "redis://host:6379/cache");
    }

    #[test]
    fn redis_query_string_is_preserved() {
        let cfg = resolve_with(&[(REDIS_URL, "rediss://default:pw@h:6380?ssl_cert_reqs=none")]);
        assert_eq!(cfg.cache_endpoint, "rediss://default:pw@h:6380/1?ssl_cert_reqs=none");
        assert_eq!(cfg.socket_endpoint, "rediss://default:pw@h:6380/3?ssl_cert_reqs=none");

        let cfg = resolve_with(&[(REDIS_URL, "redis://h:6379/0?timeout=5")]);
        assert_eq!(cfg.cache_endpoint, "redis://h:6379/1?timeout=5");
        assert_eq!(cfg.queue_endpoint, "redis://h:6379/2?timeout=5");
    }

    #[test]
    fn masked_entries_hide_secrets() {
        let cfg = resolve_with(&[("PGPASSWORD", "secret")]);
        let masked = cfg.masked_entries();
        assert_eq!(masked["db_password"], ConfigValue::Str(MASK.to_string()));
        assert_eq!(masked["secret_key"], ConfigValue::Str(MASK.to_string()));
        assert_eq!(masked["db_port"], ConfigValue::Int(5432));

        let empty = resolve_with(&[]).masked_entries();
        assert_eq!(empty["db_password"], ConfigValue::Str(String::new()));
    }

    #[test]
    fn with_site_name_replaces_identifier() {
        let cfg = resolve_with(&[]).with_site_name("hostel-main");
        assert_eq!(cfg.site_name, "hostel-main");
    }
}
