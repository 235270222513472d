use crate::error::{BootstrapError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// CommandSpec
// ---------------------------------------------------------------------------

/// One external command as an argument list. Never run through a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Human-readable form used in progress lines and error messages.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

// ---------------------------------------------------------------------------
// InstallConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    #[serde(default = "default_install_commands")]
    pub commands: Vec<CommandSpec>,
    /// Per-command limit. `0` disables the limit.
    #[serde(default = "default_install_timeout")]
    pub timeout_seconds: u64,
}

fn default_install_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("pip", ["install", "--upgrade", "pip"]),
        CommandSpec::new("pip", ["install", "-r", "requirements.txt"]),
    ]
}

fn default_install_timeout() -> u64 {
    900
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            commands: default_install_commands(),
            timeout_seconds: default_install_timeout(),
        }
    }
}

impl InstallConfig {
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_seconds > 0).then(|| std::time::Duration::from_secs(self.timeout_seconds))
    }
}

// ---------------------------------------------------------------------------
// ExtensionsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionsConfig {
    #[serde(default = "default_extensions_target")]
    pub target_dir: PathBuf,
    #[serde(default = "default_extension_files")]
    pub files: Vec<PathBuf>,
}

fn default_extensions_target() -> PathBuf {
    PathBuf::from(paths::EXTENSIONS_DIR)
}

fn default_extension_files() -> Vec<PathBuf> {
    [
        "frappe-bench/custom-forms/bike-rental-form.js",
        "frappe-bench/custom-forms/guest-checkin-form.js",
        "frappe-bench/src/volunteer-system.js",
        "frappe-bench/src/index.js",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            target_dir: default_extensions_target(),
            files: default_extension_files(),
        }
    }
}

// ---------------------------------------------------------------------------
// WebConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_entry_file")]
    pub entry_file: PathBuf,
    #[serde(default = "default_web_command")]
    pub command: String,
}

fn default_entry_file() -> PathBuf {
    PathBuf::from(paths::WEB_ENTRY_FILE)
}

fn default_web_command() -> String {
    "site-bootstrap serve".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            entry_file: default_entry_file(),
            command: default_web_command(),
        }
    }
}

// ---------------------------------------------------------------------------
// BootstrapConfig (top-level)
// ---------------------------------------------------------------------------

/// Contents of the optional `bootstrap.yaml` at the bootstrap root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_site_name")]
    pub site_name: String,
    #[serde(default = "default_apps")]
    pub apps: Vec<String>,
    #[serde(default = "default_directories")]
    pub directories: Vec<PathBuf>,
    #[serde(default)]
    pub install: InstallConfig,
    #[serde(default)]
    pub extensions: ExtensionsConfig,
    #[serde(default)]
    pub web: WebConfig,
}

fn default_site_name() -> String {
    paths::DEFAULT_SITE_NAME.to_string()
}

fn default_apps() -> Vec<String> {
    vec!["frappe".to_string(), "erpnext".to_string()]
}

fn default_directories() -> Vec<PathBuf> {
    [paths::LOGS_DIR, paths::SITES_DIR, paths::PUBLIC_DIR]
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            site_name: default_site_name(),
            apps: default_apps(),
            directories: default_directories(),
            install: InstallConfig::default(),
            extensions: ExtensionsConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl BootstrapConfig {
    /// Load `bootstrap.yaml` from `root`, falling back to built-in defaults
    /// when the file does not exist. Error-level validation findings are fatal.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::bootstrap_config_path(root);
        let cfg = if path.exists() {
            let data = std::fs::read_to_string(&path)
                .map_err(|e| BootstrapError::fs("read", &path, e))?;
            serde_yaml::from_str::<BootstrapConfig>(&data)?
        } else {
            BootstrapConfig::default()
        };

        paths::validate_site_name(&cfg.site_name)?;
        let errors: Vec<String> = cfg
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message)
            .collect();
        if !errors.is_empty() {
            return Err(BootstrapError::InvalidConfig(errors.join("; ")));
        }
        Ok(cfg)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for cmd in &self.install.commands {
            if cmd.program.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("install command has an empty program: '{}'", cmd.display()),
                });
            }
        }

        if self.apps.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "apps must list at least one application".to_string(),
            });
        }
        for (i, app) in self.apps.iter().enumerate() {
            if app.trim().is_empty() || app.contains(char::is_whitespace) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("invalid app name '{app}'"),
                });
            } else if self.apps[..i].contains(app) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("app '{app}' is listed more than once"),
                });
            }
        }

        for file in &self.extensions.files {
            if file.file_name().is_none() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "extension '{}' has no file name and will always be skipped",
                        file.display()
                    ),
                });
            }
        }

        if self.web.command.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "web.command must not be empty".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
