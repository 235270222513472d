use crate::config::WebConfig;
use crate::error::Result;
use crate::io;
use std::path::{Path, PathBuf};

/// Render the process declaration that starts the status web server.
/// The server reads `PORT` itself, so the command carries no port.
pub fn render(web: &WebConfig) -> String {
    format!("web: {}\n", web.command.trim())
}

/// (Re)generate the web entry artifact. Returns its path and whether an
/// existing file was replaced.
pub fn write_web_entry(root: &Path, web: &WebConfig) -> Result<(PathBuf, bool)> {
    let path = root.join(&web.entry_file);
    let replaced = path.exists();
    io::atomic_write(&path, render(web).as_bytes())?;
    Ok((path, replaced))
}
