use crate::error::{BootstrapError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Any existing file is replaced wholesale; readers never see a partial write.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;
    let mut tmp =
        NamedTempFile::new_in(dir).map_err(|e| BootstrapError::fs("create tempfile in", dir, e))?;
    tmp.write_all(data)
        .map_err(|e| BootstrapError::fs("write", path, e))?;
    tmp.persist(path)
        .map_err(|e| BootstrapError::fs("write", path, e.error))?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| BootstrapError::fs("create", path, e))
}
