use crate::error::Result;
use crate::io;
use std::path::{Path, PathBuf};

/// A directory the provisioner made sure of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub path: PathBuf,
    pub created: bool,
}

/// Ensure every directory in `dirs` (relative to `root`) exists.
///
/// Idempotent: existing directories are left untouched. The first filesystem
/// error aborts the step.
pub fn ensure_directories<P: AsRef<Path>>(root: &Path, dirs: &[P]) -> Result<Vec<Provisioned>> {
    let mut out = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let path = root.join(dir);
        let created = !path.is_dir();
        io::ensure_dir(&path)?;
        tracing::debug!(path = %path.display(), created, "directory ready");
        out.push(Provisioned { path, created });
    }
    Ok(out)
}
