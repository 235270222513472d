//! Best-effort copying of optional extension assets.
//!
//! Unlike installation and config materialization, nothing here can fail
//! the pipeline: a missing source is skipped and a failed copy is logged and
//! recorded as [`ExtensionOutcome::CopyFailedTolerated`].

use crate::io;
use crate::paths;
use crate::report::{Event, Reporter};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExtensionOutcome {
    SkippedAbsent { source: PathBuf },
    Copied { source: PathBuf, dest: PathBuf },
    CopyFailedTolerated { source: PathBuf, reason: String },
}

/// Copy each existing file in `files` into `target_dir` under its base name.
///
/// Paths are relative to `root`. Returns one outcome per listed file, in order.
pub fn wire_extensions<P: AsRef<Path>>(
    root: &Path,
    target_dir: &Path,
    files: &[P],
    reporter: &mut dyn Reporter,
) -> Vec<ExtensionOutcome> {
    let asset_dir = root.join(target_dir);
    let dir_error = io::ensure_dir(&asset_dir).err().map(|e| e.to_string());
    if let Some(reason) = &dir_error {
        tracing::warn!(dir = %asset_dir.display(), %reason, "extension directory unavailable");
    }

    let mut outcomes = Vec::with_capacity(files.len());
    for file in files {
        let source = file.as_ref().to_path_buf();
        let outcome = wire_one(root, &asset_dir, source, dir_error.as_deref());
        if let ExtensionOutcome::CopyFailedTolerated { source, reason } = &outcome {
            tracing::warn!(source = %source.display(), %reason, "extension copy failed, continuing");
        }
        reporter.report(Event::Extension(&outcome));
        outcomes.push(outcome);
    }
    outcomes
}

fn wire_one(
    root: &Path,
    asset_dir: &Path,
    source: PathBuf,
    dir_error: Option<&str>,
) -> ExtensionOutcome {
    let abs = root.join(&source);
    if !abs.exists() {
        return ExtensionOutcome::SkippedAbsent { source };
    }
    if let Some(reason) = dir_error {
        return ExtensionOutcome::CopyFailedTolerated {
            source,
            reason: reason.to_string(),
        };
    }
    let Some(dest) = paths::extension_dest(asset_dir, &source) else {
        return ExtensionOutcome::CopyFailedTolerated {
            source,
            reason: "source has no file name".to_string(),
        };
    };
    match std::fs::copy(&abs, &dest) {
        Ok(_) => ExtensionOutcome::Copied { source, dest },
        Err(e) => ExtensionOutcome::CopyFailedTolerated {
            source,
            reason: e.to_string(),
        },
    }
}
