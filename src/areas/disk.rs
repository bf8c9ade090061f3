//! Local filesystem probes and timestamp hygiene

use crate::areas::NodeKind;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

static SLEEP_FOR_TIMESTAMPS: AtomicBool = AtomicBool::new(true);

/// Kind of the node at `path` on disk. Absence is `NodeKind::None`, not an
/// error; anything that is neither a file nor a directory is `Unknown`.
pub fn check_path(path: &Path) -> Result<NodeKind> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(NodeKind::Dir),
        Ok(meta) if meta.is_file() || meta.file_type().is_symlink() => Ok(NodeKind::File),
        Ok(_) => Ok(NodeKind::Unknown),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(NodeKind::None),
        Err(err) => Err(err.into()),
    }
}

pub fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path)?;
    Ok(())
}

/// Create a uniquely named sibling of `base` (`base.tmp`, `base.2.tmp`, ...)
/// and return its path and open handle.
pub fn create_unique_file(base: &Path) -> Result<(PathBuf, fs::File)> {
    for attempt in 1u32..=99999 {
        let candidate = if attempt == 1 {
            PathBuf::from(format!("{}.tmp", base.display()))
        } else {
            PathBuf::from(format!("{}.{attempt}.tmp", base.display()))
        };
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((candidate, file)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("unable to make name for '{}'", base.display()),
    )
    .into())
}

/// Wait until the wall clock ticks past the filesystem timestamp
/// granularity, so that a subsequent change to a just-written file cannot
/// share its timestamp. Invoked after any batch of working-copy mutations.
pub fn sleep_for_timestamps() {
    if !SLEEP_FOR_TIMESTAMPS.load(Ordering::Relaxed) {
        return;
    }
    let nanos_into_second = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let remainder = Duration::from_secs(1) - Duration::from_nanos(u64::from(nanos_into_second));
    std::thread::sleep(remainder.min(Duration::from_secs(1)));
}

/// Disable or re-enable [`sleep_for_timestamps`] process-wide. Tests disable
/// it; nothing else should.
pub fn set_sleep_for_timestamps_enabled(enabled: bool) {
    SLEEP_FOR_TIMESTAMPS.store(enabled, Ordering::Relaxed);
}
