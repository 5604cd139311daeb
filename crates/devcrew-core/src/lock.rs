use crate::error::{CrewError, Result};
use crate::paths;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Advisory per-project busy flag.
///
/// `process_milestone` holds one of these for the duration of a run; a second
/// acquisition on the same identity fails with `ProjectBusy` instead of
/// interleaving writes. Distinct projects lock independently. This is the
/// only resource held across the slow model calls.
#[derive(Debug)]
pub struct ProjectLock {
    path: PathBuf,
}

impl ProjectLock {
    pub fn acquire(root: &Path, slug: &str) -> Result<Self> {
        paths::validate_slug(slug)?;
        let path = paths::lock_file(root, slug);
        if let Some(parent) = path.parent() {
            crate::io::ensure_dir(parent)?;
        }
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(mut f) => {
                // Record the holder for operator diagnosis of stale locks.
                let _ = writeln!(f, "{}", std::process::id());
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // Best effort: the recorded pid lets the operator tell a live
                // run from a stale lock left by a killed process.
                let holder = std::fs::read_to_string(&path)
                    .ok()
                    .and_then(|s| s.trim().parse().ok());
                Err(CrewError::ProjectBusy {
                    slug: slug.to_string(),
                    holder,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
