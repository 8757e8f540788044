use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

use crate::{decide, ReconcileReport, Transition};

/// Zero-length marker file. Existence means "enforcement enabled".
///
/// The filesystem is the only record of the state; nothing is cached here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Make existence match `enabled`.
    ///
    /// Enabling an existing file truncates it and bumps its modification
    /// time: the consumer treats a stale file as absent. Parent directories
    /// are not created.
    pub fn apply(&self, enabled: bool) -> Result<Transition> {
        let existed = self.exists();

        if enabled {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)
                .with_context(|| format!("create state file failed: {}", self.path.display()))?;
            file.set_modified(SystemTime::now()).with_context(|| {
                format!("touch state file failed: {}", self.path.display())
            })?;
            return Ok(if existed {
                Transition::Refreshed
            } else {
                Transition::Created
            });
        }

        if !existed {
            return Ok(Transition::Unchanged);
        }
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(Transition::Removed),
            // Removed underneath us; the target state holds.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Transition::Unchanged),
            Err(e) => Err(e)
                .with_context(|| format!("remove state file failed: {}", self.path.display())),
        }
    }
}

/// Decide on `raw` and apply the result to `state_file`.
///
/// Ambiguous values resolve to "disabled" and remove the file. Only
/// filesystem failures are returned as errors.
pub fn reconcile_state_file(raw: &str, state_file: &StateFile) -> Result<ReconcileReport> {
    let decision = decide(raw);
    if decision.reason.is_fail_safe() {
        warn!(
            reason = %decision.reason,
            path = %state_file.path().display(),
            "attribute value not usable; enforcement disabled"
        );
    }

    let transition = state_file.apply(decision.enabled)?;
    if transition.is_change() {
        info!(
            enabled = decision.enabled,
            transition = transition.as_str(),
            path = %state_file.path().display(),
            "state file updated"
        );
    }

    Ok(ReconcileReport {
        decision,
        transition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn enable_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let sf = StateFile::new(dir.path().join("state"));

        assert_eq!(sf.apply(true).unwrap(), Transition::Created);
        assert!(sf.exists());
        assert_eq!(fs::metadata(sf.path()).unwrap().len(), 0);
    }

    #[test]
    fn enable_again_refreshes_mtime_and_clears_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        fs::write(&path, "leftover").unwrap();
        let old = SystemTime::now() - Duration::from_secs(3600);
        fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let sf = StateFile::new(&path);
        assert_eq!(sf.apply(true).unwrap(), Transition::Refreshed);

        let meta = fs::metadata(&path).unwrap();
        assert_eq!(meta.len(), 0);
        assert!(meta.modified().unwrap() > old + Duration::from_secs(60));
    }

    #[test]
    fn disable_removes_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let sf = StateFile::new(dir.path().join("state"));
        sf.apply(true).unwrap();

        assert_eq!(sf.apply(false).unwrap(), Transition::Removed);
        assert!(!sf.exists());
        assert_eq!(sf.apply(false).unwrap(), Transition::Unchanged);
    }

    #[test]
    fn missing_parent_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sf = StateFile::new(dir.path().join("nope").join("state"));

        let err = sf.apply(true).unwrap_err();
        assert!(format!("{err:#}").contains("create state file failed"));
    }

    #[test]
    fn directory_in_place_of_file_cannot_be_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        fs::create_dir(&path).unwrap();

        let err = StateFile::new(&path).apply(false).unwrap_err();
        assert!(format!("{err:#}").contains("remove state file failed"));
    }
}
