//! Exclusive lock held for the lifetime of a tracking run.
//!
//! Only one `ft run` may record into a database at a time. A second run
//! would treat the first run's live session as stale and close it.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

/// Advisory lock on `<database>.lock`, released when dropped.
#[derive(Debug)]
pub struct RunLock {
    _file: File,
    path: PathBuf,
}

impl RunLock {
    /// Takes the lock for `database_path` without waiting.
    ///
    /// Fails if another process already holds it.
    pub fn acquire(database_path: &Path) -> Result<Self> {
        let path = lock_path(database_path);
        let file = File::create(&path)
            .with_context(|| format!("failed to create lock file {}", path.display()))?;
        file.try_lock_exclusive().with_context(|| {
            format!(
                "another `ft run` is already recording into {}",
                database_path.display()
            )
        })?;
        tracing::debug!(path = %path.display(), "acquired run lock");
        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_path(database_path: &Path) -> PathBuf {
    let mut name = OsString::from(database_path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_file_sits_next_to_database() {
        assert_eq!(
            lock_path(Path::new("/data/ft.db")),
            PathBuf::from("/data/ft.db.lock")
        );
    }

    #[test]
    fn second_run_lock_fails_while_held() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("ft.db");

        let first = RunLock::acquire(&db_path).unwrap();
        assert!(first.path().exists());

        let err = RunLock::acquire(&db_path).unwrap_err();
        assert!(
            err.to_string().contains("already recording"),
            "unexpected error: {err}"
        );

        drop(first);
        RunLock::acquire(&db_path).unwrap();
    }
}
