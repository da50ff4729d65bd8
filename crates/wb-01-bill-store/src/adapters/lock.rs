//! # Data Directory Lock
//!
//! One indexer process per data directory. The durable store takes an
//! exclusive `fs2` lock on `<data_dir>/LOCK` when it opens and keeps it until
//! it is dropped. The lock file carries the holder's PID so a second process
//! can say who it collided with.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

const LOCK_FILE_NAME: &str = "LOCK";

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock file {path} unusable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("data directory {} is used by another indexer{}", .path.display(), holder_suffix(.holder))]
    Held { path: PathBuf, holder: Option<u32> },
}

fn holder_suffix(holder: &Option<u32>) -> String {
    holder.map(|pid| format!(" (pid {pid})")).unwrap_or_default()
}

/// Held for as long as the store that owns it is open.
pub struct DataDirLock {
    file: File,
    path: PathBuf,
}

impl DataDirLock {
    pub fn acquire(data_dir: &Path) -> Result<Self, LockError> {
        let path = data_dir.join(LOCK_FILE_NAME);
        let io_err = |source| LockError::Io {
            path: path.clone(),
            source,
        };

        // Not truncated on open: a running holder's PID must stay readable
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err)?;

        if file.try_lock_exclusive().is_err() {
            return Err(LockError::Held {
                holder: holder_pid(&path),
                path: data_dir.to_path_buf(),
            });
        }

        file.set_len(0).map_err(io_err)?;
        writeln!(file, "{}", std::process::id()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        tracing::debug!("[wb-01] Locked {}", path.display());
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn holder_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
    }
}
