//! The retained-copy slot: one shared directory holding the most recent
//! build's rendered output.
//!
//! Every build overwrites the slot. Replacements are serialized through a
//! mutex so two finishing builds never interleave their copies; the last one
//! to take the lock wins and no history is kept.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::staging::copy_tree;

#[derive(Debug)]
pub struct RetainedOutput {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

/// Exclusive access to the slot.
///
/// The guard is owned, so it can move into the blocking task doing the copy
/// and stays held until that copy ends, even if the awaiting caller is gone.
#[derive(Debug)]
pub struct RetainedSlot {
    dir: PathBuf,
    _guard: OwnedMutexGuard<()>,
}

impl RetainedOutput {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Wait for exclusive access to the slot.
    pub async fn acquire(&self) -> RetainedSlot {
        RetainedSlot {
            dir: self.dir.clone(),
            _guard: Arc::clone(&self.lock).lock_owned().await,
        }
    }

    /// Replace the slot's contents with a copy of `rendered`.
    pub async fn replace_with(&self, rendered: &Path) -> io::Result<()> {
        let slot = self.acquire().await;
        let src = rendered.to_path_buf();
        tokio::task::spawn_blocking(move || slot.replace_from(&src))
            .await
            .map_err(io::Error::other)?
    }
}

impl RetainedSlot {
    /// Blocking replacement; the lock is released when this returns.
    pub fn replace_from(self, rendered: &Path) -> io::Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)?;
        }
        std::fs::create_dir_all(&self.dir)?;
        let copied = copy_tree(rendered, &self.dir)?;
        debug!(dir = %self.dir.display(), files = copied, "retained output replaced");
        Ok(())
    }
}
