//! Slot folder storage.
//!
//! Layout under the deck folder:
//!
//! ```text
//! <deck>/MAIN/<base>_MAIN.jpg
//! <deck>/SUB1/<base>_SUB1.png
//! ...
//! ```
//!
//! Name collisions get a counter before the slot suffix: `<base>(1)_MAIN.jpg`.

use crate::error::{Error, Result};
use crate::image::ExtractedImage;
use crate::types::Slot;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::mem;
use std::path::{Path, PathBuf};

/// Writes slot photos into the per-slot folders of one deck.
#[derive(Debug, Clone)]
pub struct SlotStore {
    root: PathBuf,
}

impl SlotStore {
    /// Use `root` as the deck folder without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Use `root` as the deck folder, creating it and every slot folder.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(root);
        for slot in Slot::ALL {
            let dir = store.slot_dir(slot);
            fs::create_dir_all(&dir).map_err(|source| Error::Storage { path: dir, source })?;
        }
        Ok(store)
    }

    /// The deck folder.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder holding every photo of a slot.
    pub fn slot_dir(&self, slot: Slot) -> PathBuf {
        self.root.join(slot.as_str())
    }

    /// Write an image as `<slot>/<base>_<slot>.<ext>`, or the first free
    /// `<base>(n)_<slot>.<ext>` when that name is taken. Returns the path written.
    pub fn save(&self, image: &ExtractedImage, base_name: &str) -> Result<PathBuf> {
        let dir = self.slot_dir(image.slot);

        let mut counter = 0usize;
        loop {
            let filename = if counter == 0 {
                format!("{}_{}.{}", base_name, image.slot, image.ext)
            } else {
                format!("{}({})_{}.{}", base_name, counter, image.slot, image.ext)
            };
            let path = dir.join(filename);
            counter += 1;

            // create_new makes the existence check and the creation one step.
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(Error::Storage { path, source }),
            };

            if let Err(source) = file.write_all(&image.bytes).and_then(|_| file.sync_all()) {
                drop(file);
                let _ = fs::remove_file(&path);
                return Err(Error::Storage { path, source });
            }

            return Ok(path);
        }
    }

    /// Delete the given files, skipping any that no longer exist.
    /// Returns the paths actually removed.
    pub fn cleanup(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut removed = Vec::new();
        for path in paths {
            match fs::remove_file(path) {
                Ok(()) => {
                    log::info!("  removed {}", display_name(path));
                    removed.push(path.clone());
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => log::warn!("  could not remove {}: {}", path.display(), e),
            }
        }
        removed
    }

    /// Start an all-or-nothing group of writes.
    pub fn transaction(&self) -> WriteTransaction<'_> {
        WriteTransaction {
            store: self,
            written: Vec::new(),
        }
    }
}

/// A group of slot writes that is either kept entirely or undone.
///
/// Each successful save is recorded; [`rollback`](Self::rollback) removes the
/// recorded files newest first. Dropping an uncommitted transaction rolls back.
#[derive(Debug)]
pub struct WriteTransaction<'a> {
    store: &'a SlotStore,
    written: Vec<PathBuf>,
}

impl WriteTransaction<'_> {
    /// Save one image and record it.
    pub fn save(&mut self, image: &ExtractedImage, base_name: &str) -> Result<PathBuf> {
        let path = self.store.save(image, base_name)?;
        self.written.push(path.clone());
        Ok(path)
    }

    /// Paths written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Keep every write and return the paths.
    pub fn commit(mut self) -> Vec<PathBuf> {
        mem::take(&mut self.written)
    }

    /// Undo every write, newest first. Returns the paths removed.
    pub fn rollback(mut self) -> Vec<PathBuf> {
        self.undo()
    }

    fn undo(&mut self) -> Vec<PathBuf> {
        let mut pending = mem::take(&mut self.written);
        pending.reverse();
        self.store.cleanup(&pending)
    }
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        if !self.written.is_empty() {
            self.undo();
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
