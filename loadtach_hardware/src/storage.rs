//! EEPROM emulation backends.
//!
//! Both backends keep a RAM cache that `read_block`/`write_block` operate on;
//! `commit` publishes the cache to the backing image, which is what survives
//! a simulated or real power cycle.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use loadtach_traits::{BoxError, NvStorage};

use crate::error::{HwError, Result};
use crate::util::write_atomic;

/// Default emulated page size in bytes.
pub const DEFAULT_PAGE_SIZE: usize = 64;

fn check_range(addr: usize, len: usize, size: usize) -> Result<std::ops::Range<usize>> {
    match addr.checked_add(len) {
        Some(end) if end <= size => Ok(addr..end),
        _ => Err(HwError::OutOfRange { addr, len, size }),
    }
}

// ── MemoryStorage ────────────────────────────────────────────────────────────

/// RAM-backed storage. Clones share the committed image, not the cache, so a
/// clone kept by a test observes exactly what a reboot would.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    cache: Vec<u8>,
    flash: Arc<Mutex<Vec<u8>>>,
    commits: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    /// Zero-filled image of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self::with_image(vec![0; size])
    }

    pub fn with_image(image: Vec<u8>) -> Self {
        Self {
            cache: image.clone(),
            flash: Arc::new(Mutex::new(image)),
            commits: Arc::new(AtomicUsize::new(0)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Simulated power cycle: a fresh handle whose cache is the committed image.
    pub fn reopen(&self) -> Self {
        Self {
            cache: self.flash_image(),
            flash: Arc::clone(&self.flash),
            commits: Arc::clone(&self.commits),
            fail_writes: Arc::clone(&self.fail_writes),
        }
    }

    pub fn flash_image(&self) -> Vec<u8> {
        self.flash.lock().map(|f| f.clone()).unwrap_or_default()
    }

    /// XOR one byte of the committed image.
    pub fn corrupt(&self, index: usize, mask: u8) {
        if let Ok(mut f) = self.flash.lock()
            && let Some(b) = f.get_mut(index)
        {
            *b ^= mask;
        }
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::Relaxed)
    }

    /// When set, writes and commits fail with an I/O error.
    pub fn set_fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::Relaxed);
    }

    fn failing(&self) -> bool {
        self.fail_writes.load(Ordering::Relaxed)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl NvStorage for MemoryStorage {
    fn read_block(&mut self, addr: usize, buf: &mut [u8]) -> std::result::Result<(), BoxError> {
        let range = check_range(addr, buf.len(), self.cache.len())?;
        buf.copy_from_slice(&self.cache[range]);
        Ok(())
    }

    fn write_block(&mut self, addr: usize, data: &[u8]) -> std::result::Result<(), BoxError> {
        if self.failing() {
            return Err(Box::new(HwError::Io(std::io::Error::other(
                "simulated write failure",
            ))));
        }
        let range = check_range(addr, data.len(), self.cache.len())?;
        self.cache[range].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> std::result::Result<(), BoxError> {
        if self.failing() {
            return Err(Box::new(HwError::Io(std::io::Error::other(
                "simulated commit failure",
            ))));
        }
        let mut flash = self
            .flash
            .lock()
            .map_err(|_| HwError::Io(std::io::Error::other("flash image poisoned")))?;
        flash.clone_from(&self.cache);
        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// ── FileStorage ──────────────────────────────────────────────────────────────

/// File-backed storage; the file holds the committed page image.
///
/// A missing file reads as an erased page (all `0xFF`).
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    cache: Vec<u8>,
}

impl FileStorage {
    pub fn open(path: impl AsRef<Path>, size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut cache = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "storage image missing; starting erased");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        cache.resize(size, 0xFF);
        Ok(Self { path, cache })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NvStorage for FileStorage {
    fn read_block(&mut self, addr: usize, buf: &mut [u8]) -> std::result::Result<(), BoxError> {
        let range = check_range(addr, buf.len(), self.cache.len())?;
        buf.copy_from_slice(&self.cache[range]);
        Ok(())
    }

    fn write_block(&mut self, addr: usize, data: &[u8]) -> std::result::Result<(), BoxError> {
        let range = check_range(addr, data.len(), self.cache.len())?;
        self.cache[range].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> std::result::Result<(), BoxError> {
        write_atomic(&self.path, &self.cache).map_err(HwError::from)?;
        tracing::debug!(path = %self.path.display(), bytes = self.cache.len(), "storage committed");
        Ok(())
    }
}
