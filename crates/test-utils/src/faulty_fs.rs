use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use anyhow::{bail, Result};
use stagebatch::fs::FileSystem;
use stagebatch::fs::mock::MockFileSystem;

/// Mock filesystem with injectable faults. Everything not configured to
/// fail is delegated to the wrapped `MockFileSystem`.
///
/// Path faults match on a substring of the path, e.g. `"MAIN_"` or
/// `"BLJ_STARTED"`.
#[derive(Debug)]
pub struct FaultyFs {
    inner: MockFileSystem,
    allowed_writes: Option<usize>,
    writes: AtomicUsize,
    fail_set_mode: Option<String>,
    fail_touch: Option<String>,
    fail_remove: Option<String>,
}

impl FaultyFs {
    pub fn new(inner: MockFileSystem) -> Self {
        Self {
            inner,
            allowed_writes: None,
            writes: AtomicUsize::new(0),
            fail_set_mode: None,
            fail_touch: None,
            fail_remove: None,
        }
    }

    /// `write` fails once `n` writes have succeeded.
    pub fn fail_writes_after(mut self, n: usize) -> Self {
        self.allowed_writes = Some(n);
        self
    }

    /// `set_mode` fails on matching paths, after the file was written.
    pub fn fail_set_mode_on(mut self, fragment: &str) -> Self {
        self.fail_set_mode = Some(fragment.to_string());
        self
    }

    pub fn fail_touch_on(mut self, fragment: &str) -> Self {
        self.fail_touch = Some(fragment.to_string());
        self
    }

    pub fn fail_remove_on(mut self, fragment: &str) -> Self {
        self.fail_remove = Some(fragment.to_string());
        self
    }

    pub fn inner(&self) -> &MockFileSystem {
        &self.inner
    }
}

fn hits(fragment: &Option<String>, path: &Path) -> bool {
    fragment
        .as_deref()
        .is_some_and(|f| path.to_string_lossy().contains(f))
}

impl FileSystem for FaultyFs {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.inner.read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(allowed) = self.allowed_writes {
            if self.writes.fetch_add(1, Ordering::SeqCst) >= allowed {
                bail!("disk full writing {:?}", path);
            }
        }
        self.inner.write(path, contents)
    }

    fn touch(&self, path: &Path) -> Result<()> {
        if hits(&self.fail_touch, path) {
            bail!("read-only filesystem touching {:?}", path);
        }
        self.inner.touch(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        if hits(&self.fail_remove, path) {
            bail!("permission denied removing {:?}", path);
        }
        self.inner.remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        if hits(&self.fail_set_mode, path) {
            bail!("EPERM setting mode on {:?}", path);
        }
        self.inner.set_mode(path, mode)
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        self.inner.modified(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.inner.read_dir(path)
    }
}
