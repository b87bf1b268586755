use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Persistence backend for index files
///
/// Files are addressed by flat names. `write` must be durable when it
/// returns; `write_atomic` must additionally replace the target in one step,
/// so readers observe either the old or the new content.
pub trait IndexStorage: Send + Sync + fmt::Debug {
    /// Read a file; `Ok(None)` when it does not exist
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>>;

    fn write(&self, name: &str, data: &[u8]) -> io::Result<()>;

    fn write_atomic(&self, name: &str, data: &[u8]) -> io::Result<()>;

    /// Remove a file; removing a missing file is not an error
    fn remove(&self, name: &str) -> io::Result<()>;
}

/// Index files in a directory on disk
#[derive(Debug)]
pub struct DirectoryStorage {
    base_dir: PathBuf,
}

impl DirectoryStorage {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> io::Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.base_dir
    }

    fn sync_dir(&self) -> io::Result<()> {
        File::open(&self.base_dir)?.sync_all()
    }
}

impl IndexStorage for DirectoryStorage {
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.base_dir.join(name)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let mut file = File::create(self.base_dir.join(name))?;
        file.write_all(data)?;
        file.sync_all()
    }

    fn write_atomic(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let tmp_name = format!("{}.tmp", name);
        self.write(&tmp_name, data)?;
        fs::rename(self.base_dir.join(&tmp_name), self.base_dir.join(name))?;
        self.sync_dir()
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        match fs::remove_file(self.base_dir.join(name)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// In-process storage with fault injection, for tests
///
/// Clones share the same files, so a test can keep a handle after moving the
/// storage into an index.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    inner: Arc<MemoryInner>,
}

#[derive(Debug)]
struct MemoryInner {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    /// Writes allowed before the next failure; negative disables faults
    writes_before_fault: AtomicI64,
    /// Next `write_atomic` lands, then reports an error
    fail_after_replace: AtomicBool,
}

impl Default for MemoryInner {
    fn default() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            writes_before_fault: AtomicI64::new(-1),
            fail_after_replace: AtomicBool::new(false),
        }
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next write
    pub fn fail_next_write(&self) {
        self.fail_after_writes(0);
    }

    /// Let `count` writes succeed, then fail the one after
    pub fn fail_after_writes(&self, count: u32) {
        self.inner
            .writes_before_fault
            .store(count as i64, Ordering::SeqCst);
    }

    /// Make the next `write_atomic` replace its target and still fail,
    /// like a directory sync error after the rename
    pub fn fail_after_next_replace(&self) {
        self.inner.fail_after_replace.store(true, Ordering::SeqCst);
    }

    pub fn clear_faults(&self) {
        self.inner.writes_before_fault.store(-1, Ordering::SeqCst);
        self.inner.fail_after_replace.store(false, Ordering::SeqCst);
    }

    pub fn file_names(&self) -> Vec<String> {
        self.inner.files.lock().keys().cloned().collect()
    }

    /// Overwrite a file without fault checks
    pub fn put(&self, name: &str, data: &[u8]) {
        self.inner.files.lock().insert(name.to_string(), data.to_vec());
    }

    fn check_fault(&self) -> io::Result<()> {
        let remaining = self.inner.writes_before_fault.load(Ordering::SeqCst);
        if remaining < 0 {
            return Ok(());
        }
        if remaining == 0 {
            self.inner.writes_before_fault.store(-1, Ordering::SeqCst);
            return Err(io::Error::other("injected write fault"));
        }
        self.inner
            .writes_before_fault
            .store(remaining - 1, Ordering::SeqCst);
        Ok(())
    }
}

impl IndexStorage for MemoryStorage {
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.inner.files.lock().get(name).cloned())
    }

    fn write(&self, name: &str, data: &[u8]) -> io::Result<()> {
        self.check_fault()?;
        self.put(name, data);
        Ok(())
    }

    fn write_atomic(&self, name: &str, data: &[u8]) -> io::Result<()> {
        self.write(name, data)?;
        if self.inner.fail_after_replace.swap(false, Ordering::SeqCst) {
            return Err(io::Error::other("injected sync fault after replace"));
        }
        Ok(())
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        self.inner.files.lock().remove(name);
        Ok(())
    }
}
