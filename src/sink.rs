//! Output tree writes.
//!
//! Everything the pipeline puts into the output directory goes through an
//! [`OutputSink`], addressed by `/`-separated paths relative to the output
//! root. [`FsSink`] writes to disk; [`MemorySink`] keeps files in a map so
//! pipeline runs can be inspected without touching the filesystem.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Destination for generated and mirrored files.
pub trait OutputSink: Sync {
    /// Copy a source file into the output tree.
    fn copy_in(&self, relative: &str, source: &Path) -> io::Result<()>;
    /// Write bytes, creating parent directories as needed.
    fn write(&self, relative: &str, bytes: &[u8]) -> io::Result<()>;
    /// Copy an already written output file to a second location.
    fn duplicate(&self, from: &str, to: &str) -> io::Result<()>;
    /// Remove a file. Removing a missing file is not an error.
    fn remove(&self, relative: &str) -> io::Result<()>;
}

/// Sink rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    fn prepare(&self, relative: &str) -> io::Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}

impl OutputSink for FsSink {
    fn copy_in(&self, relative: &str, source: &Path) -> io::Result<()> {
        let target = self.prepare(relative)?;
        fs::copy(source, target)?;
        Ok(())
    }

    fn write(&self, relative: &str, bytes: &[u8]) -> io::Result<()> {
        let target = self.prepare(relative)?;
        fs::write(target, bytes)
    }

    fn duplicate(&self, from: &str, to: &str) -> io::Result<()> {
        let source = self.path(from);
        let target = self.prepare(to)?;
        fs::copy(source, target)?;
        Ok(())
    }

    fn remove(&self, relative: &str) -> io::Result<()> {
        match fs::remove_file(self.path(relative)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// In-memory sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of a file, if present.
    pub fn get(&self, relative: &str) -> Option<Vec<u8>> {
        self.lock().get(relative).cloned()
    }

    /// Contents of a file as UTF-8 text, if present.
    pub fn text(&self, relative: &str) -> Option<String> {
        self.get(relative)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn contains(&self, relative: &str) -> bool {
        self.lock().contains_key(relative)
    }

    /// All file paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OutputSink for MemorySink {
    fn copy_in(&self, relative: &str, source: &Path) -> io::Result<()> {
        let bytes = fs::read(source)?;
        self.lock().insert(relative.to_string(), bytes);
        Ok(())
    }

    fn write(&self, relative: &str, bytes: &[u8]) -> io::Result<()> {
        self.lock().insert(relative.to_string(), bytes.to_vec());
        Ok(())
    }

    fn duplicate(&self, from: &str, to: &str) -> io::Result<()> {
        let mut files = self.lock();
        let bytes = files.get(from).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{from} not written"))
        })?;
        files.insert(to.to_string(), bytes);
        Ok(())
    }

    fn remove(&self, relative: &str) -> io::Result<()> {
        self.lock().remove(relative);
        Ok(())
    }
}
