use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;

use super::{normalize, FileSystem};

/// In-memory filesystem keyed by path.
///
/// Directories are implicit: a path exists if a file is stored under it.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fs = Self::new();
        for p in paths {
            fs.write(p.as_ref(), Vec::new());
        }
        fs
    }

    pub fn write(&self, path: &str, contents: impl Into<Vec<u8>>) {
        self.lock()
            .insert(normalize(path).to_string(), contents.into());
    }

    pub fn paths(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // A poisoned map is still a consistent map.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &str) -> io::Result<bool> {
        let path = normalize(path);
        let files = self.lock();
        if path == "." || files.contains_key(path) {
            return Ok(true);
        }
        let dir = format!("{path}/");
        Ok(files.keys().any(|k| k.starts_with(&dir)))
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        match self.lock().remove(normalize(path)) {
            Some(_) => Ok(()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{path}: no such file"),
            )),
        }
    }

    fn list_files(&self, root: &str) -> io::Result<Vec<String>> {
        let root = normalize(root);
        let files = self.lock();
        if root == "." {
            return Ok(files.keys().cloned().collect());
        }
        let dir = format!("{}/", root.trim_end_matches('/'));
        Ok(files
            .keys()
            .filter(|k| k.as_str() == root || k.starts_with(&dir))
            .cloned()
            .collect())
    }
}
