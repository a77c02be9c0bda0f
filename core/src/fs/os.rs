use std::io;
use std::path::{Path, PathBuf};

use super::{normalize, FileSystem};

/// The real filesystem, rooted at a working directory.
///
/// Relative paths resolve against `root`; absolute paths are used as-is.
#[derive(Debug, Clone)]
pub struct OsFileSystem {
    root: PathBuf,
}

impl OsFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Rooted at the process working directory, falling back to `.`.
    pub fn current_dir() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(normalize(path))
        }
    }
}

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &str) -> io::Result<bool> {
        match std::fs::metadata(self.resolve(path)) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        std::fs::remove_file(self.resolve(path))
    }

    fn list_files(&self, root: &str) -> io::Result<Vec<String>> {
        let root = normalize(root);
        let base = self.resolve(root);

        let meta = match std::fs::metadata(&base) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        if meta.is_file() {
            return Ok(vec![root.to_string()]);
        }

        let pattern = format!(
            "{}/**/*",
            glob::Pattern::escape(&base.to_string_lossy())
        );
        let paths = glob::glob(&pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

        let mut files = Vec::new();
        for entry in paths {
            let path = entry.map_err(glob::GlobError::into_error)?;
            if !path.is_file() {
                continue;
            }
            let Ok(rel) = path.strip_prefix(&base) else {
                continue;
            };
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if root == "." {
                files.push(rel);
            } else {
                files.push(format!("{}/{rel}", root.trim_end_matches('/')));
            }
        }
        files.sort();
        Ok(files)
    }
}
