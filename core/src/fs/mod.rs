//! Filesystem abstraction used for staleness checks, cleanup and glob expansion.
//!
//! Paths are plain strings relative to the filesystem root, mirroring how
//! targets are named in a makefile.

use std::io;

mod memory;
mod os;

pub use memory::MemoryFileSystem;
pub use os::OsFileSystem;

/// Minimal filesystem surface the build engine relies on.
///
/// Implementations must be safe to share between concurrently running
/// recipes.
pub trait FileSystem: Send + Sync {
    /// Reports whether `path` exists. A missing path is `Ok(false)`, any
    /// other failure is an error.
    fn exists(&self, path: &str) -> io::Result<bool>;

    /// Removes the file at `path`.
    fn remove(&self, path: &str) -> io::Result<()>;

    /// Lists every regular file under `root` (recursively), as paths in the
    /// same form they would be written in a makefile.
    fn list_files(&self, root: &str) -> io::Result<Vec<String>>;
}

/// Strips a leading `./` so `./a` and `a` name the same target.
pub(crate) fn normalize(path: &str) -> &str {
    let mut p = path;
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    if p.is_empty() {
        "."
    } else {
        p
    }
}
