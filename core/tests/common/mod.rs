#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use makex_core::executor::{LogSink, SharedBuffer};
use makex_core::{parse, Config, FileSystem, OsFileSystem, Plan};

/// A real-filesystem config rooted at `dir`, logging into a buffer.
pub fn config_in(dir: &Path, jobs: usize) -> (Config, SharedBuffer) {
    let (log, buf) = LogSink::buffer();
    let mut cfg = Config::new(Arc::new(OsFileSystem::new(dir)));
    cfg.parallel_jobs = jobs;
    cfg.work_dir = Some(dir.to_path_buf());
    cfg.log = log;
    (cfg, buf)
}

pub fn plan_in(dir: &Path, jobs: usize, makefile: &str, goals: &[&str]) -> (Plan, SharedBuffer) {
    let (cfg, buf) = config_in(dir, jobs);
    let mf = parse(makefile).expect("makefile should parse");
    (Plan::new(cfg, mf, goals), buf)
}

pub fn exists(dir: &Path, name: &str) -> bool {
    dir.join(name).exists()
}

/// The real filesystem, except that `remove` always fails.
pub struct UndeletableFileSystem {
    inner: OsFileSystem,
    pub remove_attempts: std::sync::atomic::AtomicUsize,
}

impl UndeletableFileSystem {
    pub fn new(dir: &Path) -> Self {
        Self {
            inner: OsFileSystem::new(dir),
            remove_attempts: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

impl FileSystem for UndeletableFileSystem {
    fn exists(&self, path: &str) -> std::io::Result<bool> {
        self.inner.exists(path)
    }

    fn remove(&self, _path: &str) -> std::io::Result<()> {
        self.remove_attempts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        ))
    }

    fn list_files(&self, root: &str) -> std::io::Result<Vec<String>> {
        self.inner.list_files(root)
    }
}
