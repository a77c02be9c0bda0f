use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::executor::{Cancellation, LogSink};
use crate::fs::{FileSystem, OsFileSystem};

use super::types::BuildConfig;

/// Everything a plan needs at run time.
///
/// `Config` is cheap to clone; the filesystem, log sink and cancellation
/// handle are shared between clones.
#[derive(Clone)]
pub struct Config {
    pub fs: Arc<dyn FileSystem>,

    /// Upper bound on recipes running at once. Values below 1 act as 1.
    pub parallel_jobs: usize,

    /// Stream recipe output live instead of only on failure.
    pub verbose: bool,

    /// Show an indicatif progress bar. Ignored when `verbose` is set.
    pub progress: bool,

    /// Directory recipes run in. `None` keeps the process working directory.
    pub work_dir: Option<PathBuf>,

    /// Recipe lines run as `<shell> -c <line>`.
    pub shell: String,

    pub log: LogSink,

    pub cancel: Cancellation,
}

impl Config {
    /// Single-job configuration over `fs`, logging to stderr.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            parallel_jobs: 1,
            verbose: false,
            progress: false,
            work_dir: None,
            shell: "sh".to_string(),
            log: LogSink::stderr(),
            cancel: Cancellation::new(),
        }
    }

    /// Runtime settings for the real filesystem rooted at `work_dir`
    /// (the process working directory if `None`).
    pub fn from_settings(build: &BuildConfig, work_dir: Option<PathBuf>) -> Self {
        let fs = match &work_dir {
            Some(dir) => OsFileSystem::new(dir.clone()),
            None => OsFileSystem::current_dir(),
        };
        Self {
            parallel_jobs: build.jobs,
            verbose: build.verbose,
            progress: build.progress,
            work_dir,
            shell: build.shell.clone(),
            ..Self::new(Arc::new(fs))
        }
    }

    pub fn jobs(&self) -> usize {
        self.parallel_jobs.max(1)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("parallel_jobs", &self.parallel_jobs)
            .field("verbose", &self.verbose)
            .field("progress", &self.progress)
            .field("work_dir", &self.work_dir)
            .field("shell", &self.shell)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
