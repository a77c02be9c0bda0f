use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::Config;
use crate::error::RecipeFailure;

/// Destination for user-facing build output: recipe output, failure
/// reports, verbose progress lines.
///
/// Each `write_block` call lands contiguously, so output from targets
/// running in parallel never interleaves within a block.
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl LogSink {
    pub fn stderr() -> Self {
        Self::from_writer(io::stderr())
    }

    pub fn from_writer(w: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(w))),
        }
    }

    /// A sink backed by memory, plus a handle to read what was written.
    pub fn buffer() -> (Self, SharedBuffer) {
        let buf = SharedBuffer::default();
        (Self::from_writer(buf.clone()), buf)
    }

    pub fn write_block(&self, bytes: &[u8]) {
        let mut w = self.lock();
        if let Err(e) = w.write_all(bytes).and_then(|_| w.flush()) {
            tracing::warn!(error = %e, "failed to write to log sink");
        }
    }

    pub fn line(&self, msg: impl fmt::Display) {
        self.write_block(format!("{msg}\n").as_bytes());
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink")
    }
}

/// In-memory writer whose clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap_or_else(|e| e.into_inner())).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes the dry-run report: one block per level, separated by blank lines.
pub fn write_dry_run<W: Write + ?Sized>(w: &mut W, levels: &[Vec<String>]) -> io::Result<()> {
    for (i, level) in levels.iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        writeln!(w, "========= TARGET SET {} ({} targets)", i, level.len())?;
        for target in level {
            writeln!(w, " -  {target}")?;
        }
    }
    Ok(())
}

pub fn emit_plan(config: &Config, levels: &[Vec<String>]) {
    let total: usize = levels.iter().map(Vec::len).sum();
    tracing::info!(levels = levels.len(), targets = total, "build plan ready");
    if config.verbose {
        for (i, level) in levels.iter().enumerate() {
            tracing::debug!(level = i, targets = ?level, "planned level");
        }
    }
}

pub fn emit_level_start(config: &Config, level: usize, targets: &[String]) {
    tracing::debug!(level, count = targets.len(), "level start");
    if config.verbose {
        config
            .log
            .line(format_args!("makex: level {} ({} targets)", level, targets.len()));
    }
}

pub fn emit_level_end(level: usize, failed: usize, duration_ms: u64) {
    tracing::debug!(level, failed, duration_ms, "level end");
}

/// Echoes a recipe line before it runs, the way make does, in verbose mode.
pub fn emit_command(config: &Config, target: &str, command: &str) {
    tracing::debug!(name = %target, command, "running recipe line");
    if config.verbose {
        config.log.line(command);
    }
}

/// Reports a failed target. Without `verbose` this is the first time the
/// captured output reaches the sink.
pub fn emit_failure(config: &Config, failure: &RecipeFailure) {
    tracing::warn!(name = %failure.target, reason = %failure.reason, "recipe failed");
    let mut block = String::new();
    if !config.verbose && !failure.output.is_empty() {
        block.push_str(&failure.output);
        if !failure.output.ends_with('\n') {
            block.push('\n');
        }
    }
    block.push_str(&format!("makex: *** [{}] {}\n", failure.target, failure.reason));
    config.log.write_block(block.as_bytes());
}

pub fn emit_run_end(built: usize, duration_ms: u64) {
    tracing::info!(built, duration_ms, "build finished");
}
