use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress bars for a build: one overall bar counting targets, plus a
/// spinner per running target.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    target_bars: HashMap<String, ProgressBar>,
    enabled: bool,
}

impl ProgressMonitor {
    /// `enabled = false` yields a monitor whose methods do nothing.
    pub fn new(total_targets: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                target_bars: HashMap::new(),
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_targets as u64));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} targets {msg}")
        {
            overall.set_style(style.progress_chars("=> "));
        }
        overall.set_message("starting");

        Self {
            multi,
            overall,
            target_bars: HashMap::new(),
            enabled: true,
        }
    }

    pub fn start_target(&mut self, target: &str) {
        if !self.enabled {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(target.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        self.target_bars.insert(target.to_string(), bar);
    }

    pub fn finish_target(&mut self, target: &str, success: bool, duration_ms: u64) {
        if !self.enabled {
            return;
        }

        if let Some(bar) = self.target_bars.remove(target) {
            if success {
                bar.finish_and_clear();
            } else {
                bar.finish_with_message(format!("FAILED {target} ({duration_ms}ms)"));
            }
        }
        self.overall.inc(1);
    }

    pub fn update_level(&self, level: usize, total_levels: usize) {
        if self.enabled {
            self.overall
                .set_message(format!("level {}/{}", level + 1, total_levels));
        }
    }

    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }
        let msg = if success { "done" } else { "failed" };
        self.overall.finish_with_message(msg);
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        for (_, bar) in self.target_bars.drain() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_monitor_is_inert() {
        let mut monitor = ProgressMonitor::new(3, false);
        monitor.start_target("a");
        monitor.finish_target("a", true, 10);
        monitor.update_level(0, 1);
        monitor.finish(true);
        assert!(monitor.target_bars.is_empty());
    }

    #[test]
    fn enabled_monitor_tracks_running_targets() {
        let mut monitor = ProgressMonitor::new(2, true);
        monitor.start_target("a");
        monitor.start_target("b");
        assert_eq!(monitor.target_bars.len(), 2);

        monitor.finish_target("a", true, 10);
        monitor.finish_target("b", false, 20);
        assert!(monitor.target_bars.is_empty());
        assert_eq!(monitor.overall.position(), 2);
        monitor.finish(false);
    }
}
