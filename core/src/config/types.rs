use serde::{Deserialize, Serialize};

/// Settings read from `makex.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MakexConfig {
    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Makefile to read when `-f` is not given.
    #[serde(default = "default_makefile")]
    pub makefile: String,

    /// Maximum number of recipes running at once.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    #[serde(default)]
    pub verbose: bool,

    /// Expand glob patterns in prerequisites before planning.
    #[serde(default = "default_expand")]
    pub expand: bool,

    /// Show a progress bar while building (ignored in verbose mode).
    #[serde(default)]
    pub progress: bool,

    /// Shell used to run recipe lines, invoked as `<shell> -c <line>`.
    #[serde(default = "default_shell")]
    pub shell: String,
}

fn default_makefile() -> String {
    "Makefile".to_string()
}

fn default_jobs() -> usize {
    num_cpus::get().max(1)
}

fn default_expand() -> bool {
    true
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            makefile: default_makefile(),
            jobs: default_jobs(),
            verbose: false,
            expand: default_expand(),
            progress: false,
            shell: default_shell(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "warn" or "makex_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}
