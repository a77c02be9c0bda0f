use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::MakexConfig;

/// Name of the per-project settings file.
const LOCAL_CONFIG: &str = "makex.toml";

/// Get the default makex data directory: ~/.makex
pub fn get_makex_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".makex"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<MakexConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    toml::from_str::<MakexConfig>(&s).with_context(|| format!("parse config {}", path.display()))
}

/// Loads settings, highest priority first:
///
/// 1. `$MAKEX_CONFIG`
/// 2. `~/.makex/config.toml`
/// 3. `./makex.toml`
/// 4. built-in defaults
///
/// `MAKEX_JOBS` and `MAKEX_LOG_LEVEL` then override whatever was loaded.
pub fn load_default() -> anyhow::Result<MakexConfig> {
    let mut cfg = match config_path() {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_from_path(&path)?
        }
        None => MakexConfig::default(),
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("MAKEX_CONFIG") {
        if !p.trim().is_empty() {
            return Some(PathBuf::from(p));
        }
    }

    let home_config = get_makex_data_dir().ok().map(|d| d.join("config.toml"));
    if let Some(p) = home_config.filter(|p| p.exists()) {
        return Some(p);
    }

    let local = Path::new(LOCAL_CONFIG);
    local.exists().then(|| local.to_path_buf())
}

fn apply_env_overrides<F>(cfg: &mut MakexConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("MAKEX_JOBS").filter(|v| !v.trim().is_empty()) {
        let jobs: usize = v
            .trim()
            .parse()
            .with_context(|| format!("MAKEX_JOBS must be a positive integer, got {v:?}"))?;
        anyhow::ensure!(jobs > 0, "MAKEX_JOBS must be at least 1");
        cfg.build.jobs = jobs;
    }

    if let Some(v) = lookup("MAKEX_LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
        cfg.logging.level = v;
    }

    Ok(())
}
