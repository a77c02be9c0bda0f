//! Wires parsed arguments and loaded settings into a build.

use std::io::Write;
use std::path::Path;

use makex_core::config::BuildConfig;
use makex_core::external::run_external_make;
use makex_core::{expand_globs, marshal, parse, Cancellation, Config, Makefile, Plan};

use crate::commands::cli::Args;
use crate::error::CliError;

/// Command-line flags override the loaded `[build]` settings.
pub fn merge_build_settings(args: &Args, mut build: BuildConfig) -> BuildConfig {
    if let Some(file) = &args.file {
        build.makefile = file.to_string_lossy().into_owned();
    }
    if let Some(jobs) = args.jobs {
        build.jobs = jobs;
    }
    build.expand = args.expand_or(build.expand);
    build.verbose |= args.verbose;
    build.progress |= args.progress;
    build
}

#[tracing::instrument(name = "cli.run_app", skip_all, fields(targets = ?args.targets))]
pub async fn run_app(args: Args, build: BuildConfig, cancel: Cancellation) -> Result<i32, CliError> {
    let settings = merge_build_settings(&args, build);

    // Read before honouring -C so a relative -f names a file in the caller's directory.
    let makefile = read_makefile(Path::new(&settings.makefile))?;

    let mut config = Config::from_settings(&settings, args.directory.clone());
    config.cancel = cancel;

    let makefile = if settings.expand {
        expand_globs(config.fs.as_ref(), &makefile)?
    } else {
        makefile
    };

    if args.print_makefile {
        let mut out = std::io::stdout().lock();
        out.write_all(marshal(&makefile).as_bytes())?;
        out.flush()?;
        return Ok(0);
    }

    let goals = resolve_goals(&args.targets, &makefile);

    if args.external {
        let dir = match &args.directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let make_args = external_args(&args, &settings, &goals);
        run_external_make(&dir, marshal(&makefile).as_bytes(), &make_args).await?;
        return Ok(0);
    }

    let plan = Plan::new(config, makefile, &goals);
    if plan.levels_needing_build()?.is_empty() {
        println!("Nothing to do.");
        return Ok(0);
    }

    if args.dry_run {
        let mut out = std::io::stdout().lock();
        plan.dry_run(&mut out)?;
        out.flush()?;
        return Ok(0);
    }

    let summary = plan.run().await?;
    tracing::info!(
        built = summary.built.len(),
        levels = summary.levels,
        duration_ms = summary.duration_ms,
        "build succeeded"
    );
    Ok(0)
}

fn read_makefile(path: &Path) -> Result<Makefile, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadMakefile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&text)?)
}

/// Requested targets, or the makefile's default goal when none are given.
pub fn resolve_goals(targets: &[String], makefile: &Makefile) -> Vec<String> {
    if !targets.is_empty() {
        return targets.to_vec();
    }
    makefile
        .default_goal()
        .map(|goal| vec![goal.to_string()])
        .unwrap_or_default()
}

fn external_args(args: &Args, settings: &BuildConfig, goals: &[String]) -> Vec<String> {
    let mut out = vec![format!("-j{}", settings.jobs.max(1))];
    if args.dry_run {
        out.push("-n".to_string());
    }
    out.extend(goals.iter().cloned());
    out
}
