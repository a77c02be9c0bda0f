use std::path::PathBuf;

use clap::Parser;

/// makex: a minimal make that builds independent targets in parallel.
///
/// If no targets are given, the first rule whose target does not start with
/// `.` is built.
#[derive(Parser, Debug, Default)]
#[command(name = "makex", version, about, long_about = None)]
pub struct Args {
    /// Path to the makefile [default: Makefile]
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Change to this directory before building. The makefile path is
    /// resolved before changing directory.
    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Print the targets that would be built, level by level, without running anything
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Number of recipes to run in parallel [default: number of CPUs]
    #[arg(short = 'j', long = "jobs", value_name = "N", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Expand globs in prerequisites (on unless configured otherwise)
    #[arg(short = 'x', long = "expand", overrides_with = "no_expand")]
    pub expand: bool,

    /// Do not expand globs in prerequisites
    #[arg(long = "no-expand", overrides_with = "expand")]
    pub no_expand: bool,

    /// Echo recipe lines and stream their output
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Show a progress bar while building
    #[arg(long)]
    pub progress: bool,

    /// Print the parsed (and expanded) makefile and exit
    #[arg(long)]
    pub print_makefile: bool,

    /// Hand the build to the system `make` instead of running it here
    #[arg(long)]
    pub external: bool,

    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,
}

impl Args {
    /// Resolves `-x`/`--no-expand` against the configured default.
    pub fn expand_or(&self, default: bool) -> bool {
        if self.no_expand {
            false
        } else if self.expand {
            true
        } else {
            default
        }
    }
}

fn parse_jobs(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("makex").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn short_flags_and_targets() {
        let args = parse(&["-f", "build.mk", "-C", "out", "-n", "-j", "3", "-v", "a", "b"]);
        assert_eq!(args.file, Some(PathBuf::from("build.mk")));
        assert_eq!(args.directory, Some(PathBuf::from("out")));
        assert!(args.dry_run);
        assert_eq!(args.jobs, Some(3));
        assert!(args.verbose);
        assert_eq!(args.targets, vec!["a", "b"]);
    }

    #[test]
    fn zero_jobs_is_rejected() {
        assert!(Args::try_parse_from(["makex", "-j", "0"]).is_err());
        assert!(Args::try_parse_from(["makex", "-j", "lots"]).is_err());
    }

    #[test]
    fn expand_follows_last_flag_then_default() {
        assert!(parse(&[]).expand_or(true));
        assert!(!parse(&[]).expand_or(false));
        assert!(!parse(&["--no-expand"]).expand_or(true));
        assert!(parse(&["--no-expand", "-x"]).expand_or(false));
        assert!(!parse(&["-x", "--no-expand"]).expand_or(true));
    }
}
