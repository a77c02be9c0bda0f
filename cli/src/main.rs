use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod error;
mod signal;

use commands::cli;
use error::CliError;
use makex_core::config::LoggingConfig;
use makex_core::{Cancellation, ExternalError, MakeError};

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = makex_core::config::load_default()?;
    init_tracing(&cfg.logging).map_err(CliError::Logging)?;

    let cancel = Cancellation::new();
    signal::spawn_interrupt_handler(cancel.clone());

    app::run_app(args, cfg.build, cancel).await
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 2: build or planning failure (make's convention)
    // 11: config error
    // 20: IO / parse error
    // 130: interrupted
    match e {
        CliError::Config(_) | CliError::Logging(_) => 11,
        CliError::ReadMakefile { .. } | CliError::Parse(_) | CliError::Io(_) => 20,
        CliError::Make(me) => match me {
            MakeError::Cancelled => 130,
            MakeError::Fs(_) | MakeError::Parse(_) => 20,
            MakeError::UndefinedTarget { .. }
            | MakeError::CircularDependency { .. }
            | MakeError::LevelFailed { .. } => 2,
        },
        CliError::External(ee) => match ee {
            ExternalError::Failed { .. } => ee.exit_code().unwrap_or(2),
            ExternalError::Spawn { .. } | ExternalError::TempFile(_) => 20,
        },
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("makex"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("makex.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
