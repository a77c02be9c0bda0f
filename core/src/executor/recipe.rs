use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::RecipeFailure;
use crate::util::RingBytes;

use super::output::{emit_command, LogSink};

/// Bytes of merged recipe output kept per target for failure reports.
pub const CAPTURE_BYTES: usize = 1024 * 1024;

/// How long to keep reading recipe output once the shell itself has exited.
pub const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Runs `recipes` in order through the configured shell; the first failing
/// line stops the rest.
pub async fn run_recipes(
    config: &Config,
    target: &str,
    recipes: &[String],
) -> Result<(), RecipeFailure> {
    let capture = RingBytes::new(CAPTURE_BYTES);
    for command in recipes {
        emit_command(config, target, command);
        if let Err(reason) = run_command(config, command, &capture).await {
            return Err(RecipeFailure {
                target: target.to_string(),
                command: command.clone(),
                reason,
                output: capture.to_string_lossy(),
            });
        }
    }
    Ok(())
}

async fn run_command(config: &Config, command: &str, capture: &Arc<RingBytes>) -> Result<(), String> {
    if config.cancel.is_cancelled() {
        return Err("cancelled".to_string());
    }

    let mut cmd = Command::new(&config.shell);
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &config.work_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| format!("failed to spawn {}: {e}", config.shell))?;

    let live = config.verbose.then(|| config.log.clone());
    let pumps: Vec<JoinHandle<std::io::Result<u64>>> = [
        child.stdout.take().map(|rd| pump(rd, capture.clone(), live.clone(), "stdout")),
        child.stderr.take().map(|rd| pump(rd, capture.clone(), live.clone(), "stderr")),
    ]
    .into_iter()
    .flatten()
    .collect();

    let status = tokio::select! {
        status = child.wait() => status,
        _ = config.cancel.cancelled() => {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "failed to kill recipe process");
            }
            // Background grandchildren may still hold the pipes open.
            for pump in &pumps {
                pump.abort();
            }
            return Err("cancelled".to_string());
        }
    };

    // A background process started by the recipe can keep the pipes open
    // long after the shell exits; give the pumps a bounded window to drain.
    let deadline = tokio::time::Instant::now() + OUTPUT_DRAIN_TIMEOUT;
    for mut pump in pumps {
        match tokio::time::timeout_at(deadline, &mut pump).await {
            Ok(Ok(Ok(_))) => {}
            Ok(Ok(Err(e))) => tracing::warn!(error = %e, "reading recipe output failed"),
            Ok(Err(e)) => tracing::warn!(error = %e, "output pump task failed"),
            Err(_) => {
                pump.abort();
                tracing::debug!(command, "recipe output still open after exit, not waiting");
            }
        }
    }

    let status = status.map_err(|e| format!("failed to wait for {}: {e}", config.shell))?;
    if status.success() {
        Ok(())
    } else {
        Err(status.to_string())
    }
}

fn pump<R>(
    mut rd: R,
    ring: Arc<RingBytes>,
    live: Option<LogSink>,
    stream: &'static str,
) -> JoinHandle<std::io::Result<u64>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        loop {
            let n = rd.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            ring.push(&buf[..n]);
            if let Some(sink) = &live {
                sink.write_block(&buf[..n]);
            }
            total += n as u64;
        }
        tracing::trace!(stream, bytes = total, "recipe stream closed");
        Ok(total)
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    fn config() -> (Config, crate::executor::SharedBuffer) {
        let (log, buf) = LogSink::buffer();
        let mut cfg = Config::new(Arc::new(MemoryFileSystem::new()));
        cfg.log = log;
        (cfg, buf)
    }

    fn lines(cmds: &[&str]) -> Vec<String> {
        cmds.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn successful_lines_stay_quiet() {
        let (cfg, buf) = config();
        run_recipes(&cfg, "t", &lines(&["echo hidden", "true"]))
            .await
            .unwrap();
        assert_eq!(buf.contents(), "");
    }

    #[tokio::test]
    async fn first_failure_stops_the_target() {
        let (cfg, _buf) = config();
        let failure = run_recipes(
            &cfg,
            "t",
            &lines(&["echo one; echo two >&2", "exit 3", "echo never"]),
        )
        .await
        .unwrap_err();

        assert_eq!(failure.target, "t");
        assert_eq!(failure.command, "exit 3");
        assert!(failure.reason.contains('3'), "{}", failure.reason);
        assert!(failure.output.contains("one"));
        assert!(failure.output.contains("two"));
        assert!(!failure.output.contains("never"));
    }

    #[tokio::test]
    async fn verbose_streams_commands_and_output() {
        let (mut cfg, buf) = config();
        cfg.verbose = true;
        run_recipes(&cfg, "t", &lines(&["echo streamed"]))
            .await
            .unwrap();
        assert_eq!(buf.contents(), "echo streamed\nstreamed\n");
    }

    #[tokio::test]
    async fn work_dir_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cfg, _buf) = config();
        cfg.work_dir = Some(dir.path().to_path_buf());
        run_recipes(&cfg, "t", &lines(&["touch made"])).await.unwrap();
        assert!(dir.path().join("made").exists());
    }

    #[tokio::test]
    async fn cancel_kills_running_process() {
        let (cfg, _buf) = config();
        let cancel = cfg.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let started = std::time::Instant::now();
        let failure = run_recipes(&cfg, "t", &lines(&["sleep 30"]))
            .await
            .unwrap_err();
        assert_eq!(failure.reason, "cancelled");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn background_process_does_not_hold_the_target() {
        let (mut cfg, buf) = config();
        cfg.verbose = true;

        let started = std::time::Instant::now();
        run_recipes(&cfg, "t", &lines(&["sleep 5 & echo done"]))
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(3), "{:?}", started.elapsed());
        assert!(buf.contents().contains("done\n"), "{}", buf.contents());
    }
}
