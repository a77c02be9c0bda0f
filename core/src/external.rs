//! Delegating a build to the system `make`.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::ExternalError;

pub const DEFAULT_MAKE: &str = "make";

/// Writes `makefile` to a temporary file and runs
/// `make <args> -f <tmp> -C <dir>`.
///
/// The child's stdout is sent to our stderr so that stdout stays free for
/// callers that pipe it. The temporary file is removed when this returns.
pub async fn run_external_make(
    dir: &Path,
    makefile: &[u8],
    args: &[String],
) -> Result<(), ExternalError> {
    run_external(DEFAULT_MAKE, dir, makefile, args).await
}

/// Like [`run_external_make`] with an explicit program instead of `make`.
pub async fn run_external(
    program: &str,
    dir: &Path,
    makefile: &[u8],
    args: &[String],
) -> Result<(), ExternalError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("makex-")
        .suffix(".mk")
        .tempfile()
        .map_err(ExternalError::TempFile)?;
    tmp.write_all(makefile)
        .and_then(|_| tmp.flush())
        .map_err(ExternalError::TempFile)?;

    tracing::info!(program, dir = %dir.display(), ?args, "delegating to external make");

    let status = Command::new(program)
        .args(args)
        .arg("-f")
        .arg(tmp.path())
        .arg("-C")
        .arg(dir)
        .stdin(Stdio::null())
        .stdout(std::io::stderr())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .status()
        .await
        .map_err(|source| ExternalError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(ExternalError::Failed {
            program: program.to_string(),
            status,
        })
    }
}
