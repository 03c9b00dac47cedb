// src/exec/runner.rs

//! Launch a generated script with `bash` and wait for it.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

/// Run `script` to completion and return its exit code.
///
/// Stdout is logged at `info`, stderr at `debug`. A process killed by a
/// signal reports `-1`.
pub async fn run_script(script: &Path) -> Result<i32> {
    let name = script
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| script.display().to_string());

    info!(script = %script.display(), "starting script process");

    let mut cmd = Command::new("bash");
    cmd.arg(script)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning bash for script {:?}", script))?;

    let stdout = child.stdout.take().map(|out| {
        let name = name.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(out).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(script = %name, "stdout: {}", line);
            }
        })
    });

    // Always consume stderr so buffers don't fill; log at debug.
    let stderr = child.stderr.take().map(|err| {
        let name = name.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(err).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(script = %name, "stderr: {}", line);
            }
        })
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for script {:?}", script))?;

    for handle in [stdout, stderr].into_iter().flatten() {
        let _ = handle.await;
    }

    let code = status.code().unwrap_or(-1);
    info!(
        script = %name,
        exit_code = code,
        success = status.success(),
        "script process exited"
    );

    Ok(code)
}
