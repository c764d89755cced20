//! Thin wrapper around external tool invocation.
//!
//! Tool output is discarded; only the exit status matters. Compressors and
//! decompressors communicate through the filesystem, not through pipes to
//! this process.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::BenchError;

/// Run a program with arguments and wait for it to finish.
///
/// A non-zero exit status or a failure to launch (tool not installed) is a
/// [`BenchError::Tool`]. There is no retry; the caller aborts the current
/// unit of work.
pub fn run_argv(argv: &[&str], cwd: Option<&Path>) -> Result<(), BenchError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| BenchError::Tool("empty command".to_string()))?;
    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::null()).stderr(Stdio::null());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let status = cmd
        .status()
        .map_err(|e| BenchError::Tool(format!("could not run {program}: {e}")))?;
    if status.success() {
        Ok(())
    } else {
        Err(BenchError::Tool(format!("{program} exited with {status}")))
    }
}

/// Run a shell pipeline via `sh -c` and wait for it to finish.
///
/// The pipeline reports the exit status of its last command, as usual for
/// `sh`. Failure semantics match [`run_argv`].
pub fn run_shell(pipeline: &str, cwd: Option<&Path>) -> Result<(), BenchError> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(pipeline)
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let status = cmd
        .status()
        .map_err(|e| BenchError::Tool(format!("could not run shell: {e}")))?;
    if status.success() {
        Ok(())
    } else {
        Err(BenchError::Tool(format!(
            "pipeline `{pipeline}` exited with {status}"
        )))
    }
}
