// src/system/executor.rs

use crate::core::command::{ExecutionChannel, ScriptResult, render_script};
use anyhow::Result;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command as StdCommand, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// The concrete execution channel: runs scripts inside a project's long-lived
/// container through `docker exec`.
///
/// Stdout is captured and fed to the sink (per line when streaming, in one
/// piece when buffered); stderr passes straight through to the user's
/// terminal. Timeouts, retries and cancellation are the caller's concern.
#[derive(Debug, Clone)]
pub struct DockerChannel {
    container: String,
}

impl DockerChannel {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }
}

impl ExecutionChannel for DockerChannel {
    fn run_script(
        &mut self,
        argv: &[String],
        worktree: &Path,
        stream: bool,
        sink: &mut dyn FnMut(Option<i32>, &str),
    ) -> Result<ScriptResult> {
        if argv.is_empty() {
            return Err(ExecutionError::EmptyCommand.into());
        }
        let display = render_script(argv);
        log::debug!(
            "docker exec [{}] in '{}': {}",
            self.container,
            worktree.display(),
            display
        );

        let mut command = StdCommand::new("docker");
        command
            .arg("exec")
            .arg("-w")
            .arg(worktree)
            .arg(&self.container)
            .args(argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut child = command
            .spawn()
            .map_err(|e| ExecutionError::CommandFailed(display.clone(), e))?;

        let mut output = String::new();
        if stream {
            if let Some(stdout) = child.stdout.take() {
                let reader = BufReader::new(stdout);
                for line in reader.lines() {
                    match line {
                        Ok(line) => {
                            let chunk = format!("{line}\n");
                            sink(None, &chunk);
                            output.push_str(&chunk);
                        }
                        Err(e) => {
                            return Err(reap(child, ExecutionError::CommandFailed(display, e)));
                        }
                    }
                }
            }
        } else if let Some(mut stdout) = child.stdout.take() {
            let mut bytes = Vec::new();
            if let Err(e) = stdout.read_to_end(&mut bytes) {
                return Err(reap(child, ExecutionError::CommandFailed(display, e)));
            }
            output = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    return Err(reap(
                        child,
                        ExecutionError::InvalidUtf8Output {
                            command: display,
                            source: e,
                        },
                    ));
                }
            };
        }

        let status = child
            .wait()
            .map_err(|e| ExecutionError::CommandFailed(display, e))?;
        // Killed-by-signal has no code; report it as a conventional failure.
        let exit_code = status.code().unwrap_or(-1);

        if !stream {
            sink(Some(exit_code), &output);
        }

        Ok(ScriptResult { exit_code, output })
    }
}

/// Ensures a half-read child does not linger when capture fails mid-stream.
fn reap(mut child: Child, error: ExecutionError) -> anyhow::Error {
    if let Err(e) = child.kill() {
        log::warn!("Failed to kill child process {}: {}", child.id(), e);
    }
    child.wait().ok();
    error.into()
}
