// src/core/command.rs

use crate::core::meta::MetaData;
use crate::core::taxonomy::Taxonomy;
use anyhow::{Result, anyhow};
use scopeguard::defer;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The resolved bundle describing what to run, where, and how.
///
/// Produced once per invocation by [`Command::run`], consumed exactly once by
/// [`execute`]. `stream` selects live chunk delivery over buffered output.
pub struct ExecutionRequest {
    pub metadata: Arc<MetaData>,
    /// The checkout directory the scripts operate on, as seen inside the
    /// container.
    pub worktree: PathBuf,
    /// Lifecycle-bound scripts, executed strictly in order.
    pub scripts: Vec<Box<dyn CommandScript>>,
    pub stream: bool,
}

impl fmt::Debug for ExecutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionRequest")
            .field("metadata", &self.metadata.name())
            .field("worktree", &self.worktree)
            .field("scripts", &self.scripts.len())
            .field("stream", &self.stream)
            .finish()
    }
}

/// One shell invocation inside the container, with hooks around its execution.
///
/// Hooks default to no-ops; a concrete script overrides the ones it needs.
/// Per-script lifecycle: `before` fires immediately prior to execution,
/// `output` zero or more times while the script runs (once, with the final
/// exit code, in buffered mode), and `after` exactly once when the script has
/// completed. A script that never ran (an upstream failure cancelled it)
/// receives `after(info, None, None)` only.
pub trait CommandScript {
    /// The argument vector executed inside the container.
    fn command(&self) -> &[String];

    fn before(&mut self, info: &ExecutionRequest) {
        let _ = info;
    }

    /// Receives captured output. In streaming mode the exit code is not yet
    /// known and `exit_code` is `None`; in buffered mode the single delivery
    /// carries the final code.
    fn output(&mut self, exit_code: Option<i32>, chunk: &str) {
        let _ = (exit_code, chunk);
    }

    fn after(&mut self, info: &ExecutionRequest, exit_code: Option<i32>, output: Option<&str>) {
        let _ = (info, exit_code, output);
    }
}

/// A verb of the harness (build, test, ...).
///
/// `run` is pure with respect to the container: it parses arguments, resolves
/// project metadata and assembles the ordered script list, but performs no
/// execution. Side effects live in `setup`/`teardown` and in the scripts the
/// request carries.
pub trait Command {
    /// Parses `argv`, resolves the project through the taxonomy and returns
    /// the request to execute. Metadata errors propagate unchanged; no partial
    /// request is ever returned.
    fn run(&self, argv: &[String], taxonomy: &Taxonomy) -> Result<ExecutionRequest>;

    /// Pre-execution side effect, e.g. announcing the operation.
    fn setup(&self, info: &ExecutionRequest) {
        let _ = info;
    }

    /// Always invoked after execution, regardless of outcome.
    fn teardown(&self, info: &ExecutionRequest) {
        let _ = info;
    }

    /// One-line usage summary shown by the top-level help.
    fn help(&self) -> &'static str;
}

/// The result of one completed script run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptResult {
    pub exit_code: i32,
    /// The complete captured output, also available to `after`.
    pub output: String,
}

/// The execution channel the core consumes: "run script S in worktree W with
/// streaming mode M, deliver output and exit code". The concrete transport
/// (docker exec, ssh, a test double) lives behind this trait.
pub trait ExecutionChannel {
    /// Runs one script to completion. The sink receives chunks as they are
    /// produced when `stream` is set, or the whole output once at completion
    /// otherwise. An `Err` means the script failed before completing.
    fn run_script(
        &mut self,
        argv: &[String],
        worktree: &Path,
        stream: bool,
        sink: &mut dyn FnMut(Option<i32>, &str),
    ) -> Result<ScriptResult>;
}

/// Drives a request through the full command lifecycle:
/// `setup`, then per script `before` / `output`... / `after`, then `teardown`.
///
/// Teardown is guarded: it runs even when a script fails, the channel errors,
/// or a hook panics, so setup-phase side effects are always reversed. The
/// first failure (a channel error, or a completed script with a non-zero exit
/// code) cancels the remaining scripts; each cancelled script still observes
/// `after(info, None, None)`.
pub fn execute(
    command: &dyn Command,
    mut request: ExecutionRequest,
    channel: &mut dyn ExecutionChannel,
) -> Result<()> {
    command.setup(&request);
    let scripts = std::mem::take(&mut request.scripts);
    let request = request;

    defer! {
        log::trace!("Lifecycle: teardown for '{}'", request.metadata.name());
        command.teardown(&request);
    }

    let mut first_failure: Option<anyhow::Error> = None;
    for (position, mut script) in scripts.into_iter().enumerate() {
        let display = render_script(script.command());

        if first_failure.is_some() {
            log::debug!("Skipping script #{}: '{}'", position, display);
            script.after(&request, None, None);
            continue;
        }

        let argv = script.command().to_vec();
        log::trace!("Lifecycle: before script #{}: '{}'", position, display);
        script.before(&request);

        let mut sink = |code: Option<i32>, chunk: &str| script.output(code, chunk);
        let outcome = channel.run_script(&argv, &request.worktree, request.stream, &mut sink);

        match outcome {
            Ok(result) => {
                log::trace!(
                    "Lifecycle: script #{} completed with exit code {}",
                    position,
                    result.exit_code
                );
                script.after(&request, Some(result.exit_code), Some(&result.output));
                if result.exit_code != 0 {
                    first_failure = Some(anyhow!(
                        "Script '{}' exited with status {}.",
                        display,
                        result.exit_code
                    ));
                }
            }
            Err(e) => {
                log::trace!("Lifecycle: script #{} failed before completion", position);
                script.after(&request, None, None);
                first_failure = Some(e.context(format!("Script '{}' failed to run.", display)));
            }
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Renders an argument vector as a shell-quoted line for messages.
pub fn render_script(argv: &[String]) -> String {
    shlex::try_join(argv.iter().map(String::as_str)).unwrap_or_else(|_| argv.join(" "))
}

// MARK: --- UNIT TESTS ---
