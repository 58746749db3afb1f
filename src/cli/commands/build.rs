// src/cli/commands/build.rs

use crate::{
    cli::args::ProjectArgs,
    core::{
        command::{Command, CommandScript, ExecutionRequest, render_script},
        taxonomy::Taxonomy,
        worktree,
    },
};
use anyhow::Result;
use clap::Parser;
use colored::*;

/// One build invocation inside the project container.
#[derive(Debug)]
pub struct BuildScript {
    command: Vec<String>,
}

impl BuildScript {
    fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl CommandScript for BuildScript {
    fn command(&self) -> &[String] {
        &self.command
    }

    fn before(&mut self, _info: &ExecutionRequest) {
        println!("{} {}", "→".blue(), render_script(&self.command).green());
    }

    fn output(&mut self, _exit_code: Option<i32>, chunk: &str) {
        print!("{chunk}");
    }

    fn after(&mut self, info: &ExecutionRequest, exit_code: Option<i32>, _output: Option<&str>) {
        match exit_code {
            Some(0) => log::info!("Build of '{}' succeeded.", info.metadata.name()),
            Some(code) => log::error!(
                "Build of '{}' failed with status {}.",
                info.metadata.name(),
                code
            ),
            None => log::warn!("Build of '{}' never ran.", info.metadata.name()),
        }
    }
}

/// Builds the checked-out defect with the project's configured build tool,
/// plain or coverage-instrumented.
#[derive(Debug)]
pub struct BuildCommand;

impl Command for BuildCommand {
    fn run(&self, argv: &[String], taxonomy: &Taxonomy) -> Result<ExecutionRequest> {
        let args = ProjectArgs::try_parse_from(argv)?;
        let (state, worktree_dir) = worktree::read_worktree_config(args.path.as_deref().unwrap_or("."))?;

        let metadata = taxonomy.get(&state.project)?;
        let common = &metadata.load()?.common;

        let script = if args.coverage {
            BuildScript::new(common.build_coverage_command.clone())
        } else {
            BuildScript::new(common.build_command.clone())
        };

        Ok(ExecutionRequest {
            metadata,
            worktree: worktree_dir,
            scripts: vec![Box::new(script)],
            stream: args.verbose,
        })
    }

    fn setup(&self, info: &ExecutionRequest) {
        println!("{}", format!("Building '{}'", info.metadata.name()).cyan());
    }

    fn teardown(&self, info: &ExecutionRequest) {
        log::debug!("Build lifecycle for '{}' finished.", info.metadata.name());
    }

    fn help(&self) -> &'static str {
        "Build a defect worktree inside its container (--coverage for an instrumented build)"
    }
}

// MARK: --- UNIT TESTS ---
