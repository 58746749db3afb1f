// src/cli/commands/test.rs

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

/// One test-suite invocation inside the project container.
#[derive(Debug)]
pub struct TestScript {
    command: Vec<String>,
}

impl TestScript {
    fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl CommandScript for TestScript {
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
            Some(0) => log::info!("Test suite of '{}' passed.", info.metadata.name()),
            Some(code) => log::error!(
                "Test suite of '{}' exited with status {}.",
                info.metadata.name(),
                code
            ),
            None => log::warn!("Test suite of '{}' never ran.", info.metadata.name()),
        }
    }
}

/// The coverage report step appended after an instrumented test run.
#[derive(Debug)]
pub struct GcovScript {
    command: Vec<String>,
}

impl GcovScript {
    fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl CommandScript for GcovScript {
    fn command(&self) -> &[String] {
        &self.command
    }

    fn before(&mut self, _info: &ExecutionRequest) {
        println!("{} {}", "→".blue(), render_script(&self.command).green());
    }

    fn after(&mut self, info: &ExecutionRequest, exit_code: Option<i32>, _output: Option<&str>) {
        match exit_code {
            Some(0) => log::info!(
                "Coverage data for '{}' collected.",
                info.metadata.name()
            ),
            Some(code) => log::error!(
                "Coverage collection for '{}' exited with status {}.",
                info.metadata.name(),
                code
            ),
            None => log::warn!(
                "Coverage collection for '{}' was skipped.",
                info.metadata.name()
            ),
        }
    }
}

/// Runs the project's test suite against the checked-out defect, optionally
/// instrumented for coverage with a gcov report step at the end.
#[derive(Debug)]
pub struct TestCommand;

impl Command for TestCommand {
    fn run(&self, argv: &[String], taxonomy: &Taxonomy) -> Result<ExecutionRequest> {
        let args = ProjectArgs::try_parse_from(argv)?;
        let (state, worktree_dir) = worktree::read_worktree_config(args.path.as_deref().unwrap_or("."))?;

        let metadata = taxonomy.get(&state.project)?;
        let common = &metadata.load()?.common;

        let scripts: Vec<Box<dyn CommandScript>> = if args.coverage {
            vec![
                Box::new(TestScript::new(common.test_coverage_command.clone())),
                Box::new(GcovScript::new(common.gcov.command.clone())),
            ]
        } else {
            vec![Box::new(TestScript::new(common.test_command.clone()))]
        };

        Ok(ExecutionRequest {
            metadata,
            worktree: worktree_dir,
            scripts,
            stream: args.verbose,
        })
    }

    fn setup(&self, info: &ExecutionRequest) {
        println!("{}", format!("Testing '{}'", info.metadata.name()).cyan());
    }

    fn teardown(&self, info: &ExecutionRequest) {
        log::debug!("Test lifecycle for '{}' finished.", info.metadata.name());
    }

    fn help(&self) -> &'static str {
        "Run a defect worktree's test suite in its container (--coverage adds the gcov report)"
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{META_FILENAME, WORKTREE_CONFIG_FILENAME};
    use crate::test_logging::capture_logs;
    use log::Level;
    use tempfile::TempDir;

    const DESCRIPTOR: &str = r#"{
        "info": { "url": "https://example.com/libucl", "short-desc": "UCL parser", "vcs": "git" },
        "common": {
            "build": { "command": ["cmake", "--build", "build"] },
            "build-coverage": { "command": ["cmake", "--build", "build-cov"] },
            "test-type": "ctest",
            "test": { "command": ["ctest", "--test-dir", "build"] },
            "test-coverage": { "command": ["ctest", "--test-dir", "build-cov"] },
            "gcov": { "exclude": ["tests/*"], "command": ["gcov", "-abcfu"] }
        },
        "defects": [ { "hash": "cafebabe", "patch": 2, "cases": 1 } ]
    }"#;

    fn fixture() -> (TempDir, Taxonomy, TempDir) {
        let root = TempDir::new().unwrap();
        let project = root.path().join("libucl");
        std::fs::create_dir(&project).unwrap();
        std::fs::write(project.join(META_FILENAME), DESCRIPTOR).unwrap();
        let taxonomy = Taxonomy::discover(root.path()).unwrap();

        let worktree_dir = TempDir::new().unwrap();
        std::fs::write(
            worktree_dir.path().join(WORKTREE_CONFIG_FILENAME),
            r#"{ "project": "libucl", "defect": 2 }"#,
        )
        .unwrap();
        (root, taxonomy, worktree_dir)
    }

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_run_wraps_plain_test_command() {
        let (_root, taxonomy, worktree_dir) = fixture();
        let path = worktree_dir.path().display().to_string();

        let request = TestCommand.run(&argv(&[&path]), &taxonomy).unwrap();

        assert_eq!(request.scripts.len(), 1);
        assert_eq!(
            request.scripts[0].command(),
            ["ctest".to_string(), "--test-dir".to_string(), "build".to_string()]
        );
    }

    #[test]
    fn test_coverage_appends_gcov_report_step() {
        let (_root, taxonomy, worktree_dir) = fixture();
        let path = worktree_dir.path().display().to_string();

        let request = TestCommand
            .run(&argv(&[&path, "--coverage"]), &taxonomy)
            .unwrap();

        assert_eq!(request.scripts.len(), 2);
        assert_eq!(
            request.scripts[0].command(),
            ["ctest".to_string(), "--test-dir".to_string(), "build-cov".to_string()]
        );
        assert_eq!(
            request.scripts[1].command(),
            ["gcov".to_string(), "-abcfu".to_string()]
        );
    }

    #[test]
    fn test_stream_follows_verbose_flag() {
        let (_root, taxonomy, worktree_dir) = fixture();
        let path = worktree_dir.path().display().to_string();

        let buffered = TestCommand.run(&argv(&[&path]), &taxonomy).unwrap();
        assert!(!buffered.stream);

        let streamed = TestCommand
            .run(&argv(&[&path, "-v"]), &taxonomy)
            .unwrap();
        assert!(streamed.stream);
    }

    #[test]
    fn test_test_script_after_logs_by_exit_code() {
        let (_root, taxonomy, worktree_dir) = fixture();
        let path = worktree_dir.path().display().to_string();

        let mut request = TestCommand.run(&argv(&[&path]), &taxonomy).unwrap();
        let mut script = request.scripts.pop().unwrap();
        script.before(&request);
        script.output(Some(0), "100% tests passed\n");

        let success = capture_logs(|| script.after(&request, Some(0), Some("")));
        assert!(success.iter().any(|(level, message)| *level == Level::Info
            && message.contains("Test suite of 'libucl' passed")));

        let failure = capture_logs(|| script.after(&request, Some(8), Some("")));
        assert!(failure.iter().any(|(level, message)| *level == Level::Error
            && message.contains("Test suite of 'libucl' exited with status 8")));

        let skipped = capture_logs(|| script.after(&request, None, None));
        assert!(skipped.iter().any(|(level, message)| *level == Level::Warn
            && message.contains("Test suite of 'libucl' never ran")));
    }

    #[test]
    fn test_gcov_script_after_logs_by_exit_code() {
        let (_root, taxonomy, worktree_dir) = fixture();
        let path = worktree_dir.path().display().to_string();

        let mut request = TestCommand
            .run(&argv(&[&path, "--coverage"]), &taxonomy)
            .unwrap();
        // The report step sits at the end of the coverage script list.
        let mut script = request.scripts.pop().unwrap();
        assert_eq!(script.command(), ["gcov".to_string(), "-abcfu".to_string()]);
        script.before(&request);

        let success = capture_logs(|| script.after(&request, Some(0), Some("")));
        assert!(success.iter().any(|(level, message)| *level == Level::Info
            && message.contains("Coverage data for 'libucl' collected")));

        let failure = capture_logs(|| script.after(&request, Some(1), Some("")));
        assert!(failure.iter().any(|(level, message)| *level == Level::Error
            && message.contains("Coverage collection for 'libucl' exited with status 1")));

        let skipped = capture_logs(|| script.after(&request, None, None));
        assert!(skipped.iter().any(|(level, message)| *level == Level::Warn
            && message.contains("Coverage collection for 'libucl' was skipped")));
    }
}
