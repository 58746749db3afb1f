// src/bin/defectlab.rs

use anyhow::{Result, anyhow};
use colored::*;
use defectlab::{
    cli::commands::{build::BuildCommand, test::TestCommand},
    constants::CONTAINER_PREFIX,
    core::{
        command::{self, Command},
        paths,
        taxonomy::Taxonomy,
    },
    system::executor::DockerChannel,
};
use std::env;

// --- Command Definition and Registry ---

/// Defines a harness verb, its aliases, and the factory for its command object.
/// The uniform shape keeps the registry declarative: adding a verb is one entry.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    factory: fn() -> Box<dyn Command>,
}

/// The single source of truth for all harness verbs.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "build",
        aliases: &[],
        factory: || Box::new(BuildCommand),
    },
    CommandDefinition {
        name: "test",
        aliases: &[],
        factory: || Box::new(TestCommand),
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// The main entry point of the `defectlab` binary.
/// It sets up logging, dispatches to the requested command, and performs
/// centralized error handling.
fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = run_cli(args) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(args: Vec<String>) -> Result<()> {
    log::debug!("Dispatching args: {:?}", args);

    let Some((verb, rest)) = args.split_first() else {
        print_help();
        return Ok(());
    };
    if matches!(verb.as_str(), "help" | "--help" | "-h") {
        print_help();
        return Ok(());
    }

    let Some(definition) = find_command(verb) else {
        return Err(anyhow!(
            "Unknown command '{}'. Run 'defectlab help' for the list of commands.",
            verb
        ));
    };

    let command = (definition.factory)();
    let taxonomy = Taxonomy::discover(&paths::get_taxonomy_root()?)?;
    log::debug!("Taxonomy holds {} project(s)", taxonomy.len());

    // `run` is pure: it only resolves metadata and assembles the script list.
    let request = command.run(rest, &taxonomy)?;

    let mut channel = DockerChannel::new(format!(
        "{}{}",
        CONTAINER_PREFIX,
        request.metadata.name()
    ));
    command::execute(command.as_ref(), request, &mut channel)
}

fn print_help() {
    println!(
        "{}",
        "defectlab: build and test reproducible historical defects inside containers.".bold()
    );
    println!();
    println!("{}", "Commands:".yellow());
    for definition in COMMAND_REGISTRY {
        let command = (definition.factory)();
        println!(
            "  {} {}",
            format!("{:<8}", definition.name).cyan(),
            command.help()
        );
    }
    println!();
    println!(
        "Project definitions are discovered under the taxonomy root ({} or the\nuser config directory).",
        "DEFECTLAB_TAXONOMY".cyan()
    );
}
