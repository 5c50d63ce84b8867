//! mochi CLI entry point.

use clap::Parser;
use mochi::cli::commands::{self, GlobalArgs};
use mochi::cli::{Cli, Commands};
use mochi::error::Error;
use mochi::sync::MergePolicy;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,reqwest=info,hyper=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let args = GlobalArgs::from_cli(cli, json);

    match &cli.command {
        Commands::Decks => commands::decks::execute(&args),
        Commands::Pull { deck } => commands::pull::execute(deck, &args),
        Commands::Push { file, force } => {
            commands::sync::execute(MergePolicy::Push, file.as_deref(), *force, &args)
        }
        Commands::Sync { file, force } => {
            commands::sync::execute(MergePolicy::Sync, file.as_deref(), *force, &args)
        }
        Commands::Dedupe { file, threshold } => commands::dedupe::execute(file, *threshold, &args),
        Commands::Curate { file, threshold } => commands::curate::execute(file, *threshold, &args),
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
