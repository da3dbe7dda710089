use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod input;

#[derive(Parser)]
#[command(name = "habitlens-cli", version, about = "HabitLens CLI")]
struct Cli {
    /// Config file (defaults to ~/.config/habitlens/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and suggest habit settings for a target
    Recommend(commands::recommend::RecommendArgs),
    /// Build a daily plan from the template and habit constraints
    Schedule(commands::schedule::ScheduleArgs),
    /// Show the configured schedule template
    Template(commands::template::TemplateArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Recommend(args) => commands::recommend::run(args, config),
        Commands::Schedule(args) => commands::schedule::run(args, config),
        Commands::Template(args) => commands::template::run(args, config),
        Commands::Config { action } => commands::config::run(action, config),
        Commands::Completions { shell } => {
            commands::completions::run::<Cli>(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
