use abacus::commands::{execute, CommandRegistry};
use abacus::persistence::HistoryStore;
use abacus::utils::print_reply;
use abacus::{config::Config, error::AbacusResult, Calculator, ReplEngine};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "abacus")]
#[command(about = "An interactive decimal calculator with undoable history")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// History file path, overriding the configuration
    #[arg(long)]
    history_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run a single command (e.g. "add 2 3") and exit
    #[arg(short = 'c', long = "command")]
    command_string: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },
    /// Show configuration information
    Config,
    /// Delete the saved calculation history
    ClearHistory,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> AbacusResult<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .init();

    info!("Starting Abacus v{}", abacus::VERSION);

    let mut config = Config::load(cli.config.as_deref()).await?;
    apply_cli_overrides(&cli, &mut config);

    if let Some(command) = cli.command {
        return handle_command(command, &config).await;
    }

    let mut calculator = Calculator::new(&config)?;

    match cli.command_string {
        Some(line) => {
            if config.history.load_on_start {
                calculator.restore()?;
            }
            let registry = CommandRegistry::new();
            let command = registry.parse(&line)?;
            let reply = execute(&mut calculator, &registry, &command)?;
            print_reply(&reply);
        }
        None => {
            let mut repl = ReplEngine::new(config, calculator);
            repl.run_interactive()?;
        }
    }

    Ok(())
}

/// Command-line flags take precedence over the environment and the config file
fn apply_cli_overrides(cli: &Cli, config: &mut Config) {
    if let Some(path) = &cli.history_file {
        config.override_history_file(path.clone());
    }
}

async fn handle_command(command: Commands, config: &Config) -> AbacusResult<()> {
    match command {
        Commands::Init { force } => {
            let path = config.init(force).await?;
            println!("✓ Configuration initialized at {}", path.display());
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        Commands::ClearHistory => {
            HistoryStore::new(config.history_file()).remove()?;
            println!("✓ Calculation history cleared");
        }
    }
    Ok(())
}
