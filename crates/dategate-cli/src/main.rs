use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dategate-cli", version, about = "dategate CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active window for a year
    Window(commands::gate::WindowArgs),
    /// Run the enforcer once against a page path
    Check(commands::gate::CheckArgs),
    /// Show the next window boundary and one-shot delay
    Next(commands::gate::NextArgs),
    /// Keep a page gated until Ctrl-C
    Watch(commands::gate::WatchArgs),
    /// Opt-in flag management
    Optin {
        #[command(subcommand)]
        action: commands::optin::OptinAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print a shell completion script
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("DATEGATE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Window(args) => commands::gate::window(args),
        Commands::Check(args) => commands::gate::check(args),
        Commands::Next(args) => commands::gate::next(args),
        Commands::Watch(args) => commands::gate::watch(args),
        Commands::Optin { action } => commands::optin::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "dategate-cli", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
