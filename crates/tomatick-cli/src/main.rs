use clap::{Parser, Subcommand};
use tomatick_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod notifier;
mod session;

#[derive(Parser)]
#[command(name = "tomatick", version, about = "Tomatick Pomodoro timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Stage lengths and cycle length
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Daily statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
}

fn init_tracing(app_config: &AppConfig) {
    let filter = EnvFilter::try_from_env("TOMATICK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&app_config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let app_config = AppConfig::load_or_default();
    init_tracing(&app_config);

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, &app_config),
        Commands::Config { action } => commands::config::run(action, &app_config),
        Commands::Stats { action } => commands::stats::run(action, &app_config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
