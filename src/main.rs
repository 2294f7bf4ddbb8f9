use anyhow::Result;
use clap::{Parser, Subcommand};
use sparkchat::config::{Config, Overrides};
use sparkchat::theme::AccentColor;
use sparkchat::transport::HttpTransport;
use sparkchat::{app, commands, logging};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sparkchat")]
#[command(version)]
#[command(about = "Chat with a remote assistant from your terminal", long_about = None)]
struct Cli {
    /// Config file (default: ~/.sparkchat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Chat endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// JSON field carrying the message text
    #[arg(long = "field", global = true)]
    request_field: Option<String>,

    /// Starting accent color
    #[arg(long, global = true)]
    accent: Option<AccentColor>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Ask {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Print the effective configuration
    Config {
        /// Write the default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    config.apply(Overrides {
        endpoint: cli.endpoint,
        request_field: cli.request_field,
        accent: cli.accent,
    });

    match cli.command {
        None => {
            let _guard = logging::init(&Config::home_dir()?.join("logs"))?;
            let transport = HttpTransport::new(&config)?;
            app::run(&config, Arc::new(transport))
        }
        Some(Commands::Ask { text }) => {
            let _guard = logging::init(&Config::home_dir()?.join("logs"))?;
            commands::ask(&config, &text.join(" "), &mut io::stdout().lock()).await
        }
        Some(Commands::Config { init }) => {
            commands::show_config(&config, &config_path, init, &mut io::stdout().lock())
        }
    }
}
