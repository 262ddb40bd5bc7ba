mod config;
mod llm;
mod sandbox;
mod tutor;
mod web;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::sandbox::Sandbox;
use crate::tutor::Tutor;
use crate::web::AppState;

fn print_help() {
    println!(
        "\
pytutor v{}

A web-based Python code runner with sandboxed execution and AI feedback.

USAGE:
    pytutor [OPTIONS] [CONFIG_PATH]

ARGUMENTS:
    CONFIG_PATH    Path to TOML configuration file [default: config/pytutor.toml]

OPTIONS:
    -h, --help       Print this help message and exit
    -V, --version    Print version and exit

ENVIRONMENT VARIABLES:
    Variables are referenced in the config file via ${{VAR_NAME}} syntax.

    RUST_LOG          Log level filter for tracing
                      (e.g. debug, pytutor=debug,warn)
    GEMINI_API_KEY    API key for Google Gemini models
                      (from https://aistudio.google.com/apikey)

EXAMPLES:
    pytutor                          # uses config/pytutor.toml
    pytutor /etc/pytutor/config.toml # custom config path
    RUST_LOG=debug pytutor           # with debug logging",
        env!("CARGO_PKG_VERSION"),
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --help / --version before anything else
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("pytutor v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {}
        }
    }

    // Initialize logging (RUST_LOG=debug for debug mode)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pytutor=info")),
        )
        .init();

    println!(
        r#"
              _        _
  _ __  _   _| |_ _   _| |_ ___  _ __
 | '_ \| | | | __| | | | __/ _ \| '__|
 | |_) | |_| | |_| |_| | || (_) | |
 | .__/ \__, |\__|\__,_|\__\___/|_|
 |_|    |___/   v{}
"#,
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration; run on defaults when the file is absent
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/pytutor.toml".to_string());

    let config = if std::path::Path::new(&config_path).exists() {
        info!("Loading configuration from {config_path}");
        Config::load(&config_path)?
    } else {
        warn!("No config file at {config_path}, using defaults");
        Config::default()
    };

    let tutor = Tutor::from_config(&config.llm);
    info!(
        "Sandbox: {} (timeout {}s)",
        config.sandbox.interpreter.display(),
        config.sandbox.timeout_seconds
    );
    info!("Feedback: {}", tutor.description());

    let state = AppState {
        sandbox: Arc::new(Sandbox::new(config.sandbox.clone())),
        tutor: Arc::new(tutor),
    };

    web::serve(&config.server, state).await
}
