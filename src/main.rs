//! fwbridge - Firewall Control Bridge
//!
//! Command-line transport for the bridge. Each command runs one operation and
//! prints the resulting `BridgeResponse` as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! fwbridge status
//! fwbridge toggle on
//! fwbridge add-rule --name "Web" --port 80,443 --protocol TCP --action Allow
//! fwbridge list-rules
//! fwbridge --primitive /usr/libexec/fw-primitive --timeout 10 status
//! fwbridge config                    # Print the effective configuration
//! fwbridge --timeout 10 config --save  # Persist it to config.json
//! ```
//!
//! Exits non-zero when the operation did not succeed.

use clap::{Parser, Subcommand};
use fwbridge::config::{self, BridgeConfig};
use fwbridge::core::error::PrimitiveErrorPattern;
use fwbridge::core::firewall::{Operation, ToggleState};
use fwbridge::{Bridge, BridgeResponse, RuleRequest};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

shadow_rs::shadow!(build);

#[derive(Parser)]
#[command(name = "fwbridge")]
#[command(about = "Firewall Control Bridge - structured firewall operations", long_about = None)]
#[command(version = build::CLAP_LONG_VERSION)]
struct Cli {
    /// Firewall primitive program (overrides config and FWBRIDGE_PRIMITIVE)
    #[arg(long, global = true, value_name = "PROGRAM")]
    primitive: Option<String>,

    /// Abandon the operation after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration
    Config {
        /// Also write it to config.json, including --primitive/--timeout overrides
        #[arg(long)]
        save: bool,
    },
    #[command(flatten)]
    Operation(OperationCommand),
}

#[derive(Subcommand)]
enum OperationCommand {
    /// Show whether the firewall is active
    Status,
    /// Turn the firewall on or off
    Toggle {
        /// Desired state: on or off
        state: Option<String>,
    },
    /// Add an allow/block rule on a port
    AddRule {
        #[arg(long)]
        name: Option<String>,
        /// Port, port list or range (e.g. 80, 80,443, 8000-8100)
        #[arg(long)]
        port: Option<String>,
        /// TCP or UDP
        #[arg(long)]
        protocol: Option<String>,
        /// Allow or Block
        #[arg(long)]
        action: Option<String>,
    },
    /// List managed rules
    ListRules,
}

fn main() -> ExitCode {
    let _ = fwbridge::utils::ensure_dirs();
    init_logging();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to create Tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(handle_cli(cli))
}

/// Logs to `<state_dir>/fwbridge.log`, falling back to stderr.
///
/// Stdout is reserved for the JSON response.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let log_file = fwbridge::utils::get_state_dir().and_then(|mut log_path| {
        log_path.push("fwbridge.log");
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .ok()
    });

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(file)
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

async fn handle_cli(cli: Cli) -> ExitCode {
    let mut config = config::load_config().await.apply_env();
    if let Some(program) = cli.primitive {
        config = config.with_primitive(program);
    }
    if let Some(secs) = cli.timeout {
        config.timeout_secs = secs;
    }

    let command = match cli.command {
        Commands::Config { save } => return handle_config(&config, save).await,
        Commands::Operation(command) => command,
    };

    let response = run_command(&config, command).await;
    if !response.success
        && let Some(error) = &response.error
    {
        print_hints(error);
    }

    if print_json(&response) && response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn handle_config(config: &BridgeConfig, save: bool) -> ExitCode {
    if save {
        if let Err(e) = config::save_config(config).await {
            eprintln!("Error: failed to save configuration: {e}");
            return ExitCode::FAILURE;
        }
        tracing::info!("Configuration saved");
    }

    if print_json(config) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_command(config: &BridgeConfig, command: OperationCommand) -> BridgeResponse {
    let bridge = Bridge::from_config(config);

    let op = match command {
        OperationCommand::Status => Operation::StatusQuery,
        OperationCommand::ListRules => Operation::ListRules,
        OperationCommand::Toggle { state } => match ToggleState::parse_request(state.as_deref()) {
            Ok(state) => Operation::Toggle(state),
            Err(e) => return e.into_response(),
        },
        OperationCommand::AddRule {
            name,
            port,
            protocol,
            action,
        } => {
            let request = RuleRequest {
                name,
                port,
                protocol,
                action,
            };
            match request.validate(config.sanitize_policy) {
                Ok(rule) => Operation::AddRule(rule),
                Err(e) => return e.into_response(),
            }
        }
    };

    match config.timeout() {
        Some(timeout) => bridge.run_with_timeout(op, timeout).await,
        None => bridge.run(op).await,
    }
}

fn print_hints(error: &str) {
    let translation = PrimitiveErrorPattern::match_error(error);
    tracing::debug!("Translated primitive error: {}", translation.user_message);
    for suggestion in &translation.suggestions {
        eprintln!("hint: {suggestion}");
    }
}

/// Prints `value` as pretty JSON on stdout; returns false if it cannot be encoded
fn print_json<T: serde::Serialize>(value: &T) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            true
        }
        Err(e) => {
            eprintln!("Error: {e}");
            false
        }
    }
}
