//! dirgroups command-line tool.
//!
//! Acts as a minimal host runtime for the groups data source: generates and
//! validates provider configuration, prints the data source schema, and
//! performs a read, printing the resulting state as JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dirgroups_core::config::ProviderConfig;
use dirgroups_core::{GroupsDataSource, ProviderContext, ReadContext};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// dirgroups command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "dirgroups",
    version,
    about = "List directory groups as a read-only data source"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "./dirgroups.toml")]
    config: PathBuf,

    /// Override the log level from the config file (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./dirgroups.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,

    /// Print the groups data source schema as JSON.
    Schema,

    /// Read all groups and print the resulting state as JSON.
    Read {
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { output } => {
            init_tracing(cli.log_level.as_deref().unwrap_or("warn"));
            cmd_init(&output)
        }
        Commands::Validate => {
            init_tracing(cli.log_level.as_deref().unwrap_or("warn"));
            cmd_validate(&cli.config)
        }
        Commands::Schema => {
            init_tracing(cli.log_level.as_deref().unwrap_or("warn"));
            cmd_schema()
        }
        Commands::Read { pretty } => {
            let config = ProviderConfig::load_and_resolve(&cli.config)
                .context("failed to load configuration")?;
            init_tracing(
                cli.log_level
                    .as_deref()
                    .unwrap_or(&config.provider.log_level),
            );
            cmd_read(&config, pretty).await
        }
    }
}

/// Logs go to stderr so stdout carries only the JSON result.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# dirgroups configuration

[provider]
# Customer scope to list groups for. `my_customer` means the account the
# credentials belong to.
customer_id = "my_customer"
log_level = "info"

[directory]
api_url = "https://admin.googleapis.com"
access_token_env = "DIRGROUPS_ACCESS_TOKEN"
page_size = 200
timeout_secs = 30
# impersonated_user_email = "admin@example.com"
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Set customer_id to your customer scope");
    println!("  2. Export an access token in DIRGROUPS_ACCESS_TOKEN");
    println!(
        "  3. Validate with: dirgroups validate --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let mut config =
        ProviderConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    match config.validate() {
        Ok(()) => println!("  [OK] All required fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    // A missing token is reported but does not fail validation.
    if let Err(e) = config.resolve_env_vars() {
        println!("  [WARN] {}", e);
    } else {
        println!("  [OK] Environment variable references resolved");
    }

    println!();
    println!("Configuration summary:");
    println!("  Customer      : {}", config.provider.customer_id);
    println!("  API URL       : {}", config.directory.api_url);
    println!("  Page size     : {}", config.directory.page_size);
    println!("  Timeout       : {}s", config.directory.timeout_secs);
    println!(
        "  Access token  : {}",
        if config.directory.access_token.is_some() {
            "set"
        } else {
            "NOT SET"
        }
    );
    println!(
        "  Impersonating : {}",
        config
            .directory
            .impersonated_user_email
            .as_deref()
            .unwrap_or("-")
    );
    println!();
    println!("Configuration is valid.");

    Ok(())
}

fn cmd_schema() -> Result<()> {
    let schema = GroupsDataSource.schema();
    let json = serde_json::to_string_pretty(&schema).context("failed to serialize schema")?;
    println!("{}", json);
    Ok(())
}

async fn cmd_read(config: &ProviderConfig, pretty: bool) -> Result<()> {
    let provider =
        ProviderContext::from_config(config).context("failed to build directory client")?;

    let (ctx, cancel) = ReadContext::new();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("received SIGINT (Ctrl+C), cancelling read");
            cancel.cancel();
        }
    });

    let source = GroupsDataSource;
    let mut data = source.new_state();
    let result = source.read(&ctx, &provider, &mut data).await;
    interrupt.abort();

    let outcome = result.context("groups read failed")?;
    if outcome.was_not_found() {
        warn!(customer = %provider.customer, "customer not found, returning no groups");
    }
    info!(groups = outcome.groups, "read complete");

    let state = data.to_json();
    let json = if pretty {
        serde_json::to_string_pretty(&state)
    } else {
        serde_json::to_string(&state)
    }
    .context("failed to serialize state")?;
    println!("{}", json);

    Ok(())
}
