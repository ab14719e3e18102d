use anyhow::Result;
use clap::Parser;
use ndbctl_core::config::Config;
use tracing::{debug, error, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::NdbCtlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let loaded = match &cli.config_file {
        Some(config_file) => {
            let path = std::path::PathBuf::from(config_file);
            debug!("Loading config from explicit path: {:?}", path);
            Config::load_from_path(&path).map(|config| (config, Some(path)))
        }
        None => {
            debug!("Loading config from default location");
            Config::load().map(|config| (config, None))
        }
    };
    let (config, config_path) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            NdbCtlError::from(e).print_diagnostic();
            std::process::exit(1);
        }
    };
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "ndbctl=warn,ndbctl_core=warn",
            1 => "ndbctl=info,ndbctl_core=info",
            2 => "ndbctl=debug,ndbctl_core=debug",
            _ => "ndbctl=trace,ndbctl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), NdbCtlError> {
    trace!("Executing command: {:?}", cli.command);
    let profile = cli.profile.as_deref();

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            let format = output::OutputFormat::from(cli.output);
            if format.is_table() {
                println!("ndbctl {}", env!("CARGO_PKG_VERSION"));
            } else {
                output::print_output(
                    serde_json::json!({
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    }),
                    format,
                )?;
            }
            Ok(())
        }

        Commands::Profile(profile_cmd) => {
            debug!("Executing profile command");
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, cli.output)
        }

        Commands::Dbserver(dbserver_cmd) => {
            debug!("Executing dbserver command");
            commands::dbserver::handle_dbserver_command(dbserver_cmd, conn_mgr, profile, cli.output)
                .await
        }

        Commands::Operation(operation_cmd) => {
            debug!("Executing operation command");
            commands::operation::handle_operation_command(
                operation_cmd,
                conn_mgr,
                profile,
                cli.output,
            )
            .await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}
