//! herakles-memory-collector - version 0.1.0
//!
//! Prometheus collector for system memory counters with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod metrics;
mod state;

use axum::{routing::get, Router};
use clap::Parser;
use herakles_memory_collector::CycleStats;
use prometheus::Registry;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info, warn, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_collect, command_config, command_units};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{health_handler, metrics_handler, root_handler};
use metrics::ExportedMetrics;
use state::AppState;

/// Effective log level: CLI flag first, then the config file.
fn effective_log_level(config: &Config, args: &Args) -> LogLevel {
    if let Some(level) = args.log_level {
        return level;
    }
    match config.log_level.as_deref() {
        Some("off") => LogLevel::Off,
        Some("error") => LogLevel::Error,
        Some("warn") => LogLevel::Warn,
        Some("debug") => LogLevel::Debug,
        Some("trace") => LogLevel::Trace,
        _ => LogLevel::Info,
    }
}

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config, args: &Args) {
    let level = effective_log_level(config, args);
    if matches!(level, LogLevel::Off) {
        return;
    }

    let log_level = match level {
        LogLevel::Off | LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Units = command {
            return command_units();
        }
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config, &args);

        return match command {
            Commands::Collect { format } => command_collect(format.clone(), &config),
            Commands::Check => command_check(&config),
            Commands::Config { .. } | Commands::Units => unreachable!("handled above"),
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;
    setup_logging(&config, &args);

    info!("Starting herakles-memory-collector");

    let runtime_config = config.runtime_config()?;
    let collector = config.memory_collector();
    if !config.is_enabled() {
        warn!("Collection disabled in configuration, /metrics serves self-telemetry only");
    }
    info!(
        "Primary source: {}, fallback: {}, detailed: {}, unit: {}",
        collector.primary().path().display(),
        if collector.fallback().is_some() { "sysinfo" } else { "disabled" },
        runtime_config.detailed,
        runtime_config
            .target_unit()
            .map(|u| u.name())
            .unwrap_or("-")
    );

    let bind_ip_str = config
        .bind
        .clone()
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let port = config.port.unwrap_or(DEFAULT_PORT);

    // Initialize Prometheus metrics registry
    let registry = Registry::new();
    let metrics = ExportedMetrics::new(&registry, config.metric_prefix())?;
    debug!("All metrics registered successfully");

    let enable_health = config.enable_health.unwrap_or(true);
    let state = Arc::new(AppState {
        registry,
        metrics,
        collector,
        runtime_config,
        config: Arc::new(config),
        stats: Arc::new(CycleStats::new()),
        scrape_lock: Mutex::new(()),
        start_time: Instant::now(),
    });

    // Configure HTTP server routes
    let bind_ip: IpAddr = bind_ip_str.parse()?;
    let addr = SocketAddr::new(bind_ip, port);

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler));

    if enable_health {
        app = app.route("/health", get(health_handler));
    } else {
        debug!("/health endpoint disabled");
    }

    let app = app.with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!(
        "herakles-memory-collector listening on http://{}",
        addr
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("herakles-memory-collector stopped gracefully");
    Ok(())
}
