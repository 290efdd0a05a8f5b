// src/main.rs

use factory_panel::cli::{Cli, Commands};
use factory_panel::config::{save_config, AppConfig};
use factory_panel::{bootstrap, setup_configuration, AppError, AppState};
use serde::Serialize;
use std::process::ExitCode;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!(signal = "Ctrl+C", "Received signal. Stopping...") },
        () = terminate => { info!(signal = "Terminate", "Received signal. Stopping...") },
    }
}

fn init_tracing(json_logs: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json_logs {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(true))
            .init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_found<T: Serialize>(kind: &str, id: &str, value: Option<T>) -> Result<ExitCode, AppError> {
    match value {
        Some(value) => {
            print_json(&value)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("{kind} '{id}' not found or Engine unavailable");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn watch(state: &AppState) -> Result<(), AppError> {
    let mut poller = state.health_poller()?;
    let status = state.engine_status();
    let mut updates = status.watch();

    let reporter = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let view = *updates.borrow_and_update();
            if view.loading {
                continue;
            }
            info!(
                engine.online = view.is_online,
                checked_at = ?view.last_checked_at,
                "Engine status"
            );
        }
    });

    poller.start();
    shutdown_signal().await;
    poller.stop();
    status.deactivate();
    reporter.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, AppError> {
    let cli = Cli::parse_args();
    init_tracing(cli.json_logs);

    match cli.command() {
        Commands::Config { init: Some(path) } => {
            save_config(&AppConfig::default(), &path).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { init: None } => {
            let (config, _) = setup_configuration(cli.config)?;
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Watch => {
            let state = bootstrap(cli.config)?;
            watch(&state).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check => {
            let state = bootstrap(cli.config)?;
            let result = state.engine_status().check_system().await;
            print_json(&result)?;
            Ok(if result.is_online { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Commands::Cluster { id } => {
            let state = bootstrap(cli.config)?;
            print_found("cluster", &id, state.engine.get_cluster(&id).await)
        }
        Commands::Job { id } => {
            let state = bootstrap(cli.config)?;
            print_found("job", &id, state.engine.get_job(&id).await)
        }
        Commands::Template { id } => {
            let state = bootstrap(cli.config)?;
            print_found("template", &id, state.engine.get_template(&id).await)
        }
    }
}
