mod args;
mod config;
mod render;

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use args::CliArgs;
use monitor_app::{
    AppConfig, AppState, Dashboard, ViewPreferences, ViewSnapshot, shift_range, today_local,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    init_logging(args.debug);

    if let Some(path) = &args.detail {
        let detail = monitor_app::feed::load_run_detail(path)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&detail)?);
        } else {
            println!("{}", render::render_detail(&detail));
        }
        return Ok(());
    }
    let Some(runs_path) = args.runs.clone() else {
        return Err("--runs is required".into());
    };

    let mut load = config::load_or_create(args.config_dir.as_deref())?;
    if load.created {
        info!(path = %load.paths.file.display(), "created default config");
    }

    let snapshot = resolve_view(&args, &load.config.preferences, today_local());
    if args.save {
        load.config.preferences = args.overrides().or(load.config.preferences.clone());
        config::save(&load.paths, &load.config)?;
        info!(path = %load.paths.file.display(), "saved view preferences");
    }

    let app_state = AppState::new(AppConfig {
        runs_path,
        report_path: args.report.clone(),
        monitor: load.config.monitor.clone(),
    });

    let interval_secs = snapshot.refresh_interval_secs;
    if args.once || interval_secs == 0 {
        let dashboard = app_state.refresh(&snapshot, Utc::now())?;
        print_dashboard(&dashboard, &args)?;
        return Ok(());
    }

    info!(interval_secs, runs = %app_state.config.runs_path.display(), "starting refresh loop");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Re-resolved each tick so the window follows the calendar.
                let view = resolve_view(&args, &load.config.preferences, today_local());
                match app_state.refresh(&view, Utc::now()) {
                    Ok(dashboard) => print_dashboard(&dashboard, &args)?,
                    Err(err) => warn!(error = %err, "refresh skipped"),
                }
            }
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
        }
    }
    Ok(())
}

fn resolve_view(args: &CliArgs, persisted: &ViewPreferences, today: NaiveDate) -> ViewSnapshot {
    let snapshot = ViewSnapshot::resolve(args.overrides(), persisted.clone(), today);
    match args.shift {
        Some(delta) => ViewSnapshot {
            range: shift_range(snapshot.range, delta, today),
            ..snapshot
        },
        None => snapshot,
    }
}

fn print_dashboard(dashboard: &Dashboard, args: &CliArgs) -> Result<(), serde_json::Error> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(dashboard)?);
    } else {
        println!("{}", render::render_text(dashboard, &args.hidden));
    }
    Ok(())
}

fn init_logging(debug: bool) {
    let level = if debug {
        "debug".to_string()
    } else if let Ok(level) = std::env::var("AGENT_MONITOR_LOG") {
        level
    } else {
        "info".to_string()
    };
    let filter = if debug {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("logging already initialized");
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}
