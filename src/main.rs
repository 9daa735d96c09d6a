use anyhow::{bail, Context};
use std::path::PathBuf;

use session_telemetry::log_scan::{find_latest_log, lines_from_text, LogScanner};
use session_telemetry::rounds::{render_report, RoundAggregator};
use session_telemetry::{AppResult, TelemetryConfig};

/// Initialize tracing with file and console output
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Get log directory in user config folder
    let log_dir =
        TelemetryConfig::app_log_dir().unwrap_or_else(|_| std::path::PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "session-telemetry.log");

    // Configure filter (info level by default)
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    // In debug builds, also log to the console. Stdout carries the report.
    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::debug!("Log directory: {}", log_dir.display());
}

fn resolve_log_path(config: &TelemetryConfig) -> AppResult<PathBuf> {
    if let Some(arg) = std::env::args_os().nth(1) {
        return Ok(PathBuf::from(arg));
    }

    let Some(log_dir) = config.log_dir.as_deref() else {
        bail!("No log file given and no log_dir configured");
    };

    find_latest_log(std::path::Path::new(log_dir))
        .context("Failed to search the log directory")?
        .with_context(|| format!("No .log files found in {}", log_dir))
}

fn main() -> AppResult<()> {
    initialize_tracing();
    tracing::info!("session-telemetry v{}", env!("CARGO_PKG_VERSION"));

    let config = TelemetryConfig::load().context("Failed to load configuration")?;
    let log_path = resolve_log_path(&config)?;
    tracing::info!("Analyzing {}", log_path.display());

    let bytes = std::fs::read(&log_path)
        .with_context(|| format!("Failed to read log file {}", log_path.display()))?;
    let text = String::from_utf8_lossy(&bytes);

    let mut scanner = LogScanner::new(config.scanner_config());
    let mut rounds = RoundAggregator::new();
    for boundary in scanner.scan(lines_from_text(&text)) {
        rounds.append(boundary);
    }

    let report = render_report(rounds.rounds(), &rounds.summary());
    print!("{}", report);

    if let Some(report_path) = config.report_path.as_deref() {
        std::fs::write(report_path, &report)
            .with_context(|| format!("Failed to write report to {}", report_path))?;
        tracing::info!("Report written to {}", report_path);
    }

    Ok(())
}
