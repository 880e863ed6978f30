mod app;
mod model;
mod msg;
mod plugin;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use app::App;
use model::config::{AppConfig, LogConfig};

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    let _guard = init_logging(&config.log)?;

    tracing::info!("addon-sync starting");

    let app = App::new(config)?;
    let summary = app.run()?;

    tracing::info!(
        checked = summary.checked,
        installed = summary.installed,
        "addon-sync done"
    );
    Ok(())
}

/// Console output always; a daily log file under the data dir when enabled.
fn init_logging(log: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let console = fmt::layer().with_writer(std::io::stderr);

    let log_dir = match model::config::project_dirs() {
        Some(dirs) if log.file => Some(dirs.data_dir().to_path_buf()),
        _ => None,
    };

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry().with(filter).with(console).init();
        return Ok(None);
    };

    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "addon-sync.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(Some(guard))
}
