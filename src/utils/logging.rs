use std::{path::Path, sync::LazyLock};

use anyhow::{anyhow, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

/// Log file prefix of `playtrack query`.
pub const CLI_PREFIX: &str = "cli";
/// Log file prefix of `playtrack serve`. Separate from queries so a chatty report session doesn't
/// rotate away poller history.
pub const DAEMON_PREFIX: &str = "daemon";

const DEFAULT_LEVEL: &str = "info";
const LOG_DIR: &str = "logs";

/// Installs the global subscriber of a playtrack process.
///
/// Both the daemon and queries write into `<application_data_path>/logs`, one daily rotated file
/// set per `prefix`. A detached daemon has no terminal, so `show_std` only matters for
/// `--foreground` runs and queries. Only events of this crate pass the filter.
pub fn enable_logging(
    prefix: &str,
    application_data_path: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(prefix)
        .build(application_data_path.join(LOG_DIR))?;

    let stdout = std::io::stdout.with_filter(move |_| show_std);
    let level = resolve_level(log_level, std::env::var("RUST_LOG").ok());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(crate_directive(&level)))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(appender))
        .pretty()
        .try_init()
        .map_err(|e| anyhow!("Couldn't install logging {e}"))?;
    Ok(())
}

/// `--log-filter` wins over `RUST_LOG`, which wins over the default.
fn resolve_level(log_level: Option<LevelFilter>, env_level: Option<String>) -> String {
    match (log_level, env_level) {
        (Some(level), _) => level.to_string().to_lowercase(),
        (None, Some(level)) if !level.trim().is_empty() => level,
        _ => DEFAULT_LEVEL.into(),
    }
}

fn crate_directive(level: &str) -> String {
    format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_"))
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
