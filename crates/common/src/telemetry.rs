//! Logging initialisation for dmesh binaries.
//!
//! Three sinks:
//! - stderr, filtered by `RUST_LOG` or the configured level
//! - `dmesh.log`, a daily-rolling JSON log of INFO and above
//! - `audit.jsonl`, only events emitted with `target: "audit"`

use crate::config::LoggingSettings;
use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Target used for access-audit events.
pub const AUDIT_TARGET: &str = "audit";

pub fn init_logging(settings: &LoggingSettings, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        settings.level.as_str()
    };
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let mut setup_warning = None;
    let log_dir = if settings.file_logging {
        settings.resolve_directory().and_then(|dir| {
            match std::fs::create_dir_all(&dir) {
                Ok(()) => Some(dir),
                Err(e) => {
                    setup_warning = Some(format!(
                        "File logging disabled, cannot create {}: {}",
                        dir.display(),
                        e
                    ));
                    None
                }
            }
        })
    } else {
        None
    };

    let file_layer = log_dir.as_ref().map(|dir| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(tracing_appender::rolling::daily(dir, "dmesh.log"))
            .with_filter(LevelFilter::INFO)
    });

    let audit_layer = log_dir.as_ref().filter(|_| settings.audit).map(|dir| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(tracing_appender::rolling::never(dir, "audit.jsonl"))
            .with_filter(filter_fn(|metadata| metadata.target() == AUDIT_TARGET))
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(audit_layer)
        .try_init()
        .ok();

    if let Some(warning) = setup_warning {
        tracing::warn!("{}", warning);
    }
    if let Some(dir) = log_dir {
        tracing::debug!(log_dir = %dir.display(), "Logging initialized");
    }
}
