use std::env;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "FINSIGHT_LOG";

/// Stderr subscriber; stdout is left to command output.
///
/// `FINSIGHT_LOG` takes precedence; otherwise `warn`, or `debug` with `--verbose`.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| default_filter.to_string());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter_layer)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
