use std::env;

use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber on stderr, leaving stdout to `score`.
/// `RUST_LOG` picks the filter (default `info`), `LOG_FORMAT=json` switches
/// to JSON lines.
pub fn configure_logging() -> Result<(), anyhow::Error> {
    let filter = match env::var("RUST_LOG") {
        Ok(directives) => EnvFilter::try_new(directives)?,
        Err(_) => EnvFilter::new("info"),
    };
    let json = env::var("LOG_FORMAT").is_ok_and(|format| format == "json");

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = installed {
        warn!("Logging was already initialized: {}", e);
    }

    Ok(())
}
