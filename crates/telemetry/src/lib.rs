//! Tracing subscriber bootstrap.

use bookstore_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber described by `settings`.
///
/// `RUST_LOG` takes precedence over `telemetry.log_level`. Returns `false`
/// when a subscriber was already installed, which leaves the existing one
/// in place.
pub fn init(settings: &TelemetrySettings) -> bool {
    let filter = env_filter(&settings.log_level);

    let installed = match settings.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(false)
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(
            target: "bookstore-telemetry",
            format = ?settings.log_format,
            "telemetry initialized"
        );
    }

    installed
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_keeps_first_subscriber() {
        let settings = TelemetrySettings::default();
        init(&settings);
        assert!(!init(&settings));
    }

    #[test]
    fn invalid_level_falls_back() {
        let filter = env_filter("definitely=not=a=level");
        assert!(!filter.to_string().is_empty());
    }
}
