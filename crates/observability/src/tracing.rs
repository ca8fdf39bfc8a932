//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

use crate::LogSettings;

/// Build the filter: `RUST_LOG` if present and valid, else the configured level.
pub fn filter(settings: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(settings: &LogSettings) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(settings))
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    let _ = if settings.json {
        builder.json().with_target(false).try_init()
    } else {
        builder.with_target(true).try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        let settings = LogSettings::default();
        init(&settings);
        init(&LogSettings {
            level: "debug".to_string(),
            json: true,
        });
    }

    #[test]
    fn garbage_level_falls_back_instead_of_panicking() {
        let _ = filter(&LogSettings {
            level: "[[not a directive".to_string(),
            json: false,
        });
    }
}
