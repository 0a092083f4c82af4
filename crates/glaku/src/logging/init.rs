use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` uses the `env_logger` filter syntax, e.g.
/// `"glaku=debug,glaku_demo=info"`. When unset, `RUST_LOG` is consulted and
/// then `default_level`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Filter string actually applied, given the value of `RUST_LOG`.
    fn resolve_filter(&self, rust_log: Option<String>) -> Option<String> {
        self.env_filter.clone().or(rust_log)
    }
}

static INIT: Once = Once::new();

/// Installs the global logger once. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.resolve_filter(std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(config.default_level);
            }
        }

        builder.write_style(config.write_style);
        // A logger may already be installed by the host (tests, embedders).
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_beats_environment() {
        let config = LoggingConfig { env_filter: Some("glaku=trace".into()), ..Default::default() };
        assert_eq!(config.resolve_filter(Some("warn".into())).as_deref(), Some("glaku=trace"));
    }

    #[test]
    fn environment_used_when_no_filter() {
        let config = LoggingConfig::default();
        assert_eq!(config.resolve_filter(Some("warn".into())).as_deref(), Some("warn"));
        assert_eq!(config.resolve_filter(None), None);
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig::default());
    }
}
