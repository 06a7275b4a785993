//! Logging initialization.
//!
//! Maps [`Config`] onto the observability crate so the binary only has one
//! call to make at startup.

use crate::Config;
use observability::LogConfig;
use std::path::PathBuf;

/// Service name recorded when the JSONL log starts.
const SERVICE_NAME: &str = "anon-link";

/// Build the observability config for `config`.
///
/// With `log_file` set, logs go to that JSONL file and stderr stays free for
/// the demo's own output.
pub fn log_config(config: &Config, log_file: Option<PathBuf>) -> LogConfig {
    LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: config.log_level.clone(),
        log_path: log_file,
        also_stderr: false,
    }
}

/// Initialize the logging system.
///
/// ```ignore
/// init_logging(&Config::default(), None);
/// tracing::info!("demo started");
/// ```
pub fn init_logging(config: &Config, log_file: Option<PathBuf>) {
    observability::init_with_config(log_config(config, log_file));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_uses_config_level() {
        let mut config = Config::default();
        config.log_level = "debug".to_string();

        let log = log_config(&config, None);
        assert_eq!(log.service_name, "anon-link");
        assert_eq!(log.default_level, "debug");
        assert!(log.log_path.is_none());
    }

    #[test]
    fn test_log_config_with_file() {
        let log = log_config(&Config::default(), Some(PathBuf::from("/tmp/x.jsonl")));
        assert_eq!(log.log_path, Some(PathBuf::from("/tmp/x.jsonl")));
        assert!(!log.also_stderr);
    }
}
