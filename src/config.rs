use std::path::PathBuf;

use stopwatch_core::EngineConfig;

const LOG_FILE_NAME: &str = "stopwatch.log";
const DEFAULT_LOG_FILTER: &str = "stopwatch=info,stopwatch_core=info";

/// Compiled-in settings for the terminal stopwatch.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub engine: EngineConfig,
    /// Logs go to a file since the terminal is taken by the UI.
    pub log_file: PathBuf,
    /// Used when `RUST_LOG` is unset or invalid.
    pub default_log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            log_file: std::env::temp_dir().join(LOG_FILE_NAME),
            default_log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
