//! Logging utilities

use crate::Result;
use log::{Level, LevelFilter};
use std::time::{Duration, Instant};

/// Initialize the global logger.
///
/// An explicit `level` wins; otherwise `RUST_LOG` is honoured and the
/// default is `warn`.
pub fn init_logger(level: Option<LevelFilter>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    if let Some(level) = level {
        builder.filter_level(level);
    }

    builder.format_timestamp_millis().try_init()?;
    Ok(())
}

/// Performance logger for timing operations
pub struct PerfLogger {
    /// Operation name
    operation: String,
    /// Start time
    start_time: Instant,
}

impl PerfLogger {
    /// Start timing `operation`
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log the elapsed time at info level and return it
    pub fn log(self) -> Duration {
        self.log_with_level(Level::Info)
    }

    /// Log with custom level
    pub fn log_with_level(self, level: Level) -> Duration {
        let elapsed = self.elapsed();
        log::log!(
            level,
            "Performance: {} took {} microseconds",
            self.operation,
            elapsed.as_micros()
        );
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_logger_reports_elapsed() {
        let perf = PerfLogger::new("sleep");
        std::thread::sleep(Duration::from_millis(5));
        let elapsed = perf.log_with_level(Level::Debug);
        assert!(elapsed >= Duration::from_millis(5));
    }

    #[test]
    fn test_second_init_fails() {
        // Whichever call comes first in this process may succeed; a later
        // one must report the logger as already set.
        let _ = init_logger(Some(LevelFilter::Off));
        assert!(init_logger(Some(LevelFilter::Off)).is_err());
    }
}
