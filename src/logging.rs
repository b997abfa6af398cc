use crate::config::LogFormat;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Logging settings resolved from config and CLI verbosity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

impl LogSettings {
    pub fn new(level: &str, format: LogFormat, verbose: u8) -> Self {
        Self {
            level: raise_level(level, verbose),
            format,
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Install a subscriber for the current thread. Logging stops when the guard drops.
    pub fn install(&self) -> DefaultGuard {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stderr)
            .with_target(false);

        match self.format {
            LogFormat::Compact => tracing::subscriber::set_default(builder.compact().finish()),
            LogFormat::Full => tracing::subscriber::set_default(builder.finish()),
        }
    }
}

/// `-v` bumps to debug, `-vv` to trace
fn raise_level(level: &str, verbose: u8) -> String {
    match verbose {
        0 => level.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// In-memory log sink for asserting on emitted events
    #[derive(Clone, Default)]
    pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        pub(crate) fn install(&self) -> DefaultGuard {
            let writer = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(move || writer.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::INFO)
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        /// Number of captured lines at ERROR level
        pub(crate) fn error_lines(&self) -> usize {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|line| line.contains("ERROR"))
                .count()
        }
    }

    #[test]
    fn test_verbosity_raises_level() {
        assert_eq!(LogSettings::new("warn", LogFormat::Compact, 0).level, "warn");
        assert_eq!(LogSettings::new("warn", LogFormat::Compact, 1).level, "debug");
        assert_eq!(LogSettings::new("info", LogFormat::Full, 3).level, "trace");
    }

    #[test]
    fn test_install_scoped_guard() {
        let settings = LogSettings::new("info", LogFormat::Full, 0);
        let guard = settings.install();
        tracing::info!("logging installed");
        drop(guard);
    }

    #[test]
    fn test_captured_logs_count_errors() {
        let logs = CapturedLogs::default();
        let _guard = logs.install();
        tracing::info!("fine");
        tracing::error!("broken");
        assert_eq!(logs.error_lines(), 1);
    }
}
