//! Forwards the SDK's `log` records to a logger supplied by the host app.

use std::sync::{Arc, OnceLock};

/// Receives log messages from the SDK.
///
/// Implemented by the host app and registered once with [`set_logger`].
///
/// # Examples
///
/// ```rust
/// use docstatus_core::logger::{Logger, LogLevel};
///
/// struct StdoutLogger;
///
/// impl Logger for StdoutLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         println!("[{:?}] {}", level, message);
///     }
/// }
/// ```
///
/// ## Kotlin
///
/// ```kotlin
/// object DocStatusLogger : Logger {
///     override fun log(level: LogLevel, message: String) {
///         Log.println(level.toPriority(), "DocStatus", message)
///     }
/// }
///
/// // in Application.onCreate, once
/// setLogger(DocStatusLogger)
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Logs `message` at `level`.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log message.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Very detailed tracing.
    Trace,
    /// Debugging information.
    Debug,
    /// Progress of the application (login, restored session, verification).
    Info,
    /// Something went wrong but was handled (retries, fallbacks).
    Warn,
    /// Failures the user may notice.
    Error,
}

/// Bridges the `log` facade to the host's [`Logger`].
struct LogBridge {
    host: Arc<dyn Logger>,
}

impl LogBridge {
    /// Debug and trace output is only forwarded for this SDK's own modules;
    /// for reqwest, hyper and friends it is noise.
    fn forwards(metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info || metadata.target().starts_with("docstatus")
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Self::forwards(metadata)
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let level = match record.level() {
                log::Level::Error => LogLevel::Error,
                log::Level::Warn => LogLevel::Warn,
                log::Level::Info => LogLevel::Info,
                log::Level::Debug => LogLevel::Debug,
                log::Level::Trace => LogLevel::Trace,
            };
            self.host.log(level, record.args().to_string());
        }
    }

    fn flush(&self) {}
}

static BRIDGE: OnceLock<LogBridge> = OnceLock::new();

fn install(host: Arc<dyn Logger>) -> Result<(), String> {
    let mut fresh = false;
    let bridge = BRIDGE.get_or_init(|| {
        fresh = true;
        LogBridge { host }
    });
    if !fresh {
        return Err("a logger is already set, keeping the first one".to_string());
    }
    log::set_logger(bridge).map_err(|e| format!("cannot install logger: {e}"))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Registers the host's logger and routes the SDK's `log` records to it.
///
/// Records emitted before registration are dropped. Only the first call has
/// an effect; a failed registration is reported on stderr.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if let Err(message) = install(logger) {
        eprintln!("docstatus: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorded(Mutex<Vec<(LogLevel, String)>>);

    impl Logger for Recorded {
        fn log(&self, level: LogLevel, message: String) {
            self.0.lock().unwrap().push((level, message));
        }
    }

    fn metadata(target: &str, level: log::Level) -> log::Metadata<'_> {
        log::Metadata::builder().target(target).level(level).build()
    }

    #[test]
    fn test_dependency_debug_output_is_dropped() {
        assert!(!LogBridge::forwards(&metadata("hyper::proto", log::Level::Debug)));
        assert!(!LogBridge::forwards(&metadata("reqwest::connect", log::Level::Trace)));
        assert!(LogBridge::forwards(&metadata("reqwest::connect", log::Level::Warn)));
        assert!(LogBridge::forwards(&metadata("docstatus_core::scan", log::Level::Trace)));
    }

    #[test]
    fn test_records_reach_the_host_with_their_level() {
        let host = Arc::new(Recorded::default());
        let bridge = LogBridge { host: host.clone() };

        bridge.log(
            &log::Record::builder()
                .args(format_args!("retrying in {}s", 2))
                .level(log::Level::Warn)
                .target("docstatus_core::http_request")
                .build(),
        );
        bridge.log(
            &log::Record::builder()
                .args(format_args!("connection pooled"))
                .level(log::Level::Debug)
                .target("hyper_util::client")
                .build(),
        );

        assert_eq!(
            *host.0.lock().unwrap(),
            vec![(LogLevel::Warn, "retrying in 2s".to_string())]
        );
    }
}
