use std::io::Write;
use std::sync::Mutex;

use chrono::Local;
use slog::{Drain, o};

pub const DEFAULT_LOGGING_TIME_FMT: &str = "%F %T:%S%.6f";

pub trait Logger: Sync + Send {
    fn append(&self, level: LoggingLevel, file: &str, line: u32, message: &str);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoggingLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LoggingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoggingLevel::Debug => "DEBUG",
            LoggingLevel::Info => "INFO",
            LoggingLevel::Warn => "WARN",
            LoggingLevel::Error => "ERROR",
        }
    }
}

#[macro_export]
macro_rules! log_append {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.append($level, file!(), line!(), format!($($arg)+).as_str())
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_append!($logger, $crate::base::LoggingLevel::Info, $($arg)+)
    }
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_append!($logger, $crate::base::LoggingLevel::Warn, $($arg)+)
    }
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_append!($logger, $crate::base::LoggingLevel::Error, $($arg)+)
    }
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_append!($logger, $crate::base::LoggingLevel::Debug, $($arg)+)
    }
}

pub fn new_default_logger() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator)
        .use_custom_timestamp(|wr| {
            let now = Local::now();
            write!(wr, "{}", now.format(DEFAULT_LOGGING_TIME_FMT))
        })
        .build()
        .fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, o!())
}

/// Forwards to a slog logger, keeping the caller's source location as a key.
pub struct SlogLogger {
    inner: slog::Logger,
}

impl SlogLogger {
    pub fn new(inner: slog::Logger) -> Self {
        Self { inner }
    }
}

impl Default for SlogLogger {
    fn default() -> Self {
        Self::new(new_default_logger())
    }
}

impl Logger for SlogLogger {
    fn append(&self, level: LoggingLevel, file: &str, line: u32, message: &str) {
        let location = format!("{}:{}", file, line);
        match level {
            LoggingLevel::Debug => slog::debug!(self.inner, "{}", message; "at" => location),
            LoggingLevel::Info => slog::info!(self.inner, "{}", message; "at" => location),
            LoggingLevel::Warn => slog::warn!(self.inner, "{}", message; "at" => location),
            LoggingLevel::Error => slog::error!(self.inner, "{}", message; "at" => location),
        }
    }
}

pub struct BlackHoleLogger;

impl Logger for BlackHoleLogger {
    fn append(&self, _level: LoggingLevel, _file: &str, _line: u32, _message: &str) {}
}

pub struct WriterLogger {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl WriterLogger {
    pub fn new<T>(owns: T) -> Self
        where T: Write + Send + 'static {
        Self { writer: Mutex::new(Box::new(owns)) }
    }
}

impl Logger for WriterLogger {
    fn append(&self, level: LoggingLevel, file: &str, line: u32, message: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            // Write failures are dropped.
            let _ = writeln!(writer, "[{}:{}] {} {}", file, line, level.as_str(), message);
            let _ = writer.flush();
        }
    }
}

/// Keeps every appended line in memory, for inspecting background failures.
#[derive(Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(LoggingLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(LoggingLevel, String)> {
        self.lines.lock().map(|x| x.clone()).unwrap_or_default()
    }

    pub fn messages_at(&self, level: LoggingLevel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn append(&self, level: LoggingLevel, _file: &str, _line: u32, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn black_hole_log() {
        let log = Arc::new(BlackHoleLogger {});
        log_info!(log, "{}", 1);
    }

    #[test]
    fn writer_log() {
        let log = WriterLogger::new(io::stderr());
        log_warn!(log, "{} = {}", 2, 3);
    }

    #[test]
    fn slog_logging() {
        let log = SlogLogger::default();
        log_info!(log, "ok={}", 1);
        log_debug!(log, "err={}", "fail");
    }

    #[test]
    fn memory_log_keeps_levels() {
        let log = Arc::new(MemoryLogger::new());
        log_error!(log, "commit failed: {}", "boom");
        log_debug!(log, "step {}", 2);
        assert_eq!(2, log.lines().len());
        assert_eq!(vec!["commit failed: boom".to_string()], log.messages_at(LoggingLevel::Error));
    }
}
