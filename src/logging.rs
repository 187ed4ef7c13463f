//! Structured logging for the speed test monitor
//!
//! Console logger with leveled output, UTC timestamps and a per-process
//! session ID. ERROR and CRITICAL entries go to stderr; CRITICAL always
//! precedes a process exit performed by the top-level runner.

use crate::error::{AppError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Debug level - detailed information for debugging
    Debug = 0,
    /// Info level - general application information
    Info = 1,
    /// Warning level - potentially harmful situations
    Warn = 2,
    /// Error level - error events but application can continue
    Error = 3,
    /// Critical level - severe error events that cause application termination
    Critical = 4,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Apply the level's console color to a tag
    fn colorize(&self, tag: &str) -> String {
        use colored::Colorize;
        match self {
            LogLevel::Debug => tag.cyan().to_string(),
            LogLevel::Info => tag.green().to_string(),
            LogLevel::Warn => tag.yellow().to_string(),
            LogLevel::Error => tag.red().to_string(),
            LogLevel::Critical => tag.red().bold().to_string(),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" | "FATAL" => Ok(LogLevel::Critical),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
}

/// Console logger shared by all components.
///
/// Cloning is cheap; each component holds a clone carrying its own name while
/// the session ID stays common to the whole process.
#[derive(Debug, Clone)]
pub struct Logger {
    /// Logger name/component
    name: String,
    /// Minimum log level to output
    min_level: LogLevel,
    /// Whether to use colored output
    use_color: bool,
    /// Output format
    format: LogFormat,
    /// Session correlation ID
    session_id: String,
}

impl Logger {
    /// Create the root logger for this process
    pub fn new(min_level: LogLevel, use_color: bool, format: LogFormat) -> Self {
        Self {
            name: "stm".to_string(),
            min_level,
            use_color,
            format,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Derive a component logger sharing this logger's settings and session
    pub fn named(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// Get the session correlation ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Emit a log entry at the given level
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.min_level {
            return;
        }

        let line = match self.format {
            LogFormat::Console => self.format_console(level, message),
            LogFormat::Json => self.format_json(level, message),
        };

        if level >= LogLevel::Error {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    fn format_console(&self, level: LogLevel, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        let tag = format!("{:<8}", level.as_str());
        let tag = if self.use_color {
            level.colorize(&tag)
        } else {
            tag
        };
        format!("{} {} {}: {}", timestamp, tag, self.name, message)
    }

    fn format_json(&self, level: LogLevel, message: &str) -> String {
        serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level.as_str(),
            "logger": self.name,
            "session_id": self.session_id,
            "message": message,
        })
        .to_string()
    }

    /// Log at DEBUG level
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Log at INFO level
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Log at WARN level
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    /// Log at ERROR level
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    /// Log at CRITICAL level
    pub fn critical(&self, message: &str) {
        self.log(LogLevel::Critical, message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Info, true, LogFormat::Console)
    }
}
