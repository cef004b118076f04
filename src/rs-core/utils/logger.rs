use std::sync::atomic::{AtomicU8, Ordering};

use crate::bindings::LogLevel;

static MAX_LOG_LEVEL: AtomicU8 = AtomicU8::new(LoggerLevel::Info as u8);

/// Verbosity threshold of the `Logger`. A log is only emitted if its level is
/// inferior or equal to the current threshold.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum LoggerLevel {
    None = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl LoggerLevel {
    /// Convert the numeric level communicated by the JavaScript-side.
    /// Values above `4` are clamped to `Debug`.
    pub fn from_u8(level: u8) -> Self {
        match level {
            0 => LoggerLevel::None,
            1 => LoggerLevel::Error,
            2 => LoggerLevel::Warn,
            3 => LoggerLevel::Info,
            _ => LoggerLevel::Debug,
        }
    }
}

pub struct Logger {}

impl Logger {
    pub fn set_logger_level(new_level: LoggerLevel) {
        MAX_LOG_LEVEL.store(new_level as u8, Ordering::Relaxed);
    }

    pub fn logger_level() -> LoggerLevel {
        LoggerLevel::from_u8(MAX_LOG_LEVEL.load(Ordering::Relaxed))
    }

    pub fn error(text: &str) {
        if is_enabled(LoggerLevel::Error) {
            emit(LogLevel::Error, text);
        }
    }

    pub fn warn(text: &str) {
        if is_enabled(LoggerLevel::Warn) {
            emit(LogLevel::Warn, text);
        }
    }

    pub fn info(text: &str) {
        if is_enabled(LoggerLevel::Info) {
            emit(LogLevel::Info, text);
        }
    }

    pub fn debug(text: &str) {
        if is_enabled(LoggerLevel::Debug) {
            emit(LogLevel::Debug, text);
        }
    }

    pub fn lazy_error(func: &dyn Fn() -> String) {
        if is_enabled(LoggerLevel::Error) {
            emit(LogLevel::Error, &func());
        }
    }

    pub fn lazy_warn(func: &dyn Fn() -> String) {
        if is_enabled(LoggerLevel::Warn) {
            emit(LogLevel::Warn, &func());
        }
    }

    pub fn lazy_info(func: &dyn Fn() -> String) {
        if is_enabled(LoggerLevel::Info) {
            emit(LogLevel::Info, &func());
        }
    }

    pub fn lazy_debug(func: &dyn Fn() -> String) {
        if is_enabled(LoggerLevel::Debug) {
            emit(LogLevel::Debug, &func());
        }
    }
}

#[inline(always)]
fn is_enabled(level: LoggerLevel) -> bool {
    MAX_LOG_LEVEL.load(Ordering::Relaxed) >= level as u8
}

#[cfg(target_arch = "wasm32")]
fn emit(level: LogLevel, text: &str) {
    crate::bindings::jsLog(level, text);
}

/// Outside of a browser there is no JavaScript console to forward to.
#[cfg(not(target_arch = "wasm32"))]
fn emit(level: LogLevel, text: &str) {
    eprintln!("[{level}] {text}");
}
