use crate::wasm_bindgen;
use std::fmt;

/// # js_functions
///
/// This file lists all JavaScript functions that are callable from Rust as well as
/// struct and enumeration used by those functions.

#[wasm_bindgen]
extern "C" {
    // Log the given text in the JavaScript console, with the log level given.
    pub fn jsLog(log_level: LogLevel, log: &str);

    // Announces that a request was annotated with CMCD data.
    //
    // `record` is a JSON object with the `type`, `url`, `method`, `cmcd` and
    // `timestamp` properties, `cmcd` being the `CMCD=...` query fragment which
    // was appended to `url`.
    pub fn jsLogCmcdRequest(record: &str);

    // Communicates the CMCD values sent with the last annotated request, as a
    // JSON array of objects with the `key`, `label`, `category`, `unit`,
    // `value` and `description` properties, in the order they were sent.
    pub fn jsUpdateCmcdValues(values: &str);
}

/// Levels with which a log can be emitted.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd)]
pub enum LogLevel {
    /// Log level reserved for very important errors and highly unexpected events.
    Error = 0,

    /// Log level reserved for less important errors and unexpected events.
    Warn = 1,

    /// Log level reserved for important events
    Info = 2,

    /// Log level used when debugging. Small-ish yet impactful events should be logged with it.
    Debug = 3,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                LogLevel::Error => "error",
                LogLevel::Warn => "warn",
                LogLevel::Info => "info",
                LogLevel::Debug => "debug",
            }
        )
    }
}
