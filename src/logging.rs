use chrono::Utc;
use serde_json::json;

/// Logger struct for handling structured logging
#[derive(Clone, Debug)]
pub struct Logger {
    operation_id: String,
    component: &'static str,
}

impl Logger {
    /// Create a new Logger instance
    ///
    /// # Arguments
    ///
    /// * `component` - Name of the view or flow emitting the logs
    pub fn new(component: &'static str) -> Self {
        Self {
            operation_id: crate::utils::generate_operation_id(),
            component,
        }
    }

    /// Identifier attached to every line emitted by this logger
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Log an info message
    ///
    /// # Arguments
    ///
    /// * `message` - The log message
    /// * `data` - Optional additional data to include in the log
    pub fn info(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(Level::Info, message, data);
    }

    /// Log a warning message
    pub fn warn(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(Level::Warn, message, data);
    }

    /// Log an error message
    pub fn error(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(Level::Error, message, data);
    }

    fn log(&self, level: Level, message: &str, data: Option<serde_json::Value>) {
        let line = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level.as_str(),
            "operation_id": self.operation_id,
            "component": self.component,
            "message": message,
            "data": data
        })
        .to_string();

        emit(level, &line);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        fn emit(level: Level, line: &str) {
            let value = wasm_bindgen::JsValue::from_str(line);
            match level {
                Level::Info => web_sys::console::log_1(&value),
                Level::Warn => web_sys::console::warn_1(&value),
                Level::Error => web_sys::console::error_1(&value),
            }
        }
    } else {
        fn emit(_level: Level, line: &str) {
            eprintln!("{}", line);
        }
    }
}

/// Macro to create a JSON object for additional log data
///
/// Usage: log_data!("key1" => "value1", "key2" => 42)
#[macro_export]
macro_rules! log_data {
    ($($key:expr => $value:expr),* $(,)?) => {
        Some(serde_json::json!({ $($key: $value),* }))
    };
}
