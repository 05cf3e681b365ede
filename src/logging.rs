use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        fn emit(level: &str, line: &str) {
            match level {
                "WARN" => worker::console_warn!("{}", line),
                "ERROR" => worker::console_error!("{}", line),
                _ => worker::console_log!("{}", line),
            }
        }
    } else {
        fn emit(_level: &str, line: &str) {
            eprintln!("{}", line);
        }
    }
}

/// Logger struct for handling structured logging
#[derive(Debug, Clone)]
pub struct Logger {
    request_id: String,
}

impl Logger {
    /// Create a new Logger instance
    ///
    /// # Arguments
    ///
    /// * `request_id` - A unique identifier for the current request
    pub fn new(request_id: String) -> Self {
        Self { request_id }
    }

    /// Create a Logger tagged with a fresh UUID v4 request id
    pub fn for_request() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Log an info message
    pub fn info(&self, message: &str, data: Option<serde_json::Value>) {
        self.log("INFO", message, data);
    }

    /// Log a warning message
    pub fn warn(&self, message: &str, data: Option<serde_json::Value>) {
        self.log("WARN", message, data);
    }

    /// Log an error message
    pub fn error(&self, message: &str, data: Option<serde_json::Value>) {
        self.log("ERROR", message, data);
    }

    fn log(&self, level: &str, message: &str, data: Option<serde_json::Value>) {
        let log_data = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "request_id": self.request_id,
            "message": message,
            "data": data
        });
        emit(level, &log_data.to_string());
    }
}

/// Macro to create a JSON object for additional log data
///
/// Usage: log_data!("key" => value, "other" => 42)
#[macro_export]
macro_rules! log_data {
    ($($key:expr => $value:expr),* $(,)?) => {
        Some(serde_json::json!({ $($key: $value),* }))
    };
}
