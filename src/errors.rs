use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Backend(String),
    #[error("File \"{name}\" already exists. Please choose a different file name.")]
    AlreadyExists { name: String },
    #[error("Failed to retrieve chunk {index}")]
    MissingChunk { index: u64 },
    #[error("Please select a file to upload.")]
    NoFileSelected,
    #[error("File \"{name}\" is empty")]
    EmptyFile { name: String },
    #[error("{0}")]
    Rejected(String),
    #[error("{message}")]
    Validation { message: String },
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Browser error: {0}")]
    Browser(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn backend(message: impl Into<String>) -> Self {
        AppError::Backend(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
        }
    }

    /// True when the operation was stopped before anything reached the backend.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            AppError::AlreadyExists { .. }
                | AppError::NoFileSelected
                | AppError::EmptyFile { .. }
                | AppError::Validation { .. }
                | AppError::Unauthorized(_)
        )
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        impl From<wasm_bindgen::JsValue> for AppError {
            fn from(value: wasm_bindgen::JsValue) -> Self {
                AppError::Browser(
                    value
                        .as_string()
                        .unwrap_or_else(|| format!("{:?}", value)),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_the_file() {
        let err = AppError::AlreadyExists {
            name: "diploma.pdf".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "File \"diploma.pdf\" already exists. Please choose a different file name."
        );
        assert!(err.is_precondition());
    }

    #[test]
    fn backend_errors_display_verbatim() {
        let err = AppError::backend("replica returned 503");
        assert_eq!(err.to_string(), "replica returned 503");
        assert!(!err.is_precondition());
    }
}
