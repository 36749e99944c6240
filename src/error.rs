use reqwest::StatusCode;
use thiserror::Error;

const GENERIC_ALERT: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Backend { status: StatusCode, body: String },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not signed in")]
    Unauthenticated,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("batch update failed for {failed:?} (uncompensated: {uncompensated:?})")]
    BatchIncomplete {
        failed: Vec<String>,
        uncompensated: Vec<String>,
    },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl AppError {
    /// Short message suitable for a dismissible alert. Network failures all
    /// share one generic text regardless of status code.
    pub fn alert(&self) -> String {
        match self {
            AppError::Http(_) | AppError::Backend { .. } | AppError::Decode(_) => {
                GENERIC_ALERT.to_string()
            }
            AppError::Validation(msg) => msg.clone(),
            AppError::PermissionDenied(what) => format!("Permission to access {what} was denied"),
            AppError::Unauthenticated => "Please sign in to continue.".to_string(),
            AppError::NotFound(what) => format!("Could not find {what}"),
            AppError::BatchIncomplete { failed, .. } => format!(
                "Failed to update {} order(s) in this batch. No changes were kept.",
                failed.len()
            ),
            AppError::Storage(_) => "Could not save your session on this device.".to_string(),
            AppError::Config(msg) => format!("Configuration problem: {msg}"),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Http(_) | AppError::Backend { .. })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_share_generic_alert() {
        let not_found = AppError::Backend {
            status: StatusCode::NOT_FOUND,
            body: "missing".to_string(),
        };
        let server = AppError::Backend {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };

        assert_eq!(not_found.alert(), server.alert());
        assert!(not_found.is_network());
    }

    #[test]
    fn validation_alert_is_the_message() {
        let err = AppError::Validation("Please enter both email and password".to_string());
        assert_eq!(err.alert(), "Please enter both email and password");
        assert!(!err.is_network());
    }

    #[test]
    fn batch_alert_counts_failed_orders() {
        let err = AppError::BatchIncomplete {
            failed: vec!["a".to_string(), "b".to_string()],
            uncompensated: vec![],
        };
        assert!(err.alert().contains("2 order(s)"));
    }
}
