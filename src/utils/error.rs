use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Server {address} is not reachable: {message}")]
    Unreachable { address: String, message: String },

    #[error("Endpoint identifies as '{identifier}', not the expected server")]
    WrongIdentity { identifier: String },

    #[error("Server version {reported} is older than the required {minimum}")]
    VersionTooOld { reported: String, minimum: String },

    #[error("Request was superseded")]
    Cancelled,

    #[error("Unknown {kind} reference: {id}")]
    StaleReference { kind: String, id: String },

    #[error("{operation} failed: {message}")]
    RequestFailed { operation: String, message: String },

    #[error("Group belongs to package {actual}, but the selected package is {expected:?}")]
    OwnerMismatch {
        expected: Option<String>,
        actual: String,
    },

    #[error("Form cannot be submitted: {reason}")]
    SubmitBlocked { reason: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Compatibility,
    Selection,
    Configuration,
    Internal,
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::Unreachable { .. }
            | SyncError::RequestFailed { .. }
            | SyncError::ApiError(_) => ErrorCategory::Network,
            SyncError::WrongIdentity { .. } | SyncError::VersionTooOld { .. } => {
                ErrorCategory::Compatibility
            }
            SyncError::StaleReference { .. }
            | SyncError::OwnerMismatch { .. }
            | SyncError::SubmitBlocked { .. } => ErrorCategory::Selection,
            SyncError::ConfigValidationError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SyncError::Cancelled | SyncError::IoError(_) | SyncError::SerializationError(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// 被取代的探測不應顯示給使用者
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SyncError::Unreachable { address, .. } => {
                format!("The server at {} is not responding", address)
            }
            SyncError::WrongIdentity { .. } => "This address is not a vocascan server".to_string(),
            SyncError::VersionTooOld { reported, minimum } => format!(
                "Server version {} is too old, at least {} is required",
                reported, minimum
            ),
            SyncError::RequestFailed { operation, .. } => {
                format!("Could not {}", operation)
            }
            SyncError::SubmitBlocked { reason } => format!("Cannot submit yet: {}", reason),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the server address and your network connection",
            ErrorCategory::Compatibility => {
                "Point the client at a vocascan server that meets the minimum version"
            }
            ErrorCategory::Selection => "Reload the package list and pick a package and group again",
            ErrorCategory::Configuration => "Fix the configuration file or command line flags",
            ErrorCategory::Internal => "Retry the operation",
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
