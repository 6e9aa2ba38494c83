use crate::core::firewall::BridgeResponse;
use crate::elevation::ElevationError;
use thiserror::Error;

/// Fallback message when the primitive fails without a usable diagnostic
pub const UNKNOWN_PRIMITIVE_ERROR: &str = "Unknown script error";

/// Message returned when a clean primitive exit produced unusable output
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse server response.";

/// Core error types for fwbridge
#[derive(Debug, Error)]
pub enum Error {
    /// Caller input rejected before any primitive was invoked
    #[error("{message}")]
    Validation { field: String, message: String },

    /// The primitive could not be started
    #[error("Failed to start firewall primitive: {0}")]
    Execution(String),

    /// The primitive ran but signaled failure via exit code or stderr
    #[error("{message}")]
    Primitive {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    /// The primitive exited cleanly but its output did not match the expected shape
    #[error("Failed to parse server response.")]
    ContractViolation(String),

    /// The invocation was cancelled by an externally imposed timeout
    #[error("Firewall primitive timed out after {0:?}.")]
    Timeout(std::time::Duration),

    /// Privilege escalation unavailable
    #[error("Elevation error: {0}")]
    Elevation(#[from] ElevationError),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for errors detected locally, before the OS layer was touched
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Folds any error into the uniform response contract.
    ///
    /// The message is never empty: an empty primitive diagnostic is replaced
    /// with [`UNKNOWN_PRIMITIVE_ERROR`].
    pub fn into_response(self) -> BridgeResponse {
        let message = self.to_string();
        if message.trim().is_empty() {
            BridgeResponse::failure(UNKNOWN_PRIMITIVE_ERROR)
        } else {
            BridgeResponse::failure(message)
        }
    }
}

/// Represents a translated error with helpful context
#[derive(Debug, Clone)]
pub struct ErrorTranslation {
    pub user_message: String,
    pub suggestions: Vec<String>,
}

impl ErrorTranslation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            user_message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

/// Known primitive diagnostics and their translations
pub struct PrimitiveErrorPattern;

impl PrimitiveErrorPattern {
    /// Matches a primitive error message against known patterns.
    pub fn match_error(msg: &str) -> ErrorTranslation {
        let lower = msg.to_lowercase();

        // Windows: "The requested operation requires elevation (Run as administrator)."
        if lower.contains("requires elevation")
            || lower.contains("run as administrator")
            || lower.contains("permission denied")
            || lower.contains("operation not permitted")
            || lower.contains("access is denied")
        {
            return ErrorTranslation::new("Insufficient privileges to change firewall policy")
                .with_suggestion("Run the bridge from an elevated (administrator/root) session")
                .with_suggestion("Or set \"elevate\": true in config.json to use run0/sudo/pkexec");
        }

        if lower.contains("no such file")
            || lower.contains("not found")
            || lower.contains("not recognized")
            || lower.contains("cannot find")
        {
            return ErrorTranslation::new("Firewall primitive or one of its tools was not found")
                .with_suggestion("Check primitive_program and primitive_args in config.json")
                .with_suggestion("Or point FWBRIDGE_PRIMITIVE at the primitive executable");
        }

        if lower.contains("service")
            && (lower.contains("not running") || lower.contains("not started"))
        {
            return ErrorTranslation::new("The OS firewall service is not running")
                .with_suggestion("Start the firewall service and retry");
        }

        if lower.contains("invalid") || lower.contains("syntax") {
            return ErrorTranslation::new("The firewall tool rejected the request arguments")
                .with_suggestion("Ports must be 1-65535, as a list (80,443) or range (8000-8100)")
                .with_suggestion("Protocol must be TCP or UDP; action must be Allow or Block");
        }

        if lower.contains("timed out") {
            return ErrorTranslation::new("Firewall operation timed out")
                .with_suggestion("A mutation may already be partially applied; check status")
                .with_suggestion("Raise timeout_secs if the firewall tool is slow");
        }

        ErrorTranslation::new(format!("Firewall error: {msg}"))
            .with_suggestion("Check the detailed error message for more information")
    }
}

pub type Result<T> = std::result::Result<T, Error>;
