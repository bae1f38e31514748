//! Error types for the VPAID ad unit

use crate::types::AdState;
use thiserror::Error;

/// Result type alias for ad unit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ad unit error types
#[derive(Error, Debug)]
pub enum Error {
    // Attribute errors
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    // Initialization errors
    #[error("Malformed creative parameters: {0}")]
    MalformedCreativeParameters(#[from] serde_json::Error),

    #[error("No slot or video slot supplied by the host")]
    MissingSlot,

    // Lifecycle errors
    #[error("Cannot {operation} while ad is {from}")]
    InvalidStateTransition {
        from: AdState,
        operation: &'static str,
    },

    // Host collaborator errors
    #[error("Media element error: {0}")]
    Media(String),
}

impl Error {
    /// Create a media element error
    pub fn media(msg: impl Into<String>) -> Self {
        Error::Media(msg.into())
    }

    /// Returns the stable error code reported to the host
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::UnknownAttribute(_) => "UNKNOWN_ATTRIBUTE",
            Error::MalformedCreativeParameters(_) => "MALFORMED_CREATIVE_PARAMETERS",
            Error::MissingSlot => "MISSING_SLOT",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::Media(_) => "MEDIA",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::UnknownAttribute("duration".into()).error_code(), "UNKNOWN_ATTRIBUTE");
        assert_eq!(Error::MissingSlot.error_code(), "MISSING_SLOT");
        assert_eq!(Error::media("play rejected").error_code(), "MEDIA");
    }

    #[test]
    fn test_state_error_message() {
        let err = Error::InvalidStateTransition {
            from: AdState::Stopped,
            operation: "resumeAd",
        };
        assert_eq!(err.to_string(), "Cannot resumeAd while ad is stopped");
    }
}
