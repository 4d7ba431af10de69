//! Error taxonomy for the SAF bridge.
//!
//! Every fallible operation returns [`BridgeError`]. The dispatch layer turns
//! it into an [`ErrorReply`] (a wire code plus message) so nothing escapes the
//! channel as a panic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid tree reference: {0}")]
    InvalidTree(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    CreateFailed(String),

    #[error("{0}")]
    OpenFailed(String),

    #[error("{0}")]
    WriteFailed(String),

    #[error("{0}")]
    ReadFailed(String),

    #[error("{0}")]
    DeleteFailed(String),

    #[error("{0}")]
    ListFailed(String),

    #[error("folder picker already active")]
    Busy,

    #[error("{0}")]
    PersistFailed(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failure as seen by the application shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub code: String,
    pub message: String,
}

impl ErrorReply {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Map an error raised while serving an operation whose generic failure
    /// code is `op_code`.
    ///
    /// Argument problems, a busy picker and a missing document keep their own
    /// codes; everything else is reported under the operation's code, or
    /// `internal` when the operation has none.
    pub fn from_error(op_code: Option<&str>, err: &BridgeError) -> Self {
        let code = match err {
            BridgeError::InvalidArgument(_) => "bad_args",
            BridgeError::Busy => "busy",
            BridgeError::NotFound(_) => "not_found",
            _ => op_code.unwrap_or("internal"),
        };
        Self::new(code, err.to_string())
    }
}
