//! Response definitions
//!
//! [`ApiResponse`] is the parsed form of one datagram. [`CommandResult`] is
//! what a caller receives once its request resolves.

use super::return_code::{is_reportable_server_error, ReturnCode};
use super::tag::CorrelationTag;

/// One parsed datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// Tag echoed by the server, if the first token had the tag shape
    pub tag: Option<CorrelationTag>,

    /// Reply classification
    pub return_code: ReturnCode,

    /// Numeric code as it appeared on the wire
    pub raw_code: u16,

    /// Remaining space-delimited tokens, in order
    pub fields: Vec<String>,

    /// Decoded datagram text
    pub raw: String,
}

impl ApiResponse {
    /// First data field, if any
    pub fn first_field(&self) -> Option<&str> {
        self.fields.first().map(String::as_str)
    }

    /// Whether this reply belongs to the reportable server-error band
    pub fn is_server_error(&self) -> bool {
        is_reportable_server_error(self.raw_code)
    }
}

/// Result variant a request expects its reply to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Generic,
    Auth,
    Encrypt,
    Logout,
}

/// Typed outcome of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Any reply without a more specific shape
    Generic {
        code: ReturnCode,
        data: Option<String>,
    },

    /// Reply to AUTH; `session_key` is set on login-accepted codes
    Auth {
        code: ReturnCode,
        session_key: Option<String>,
    },

    /// Reply to ENCRYPT; `salt` is set when encryption was enabled
    Encrypt {
        code: ReturnCode,
        salt: Option<String>,
    },

    /// Reply to LOGOUT
    Logout { code: ReturnCode },
}

impl CommandResult {
    /// Build the result for `kind`
    ///
    /// Busy, out-of-service and server-error-band codes always build a
    /// generic result.
    pub fn build(kind: ResultKind, code: ReturnCode, first_field: Option<&str>) -> Self {
        let data = first_field.map(str::to_string);
        if code.forces_generic() {
            return CommandResult::Generic { code, data };
        }

        match kind {
            ResultKind::Generic => CommandResult::Generic { code, data },
            ResultKind::Auth => CommandResult::Auth {
                code,
                session_key: data.filter(|_| {
                    matches!(
                        code,
                        ReturnCode::LoginAccepted | ReturnCode::LoginAcceptedNewVersion
                    )
                }),
            },
            ResultKind::Encrypt => CommandResult::Encrypt {
                code,
                salt: data.filter(|_| code == ReturnCode::EncryptionEnabled),
            },
            ResultKind::Logout => CommandResult::Logout { code },
        }
    }

    /// Generic result carrying only `code`
    pub fn generic(code: ReturnCode) -> Self {
        CommandResult::Generic { code, data: None }
    }

    pub fn return_code(&self) -> ReturnCode {
        match self {
            CommandResult::Generic { code, .. }
            | CommandResult::Auth { code, .. }
            | CommandResult::Encrypt { code, .. }
            | CommandResult::Logout { code } => *code,
        }
    }

    /// Variant actually built
    pub fn kind(&self) -> ResultKind {
        match self {
            CommandResult::Generic { .. } => ResultKind::Generic,
            CommandResult::Auth { .. } => ResultKind::Auth,
            CommandResult::Encrypt { .. } => ResultKind::Encrypt,
            CommandResult::Logout { .. } => ResultKind::Logout,
        }
    }
}
