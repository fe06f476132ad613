//! Caller response protocol.
//!
//! Every request produces exactly one [`Response`]: a numeric code, a short
//! message and, for failures, an errno-style cause code.

use std::fmt;

use sectable_common::{TableMgrError, TableMgrResult};

/// Message sent when a route mutation succeeds
pub const MSG_ROUTE_MODIFIED: &str = "Route modified";

/// Message sent when every table slot is taken
pub const MSG_MAX_NATED: &str = "Max number NATed";

/// Message sent when removing from an interface without a table
pub const MSG_INTERFACE_NOT_FOUND: &str = "Interface not found";

/// Message sent when the routing tool fails
pub const MSG_MODIFICATION_FAILED: &str = "ip route modification failed";

/// Message sent when a command line reaches the length ceiling
pub const MSG_TOO_LONG: &str = "Too long";

/// Message sent when the interface name cannot name a kernel interface
pub const MSG_INVALID_INTERFACE: &str = "Invalid interface name";

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    /// Request completed
    CommandOkay,
    /// Request understood but could not be carried out
    OperationFailed,
    /// Request could not be executed as rendered
    CommandSyntaxError,
    /// Request had malformed parameters
    CommandParameterError,
}

impl ResponseCode {
    /// Numeric code sent on the wire
    pub fn code(&self) -> u16 {
        match self {
            ResponseCode::CommandOkay => 200,
            ResponseCode::OperationFailed => 400,
            ResponseCode::CommandSyntaxError => 500,
            ResponseCode::CommandParameterError => 501,
        }
    }

    /// True for the success code
    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseCode::CommandOkay)
    }
}

/// One outcome reported to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub code: ResponseCode,
    /// Human readable message
    pub message: String,
    /// Cause code, present on failures
    pub errno: Option<i32>,
}

impl Response {
    /// Successful route mutation
    pub fn route_modified() -> Self {
        Self {
            code: ResponseCode::CommandOkay,
            message: MSG_ROUTE_MODIFIED.to_string(),
            errno: None,
        }
    }

    /// Failure response
    pub fn failure(code: ResponseCode, message: impl Into<String>, errno: Option<i32>) -> Self {
        Self {
            code,
            message: message.into(),
            errno,
        }
    }

    /// Map an operation error to the response sent for it
    pub fn from_error(err: &TableMgrError) -> Self {
        let (code, message) = match err {
            TableMgrError::ResourceExhausted { .. } => {
                (ResponseCode::OperationFailed, MSG_MAX_NATED)
            }
            TableMgrError::NotFound { .. } => {
                (ResponseCode::OperationFailed, MSG_INTERFACE_NOT_FOUND)
            }
            TableMgrError::InvalidInterface { .. } => {
                (ResponseCode::CommandParameterError, MSG_INVALID_INTERFACE)
            }
            TableMgrError::CommandTooLong { .. } => {
                (ResponseCode::CommandSyntaxError, MSG_TOO_LONG)
            }
            TableMgrError::ExecutionFailed { .. }
            | TableMgrError::ShellExec { .. }
            | TableMgrError::InvalidConfig { .. }
            | TableMgrError::Io(_) => (ResponseCode::OperationFailed, MSG_MODIFICATION_FAILED),
        };
        Self::failure(code, message, Some(err.errno()))
    }

    /// Map an operation result to the response sent for it
    pub fn from_result<T>(result: &TableMgrResult<T>) -> Self {
        match result {
            Ok(_) => Self::route_modified(),
            Err(e) => Self::from_error(e),
        }
    }

    /// True for a success response
    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code.code(), self.message)?;
        if let Some(errno) = self.errno {
            write!(f, " (errno {})", errno)?;
        }
        Ok(())
    }
}
