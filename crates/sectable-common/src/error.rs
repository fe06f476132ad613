//! Error types for secondary table operations.
//!
//! Every failure a route mutation can produce is one of the variants below.
//! None of them are retried internally; each is reported straight back to
//! the caller together with an errno-style cause code.

use std::io;
use thiserror::Error;

/// No such device.
pub const ENODEV: i32 = 19;

/// Argument list too long.
pub const E2BIG: i32 = 7;

/// Invalid argument.
pub const EINVAL: i32 = 22;

/// Result type alias for secondary table operations.
pub type TableMgrResult<T> = Result<T, TableMgrError>;

/// Errors that can occur while managing secondary routing tables.
#[derive(Debug, Error)]
pub enum TableMgrError {
    /// Every table slot is held by another interface.
    #[error("No free routing table slot for interface '{interface}'")]
    ResourceExhausted {
        /// The interface that asked for a slot.
        interface: String,
    },

    /// Remove targeted an interface that holds no slot.
    #[error("Interface '{interface}' has no secondary routing table")]
    NotFound {
        /// The interface named in the request.
        interface: String,
    },

    /// The interface name is empty or does not fit the kernel name buffer.
    #[error("Invalid interface name '{interface}'")]
    InvalidInterface {
        /// The name as supplied.
        interface: String,
    },

    /// The rendered command line reached the length ceiling.
    #[error("Command too long ({len} bytes): '{command}'")]
    CommandTooLong {
        /// The rejected command line.
        command: String,
        /// Its length in bytes.
        len: usize,
    },

    /// The routing tool ran and returned a non-zero exit status.
    #[error("Routing command failed: '{command}' (exit code {exit_code})")]
    ExecutionFailed {
        /// The command that failed.
        command: String,
        /// The exit code, or -1 when terminated by a signal.
        exit_code: i32,
    },

    /// The routing tool could not be started at all.
    #[error("Failed to execute routing command '{command}': {source}")]
    ShellExec {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// IO error outside of command execution.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl TableMgrError {
    /// Creates a resource exhausted error.
    pub fn resource_exhausted(interface: impl Into<String>) -> Self {
        Self::ResourceExhausted {
            interface: interface.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(interface: impl Into<String>) -> Self {
        Self::NotFound {
            interface: interface.into(),
        }
    }

    /// Creates an invalid interface error.
    pub fn invalid_interface(interface: impl Into<String>) -> Self {
        Self::InvalidInterface {
            interface: interface.into(),
        }
    }

    /// Creates a command too long error.
    pub fn command_too_long(command: impl Into<String>) -> Self {
        let command = command.into();
        Self::CommandTooLong {
            len: command.len(),
            command,
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the errno-style cause code reported to the caller.
    pub fn errno(&self) -> i32 {
        match self {
            TableMgrError::ResourceExhausted { .. }
            | TableMgrError::NotFound { .. }
            | TableMgrError::ExecutionFailed { .. }
            | TableMgrError::ShellExec { .. } => ENODEV,
            TableMgrError::CommandTooLong { .. } => E2BIG,
            TableMgrError::InvalidInterface { .. } | TableMgrError::InvalidConfig { .. } => EINVAL,
            TableMgrError::Io(e) => e.raw_os_error().unwrap_or(EINVAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TableMgrError::not_found("wlan0");
        assert_eq!(
            err.to_string(),
            "Interface 'wlan0' has no secondary routing table"
        );
    }

    #[test]
    fn test_command_too_long_records_length() {
        let err = TableMgrError::command_too_long("x".repeat(300));
        match err {
            TableMgrError::CommandTooLong { len, .. } => assert_eq!(len, 300),
            _ => panic!("Expected CommandTooLong error"),
        }
    }

    #[test]
    fn test_execution_failed() {
        let err = TableMgrError::ExecutionFailed {
            command: "ip route add 10.0.0.0/8 dev rmnet0 table 60".to_string(),
            exit_code: 2,
        };
        assert!(err.to_string().contains("ip route add"));
        assert!(err.to_string().contains("exit code 2"));
    }

    #[test]
    fn test_errno() {
        assert_eq!(TableMgrError::resource_exhausted("usb0").errno(), ENODEV);
        assert_eq!(TableMgrError::not_found("usb0").errno(), ENODEV);
        assert_eq!(TableMgrError::command_too_long("ip").errno(), E2BIG);
        assert_eq!(TableMgrError::invalid_interface("").errno(), EINVAL);
        assert_eq!(
            TableMgrError::invalid_config("capacity", "must be > 0").errno(),
            EINVAL
        );
    }
}
