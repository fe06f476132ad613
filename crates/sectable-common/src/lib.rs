//! Common infrastructure for the secondary routing-table manager.
//!
//! This crate provides the pieces of the controller that talk to the
//! outside world or describe its failures:
//!
//! - [`shell`]: Routing-command execution through the `ip` tool, with the
//!   command-length ceiling enforced at the execution boundary
//! - [`error`]: Error types shared by every operation
//!
//! # Example
//!
//! ```ignore
//! use sectable_common::shell::{CommandRunner, IpCommandRunner};
//!
//! let runner = IpCommandRunner::new("/system/bin/ip");
//! let cmd = format!("{} route show table 60", runner.ip_cmd());
//! let status = runner.run(&cmd).await?;
//! ```

pub mod error;
pub mod shell;

// Re-export commonly used items at crate root
pub use error::{TableMgrError, TableMgrResult};
pub use shell::{CommandRunner, IpCommandRunner, MAX_CMD_LEN};
