//! Routing-command execution.
//!
//! Commands are handed over as one fully-formed line, split on whitespace
//! and executed directly (no `/bin/sh -c`), so interface names and
//! addresses coming from a caller are never interpreted by a shell.
//!
//! # Example
//!
//! ```ignore
//! use sectable_common::shell::{CommandRunner, IpCommandRunner};
//!
//! let runner = IpCommandRunner::new("/system/bin/ip");
//! let status = runner
//!     .run("/system/bin/ip route add 10.0.0.0/8 dev rmnet0 table 60")
//!     .await?;
//! if status != 0 {
//!     eprintln!("route add failed with {}", status);
//! }
//! ```

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{TableMgrError, TableMgrResult};

/// Default path to the `ip` tool on the target device.
pub const IP_CMD: &str = "/system/bin/ip";

/// Length ceiling for a command line, terminator included.
///
/// A line of `MAX_CMD_LEN` bytes or more is rejected.
pub const MAX_CMD_LEN: usize = 255;

/// Rejects a command line at or over `max_len` bytes.
pub fn check_command_len(cmd: &str, max_len: usize) -> TableMgrResult<()> {
    if cmd.len() >= max_len {
        return Err(TableMgrError::command_too_long(cmd));
    }
    Ok(())
}

/// Executes routing command lines and reports their exit status.
///
/// Implementations run one command to completion per call. The controller
/// only ever calls a runner from a single task at a time.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Path of the routing tool every command line starts with.
    fn ip_cmd(&self) -> &str;

    /// Length ceiling applied to every command line.
    fn max_command_len(&self) -> usize {
        MAX_CMD_LEN
    }

    /// Runs one command line, returning the tool's exit status.
    ///
    /// A line at or over the length ceiling yields
    /// [`TableMgrError::CommandTooLong`] and is never executed.
    async fn run(&self, cmd: &str) -> TableMgrResult<i32>;
}

/// [`CommandRunner`] that spawns the `ip` binary directly.
#[derive(Debug, Clone)]
pub struct IpCommandRunner {
    ip_cmd: String,
    max_len: usize,
}

impl IpCommandRunner {
    /// Creates a runner for the tool at `ip_cmd`.
    pub fn new(ip_cmd: impl Into<String>) -> Self {
        Self {
            ip_cmd: ip_cmd.into(),
            max_len: MAX_CMD_LEN,
        }
    }

    /// Overrides the command-length ceiling.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }
}

impl Default for IpCommandRunner {
    fn default() -> Self {
        Self::new(IP_CMD)
    }
}

#[async_trait]
impl CommandRunner for IpCommandRunner {
    fn ip_cmd(&self) -> &str {
        &self.ip_cmd
    }

    fn max_command_len(&self) -> usize {
        self.max_len
    }

    async fn run(&self, cmd: &str) -> TableMgrResult<i32> {
        check_command_len(cmd, self.max_len)?;
        exec_nosh(cmd).await
    }
}

/// Executes a command line without a shell.
///
/// The line is tokenised on whitespace; the first token is the program.
/// Output is discarded apart from stderr, which is logged on failure.
pub async fn exec_nosh(cmd: &str) -> TableMgrResult<i32> {
    tracing::debug!(command = %cmd, "Executing routing command");

    let mut tokens = cmd.split_whitespace();
    let program = tokens.next().ok_or_else(|| TableMgrError::ShellExec {
        command: cmd.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
    })?;

    let output = Command::new(program)
        .args(tokens)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| TableMgrError::ShellExec {
            command: cmd.to_string(),
            source: e,
        })?;

    let exit_code = output.status.code().unwrap_or(-1);
    if exit_code == 0 {
        tracing::trace!(command = %cmd, "Command succeeded");
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!(
            command = %cmd,
            exit_code = exit_code,
            stderr = %stderr.trim(),
            "Command failed"
        );
    }

    Ok(exit_code)
}
