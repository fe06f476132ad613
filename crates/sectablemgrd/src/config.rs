//! Configuration file support for sectablemgrd
//!
//! Loads and validates the daemon configuration from a TOML file.
//! Default location: /etc/sectablemgrd.conf

use std::fs;
use std::path::{Path, PathBuf};

use sectable_common::{shell, TableMgrError, TableMgrResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{
    BASE_TABLE_NUMBER, INTERFACES_TRACKED, MAX_MULTIPATH_INTERFACES, MPTCP_PROBE_PATH,
    RESERVED_TABLE_IDS,
};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sectablemgrd.conf";

/// Table pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablesConfig {
    /// Routing table id of slot 0
    #[serde(default = "default_base_table_number")]
    pub base_table_number: u32,

    /// Number of slots in the pool
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

/// Routing tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Path to the `ip` binary
    #[serde(default = "default_ip_path")]
    pub ip_path: String,

    /// Command lines at or over this length are rejected
    #[serde(default = "default_max_command_len")]
    pub max_command_len: usize,
}

/// Multipath rule configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipathConfig {
    /// File whose presence enables multipath rules
    #[serde(default = "default_probe_path")]
    pub probe_path: PathBuf,

    /// Interface entries inspected per pass
    #[serde(default = "default_max_interfaces")]
    pub max_interfaces: usize,
}

/// Complete sectablemgrd configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMgrConfig {
    /// Table pool configuration
    #[serde(default)]
    pub tables: TablesConfig,

    /// Routing tool configuration
    #[serde(default)]
    pub commands: CommandsConfig,

    /// Multipath rule configuration
    #[serde(default)]
    pub multipath: MultipathConfig,
}

// Default functions
fn default_base_table_number() -> u32 {
    BASE_TABLE_NUMBER
}

fn default_capacity() -> usize {
    INTERFACES_TRACKED
}

fn default_ip_path() -> String {
    shell::IP_CMD.to_string()
}

fn default_max_command_len() -> usize {
    shell::MAX_CMD_LEN
}

fn default_probe_path() -> PathBuf {
    PathBuf::from(MPTCP_PROBE_PATH)
}

fn default_max_interfaces() -> usize {
    MAX_MULTIPATH_INTERFACES
}

// Default implementations
impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            base_table_number: default_base_table_number(),
            capacity: default_capacity(),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            ip_path: default_ip_path(),
            max_command_len: default_max_command_len(),
        }
    }
}

impl Default for MultipathConfig {
    fn default() -> Self {
        Self {
            probe_path: default_probe_path(),
            max_interfaces: default_max_interfaces(),
        }
    }
}

impl TableMgrConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> TableMgrResult<Self> {
        toml::from_str(content)
            .map_err(|e| TableMgrError::invalid_config("file", format!("parse error: {}", e)))
    }

    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> TableMgrResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(TableMgrError::Io(e)),
        }
    }

    /// Last table id in the pool
    pub fn last_table_id(&self) -> Option<u32> {
        let capacity = u32::try_from(self.tables.capacity).ok()?;
        self.tables
            .base_table_number
            .checked_add(capacity)?
            .checked_sub(1)
    }

    /// Validate configuration
    pub fn validate(&self) -> TableMgrResult<()> {
        if self.tables.capacity == 0 {
            return Err(TableMgrError::invalid_config(
                "tables.capacity",
                "must be > 0",
            ));
        }

        let first = self.tables.base_table_number;
        let last = self.last_table_id().ok_or_else(|| {
            TableMgrError::invalid_config("tables.capacity", "table id range overflows u32")
        })?;

        if let Some(reserved) = RESERVED_TABLE_IDS
            .iter()
            .find(|&&id| (first..=last).contains(&id))
        {
            return Err(TableMgrError::invalid_config(
                "tables.base_table_number",
                format!(
                    "table range {}-{} overlaps reserved table {}",
                    first, last, reserved
                ),
            ));
        }

        if self.commands.ip_path.trim().is_empty()
            || self.commands.ip_path.contains(char::is_whitespace)
        {
            return Err(TableMgrError::invalid_config(
                "commands.ip_path",
                "must be a non-empty path without whitespace",
            ));
        }

        if self.commands.max_command_len == 0 {
            return Err(TableMgrError::invalid_config(
                "commands.max_command_len",
                "must be > 0",
            ));
        }

        if self.multipath.max_interfaces == 0 {
            return Err(TableMgrError::invalid_config(
                "multipath.max_interfaces",
                "must be > 0",
            ));
        }

        Ok(())
    }
}
