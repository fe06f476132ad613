//! Type definitions for sectablemgrd

use std::fmt;

/// First routing table id handed out; slot `i` maps to `BASE_TABLE_NUMBER + i`.
pub const BASE_TABLE_NUMBER: u32 = 60;

/// Number of interfaces that can hold a secondary table at once.
pub const INTERFACES_TRACKED: usize = 10;

/// Kernel interface-name buffer size, terminator included.
pub const IFNAMSIZ: usize = 16;

/// Gateway value meaning "no gateway": the route is installed on-link.
pub const UNSPECIFIED_GATEWAY: &str = "::";

/// Upper bound on interface entries inspected per multipath pass.
pub const MAX_MULTIPATH_INTERFACES: usize = 20;

/// File whose presence signals multipath TCP path-manager support.
pub const MPTCP_PROBE_PATH: &str = "/proc/net/mptcp_pm";

/// Reserved kernel tables that must never be handed out.
pub const RESERVED_TABLE_IDS: [u32; 4] = [0, 253, 254, 255];

/// True if `name` can name a kernel interface.
///
/// The name must be non-empty and leave room for the terminator in an
/// `IFNAMSIZ` buffer.
pub fn is_valid_ifname(name: &str) -> bool {
    !name.is_empty() && name.len() < IFNAMSIZ
}

/// Route or rule mutation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Install
    Add,
    /// Remove
    Del,
}

impl Action {
    /// Verb used on the `ip` command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Del => "del",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A route to add to or remove from an interface's secondary table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMutationRequest {
    /// Interface the route leaves through
    pub interface: String,
    /// Destination network address
    pub destination: String,
    /// Destination prefix length
    pub prefix_len: u8,
    /// Next hop; `None` installs an on-link route
    pub gateway: Option<String>,
}

impl RouteMutationRequest {
    /// Create a new request.
    ///
    /// A gateway of `::` (or an empty string) is treated as unspecified.
    pub fn new(
        interface: impl Into<String>,
        destination: impl Into<String>,
        prefix_len: u8,
        gateway: impl Into<String>,
    ) -> Self {
        let gateway = gateway.into();
        let gateway = if gateway.is_empty() || gateway == UNSPECIFIED_GATEWAY {
            None
        } else {
            Some(gateway)
        };

        Self {
            interface: interface.into(),
            destination: destination.into(),
            prefix_len,
            gateway,
        }
    }

    /// Create an on-link request with no gateway
    pub fn on_link(
        interface: impl Into<String>,
        destination: impl Into<String>,
        prefix_len: u8,
    ) -> Self {
        Self::new(interface, destination, prefix_len, UNSPECIFIED_GATEWAY)
    }

    /// True when the route has no next hop
    pub fn is_on_link(&self) -> bool {
        self.gateway.is_none()
    }
}

impl fmt::Display for RouteMutationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.destination, self.prefix_len)?;
        if let Some(gw) = &self.gateway {
            write!(f, " via {}", gw)?;
        }
        write!(f, " dev {}", self.interface)
    }
}
