//! Multipath source-rule synchronization.
//!
//! With multipath TCP every subflow is bound to a local address, so each
//! address of an interface with a secondary table needs a
//! `rule from <addr> table <id>` entry. The rules mirror route mutations:
//! they are issued before the route command on both add and remove.
//!
//! Rule commands are fire-and-forget. Their exit status is logged and
//! otherwise ignored, and a failed rule never blocks or rolls back the
//! route mutation that follows it.

use std::fs::File;
use std::io;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use sectable_common::{shell, CommandRunner};
use tracing::{debug, warn};

use crate::commands::build_rule_cmd;
use crate::types::{Action, MAX_MULTIPATH_INTERFACES, MPTCP_PROBE_PATH};

/// One configured IPv4 address of a network interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddr {
    /// Interface name
    pub name: String,
    /// Assigned address
    pub addr: Ipv4Addr,
}

impl InterfaceAddr {
    /// Create a new InterfaceAddr
    pub fn new(name: impl Into<String>, addr: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            addr,
        }
    }
}

/// Reports whether the platform supports multipath transport
pub trait MultipathProbe: Send + Sync {
    /// Consulted once per add/remove
    fn is_supported(&self) -> bool;
}

/// Lists configured interfaces and their addresses
pub trait InterfaceEnumerator: Send + Sync {
    /// Entries in enumeration order, one per interface address
    fn interfaces(&self) -> io::Result<Vec<InterfaceAddr>>;
}

/// Probe that checks whether a procfs entry can be opened
#[derive(Debug, Clone)]
pub struct ProcFsProbe {
    path: PathBuf,
}

impl ProcFsProbe {
    /// Probe `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcFsProbe {
    fn default() -> Self {
        Self::new(MPTCP_PROBE_PATH)
    }
}

impl MultipathProbe for ProcFsProbe {
    fn is_supported(&self) -> bool {
        File::open(&self.path).is_ok()
    }
}

/// Enumerates IPv4 interface addresses with `getifaddrs`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

#[cfg(any(target_os = "linux", target_os = "android"))]
impl InterfaceEnumerator for SystemInterfaces {
    fn interfaces(&self) -> io::Result<Vec<InterfaceAddr>> {
        let addrs = nix::ifaddrs::getifaddrs().map_err(io::Error::other)?;

        Ok(addrs
            .filter_map(|ifaddr| {
                let sin = *ifaddr.address?.as_sockaddr_in()?;
                Some(InterfaceAddr::new(ifaddr.interface_name, sin.ip()))
            })
            .collect())
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
impl InterfaceEnumerator for SystemInterfaces {
    fn interfaces(&self) -> io::Result<Vec<InterfaceAddr>> {
        Ok(Vec::new())
    }
}

/// Issues source rules for the addresses of a route's interface
pub struct MultipathRuleSync {
    probe: Box<dyn MultipathProbe>,
    enumerator: Box<dyn InterfaceEnumerator>,
    max_interfaces: usize,
}

impl MultipathRuleSync {
    /// Create a synchronizer over the given collaborators
    pub fn new(probe: Box<dyn MultipathProbe>, enumerator: Box<dyn InterfaceEnumerator>) -> Self {
        Self {
            probe,
            enumerator,
            max_interfaces: MAX_MULTIPATH_INTERFACES,
        }
    }

    /// Synchronizer backed by procfs and `getifaddrs`
    pub fn system(probe_path: impl Into<PathBuf>) -> Self {
        Self::new(
            Box::new(ProcFsProbe::new(probe_path)),
            Box::new(SystemInterfaces),
        )
    }

    /// Limit how many enumerated entries are inspected per pass
    pub fn with_max_interfaces(mut self, max_interfaces: usize) -> Self {
        self.max_interfaces = max_interfaces;
        self
    }

    /// True if the platform advertises multipath support
    pub fn is_active(&self) -> bool {
        self.probe.is_supported()
    }

    /// Issue one rule command per address of `interface`.
    ///
    /// Enumeration beyond `max_interfaces` entries is silently dropped.
    /// Returns the number of rule commands issued.
    pub async fn sync(
        &self,
        runner: &dyn CommandRunner,
        action: Action,
        interface: &str,
        table_id: u32,
    ) -> usize {
        if !self.is_active() {
            return 0;
        }

        let entries = match self.enumerator.interfaces() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Interface enumeration failed, skipping multipath rules: {}",
                    e
                );
                return 0;
            }
        };

        let mut issued = 0;
        for entry in entries
            .iter()
            .take(self.max_interfaces)
            .filter(|e| e.name == interface)
        {
            let cmd = build_rule_cmd(runner.ip_cmd(), action, entry.addr, table_id);
            if let Err(e) = shell::check_command_len(&cmd, runner.max_command_len()) {
                warn!("Skipping multipath rule: {}", e);
                continue;
            }

            issued += 1;
            match runner.run(&cmd).await {
                Ok(0) => debug!("Multipath rule applied: {}", cmd),
                Ok(status) => debug!("Multipath rule exited with {}: {}", status, cmd),
                Err(e) => debug!("Multipath rule not applied: {}", e),
            }
        }

        issued
    }
}
