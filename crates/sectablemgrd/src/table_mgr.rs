//! Secondary Table Manager - route attach/detach and slot lifecycle

use sectable_common::{CommandRunner, IpCommandRunner, TableMgrError, TableMgrResult};
use tracing::{error, info, instrument};

use crate::commands::build_checked_route_cmd;
use crate::config::TableMgrConfig;
use crate::multipath::MultipathRuleSync;
use crate::slots::{SlotRegistry, TableSlot};
use crate::types::{is_valid_ifname, Action, RouteMutationRequest};

/// Secondary Table Manager
///
/// Owns the slot pool and sequences slot resolution, multipath rules and
/// the route command for each request. Slot and route-count state change
/// only after the route command succeeds.
///
/// Requests take `&mut self`, so one manager handles one request at a time.
pub struct SecondaryTableMgr {
    /// Interface -> table slot pool
    registry: SlotRegistry,

    /// Routing tool
    runner: Box<dyn CommandRunner>,

    /// Companion source rules for multipath transport
    multipath: MultipathRuleSync,
}

impl SecondaryTableMgr {
    /// Create a manager over explicit collaborators
    pub fn new(
        registry: SlotRegistry,
        runner: Box<dyn CommandRunner>,
        multipath: MultipathRuleSync,
    ) -> Self {
        info!(
            "SecondaryTableMgr initialized with {} table slots",
            registry.capacity()
        );

        Self {
            registry,
            runner,
            multipath,
        }
    }

    /// Create a manager using the system `ip` tool, procfs and `getifaddrs`
    pub fn from_config(config: &TableMgrConfig) -> TableMgrResult<Self> {
        let registry = SlotRegistry::new(config.tables.capacity, config.tables.base_table_number)?;
        let runner = IpCommandRunner::new(config.commands.ip_path.as_str())
            .with_max_len(config.commands.max_command_len);
        let multipath = MultipathRuleSync::system(config.multipath.probe_path.clone())
            .with_max_interfaces(config.multipath.max_interfaces);

        Ok(Self::new(registry, Box::new(runner), multipath))
    }

    /// Add a route to the interface's secondary table.
    ///
    /// Reuses the interface's slot or picks a free one; the slot is only
    /// taken once the route is installed. Returns the table id used.
    /// Names that cannot name a kernel interface are rejected before any
    /// command is issued.
    #[instrument(skip(self, req), fields(route = %req))]
    pub async fn add_route(&mut self, req: &RouteMutationRequest) -> TableMgrResult<u32> {
        if !is_valid_ifname(&req.interface) {
            error!("Invalid interface name");
            return Err(TableMgrError::invalid_interface(req.interface.as_str()));
        }

        let index = match self.registry.find_slot(&req.interface) {
            Some(slot) => slot.index,
            None => self.registry.find_free_slot().ok_or_else(|| {
                error!("Max number of NATed interfaces reached");
                TableMgrError::resource_exhausted(req.interface.as_str())
            })?,
        };
        let table_id = self.registry.table_id(index);

        self.multipath
            .sync(self.runner.as_ref(), Action::Add, &req.interface, table_id)
            .await;

        self.modify_route(Action::Add, req, index).await
    }

    /// Remove a route from the interface's secondary table.
    ///
    /// Fails with [`TableMgrError::NotFound`] without issuing any command
    /// when the interface holds no slot. Only valid names are ever stored,
    /// so an over-long name always ends up here. Returns the table id used.
    #[instrument(skip(self, req), fields(route = %req))]
    pub async fn remove_route(&mut self, req: &RouteMutationRequest) -> TableMgrResult<u32> {
        let Some(index) = self.registry.find_slot(&req.interface).map(|s| s.index) else {
            error!("Interface not found");
            return Err(TableMgrError::not_found(req.interface.as_str()));
        };
        let table_id = self.registry.table_id(index);

        self.multipath
            .sync(self.runner.as_ref(), Action::Del, &req.interface, table_id)
            .await;

        self.modify_route(Action::Del, req, index).await
    }

    /// Run the route command and, on success, update the slot's route count
    async fn modify_route(
        &mut self,
        action: Action,
        req: &RouteMutationRequest,
        index: usize,
    ) -> TableMgrResult<u32> {
        let table_id = self.registry.table_id(index);
        let cmd = build_checked_route_cmd(
            self.runner.ip_cmd(),
            action,
            req,
            table_id,
            self.runner.max_command_len(),
        )
        .inspect_err(|e| error!("ip command too long: {}", e))?;

        let status = self
            .runner
            .run(&cmd)
            .await
            .inspect_err(|e| error!("ip route {} failed: {}", action, e))?;
        if status != 0 {
            error!("ip route {} failed: {} (exit code {})", action, cmd, status);
            return Err(TableMgrError::ExecutionFailed {
                command: cmd,
                exit_code: status,
            });
        }

        match action {
            Action::Add => {
                let allocated = self.registry.allocate(&req.interface)?;
                debug_assert_eq!(allocated, index);
                self.registry.increment(&req.interface);
            }
            Action::Del => {
                self.registry.decrement(&req.interface);
            }
        }

        info!("Route {} {} in table {}", action, req, table_id);
        Ok(table_id)
    }

    /// Table id currently assigned to `interface`
    pub fn table_id(&self, interface: &str) -> Option<u32> {
        self.registry
            .find_slot(interface)
            .map(|slot| self.registry.table_id(slot.index))
    }

    /// Routes currently counted for `interface`
    pub fn rule_count(&self, interface: &str) -> u32 {
        self.registry
            .find_slot(interface)
            .map_or(0, |slot| slot.rule_count)
    }

    /// Occupied slots ordered by index
    pub fn slots(&self) -> Vec<&TableSlot> {
        self.registry.occupied()
    }

    /// Slots available for new interfaces
    pub fn free_slot_count(&self) -> usize {
        self.registry.free_count()
    }
}
