//! Command builders for secondary table routes and multipath rules

use std::net::Ipv4Addr;

use sectable_common::{shell, TableMgrResult};

use crate::types::{Action, RouteMutationRequest};

/// Build a route mutation command
///
/// `<ip> route {add|del} <dest>/<prefix> [via <gw>] dev <iface> table <id>`.
/// The via clause is omitted for on-link routes.
pub fn build_route_cmd(
    ip_cmd: &str,
    action: Action,
    req: &RouteMutationRequest,
    table_id: u32,
) -> String {
    match &req.gateway {
        Some(gateway) => format!(
            "{} route {} {}/{} via {} dev {} table {}",
            ip_cmd, action, req.destination, req.prefix_len, gateway, req.interface, table_id
        ),
        None => format!(
            "{} route {} {}/{} dev {} table {}",
            ip_cmd, action, req.destination, req.prefix_len, req.interface, table_id
        ),
    }
}

/// Build a route mutation command, rejecting it if it reaches `max_len`
pub fn build_checked_route_cmd(
    ip_cmd: &str,
    action: Action,
    req: &RouteMutationRequest,
    table_id: u32,
    max_len: usize,
) -> TableMgrResult<String> {
    let cmd = build_route_cmd(ip_cmd, action, req, table_id);
    shell::check_command_len(&cmd, max_len)?;
    Ok(cmd)
}

/// Build a source rule command
///
/// Sends traffic sourced from `addr` to the secondary table.
pub fn build_rule_cmd(ip_cmd: &str, action: Action, addr: Ipv4Addr, table_id: u32) -> String {
    format!(
        "{} rule {} from {} table {}",
        ip_cmd, action, addr, table_id
    )
}
