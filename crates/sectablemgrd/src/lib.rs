//! Secondary routing-table manager for multi-homed devices.
//!
//! Keeps a small fixed pool of policy-routing tables, one per interface
//! that currently carries secondary routes (cellular, Wi-Fi, tethering),
//! and attaches or detaches routes in those tables through the `ip` tool.
//! When the platform supports multipath TCP, matching source rules are
//! installed so subflows leave through the right interface.
//!
//! The manager is single-caller: each request runs to completion before
//! the next one starts. Callers sharing a [`SecondaryTableMgr`] between
//! tasks must serialize access themselves.

mod commands;
mod config;
mod dispatch;
mod multipath;
mod response;
mod slots;
mod table_mgr;
mod types;

pub use commands::*;
pub use config::*;
pub use dispatch::*;
pub use multipath::*;
pub use response::*;
pub use slots::*;
pub use table_mgr::SecondaryTableMgr;
pub use types::*;
