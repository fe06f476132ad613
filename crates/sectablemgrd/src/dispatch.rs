//! Line-oriented request dispatch.
//!
//! Requests look like
//! `route add <iface> <dest> <prefix> <gateway>` or
//! `route remove <iface> <dest> <prefix> <gateway>`, one per line.
//! Each request is run to completion and answered with one [`Response`].

use thiserror::Error;
use tracing::debug;

use crate::response::{Response, ResponseCode};
use crate::table_mgr::SecondaryTableMgr;
use crate::types::{is_valid_ifname, Action, RouteMutationRequest};

/// Usage text returned for malformed requests
pub const USAGE: &str = "Usage: route <add|remove> <iface> <dest> <prefix> <gateway>";

/// Reasons a request line cannot be parsed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// Wrong verb or argument count
    #[error("{}", USAGE)]
    Usage,

    /// Interface name is empty or too long for the kernel
    #[error("Invalid interface '{0}'")]
    InvalidInterface(String),

    /// Prefix is not a number in 0..=128
    #[error("Invalid prefix '{0}'")]
    InvalidPrefix(String),
}

/// A parsed route request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Add or remove
    pub action: Action,
    /// Route to mutate
    pub route: RouteMutationRequest,
}

impl Request {
    /// Parse one request line
    pub fn parse(line: &str) -> Result<Self, RequestError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [cmd, verb, iface, dest, prefix, gateway] = tokens.as_slice() else {
            return Err(RequestError::Usage);
        };
        if *cmd != "route" {
            return Err(RequestError::Usage);
        }

        let action = match *verb {
            "add" => Action::Add,
            "remove" | "del" => Action::Del,
            _ => return Err(RequestError::Usage),
        };

        if !is_valid_ifname(iface) {
            return Err(RequestError::InvalidInterface(iface.to_string()));
        }

        let prefix_len = prefix
            .parse::<u8>()
            .ok()
            .filter(|p| *p <= 128)
            .ok_or_else(|| RequestError::InvalidPrefix(prefix.to_string()))?;

        Ok(Self {
            action,
            route: RouteMutationRequest::new(*iface, *dest, prefix_len, *gateway),
        })
    }
}

impl From<&RequestError> for Response {
    fn from(err: &RequestError) -> Self {
        Response::failure(ResponseCode::CommandParameterError, err.to_string(), None)
    }
}

/// Parse and execute one request line
pub async fn dispatch(mgr: &mut SecondaryTableMgr, line: &str) -> Response {
    let request = match Request::parse(line) {
        Ok(request) => request,
        Err(e) => {
            debug!("Rejected request '{}': {}", line.trim(), e);
            return Response::from(&e);
        }
    };

    let result = match request.action {
        Action::Add => mgr.add_route(&request.route).await,
        Action::Del => mgr.remove_route(&request.route).await,
    };
    Response::from_result(&result)
}
