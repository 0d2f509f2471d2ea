//! Route lookup.
//!
//! # Responsibilities
//! - Store one compiled target per virtual host
//! - Look up the target for a normalized host
//! - Return an explicit miss rather than a silent default
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) host lookup via HashMap
//! - Targets are built once here, so nothing is constructed per request

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::schema::ProxyConfig;
use crate::routing::target::{ProxyTarget, StaticResponse, UpstreamTarget};
use crate::routing::RouteError;

/// Virtual host → target mapping, built once at startup.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<String, Arc<ProxyTarget>>,
}

impl RouteTable {
    /// Compile redirects and static hosts from configuration.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, RouteError> {
        let mut table = Self::default();
        for (host, url) in &config.redirects {
            let target = UpstreamTarget::parse(host, url)?;
            table.insert(host, ProxyTarget::Upstream(target))?;
        }
        for (host, response) in &config.static_hosts {
            let target = StaticResponse::from_config(host, response)?;
            table.insert(host, ProxyTarget::Static(target))?;
        }

        tracing::info!(routes = table.len(), "Route table compiled");
        for host in table.hosts() {
            if let Some(target) = table.lookup(host) {
                tracing::debug!(host = %host, target = target.kind(), "Route registered");
            }
        }
        Ok(table)
    }

    /// Register a target for `host`. Each host may appear once.
    pub fn insert(&mut self, host: &str, target: ProxyTarget) -> Result<(), RouteError> {
        if self.routes.contains_key(host) {
            return Err(RouteError::DuplicateHost(host.to_string()));
        }
        self.routes.insert(host.to_string(), Arc::new(target));
        Ok(())
    }

    /// Exact, case-sensitive lookup of a normalized host.
    pub fn lookup(&self, host: &str) -> Option<&Arc<ProxyTarget>> {
        self.routes.get(host)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered hosts in sorted order.
    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }
}
