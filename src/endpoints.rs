//! Client-owned endpoint cache.
//!
//! The browser keeps its saved endpoint list in local storage; the server
//! only ever sees one endpoint per request. This module models that list as
//! an explicit store interface so UI code takes it as a dependency instead
//! of reaching for ambient global state.

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Reachability of a saved endpoint, updated after each execution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    Unknown,
    Online,
    Offline,
}

/// A saved remote target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Creation timestamp in milliseconds, doubles as the identifier
    pub id: i64,
    pub host: String,
    pub port: u16,
    pub use_https: bool,
    pub url: String,
    pub name: String,
    pub saved: String,
    pub status: EndpointStatus,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, use_https: bool) -> Self {
        let host = host.into();
        let scheme = if use_https { "https" } else { "http" };
        Self {
            id: Utc::now().timestamp_millis(),
            url: format!("{}://{}:{}", scheme, host, port),
            name: format!("{}:{}", host, port),
            saved: crate::exec::now_iso(),
            status: EndpointStatus::Unknown,
            host,
            port,
            use_https,
        }
    }
}

/// Store interface for the endpoint list
pub trait EndpointStore: Send + Sync {
    fn list(&self) -> Vec<Endpoint>;
    /// Upsert keyed on host:port; an existing entry is replaced in place
    fn save(&self, endpoint: Endpoint);
    fn remove(&self, id: i64) -> bool;
    fn clear(&self);
    fn set_status(&self, id: i64, status: EndpointStatus) -> bool;
}

/// In-memory store backing a single browser session
#[derive(Default)]
pub struct MemoryEndpointStore {
    endpoints: RwLock<Vec<Endpoint>>,
}

impl MemoryEndpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EndpointStore for MemoryEndpointStore {
    fn list(&self) -> Vec<Endpoint> {
        self.endpoints.read().clone()
    }

    fn save(&self, endpoint: Endpoint) {
        let mut endpoints = self.endpoints.write();
        match endpoints
            .iter_mut()
            .find(|e| e.host == endpoint.host && e.port == endpoint.port)
        {
            Some(existing) => *existing = endpoint,
            None => endpoints.push(endpoint),
        }
    }

    fn remove(&self, id: i64) -> bool {
        let mut endpoints = self.endpoints.write();
        let before = endpoints.len();
        endpoints.retain(|e| e.id != id);
        endpoints.len() != before
    }

    fn clear(&self) {
        self.endpoints.write().clear();
    }

    fn set_status(&self, id: i64, status: EndpointStatus) -> bool {
        let mut endpoints = self.endpoints.write();
        match endpoints.iter_mut().find(|e| e.id == id) {
            Some(endpoint) => {
                endpoint.status = status;
                true
            }
            None => false,
        }
    }
}
