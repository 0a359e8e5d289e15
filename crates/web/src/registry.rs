//! Process-wide server registry.
//!
//! The transport layer owns the sockets; this module only records which
//! virtual server answers on which port, and which hosts each server knows.
//! Both maps are read-mostly: lookups take a shared guard, registration an
//! exclusive one.

use crate::host::HttpHost;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

static SERVERS_BY_PORT: Lazy<RwLock<HashMap<u16, Arc<VirtualServer>>>> = Lazy::new(Default::default);

/// The host records served behind one listening port.
pub struct VirtualServer {
    port: u16,
    hosts: RwLock<HashMap<String, Arc<HttpHost>>>,
}

impl VirtualServer {
    pub fn new(port: u16) -> Arc<Self> {
        Arc::new(Self { port, hosts: RwLock::new(HashMap::new()) })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Read-through host lookup, creating the record on first use.
    ///
    /// On non-standard ports the port is folded into the stored key, so
    /// `example.com` on port 8080 registers as `example.com:8080` — the form
    /// clients send in the `Host` header.
    pub fn get_host(&self, host_name: &str) -> Arc<HttpHost> {
        let key = self.host_key(host_name);

        if let Some(host) = self.hosts.read().unwrap().get(&key) {
            return host.clone();
        }

        let mut hosts = self.hosts.write().unwrap();
        hosts.entry(key).or_insert_with_key(|key| HttpHost::new(key.clone())).clone()
    }

    /// Exact lookup by the key stored at registration (i.e. by the raw
    /// `Host` header value). Returns nothing for unknown hosts.
    pub fn lookup_host(&self, host_header: &str) -> Option<Arc<HttpHost>> {
        self.hosts.read().unwrap().get(host_header).cloned()
    }

    pub fn host_names(&self) -> Vec<String> {
        self.hosts.read().unwrap().keys().cloned().collect()
    }

    fn host_key(&self, host_name: &str) -> String {
        if self.port != 80 && self.port != 443 {
            format!("{}:{}", host_name, self.port)
        } else {
            host_name.to_string()
        }
    }
}

/// Registers `server` under its port, replacing any previous entry.
pub fn register_server(server: Arc<VirtualServer>) {
    info!(port = server.port(), "registering http server");
    SERVERS_BY_PORT.write().unwrap().insert(server.port(), server);
}

/// The server listening on `port`, if one was registered.
pub fn server_for_port(port: u16) -> Option<Arc<VirtualServer>> {
    SERVERS_BY_PORT.read().unwrap().get(&port).cloned()
}

/// Removes and returns the server registered under `port`.
pub fn remove_server(port: u16) -> Option<Arc<VirtualServer>> {
    SERVERS_BY_PORT.write().unwrap().remove(&port)
}

/// Empties the registry.
pub fn clear_servers() {
    SERVERS_BY_PORT.write().unwrap().clear();
}
