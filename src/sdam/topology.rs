use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    options::ServerAddress,
    sdam::{ServerCapabilities, ServerDescription},
};

/// The view of the deployment that command construction and cursor cleanup consume.
///
/// Implementations are expected to answer from their most recent knowledge of each server;
/// callers ask again for every command rather than caching the answers.
pub trait Topology: Send + Sync {
    /// What the given server currently accepts.
    fn capabilities(&self, server: &ServerAddress) -> ServerCapabilities;

    /// Whether the given server is currently known to be a mongos.
    fn is_routing_node(&self, server: &ServerAddress) -> bool {
        self.capabilities(server).is_routing_node
    }
}

/// An in-memory [`Topology`] holding the latest [`ServerDescription`] for each known server.
///
/// Whatever monitors the deployment calls [`update`](TopologyDescription::update) whenever a
/// server's role or version changes. Servers that have never been described report
/// [`ServerCapabilities::default`].
#[derive(Debug, Default)]
pub struct TopologyDescription {
    servers: RwLock<HashMap<ServerAddress, ServerDescription>>,
}

impl TopologyDescription {
    /// Creates an empty topology description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the latest description of a server, replacing any previous one.
    pub fn update(&self, description: ServerDescription) {
        self.write()
            .insert(description.address.clone(), description);
    }

    /// Forgets a server.
    pub fn remove(&self, address: &ServerAddress) -> Option<ServerDescription> {
        self.write().remove(address)
    }

    /// The latest description of a server, if there is one.
    pub fn server(&self, address: &ServerAddress) -> Option<ServerDescription> {
        self.read().get(address).cloned()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ServerAddress, ServerDescription>> {
        self.servers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ServerAddress, ServerDescription>> {
        self.servers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FromIterator<ServerDescription> for TopologyDescription {
    fn from_iter<I: IntoIterator<Item = ServerDescription>>(iter: I) -> Self {
        let topology = Self::new();
        for description in iter {
            topology.update(description);
        }
        topology
    }
}

impl Topology for TopologyDescription {
    fn capabilities(&self, server: &ServerAddress) -> ServerCapabilities {
        self.read()
            .get(server)
            .map(ServerDescription::capabilities)
            .unwrap_or_default()
    }
}
