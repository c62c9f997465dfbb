use crate::{
    bson::Document,
    error::Result,
    hello::HelloCommandResponse,
    options::ServerAddress,
};

/// The first wire version at which the server accepts the find, getMore, and killCursors commands
/// (MongoDB 3.2).
pub(crate) const SERVER_3_2_0_WIRE_VERSION: i32 = 4;

/// The first wire version at which the server accepts a `writeConcern` on commands that write
/// (MongoDB 3.4).
pub(crate) const SERVER_3_4_0_WIRE_VERSION: i32 = 5;

/// Enum representing the possible types of servers that the driver can connect to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, derive_more::Display)]
#[non_exhaustive]
pub enum ServerType {
    /// A single, non-replica set mongod.
    Standalone,

    /// A router used in sharded deployments.
    Mongos,

    /// The primary node in a replica set.
    #[display("RSPrimary")]
    RsPrimary,

    /// A secondary node in a replica set.
    #[display("RSSecondary")]
    RsSecondary,

    /// A non-data bearing node in a replica set which can participate in elections.
    #[display("RSArbiter")]
    RsArbiter,

    /// Hidden, starting up, or recovering nodes in a replica set.
    #[display("RSOther")]
    RsOther,

    /// A member of an uninitialized replica set or a member that has been removed from the replica
    /// set config.
    #[display("RSGhost")]
    RsGhost,

    /// A server that the driver hasn't yet communicated with or can't connect to.
    #[default]
    Unknown,
}

impl ServerType {
    /// Whether this server routes commands to the data-bearing members of a sharded cluster.
    pub fn is_routing_node(self) -> bool {
        matches!(self, ServerType::Mongos)
    }
}

/// A snapshot of what a server said about itself in its most recent hello reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerDescription {
    pub(crate) address: ServerAddress,
    pub(crate) server_type: ServerType,
    pub(crate) max_wire_version: Option<i32>,
}

impl ServerDescription {
    /// A description of a server that has not been contacted yet.
    pub fn new(address: ServerAddress) -> Self {
        Self {
            address,
            server_type: ServerType::Unknown,
            max_wire_version: None,
        }
    }

    /// Builds a description from the parsed reply of a `hello` or legacy hello command.
    pub fn from_hello_response(address: ServerAddress, reply: &HelloCommandResponse) -> Self {
        Self {
            address,
            server_type: reply.server_type(),
            max_wire_version: reply.max_wire_version,
        }
    }

    /// Builds a description from the raw reply document of a `hello` or legacy hello command.
    pub fn from_hello_reply(address: ServerAddress, reply: Document) -> Result<Self> {
        let response = HelloCommandResponse::from_document(reply)?;
        Ok(Self::from_hello_response(address, &response))
    }

    /// The address of the server.
    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    /// The type of the server.
    pub fn server_type(&self) -> ServerType {
        self.server_type
    }

    /// The maximum wire version that the server supports, if it has been reported.
    pub fn max_wire_version(&self) -> Option<i32> {
        self.max_wire_version
    }

    /// Derives what the server can accept from this description.
    pub fn capabilities(&self) -> ServerCapabilities {
        let max_wire_version = self.max_wire_version.unwrap_or(0);
        ServerCapabilities {
            supports_command_protocol: max_wire_version >= SERVER_3_2_0_WIRE_VERSION,
            supports_write_concern_on_command: max_wire_version >= SERVER_3_4_0_WIRE_VERSION,
            is_routing_node: self.server_type.is_routing_node(),
        }
    }
}

/// What a particular server accepts, as relevant to shaping the commands sent to it.
///
/// The default value describes a legacy, non-routing server that accepts neither the command
/// protocol for cursor operations nor a write concern on commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ServerCapabilities {
    /// Whether the server accepts cursor operations (`cursor` options, `getMore`,
    /// `killCursors`) as commands rather than legacy wire messages.
    pub supports_command_protocol: bool,

    /// Whether the server accepts a `writeConcern` field on commands that write.
    pub supports_write_concern_on_command: bool,

    /// Whether the server is a mongos.
    pub is_routing_node: bool,
}

impl ServerCapabilities {
    /// Capabilities of a modern data-bearing server.
    pub fn modern() -> Self {
        Self {
            supports_command_protocol: true,
            supports_write_concern_on_command: true,
            is_routing_node: false,
        }
    }

    /// Capabilities of a server predating the command protocol.
    pub fn legacy() -> Self {
        Self::default()
    }

    /// These capabilities, but for a mongos.
    pub fn routing(mut self) -> Self {
        self.is_routing_node = true;
        self
    }
}
