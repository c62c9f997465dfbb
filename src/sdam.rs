//! Server descriptions and the topology interface that commands are adapted against.

mod description;
#[cfg(test)]
mod test;
mod topology;

pub use self::{
    description::{ServerCapabilities, ServerDescription, ServerType},
    topology::{Topology, TopologyDescription},
};
