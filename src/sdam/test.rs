use pretty_assertions::assert_eq;

use crate::{
    bson::doc,
    options::ServerAddress,
    sdam::{ServerCapabilities, ServerDescription, ServerType, Topology, TopologyDescription},
};

fn address(host: &str) -> ServerAddress {
    ServerAddress::parse(host).unwrap()
}

fn describe(host: &str, reply: crate::bson::Document) -> ServerDescription {
    ServerDescription::from_hello_reply(address(host), reply).unwrap()
}

#[test]
fn capabilities_follow_wire_version() {
    let legacy = describe("a:27017", doc! { "ok": 1, "ismaster": true, "maxWireVersion": 3 });
    assert_eq!(legacy.capabilities(), ServerCapabilities::legacy());

    let three_two = describe("a:27017", doc! { "ok": 1, "ismaster": true, "maxWireVersion": 4 });
    let capabilities = three_two.capabilities();
    assert!(capabilities.supports_command_protocol);
    assert!(!capabilities.supports_write_concern_on_command);
    assert!(!capabilities.is_routing_node);

    let modern = describe("a:27017", doc! { "ok": 1, "ismaster": true, "maxWireVersion": 17 });
    assert_eq!(modern.capabilities(), ServerCapabilities::modern());
}

#[test]
fn mongos_is_routing_node() {
    let mongos = describe(
        "router:27017",
        doc! { "ok": 1, "ismaster": true, "msg": "isdbgrid", "maxWireVersion": 8 },
    );
    assert_eq!(mongos.server_type(), ServerType::Mongos);
    assert_eq!(
        mongos.capabilities(),
        ServerCapabilities::modern().routing()
    );
}

#[test]
fn unknown_servers_have_default_capabilities() {
    let topology = TopologyDescription::new();
    let server = address("nowhere:1");
    assert_eq!(topology.capabilities(&server), ServerCapabilities::default());
    assert!(!topology.is_routing_node(&server));

    topology.update(ServerDescription::new(server.clone()));
    assert_eq!(topology.capabilities(&server), ServerCapabilities::default());
}

#[test]
fn updates_replace_previous_description() {
    let server = address("a:27017");
    let topology: TopologyDescription = [describe(
        "a:27017",
        doc! { "ok": 1, "ismaster": true, "maxWireVersion": 3 },
    )]
    .into_iter()
    .collect();
    assert!(!topology.capabilities(&server).supports_command_protocol);

    topology.update(describe(
        "a:27017",
        doc! { "ok": 1, "ismaster": true, "msg": "isdbgrid", "maxWireVersion": 6 },
    ));
    assert!(topology.capabilities(&server).supports_command_protocol);
    assert!(topology.is_routing_node(&server));

    assert!(topology.remove(&server).is_some());
    assert!(topology.server(&server).is_none());
}

#[test]
fn server_type_display() {
    assert_eq!(ServerType::RsPrimary.to_string(), "RSPrimary");
    assert_eq!(ServerType::Mongos.to_string(), "Mongos");
}
