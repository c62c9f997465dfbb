use serde::{Deserialize, Serialize};

use crate::{
    bson::Document,
    error::Result,
    read_preference::TagSet,
    sdam::ServerType,
};

/// The response to a `hello` command.
///
/// See the documentation [here](https://www.mongodb.com/docs/manual/reference/command/hello/) for more details.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloCommandResponse {
    /// Whether the server is writable. If true, this instance is a primary in a replica set, a
    /// mongos instance, or a standalone mongod.
    pub is_writable_primary: Option<bool>,

    #[serde(rename = "ismaster")]
    /// Legacy name for `is_writable_primary` field.
    pub is_master: Option<bool>,

    /// Whether or not the server supports using the `hello` command for monitoring instead
    /// of the legacy hello command.
    pub hello_ok: Option<bool>,

    /// An optional message. This contains the value "isdbgrid" when returned from a mongos.
    pub msg: Option<String>,

    /// The name of the current replica set.
    pub set_name: Option<String>,

    /// Whether the server is hidden.
    pub hidden: Option<bool>,

    /// Whether the server is a secondary.
    pub secondary: Option<bool>,

    /// Whether the server is an arbiter.
    pub arbiter_only: Option<bool>,

    #[serde(rename = "isreplicaset")]
    /// Whether the server is a replica set.
    pub is_replica_set: Option<bool>,

    /// The minimum wire version that the server supports.
    pub min_wire_version: Option<i32>,

    /// The maximum wire version that the server supports.
    pub max_wire_version: Option<i32>,

    /// User-defined tags for a replica set member.
    pub tags: Option<TagSet>,
}

impl HelloCommandResponse {
    /// Parses the reply document of a `hello` or legacy hello command.
    pub fn from_document(reply: Document) -> Result<Self> {
        Ok(crate::bson::from_document(reply)?)
    }

    pub(crate) fn server_type(&self) -> ServerType {
        if self.msg.as_deref() == Some("isdbgrid") {
            ServerType::Mongos
        } else if self.set_name.is_some() {
            if self.hidden == Some(true) {
                ServerType::RsOther
            } else if self.is_writable_primary == Some(true) || self.is_master == Some(true) {
                ServerType::RsPrimary
            } else if self.secondary == Some(true) {
                ServerType::RsSecondary
            } else if self.arbiter_only == Some(true) {
                ServerType::RsArbiter
            } else {
                ServerType::RsOther
            }
        } else if self.is_replica_set == Some(true) {
            ServerType::RsGhost
        } else {
            ServerType::Standalone
        }
    }
}

#[cfg(test)]
mod test {
    use super::HelloCommandResponse;
    use crate::{bson::doc, sdam::ServerType};

    fn server_type(reply: crate::bson::Document) -> ServerType {
        HelloCommandResponse::from_document(reply)
            .unwrap()
            .server_type()
    }

    #[test]
    fn classify_server_types() {
        assert_eq!(
            server_type(doc! { "ok": 1, "ismaster": true, "msg": "isdbgrid", "maxWireVersion": 6 }),
            ServerType::Mongos
        );
        assert_eq!(
            server_type(doc! { "ok": 1, "ismaster": true, "setName": "rs", "maxWireVersion": 5 }),
            ServerType::RsPrimary
        );
        assert_eq!(
            server_type(doc! { "ok": 1, "ismaster": false, "secondary": true, "setName": "rs" }),
            ServerType::RsSecondary
        );
        assert_eq!(
            server_type(doc! { "ok": 1, "arbiterOnly": true, "setName": "rs" }),
            ServerType::RsArbiter
        );
        assert_eq!(
            server_type(doc! { "ok": 1, "secondary": true, "hidden": true, "setName": "rs" }),
            ServerType::RsOther
        );
        assert_eq!(
            server_type(doc! { "ok": 1, "isreplicaset": true }),
            ServerType::RsGhost
        );
        assert_eq!(
            server_type(doc! { "ok": 1, "ismaster": true, "maxWireVersion": 3 }),
            ServerType::Standalone
        );
    }
}
