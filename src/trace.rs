use crate::{
    bson::{Bson, Document},
    client::options::{ServerAddress, DEFAULT_PORT},
};

pub(crate) const COMMAND_TRACING_EVENT_TARGET: &str = "mongodb::command";
pub(crate) const CURSOR_TRACING_EVENT_TARGET: &str = "mongodb::cursor";

pub(crate) trait TracingRepresentation {
    type Representation;

    fn tracing_representation(&self) -> Self::Representation;
}

impl TracingRepresentation for Document {
    type Representation = String;

    fn tracing_representation(&self) -> String {
        Bson::Document(self.clone())
            .into_relaxed_extjson()
            .to_string()
    }
}

impl TracingRepresentation for crate::error::Error {
    type Representation = String;

    fn tracing_representation(&self) -> String {
        self.to_string()
    }
}

impl TracingRepresentation for crate::wire::Message {
    type Representation = String;

    fn tracing_representation(&self) -> String {
        match self {
            Self::Command { selector, .. } => selector.tracing_representation(),
            Self::KillCursors { cursor_ids } => format!("OP_KILL_CURSORS {:?}", cursor_ids),
        }
    }
}

impl ServerAddress {
    /// The port to report in tracing events, with the default port filled in.
    pub(crate) fn port_tracing_representation(&self) -> Option<u16> {
        Some(self.port().unwrap_or(DEFAULT_PORT))
    }
}
