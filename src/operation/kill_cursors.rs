use crate::{
    bson::doc,
    cursor::KillCursorsSpec,
    error::Result,
    operation::{build_selector, CommandIntent},
    sdam::ServerCapabilities,
    wire::Message,
};

/// Frames the kill of a set of cursors for a particular server.
#[derive(Debug)]
pub(crate) struct KillCursors<'a> {
    spec: &'a KillCursorsSpec,
}

impl<'a> KillCursors<'a> {
    pub(crate) const NAME: &'static str = "killCursors";

    pub(crate) fn new(spec: &'a KillCursorsSpec) -> Self {
        Self { spec }
    }

    /// Servers that accept the command protocol get a `killCursors` command; older ones get a
    /// legacy `OP_KILL_CURSORS` message.
    pub(crate) fn build(
        &self,
        capabilities: &ServerCapabilities,
        is_routing_target: bool,
    ) -> Result<Message> {
        if !capabilities.supports_command_protocol {
            return Ok(Message::KillCursors {
                cursor_ids: self.spec.cursor_ids.clone(),
            });
        }

        let ns = &self.spec.ns;
        let intent = CommandIntent::new(
            ns.db.as_str(),
            doc! {
                Self::NAME: ns.coll.as_str(),
                "cursors": self.spec.cursor_ids.clone(),
            },
        )?;

        Ok(Message::Command {
            target_db: intent.db().to_string(),
            selector: build_selector(&intent, capabilities, is_routing_target),
        })
    }
}
