//! The framed messages handed to a [`Dispatcher`](crate::Dispatcher).

use crate::bson::Document;

/// A single outgoing unit of work for a server, framed according to what the server accepts.
///
/// Byte-level encoding of these messages is the dispatcher's concern.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Message {
    /// A command sent to the `$cmd` namespace of `target_db`.
    Command {
        /// The database the command runs against.
        target_db: String,

        /// The finished selector, already adapted to the target server.
        selector: Document,
    },

    /// A legacy `OP_KILL_CURSORS` message, for servers that predate the `killCursors` command.
    KillCursors {
        /// The ids of the cursors to kill.
        cursor_ids: Vec<i64>,
    },
}

impl Message {
    /// The name of the command carried by this message, as used in logs.
    pub fn name(&self) -> &str {
        match self {
            Message::Command { selector, .. } => {
                let name = crate::bson_util::first_key(selector).unwrap_or("");
                if name == "$query" {
                    selector
                        .get_document("$query")
                        .ok()
                        .and_then(crate::bson_util::first_key)
                        .unwrap_or("")
                } else {
                    name
                }
            }
            Message::KillCursors { .. } => "OP_KILL_CURSORS",
        }
    }
}
