mod aggregate;
mod get_more;
mod kill_cursors;
mod run_command;
mod selector;


use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    bson::{self, Document},
    error::{Error, Result},
    options::{ReadPreference, ServerAddress, WriteConcern},
    sdam::ServerCapabilities,
    Namespace,
};

pub(crate) use aggregate::{Aggregate, AggregateTarget};
pub(crate) use get_more::GetMore;
pub(crate) use kill_cursors::KillCursors;
pub(crate) use run_command::RunCommand;
pub use selector::build_selector;

/// The logical description of an outgoing command, before it is adapted to the server it is sent
/// to.
///
/// An intent is validated when it is created and cannot be changed afterwards; the wire selector
/// is derived from it by [`build_selector`].
#[derive(Clone, Debug, PartialEq)]
pub struct CommandIntent {
    db: String,
    selector: Document,
    write_concern: Option<WriteConcern>,
    read_preference: Option<ReadPreference>,
    pipeline: Option<Vec<Document>>,
}

impl CommandIntent {
    /// Creates an intent to run `selector` against the database `db`.
    ///
    /// Returns an error if the database name or the selector is empty.
    pub fn new(db: impl Into<String>, selector: Document) -> Result<Self> {
        let db = db.into();
        if db.is_empty() {
            return Err(Error::invalid_argument(
                "a command must target a non-empty database name",
            ));
        }
        if selector.is_empty() {
            return Err(Error::invalid_argument("a command selector must not be empty"));
        }

        Ok(Self {
            db,
            selector,
            write_concern: None,
            read_preference: None,
            pipeline: None,
        })
    }

    /// Sets the write concern the command requests.
    pub fn with_write_concern(mut self, write_concern: impl Into<Option<WriteConcern>>) -> Self {
        self.write_concern = write_concern.into();
        self
    }

    /// Sets the read preference a mongos must see for the command.
    pub fn with_read_preference(
        mut self,
        read_preference: impl Into<Option<ReadPreference>>,
    ) -> Self {
        self.read_preference = read_preference.into();
        self
    }

    /// Marks the command as an aggregation over `pipeline`.
    pub fn with_pipeline(mut self, pipeline: impl IntoIterator<Item = Document>) -> Self {
        self.pipeline = Some(pipeline.into_iter().collect());
        self
    }

    /// The database the command targets.
    pub fn db(&self) -> &str {
        &self.db
    }

    /// The command as written, before any server-specific adaptation.
    pub fn selector(&self) -> &Document {
        &self.selector
    }

    /// The write concern the command requests, if any.
    pub fn write_concern(&self) -> Option<&WriteConcern> {
        self.write_concern.as_ref()
    }

    /// The read preference the command carries, if any.
    pub fn read_preference(&self) -> Option<&ReadPreference> {
        self.read_preference.as_ref()
    }

    /// The aggregation pipeline, if the command is an aggregation.
    pub fn pipeline(&self) -> Option<&[Document]> {
        self.pipeline.as_deref()
    }
}

/// A trait modeling the behavior of a server side operation.
pub(crate) trait Operation {
    /// The output type of this operation.
    type O;

    /// The name of the server side command associated with this operation.
    const NAME: &'static str;

    /// Returns the intent of the command that should be sent to the server as part of this
    /// operation.
    fn build(&self, capabilities: &ServerCapabilities) -> Result<CommandIntent>;

    /// Interprets the server response to the command. Only successful (`ok: 1`) replies are
    /// passed here.
    fn handle_response(&self, response: Document, address: &ServerAddress) -> Result<Self::O>;
}

/// Returns whether the last stage of `pipeline` writes its results to a collection.
pub(crate) fn is_out_or_merge(pipeline: &[Document]) -> bool {
    pipeline
        .last()
        .map(|stage| {
            let stage = crate::bson_util::first_key(stage);
            stage == Some("$out") || stage == Some("$merge")
        })
        .unwrap_or(false)
}

/// Appends a serializable struct to the input document. The serializable struct MUST serialize to a
/// Document; otherwise, an error will be thrown.
pub(crate) fn append_options<T: Serialize>(doc: &mut Document, options: Option<&T>) -> Result<()> {
    if let Some(options) = options {
        let options_doc = bson::to_document(options)?;
        doc.extend(options_doc);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub(crate) struct CursorBody {
    pub(crate) cursor: CursorInfo,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CursorInfo {
    pub(crate) id: i64,

    pub(crate) ns: Namespace,

    pub(crate) first_batch: VecDeque<Document>,
}
