use std::collections::VecDeque;

use serde::Deserialize;

use crate::{
    bson::{doc, Bson, Document},
    bson_util,
    cursor::CursorSpecification,
    error::Result,
    operation::{append_options, is_out_or_merge, CommandIntent, CursorBody, Operation},
    options::{AggregateOptions, ServerAddress},
    sdam::ServerCapabilities,
    Namespace,
};

#[derive(Debug)]
pub(crate) struct Aggregate {
    target: AggregateTarget,
    pipeline: Vec<Document>,
    options: Option<AggregateOptions>,
}

impl Aggregate {
    pub(crate) fn new(
        target: impl Into<AggregateTarget>,
        pipeline: impl IntoIterator<Item = Document>,
        options: Option<AggregateOptions>,
    ) -> Self {
        Self {
            target: target.into(),
            pipeline: pipeline.into_iter().collect(),
            options,
        }
    }
}

impl Operation for Aggregate {
    type O = CursorSpecification;

    const NAME: &'static str = "aggregate";

    fn build(&self, _capabilities: &ServerCapabilities) -> Result<CommandIntent> {
        let mut cursor = Document::new();
        if !is_out_or_merge(&self.pipeline) {
            if let Some(batch_size) = self.options.as_ref().and_then(|opts| opts.batch_size) {
                cursor.insert("batchSize", i32::try_from(batch_size).unwrap_or(i32::MAX));
            }
        }

        let mut body = doc! {
            Self::NAME: self.target.to_bson(),
            "pipeline": bson_util::to_bson_array(&self.pipeline),
            "cursor": cursor,
        };
        append_options(&mut body, self.options.as_ref())?;

        let write_concern = self
            .options
            .as_ref()
            .and_then(|opts| opts.write_concern.clone());
        if let Some(ref write_concern) = write_concern {
            write_concern.validate()?;
        }

        Ok(CommandIntent::new(self.target.db_name(), body)?
            .with_pipeline(self.pipeline.iter().cloned())
            .with_write_concern(write_concern)
            .with_read_preference(
                self.options
                    .as_ref()
                    .and_then(|opts| opts.read_preference.clone()),
            ))
    }

    fn handle_response(&self, response: Document, address: &ServerAddress) -> Result<Self::O> {
        let batch_size = self.options.as_ref().and_then(|opts| opts.batch_size);

        // Servers that cannot return a cursor send the whole result inline.
        if response.contains_key("result") && !response.contains_key("cursor") {
            let body: InlineResultBody = crate::bson::from_document(response)?;
            return Ok(CursorSpecification::new(
                self.target.namespace(),
                address.clone(),
                0,
                body.result,
                batch_size,
            ));
        }

        let body: CursorBody = crate::bson::from_document(response)?;
        Ok(CursorSpecification::new(
            body.cursor.ns,
            address.clone(),
            body.cursor.id,
            body.cursor.first_batch,
            batch_size,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct InlineResultBody {
    result: VecDeque<Document>,
}

#[derive(Clone, Debug)]
pub(crate) enum AggregateTarget {
    Database(String),
    Collection(Namespace),
}

impl AggregateTarget {
    fn to_bson(&self) -> Bson {
        match self {
            AggregateTarget::Database(_) => Bson::Int32(1),
            AggregateTarget::Collection(ref ns) => Bson::String(ns.coll.to_string()),
        }
    }

    fn db_name(&self) -> &str {
        match self {
            AggregateTarget::Database(ref s) => s.as_str(),
            AggregateTarget::Collection(ref ns) => ns.db.as_str(),
        }
    }

    fn namespace(&self) -> Namespace {
        match self {
            AggregateTarget::Database(ref db) => Namespace::new(db.as_str(), "$cmd.aggregate"),
            AggregateTarget::Collection(ref ns) => ns.clone(),
        }
    }
}

impl From<Namespace> for AggregateTarget {
    fn from(ns: Namespace) -> Self {
        AggregateTarget::Collection(ns)
    }
}

impl From<String> for AggregateTarget {
    fn from(db_name: String) -> Self {
        AggregateTarget::Database(db_name)
    }
}
