use std::collections::VecDeque;

use serde::Deserialize;

use crate::{
    bson::{doc, Document},
    cursor::CursorInformation,
    error::{Error, ErrorKind, Result},
    operation::{CommandIntent, Operation},
    options::ServerAddress,
    sdam::ServerCapabilities,
    Namespace,
};

#[derive(Debug)]
pub(crate) struct GetMore {
    ns: Namespace,
    cursor_id: i64,
    batch_size: Option<u32>,
}

impl GetMore {
    pub(crate) fn new(info: &CursorInformation) -> Self {
        Self {
            ns: info.ns.clone(),
            cursor_id: info.id,
            batch_size: info.batch_size,
        }
    }
}

impl Operation for GetMore {
    type O = GetMoreResult;

    const NAME: &'static str = "getMore";

    fn build(&self, capabilities: &ServerCapabilities) -> Result<CommandIntent> {
        if !capabilities.supports_command_protocol {
            return Err(ErrorKind::IncompatibleServer {
                message: "getMore requires a server that supports the command protocol".to_string(),
            }
            .into());
        }

        let mut body = doc! {
            Self::NAME: self.cursor_id,
            "collection": self.ns.coll.clone(),
        };

        if let Some(batch_size) = self.batch_size {
            let batch_size = i32::try_from(batch_size).map_err(|_| {
                Error::invalid_argument("The batch size must fit into a signed 32-bit integer")
            })?;
            if batch_size != 0 {
                body.insert("batchSize", batch_size);
            }
        }

        CommandIntent::new(self.ns.db.as_str(), body)
    }

    fn handle_response(&self, response: Document, _address: &ServerAddress) -> Result<Self::O> {
        let response: GetMoreResponseBody = crate::bson::from_document(response)?;

        Ok(GetMoreResult {
            batch: response.cursor.next_batch,
            exhausted: response.cursor.id == 0,
        })
    }
}

#[derive(Debug)]
pub(crate) struct GetMoreResult {
    pub(crate) batch: VecDeque<Document>,
    pub(crate) exhausted: bool,
}

#[derive(Debug, Deserialize)]
struct GetMoreResponseBody {
    cursor: NextBatchBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NextBatchBody {
    id: i64,
    next_batch: VecDeque<Document>,
}
