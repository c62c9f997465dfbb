use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use futures_util::{future::BoxFuture, FutureExt};
use tokio::sync::Notify;

use crate::{
    bson::{doc, Document},
    error::Result,
    options::{ClientOptions, ServerAddress},
    sdam::{ServerDescription, TopologyDescription},
    wire::Message,
    Client,
    Dispatcher,
};

/// A hello reply from a server that accepts every command form this crate produces.
pub(crate) fn modern_hello() -> Document {
    doc! { "ok": 1, "isWritablePrimary": true, "minWireVersion": 0, "maxWireVersion": 17 }
}

/// A hello reply from a server that predates the command protocol.
pub(crate) fn legacy_hello() -> Document {
    doc! { "ok": 1, "ismaster": true, "minWireVersion": 0, "maxWireVersion": 3 }
}

/// A hello reply from a mongos.
pub(crate) fn mongos_hello() -> Document {
    doc! {
        "ok": 1,
        "ismaster": true,
        "msg": "isdbgrid",
        "minWireVersion": 0,
        "maxWireVersion": 17,
    }
}

pub(crate) fn address(address: &str) -> ServerAddress {
    ServerAddress::parse(address).unwrap()
}

pub(crate) fn topology(servers: &[(&ServerAddress, Document)]) -> Arc<TopologyDescription> {
    Arc::new(
        servers
            .iter()
            .map(|(address, hello)| {
                ServerDescription::from_hello_reply((*address).clone(), hello.clone()).unwrap()
            })
            .collect(),
    )
}

#[derive(Debug, Default)]
struct Gate {
    entered: Notify,
    release: Notify,
}

/// A dispatcher that records every message it is handed and answers from a queue of scripted
/// replies, falling back to `{ ok: 1 }`.
#[derive(Debug, Default)]
pub(crate) struct RecordingDispatcher {
    sent: Mutex<Vec<(ServerAddress, Message)>>,
    replies: Mutex<VecDeque<Result<Document>>>,
    gate: Option<Gate>,
}

impl RecordingDispatcher {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A dispatcher that holds every dispatch until `release` is called for it.
    pub(crate) fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Gate::default()),
            ..Default::default()
        })
    }

    pub(crate) fn push_reply(&self, reply: Result<Document>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn sent(&self) -> Vec<(ServerAddress, Message)> {
        self.sent.lock().unwrap().clone()
    }

    /// The selectors of the commands sent so far.
    pub(crate) fn commands(&self) -> Vec<Document> {
        self.sent()
            .into_iter()
            .filter_map(|(_, message)| match message {
                Message::Command { selector, .. } => Some(selector),
                _ => None,
            })
            .collect()
    }

    /// Waits until a dispatch is being held by the gate.
    pub(crate) async fn wait_for_dispatch(&self) {
        if let Some(ref gate) = self.gate {
            gate.entered.notified().await;
        }
    }

    /// Lets one held dispatch complete.
    pub(crate) fn release(&self) {
        if let Some(ref gate) = self.gate {
            gate.release.notify_one();
        }
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch<'a>(
        &'a self,
        message: Message,
        server: &'a ServerAddress,
    ) -> BoxFuture<'a, Result<Document>> {
        async move {
            self.sent.lock().unwrap().push((server.clone(), message));
            if let Some(ref gate) = self.gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(doc! { "ok": 1 }))
        }
        .boxed()
    }
}

pub(crate) fn client(
    topology: Arc<TopologyDescription>,
    dispatcher: Arc<RecordingDispatcher>,
) -> Client {
    Client::new(topology, dispatcher, ClientOptions::default())
}
