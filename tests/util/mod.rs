use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt};
use mongodb_driver_core::{
    bson::{doc, Document},
    error::Result,
    options::{ClientOptions, ServerAddress},
    sdam::{ServerDescription, TopologyDescription},
    wire::Message,
    Client,
    Dispatcher,
};

/// A stand-in for the wire transport: records what it is asked to send and answers each
/// command with the next scripted reply, or `{ ok: 1 }` when none is left.
#[derive(Debug, Default)]
pub struct MockDispatcher {
    sent: Mutex<Vec<(ServerAddress, Message)>>,
    replies: Mutex<Vec<Document>>,
}

impl MockDispatcher {
    pub fn reply_with(&self, reply: Document) {
        self.replies.lock().unwrap().insert(0, reply);
    }

    pub fn sent(&self) -> Vec<(ServerAddress, Message)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, server: &ServerAddress) -> Vec<Message> {
        self.sent()
            .into_iter()
            .filter(|(address, _)| address == server)
            .map(|(_, message)| message)
            .collect()
    }
}

impl Dispatcher for MockDispatcher {
    fn dispatch<'a>(
        &'a self,
        message: Message,
        server: &'a ServerAddress,
    ) -> BoxFuture<'a, Result<Document>> {
        async move {
            self.sent.lock().unwrap().push((server.clone(), message));
            Ok(self
                .replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| doc! { "ok": 1 }))
        }
        .boxed()
    }
}

pub struct TestClient {
    pub client: Client,
    pub topology: Arc<TopologyDescription>,
    pub dispatcher: Arc<MockDispatcher>,
}

impl TestClient {
    /// A client over the given servers, each described by its hello reply.
    pub fn new(servers: &[(ServerAddress, Document)]) -> Self {
        let topology = Arc::new(TopologyDescription::new());
        for (address, hello) in servers {
            let description =
                ServerDescription::from_hello_reply(address.clone(), hello.clone()).unwrap();
            topology.update(description);
        }
        let dispatcher = Arc::new(MockDispatcher::default());
        let options = ClientOptions::builder()
            .kill_cursors_frequency(std::time::Duration::from_millis(100))
            .build();
        let client = Client::new(topology.clone(), dispatcher.clone(), options);

        Self {
            client,
            topology,
            dispatcher,
        }
    }
}

pub fn hello(max_wire_version: i32) -> Document {
    doc! { "ok": 1, "ismaster": true, "maxWireVersion": max_wire_version }
}
