mod executor;
pub mod options;
#[cfg(test)]
mod test;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use futures_util::future::BoxFuture;

use crate::{
    bson::Document,
    cursor::{Cursor, CursorManager},
    error::Result,
    operation::{Aggregate, AggregateTarget, RunCommand},
    options::{AggregateOptions, ClientOptions, RunCommandOptions, ServerAddress},
    sdam::Topology,
    wire::Message,
    Namespace,
};

/// The wire transport a [`Client`] sends its messages through.
///
/// A dispatcher performs a single round trip to `server` and returns the raw reply document. It
/// reports transport failures as [`ErrorKind::Io`](crate::error::ErrorKind::Io) errors; replies in
/// which the server reports a failure (`ok: 0`) are returned as replies and interpreted by the
/// caller. A legacy `OP_KILL_CURSORS` message has no reply, so any `Ok` value stands for a
/// successful send.
pub trait Dispatcher: Send + Sync {
    /// Sends `message` to `server` and waits for the reply.
    fn dispatch<'a>(
        &'a self,
        message: Message,
        server: &'a ServerAddress,
    ) -> BoxFuture<'a, Result<Document>>;
}

/// The entry point for running commands and aggregations against a deployment.
///
/// `Client` uses [`std::sync::Arc`] internally, so it can safely be shared across threads or
/// async tasks, and cloning it is cheap.
///
/// Server discovery and the wire transport are supplied by the caller: the [`Topology`] answers
/// what each server supports, and the [`Dispatcher`] performs the round trips. Every command is
/// adapted to the current capabilities of the server it is sent to.
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use mongodb_driver_core::{bson::doc, error::Result, options::{ClientOptions, ServerAddress}, sdam::TopologyDescription, Client, Dispatcher};
/// # async fn run(dispatcher: Arc<dyn Dispatcher>) -> Result<()> {
/// let topology = Arc::new(TopologyDescription::new());
/// let client = Client::new(topology, dispatcher, ClientOptions::default());
/// client.start_cursor_reaper();
///
/// let server = ServerAddress::parse("localhost:27017")?;
/// let reply = client.run_command("admin", doc! { "ping": 1 }, None, &server).await?;
/// println!("{}", reply);
///
/// client.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    topology: Arc<dyn Topology>,
    dispatcher: Arc<dyn Dispatcher>,
    cursor_manager: Arc<CursorManager>,
    shut_down: AtomicBool,
}

impl std::fmt::Debug for ClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientInner")
            .field("cursor_manager", &self.cursor_manager)
            .field("shut_down", &self.shut_down)
            .finish()
    }
}

impl Client {
    /// Creates a new `Client` over the given topology and transport.
    ///
    /// The cursor reaper is not started; see [`Client::start_cursor_reaper`].
    pub fn new(
        topology: Arc<dyn Topology>,
        dispatcher: Arc<dyn Dispatcher>,
        options: ClientOptions,
    ) -> Self {
        let cursor_manager = Arc::new(CursorManager::new(
            topology.clone(),
            dispatcher.clone(),
            options.kill_cursors_frequency(),
        ));

        Self {
            inner: Arc::new(ClientInner {
                topology,
                dispatcher,
                cursor_manager,
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// Runs a database-level command against `server` and returns the server's reply.
    ///
    /// A reply with `ok: 0` is returned as an
    /// [`ErrorKind::Command`](crate::error::ErrorKind::Command) error.
    pub async fn run_command(
        &self,
        db: impl AsRef<str>,
        command: Document,
        options: impl Into<Option<RunCommandOptions>>,
        server: &ServerAddress,
    ) -> Result<Document> {
        let operation = RunCommand::new(db.as_ref().to_string(), command, options.into())?;
        self.execute_operation(operation, server).await
    }

    /// Runs an aggregation over the collection `ns` on `server` and returns a cursor over its
    /// results.
    pub async fn aggregate(
        &self,
        ns: Namespace,
        pipeline: impl IntoIterator<Item = Document>,
        options: impl Into<Option<AggregateOptions>>,
        server: &ServerAddress,
    ) -> Result<Cursor> {
        self.aggregate_common(ns.into(), pipeline, options.into(), server)
            .await
    }

    /// Runs a database-level aggregation (`aggregate: 1`), such as one starting with
    /// `$currentOp`, on `server` and returns a cursor over its results.
    pub async fn aggregate_database(
        &self,
        db: impl AsRef<str>,
        pipeline: impl IntoIterator<Item = Document>,
        options: impl Into<Option<AggregateOptions>>,
        server: &ServerAddress,
    ) -> Result<Cursor> {
        self.aggregate_common(
            db.as_ref().to_string().into(),
            pipeline,
            options.into(),
            server,
        )
        .await
    }

    async fn aggregate_common(
        &self,
        target: AggregateTarget,
        pipeline: impl IntoIterator<Item = Document>,
        options: Option<AggregateOptions>,
        server: &ServerAddress,
    ) -> Result<Cursor> {
        let aggregate = Aggregate::new(target, pipeline, options);
        let spec = self.execute_operation(aggregate, server).await?;
        Ok(Cursor::new(self.clone(), spec))
    }

    /// Starts the background task that sends the kills scheduled by abandoned cursors. Calling
    /// this while the task is already running has no effect.
    ///
    /// This must be called from within a tokio runtime.
    pub fn start_cursor_reaper(&self) {
        self.inner.cursor_manager.start();
    }

    /// Stops the cursor reaper and sends any kills still queued. Commands run after shutdown
    /// return an [`ErrorKind::Shutdown`](crate::error::ErrorKind::Shutdown) error.
    pub async fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        self.inner.cursor_manager.stop().await;
        self.inner.cursor_manager.flush().await;
    }

    /// The registry of this client's live cursors and their pending kills.
    pub fn cursor_manager(&self) -> &Arc<CursorManager> {
        &self.inner.cursor_manager
    }

    pub(crate) fn topology(&self) -> &dyn Topology {
        self.inner.topology.as_ref()
    }

    pub(crate) fn dispatcher(&self) -> &dyn Dispatcher {
        self.inner.dispatcher.as_ref()
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }
}
