use std::{
    collections::{HashMap, HashSet},
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use tokio::sync::oneshot;

use crate::{
    bson_util,
    client::{options::DEFAULT_KILL_CURSORS_FREQUENCY, Dispatcher},
    error::{Error, Result},
    operation::KillCursors,
    options::ServerAddress,
    runtime::{self, AsyncJoinHandle},
    sdam::Topology,
    trace::{TracingRepresentation, CURSOR_TRACING_EVENT_TARGET},
    wire::Message,
    Namespace,
};

/// The cursors to kill with a single message, and the namespace they were opened on.
///
/// Two specs are considered the same kill if they name the same namespace and the same cursor ids
/// in the same order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KillCursorsSpec {
    /// The namespace the cursors were opened on.
    pub ns: Namespace,

    /// The ids of the cursors to kill.
    pub cursor_ids: Vec<i64>,
}

impl KillCursorsSpec {
    /// Creates a spec to kill the given cursors.
    pub fn new(ns: Namespace, cursor_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ns,
            cursor_ids: cursor_ids.into_iter().collect(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    active_cursors: HashSet<i64>,
    to_kill: HashMap<ServerAddress, HashSet<KillCursorsSpec>>,
}

/// Tracks the server cursors that are owned by a live [`Cursor`](crate::Cursor), and kills the
/// ones that were abandoned before being exhausted.
///
/// Kills are not sent when they are scheduled. They accumulate per server until the next
/// [`flush`](CursorManager::flush), which either the caller or the background reaper started by
/// [`start`](CursorManager::start) performs.
pub struct CursorManager {
    state: Mutex<State>,
    topology: Arc<dyn Topology>,
    dispatcher: Arc<dyn Dispatcher>,
    frequency: Duration,
    reaper: Mutex<Option<ReaperHandle>>,
}

#[derive(Debug)]
struct ReaperHandle {
    shutdown_sender: oneshot::Sender<()>,
    join_handle: AsyncJoinHandle<()>,
}

impl std::fmt::Debug for CursorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorManager")
            .field("state", &self.state)
            .field("frequency", &self.frequency)
            .field("reaper", &self.reaper)
            .finish()
    }
}

impl CursorManager {
    /// Creates a manager that looks up servers in `topology` and sends kills through
    /// `dispatcher`. Once started, the reaper flushes every `frequency`; a zero frequency falls
    /// back to the one second default.
    pub fn new(
        topology: Arc<dyn Topology>,
        dispatcher: Arc<dyn Dispatcher>,
        frequency: Duration,
    ) -> Self {
        Self {
            state: Default::default(),
            topology,
            dispatcher,
            frequency: if frequency.is_zero() {
                DEFAULT_KILL_CURSORS_FREQUENCY
            } else {
                frequency
            },
            reaper: Mutex::new(None),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reaper(&self) -> MutexGuard<'_, Option<ReaperHandle>> {
        self.reaper.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks a cursor as owned by a live handle. An absent or zero id means the server did not
    /// keep a cursor open, and is ignored.
    pub fn register(&self, cursor_id: impl Into<Option<i64>>) {
        match cursor_id.into() {
            None | Some(0) => {}
            Some(id) => {
                self.state().active_cursors.insert(id);
            }
        }
    }

    /// Marks a cursor as no longer owned by a live handle. Unregistering an unknown id does
    /// nothing.
    pub fn unregister(&self, cursor_id: i64) {
        self.state().active_cursors.remove(&cursor_id);
    }

    /// Whether a live handle currently owns the cursor.
    pub fn is_active(&self, cursor_id: i64) -> bool {
        self.state().active_cursors.contains(&cursor_id)
    }

    /// Queues `spec` to be sent to `server` on the next flush, provided `cursor_id` is still
    /// active. Returns whether the spec was queued; an inactive cursor or a spec that is already
    /// queued for that server is not queued again.
    pub fn schedule_kill(
        &self,
        cursor_id: i64,
        spec: KillCursorsSpec,
        server: &ServerAddress,
    ) -> bool {
        let mut state = self.state();
        if !state.active_cursors.contains(&cursor_id) {
            return false;
        }
        state.to_kill.entry(server.clone()).or_default().insert(spec)
    }

    /// The number of specs queued for `server`.
    pub fn pending_kills(&self, server: &ServerAddress) -> usize {
        self.state().to_kill.get(server).map_or(0, HashSet::len)
    }

    /// Sends every queued kill and returns how many of them the servers accepted.
    ///
    /// The queue is emptied before anything is sent, so kills scheduled while a flush is in
    /// progress are left for the next one. A kill that fails is logged and dropped; the server
    /// times out the cursor on its own.
    pub async fn flush(&self) -> usize {
        let to_kill = mem::take(&mut self.state().to_kill);

        let mut killed = 0;
        for (server, specs) in to_kill {
            for spec in specs {
                match self.kill(&server, &spec).await {
                    Ok(()) => {
                        killed += 1;
                        tracing::debug!(
                            target: CURSOR_TRACING_EVENT_TARGET,
                            namespace = %spec.ns,
                            cursorIds = ?spec.cursor_ids,
                            serverHost = server.host(),
                            serverPort = server.port_tracing_representation(),
                            "Killed cursors"
                        );
                    }
                    Err(error) => {
                        tracing::debug!(
                            target: CURSOR_TRACING_EVENT_TARGET,
                            namespace = %spec.ns,
                            cursorIds = ?spec.cursor_ids,
                            serverHost = server.host(),
                            serverPort = server.port_tracing_representation(),
                            failure = error.tracing_representation(),
                            "Failed to kill cursors"
                        );
                    }
                }
            }
        }
        killed
    }

    async fn kill(&self, server: &ServerAddress, spec: &KillCursorsSpec) -> Result<()> {
        let capabilities = self.topology.capabilities(server);
        let is_routing_target = self.topology.is_routing_node(server);
        let message = KillCursors::new(spec).build(&capabilities, is_routing_target)?;

        // Legacy kills have no reply to check.
        let expects_reply = matches!(message, Message::Command { .. });
        let reply = self.dispatcher.dispatch(message, server).await?;
        if expects_reply && !bson_util::is_ok(&reply) {
            return Err(Error::from_failed_reply(&reply));
        }
        Ok(())
    }

    /// Starts the background task that flushes the queued kills periodically. Starting a
    /// manager whose reaper is already running does nothing.
    ///
    /// This must be called from within a tokio runtime. The task holds only a weak reference to
    /// the manager, and exits on its own once the manager is dropped.
    pub fn start(self: &Arc<Self>) {
        let mut reaper = self.reaper();
        if reaper
            .as_ref()
            .is_some_and(|handle| !handle.join_handle.is_finished())
        {
            return;
        }

        let (shutdown_sender, shutdown_receiver) = oneshot::channel();
        let join_handle = runtime::spawn(reap(
            Arc::downgrade(self),
            self.frequency,
            shutdown_receiver,
        ));
        *reaper = Some(ReaperHandle {
            shutdown_sender,
            join_handle,
        });

        tracing::debug!(
            target: CURSOR_TRACING_EVENT_TARGET,
            frequencyMS = self.frequency.as_millis(),
            "Cursor reaper started"
        );
    }

    /// Stops the background reaper and waits for it to exit. A flush that is in progress is
    /// abandoned, and the kills it had not sent yet are dropped.
    pub async fn stop(&self) {
        let handle = self.reaper().take();
        if let Some(handle) = handle {
            let _ = handle.shutdown_sender.send(());
            let _ = handle.join_handle.await;
            tracing::debug!(
                target: CURSOR_TRACING_EVENT_TARGET,
                "Cursor reaper stopped"
            );
        }
    }

    /// Whether the background reaper is running.
    pub fn is_running(&self) -> bool {
        self.reaper()
            .as_ref()
            .is_some_and(|handle| !handle.join_handle.is_finished())
    }
}

async fn reap(
    manager: Weak<CursorManager>,
    frequency: Duration,
    mut shutdown_receiver: oneshot::Receiver<()>,
) {
    let mut interval = runtime::interval(frequency);

    loop {
        tokio::select! {
            _ = interval.tick() => {},
            // Either stop() was called or the manager (and with it the sender) was dropped.
            _ = &mut shutdown_receiver => break,
        }

        let Some(cursor_manager) = manager.upgrade() else {
            break;
        };

        tokio::select! {
            _ = cursor_manager.flush() => {},
            _ = &mut shutdown_receiver => break,
        }
    }
}
