mod manager;

use std::collections::VecDeque;

use crate::{
    bson::Document,
    error::Result,
    operation::GetMore,
    options::ServerAddress,
    Client,
    Namespace,
};

pub use self::manager::{CursorManager, KillCursorsSpec};

/// What a cursor handle needs to know to continue iterating a server cursor.
#[derive(Clone, Debug)]
pub(crate) struct CursorInformation {
    pub(crate) ns: Namespace,
    pub(crate) address: ServerAddress,
    pub(crate) id: i64,
    pub(crate) batch_size: Option<u32>,
}

/// The result of an operation that opened a cursor.
#[derive(Debug)]
pub(crate) struct CursorSpecification {
    pub(crate) info: CursorInformation,
    pub(crate) initial_buffer: VecDeque<Document>,
}

impl CursorSpecification {
    pub(crate) fn new(
        ns: Namespace,
        address: ServerAddress,
        id: i64,
        initial_buffer: VecDeque<Document>,
        batch_size: Option<u32>,
    ) -> Self {
        Self {
            info: CursorInformation {
                ns,
                address,
                id,
                batch_size,
            },
            initial_buffer,
        }
    }
}

/// A handle over the results of an aggregation.
///
/// Documents are buffered a batch at a time; [`next`](Cursor::next) requests the next batch from
/// the server once the buffer runs out.
///
/// While a cursor still has results on the server, its id is registered with the client's
/// [`CursorManager`]. Closing or dropping the handle before it is exhausted schedules a kill for
/// the server cursor, which the cursor reaper sends on its next flush. A cursor that was
/// iterated to the end needs no kill and schedules none.
#[derive(Debug)]
pub struct Cursor {
    client: Client,
    info: CursorInformation,
    buffer: VecDeque<Document>,
    exhausted: bool,
}

impl Cursor {
    pub(crate) fn new(client: Client, spec: CursorSpecification) -> Self {
        let exhausted = spec.info.id == 0;
        client.cursor_manager().register(spec.info.id);

        Self {
            client,
            info: spec.info,
            buffer: spec.initial_buffer,
            exhausted,
        }
    }

    /// Returns the next document, fetching another batch from the server if the buffered one has
    /// been consumed. Returns `None` once the results are exhausted.
    ///
    /// An error from the server ends the iteration; the cursor is considered exhausted after it.
    pub async fn next(&mut self) -> Option<Result<Document>> {
        loop {
            if let Some(document) = self.buffer.pop_front() {
                return Some(Ok(document));
            }
            if self.exhausted {
                return None;
            }

            let get_more = GetMore::new(&self.info);
            match self
                .client
                .execute_operation(get_more, &self.info.address)
                .await
            {
                Ok(result) => {
                    self.buffer = result.batch;
                    if result.exhausted {
                        self.mark_exhausted();
                    }
                }
                Err(error) => {
                    self.mark_exhausted();
                    return Some(Err(error));
                }
            }
        }
    }

    /// Releases the cursor. If it still has results on the server, a kill is scheduled for it,
    /// unless the client has been shut down. Any buffered documents are discarded. Closing a cursor more than once has no further
    /// effect, and dropping a cursor closes it.
    pub fn close(&mut self) {
        if self.exhausted {
            return;
        }

        // After shutdown nothing flushes the queue again.
        if !self.client.is_shut_down() {
            let spec = KillCursorsSpec::new(self.info.ns.clone(), [self.info.id]);
            self.client
                .cursor_manager()
                .schedule_kill(self.info.id, spec, &self.info.address);
        }
        self.buffer.clear();
        self.mark_exhausted();
    }

    fn mark_exhausted(&mut self) {
        if !self.exhausted {
            self.exhausted = true;
            self.client.cursor_manager().unregister(self.info.id);
        }
    }

    /// The id of the server cursor, or 0 if the server returned every result at once.
    pub fn id(&self) -> i64 {
        self.info.id
    }

    /// The server the cursor lives on.
    pub fn address(&self) -> &ServerAddress {
        &self.info.address
    }

    /// The namespace the cursor iterates.
    pub fn namespace(&self) -> &Namespace {
        &self.info.ns
    }

    /// Whether the server has no more results for this cursor. Buffered documents may remain.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.close();
    }
}
