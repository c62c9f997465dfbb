//! This crate contains the cursor lifecycle and command construction core of a MongoDB driver.
//! It uses the [`bson`] crate for BSON support and [`tokio`] for its background work.
//!
//! The crate does not open sockets or discover servers itself. A [`Client`] is built from two
//! collaborators supplied by the application:
//!
//! - a [`Topology`](sdam::Topology), which reports what each server currently supports. The
//!   in-memory [`TopologyDescription`](sdam::TopologyDescription) can be fed `hello` replies
//!   from whatever monitors the deployment.
//! - a [`Dispatcher`], which performs the round trip for a framed [`Message`](wire::Message).
//!
//! # Command construction
//!
//! Every command starts as a [`CommandIntent`] and is adapted to the server it is sent to by
//! [`build_selector`]: cursor options are removed for servers that predate the command protocol,
//! a write concern is kept only where the server accepts one and the command actually writes, and
//! commands sent to a mongos carry their read preference in a `$query`/`$readPreference`
//! envelope.
//!
//! # Cursors
//!
//! [`Client::aggregate`] returns a [`Cursor`]. A cursor that is closed or dropped before the
//! server has returned all of its results schedules a `killCursors` for it with the client's
//! [`CursorManager`]. Kills are batched per server and sent by a background reaper, started with
//! [`Client::start_cursor_reaper`] and stopped with [`Client::shutdown`].
//!
//! ```rust,no_run
//! # use mongodb_driver_core::{bson::doc, error::Result, options::ServerAddress, Client, Namespace};
//! # async fn run(client: Client) -> Result<()> {
//! let server = ServerAddress::parse("localhost:27017")?;
//! let mut cursor = client
//!     .aggregate(
//!         Namespace::new("db", "coll"),
//!         [doc! { "$match": { "x": 1 } }],
//!         None,
//!         &server,
//!     )
//!     .await?;
//!
//! while let Some(document) = cursor.next().await {
//!     println!("{}", document?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! The crate emits [`tracing`] events at the `debug` level: command execution under the
//! `mongodb::command` target, and cursor kills and reaper lifecycle under `mongodb::cursor`.

#![warn(missing_docs)]
#![cfg_attr(docsrs, warn(rustdoc::missing_crate_level_docs))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod options;

pub use ::bson;

mod bson_util;
mod client;
mod concern;
mod cursor;
pub mod error;
mod hello;
mod namespace;
mod operation;
mod read_preference;
pub(crate) mod runtime;
pub mod sdam;
mod serde_util;
mod trace;
pub mod wire;


pub use crate::{
    client::{Client, Dispatcher},
    cursor::{Cursor, CursorManager, KillCursorsSpec},
    hello::HelloCommandResponse,
    namespace::Namespace,
    operation::{build_selector, CommandIntent},
};
