use pretty_assertions::assert_eq;

use crate::{
    bson::doc,
    error::ErrorKind,
    options::{ReadPreference, RunCommandOptions, WriteConcern},
    sdam::ServerDescription,
    test::util::{
        address,
        client,
        legacy_hello,
        modern_hello,
        mongos_hello,
        topology,
        RecordingDispatcher,
    },
    wire::Message,
    Namespace,
};

#[tokio::test]
async fn run_command_returns_reply() {
    let server = address("a:27017");
    let dispatcher = RecordingDispatcher::new();
    let client = client(topology(&[(&server, modern_hello())]), dispatcher.clone());

    dispatcher.push_reply(Ok(doc! { "ok": 1, "n": 3 }));
    let reply = client
        .run_command("db", doc! { "count": "coll" }, None, &server)
        .await
        .unwrap();
    assert_eq!(reply, doc! { "ok": 1, "n": 3 });
    assert_eq!(
        dispatcher.sent(),
        vec![(
            server.clone(),
            Message::Command {
                target_db: "db".to_string(),
                selector: doc! { "count": "coll" },
            }
        )]
    );
}

#[tokio::test]
async fn command_failures_are_propagated() {
    let server = address("a:27017");
    let dispatcher = RecordingDispatcher::new();
    let client = client(topology(&[(&server, modern_hello())]), dispatcher.clone());

    dispatcher.push_reply(Ok(doc! {
        "ok": 0,
        "code": 40324,
        "codeName": "Location40324",
        "errmsg": "Unrecognized pipeline stage name: '$invalid'",
    }));
    let error = client
        .aggregate(
            Namespace::new("db", "coll"),
            [doc! { "$invalid": {} }],
            None,
            &server,
        )
        .await
        .unwrap_err();
    assert!(error.is_command_error());
    assert_eq!(error.code(), Some(40324));

    dispatcher.push_reply(Err(std::io::ErrorKind::ConnectionReset.into()));
    let error = client
        .run_command("db", doc! { "ping": 1 }, None, &server)
        .await
        .unwrap_err();
    assert!(error.is_network_error());

    // Nothing is retried.
    assert_eq!(dispatcher.sent().len(), 2);
}

#[tokio::test]
async fn empty_command_is_rejected() {
    let server = address("a:27017");
    let dispatcher = RecordingDispatcher::new();
    let client = client(topology(&[(&server, modern_hello())]), dispatcher.clone());

    let error = client
        .run_command("db", doc! {}, None, &server)
        .await
        .unwrap_err();
    assert!(matches!(*error.kind, ErrorKind::InvalidArgument { .. }));

    let error = client
        .run_command("", doc! { "ping": 1 }, None, &server)
        .await
        .unwrap_err();
    assert!(matches!(*error.kind, ErrorKind::InvalidArgument { .. }));
    assert!(dispatcher.sent().is_empty());
}

#[tokio::test]
async fn commands_follow_current_capabilities() {
    let server = address("a:27017");
    let dispatcher = RecordingDispatcher::new();
    let topology = topology(&[(&server, legacy_hello())]);
    let client = client(topology.clone(), dispatcher.clone());

    let options = RunCommandOptions::builder()
        .write_concern(WriteConcern::majority())
        .read_preference(ReadPreference::Secondary { options: None })
        .build();

    client
        .run_command("db", doc! { "create": "coll" }, options.clone(), &server)
        .await
        .unwrap();

    topology.update(ServerDescription::from_hello_reply(server.clone(), mongos_hello()).unwrap());
    client
        .run_command("db", doc! { "create": "coll" }, options.clone(), &server)
        .await
        .unwrap();

    topology.update(ServerDescription::from_hello_reply(server.clone(), modern_hello()).unwrap());
    client
        .run_command("db", doc! { "create": "coll" }, options, &server)
        .await
        .unwrap();

    assert_eq!(
        dispatcher.commands(),
        vec![
            doc! { "create": "coll" },
            doc! {
                "$query": { "create": "coll", "writeConcern": { "w": "majority" } },
                "$readPreference": { "mode": "secondary" },
            },
            doc! { "create": "coll", "writeConcern": { "w": "majority" } },
        ]
    );
}

#[tokio::test]
async fn aggregate_database() {
    let server = address("a:27017");
    let dispatcher = RecordingDispatcher::new();
    let client = client(topology(&[(&server, modern_hello())]), dispatcher.clone());

    dispatcher.push_reply(Ok(doc! {
        "cursor": { "id": 0_i64, "ns": "admin.$cmd.aggregate", "firstBatch": [{ "op": "query" }] },
        "ok": 1,
    }));
    let mut cursor = client
        .aggregate_database("admin", [doc! { "$currentOp": {} }], None, &server)
        .await
        .unwrap();

    assert_eq!(
        dispatcher.sent(),
        vec![(
            server.clone(),
            Message::Command {
                target_db: "admin".to_string(),
                selector: doc! {
                    "aggregate": 1,
                    "pipeline": [{ "$currentOp": {} }],
                    "cursor": {},
                },
            }
        )]
    );
    assert_eq!(cursor.namespace(), &Namespace::new("admin", "$cmd.aggregate"));
    assert_eq!(cursor.next().await.unwrap().unwrap(), doc! { "op": "query" });
    assert!(cursor.next().await.is_none());
}

#[tokio::test]
async fn shutdown_flushes_and_rejects_commands() {
    let server = address("a:27017");
    let dispatcher = RecordingDispatcher::new();
    let client = client(topology(&[(&server, modern_hello())]), dispatcher.clone());
    client.start_cursor_reaper();

    dispatcher.push_reply(Ok(doc! {
        "cursor": { "id": 42_i64, "ns": "db.coll", "firstBatch": [] },
        "ok": 1,
    }));
    let cursor = client
        .aggregate(Namespace::new("db", "coll"), [doc! { "$match": {} }], None, &server)
        .await
        .unwrap();
    drop(cursor);

    client.shutdown().await;
    assert!(!client.cursor_manager().is_running());
    assert_eq!(client.cursor_manager().pending_kills(&server), 0);
    assert_eq!(
        dispatcher.commands().last(),
        Some(&doc! { "killCursors": "coll", "cursors": [42_i64] })
    );

    let error = client
        .run_command("db", doc! { "ping": 1 }, None, &server)
        .await
        .unwrap_err();
    assert!(matches!(*error.kind, ErrorKind::Shutdown));
}

#[tokio::test]
async fn cursor_closed_after_shutdown_is_not_queued() {
    let server = address("a:27017");
    let dispatcher = RecordingDispatcher::new();
    let client = client(topology(&[(&server, modern_hello())]), dispatcher.clone());

    dispatcher.push_reply(Ok(doc! {
        "cursor": { "id": 42_i64, "ns": "db.coll", "firstBatch": [{ "_id": 1 }] },
        "ok": 1,
    }));
    let mut cursor = client
        .aggregate(Namespace::new("db", "coll"), [doc! { "$match": {} }], None, &server)
        .await
        .unwrap();

    client.shutdown().await;
    cursor.close();

    assert!(cursor.is_exhausted());
    assert!(!client.cursor_manager().is_active(42));
    assert_eq!(client.cursor_manager().pending_kills(&server), 0);
    assert_eq!(dispatcher.sent().len(), 1);
}
