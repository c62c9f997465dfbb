use std::time::Duration;

use pretty_assertions::assert_eq;

use crate::{
    bson::{doc, Document},
    error::ErrorKind,
    options::{Acknowledgment, WriteConcern},
};

#[test]
fn empty_write_concern() {
    assert!(WriteConcern::builder().build().is_empty());
    assert!(!WriteConcern::builder().journal(false).build().is_empty());
    assert!(!WriteConcern::nodes(1).is_empty());
}

#[test]
fn unacknowledged_journaled_write_concern_is_invalid() {
    let write_concern = WriteConcern::builder()
        .w(Acknowledgment::Nodes(0))
        .journal(true)
        .build();
    let error = write_concern.validate().unwrap_err();
    assert!(matches!(*error.kind, ErrorKind::InvalidArgument { .. }));

    WriteConcern::majority().validate().unwrap();
}

#[test]
fn write_concern_document() {
    assert_eq!(WriteConcern::nodes(2).to_document(), doc! { "w": 2 });
    assert_eq!(WriteConcern::majority().to_document(), doc! { "w": "majority" });

    let full = WriteConcern::builder()
        .w(Acknowledgment::Custom("dc".to_string()))
        .w_timeout(Duration::from_millis(500))
        .journal(true)
        .build();
    assert_eq!(
        full.to_document(),
        doc! { "w": "dc", "wtimeout": 500_i64, "j": true }
    );

    assert_eq!(WriteConcern::default().to_document(), Document::new());
}

#[test]
fn write_concern_deserializes_from_options() {
    let write_concern: WriteConcern =
        crate::bson::from_document(doc! { "w": "majority", "wtimeoutMS": 100, "journal": false })
            .unwrap();
    assert_eq!(write_concern.w, Some(Acknowledgment::Majority));
    assert_eq!(write_concern.w_timeout, Some(Duration::from_millis(100)));
    assert_eq!(write_concern.journal, Some(false));
}
