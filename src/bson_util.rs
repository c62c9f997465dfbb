use crate::bson::{Bson, Document};

/// Coerce numeric types into an `i64` if it would be lossless to do so. If this Bson is not numeric
/// or the conversion would be lossy (e.g. 1.5 -> 1), this returns `None`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn get_int(val: &Bson) -> Option<i64> {
    match *val {
        Bson::Int32(i) => Some(i64::from(i)),
        Bson::Int64(i) => Some(i),
        Bson::Double(f) if (f - (f as i64 as f64)).abs() <= f64::EPSILON => Some(f as i64),
        _ => None,
    }
}

pub(crate) fn to_bson_array(docs: &[Document]) -> Bson {
    Bson::Array(docs.iter().map(|doc| Bson::Document(doc.clone())).collect())
}

pub(crate) fn first_key(document: &Document) -> Option<&str> {
    document.keys().next().map(String::as_str)
}

/// Whether the reply to a command reports success (i.e. `ok: 1`).
pub(crate) fn is_ok(reply: &Document) -> bool {
    reply.get("ok").and_then(get_int) == Some(1)
}

#[cfg(test)]
mod test {
    use crate::bson::{doc, Bson};

    use super::{first_key, get_int, is_ok};

    #[test]
    fn get_int_is_lossless() {
        assert_eq!(get_int(&Bson::Int32(3)), Some(3));
        assert_eq!(get_int(&Bson::Double(1.0)), Some(1));
        assert_eq!(get_int(&Bson::Double(1.5)), None);
        assert_eq!(get_int(&Bson::String("1".into())), None);
    }

    #[test]
    fn ok_field() {
        assert!(is_ok(&doc! { "ok": 1.0 }));
        assert!(is_ok(&doc! { "ok": 1 }));
        assert!(!is_ok(&doc! { "ok": 0 }));
        assert!(!is_ok(&doc! {}));
    }

    #[test]
    fn first_key_is_command_name() {
        assert_eq!(first_key(&doc! { "aggregate": "c", "pipeline": [] }), Some("aggregate"));
        assert_eq!(first_key(&doc! {}), None);
    }
}
