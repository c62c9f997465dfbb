use crate::{
    bson::{Bson, Document},
    bson_util,
    operation::{is_out_or_merge, CommandIntent},
    sdam::ServerCapabilities,
};

/// Derives the selector to put on the wire for `intent` when sending it to a server with the given
/// capabilities.
///
/// The selector is adapted in a fixed order, each step working on the output of the previous one:
///
/// 1. The `cursor` option is removed unless the server accepts cursor options on commands.
/// 2. The `writeConcern` field is removed unless the server accepts a write concern on commands
///    and, for aggregations, the pipeline ends in a `$out` or `$merge` stage.
/// 3. When sending to a mongos with a read preference it must see explicitly, the selector is
///    wrapped as `{ $query: <selector>, $readPreference: <read preference> }`.
///
/// The intent itself is never modified.
pub fn build_selector(
    intent: &CommandIntent,
    capabilities: &ServerCapabilities,
    is_routing_target: bool,
) -> Document {
    let selector = base_selector(intent);
    let selector = filter_cursor_option(selector, capabilities);
    let selector = filter_write_concern(selector, intent, capabilities);
    wrap_for_routing_node(selector, intent, is_routing_target)
}

fn base_selector(intent: &CommandIntent) -> Document {
    let mut selector = intent.selector().clone();

    if let Some(pipeline) = intent.pipeline() {
        if !selector.contains_key("pipeline") {
            selector.insert("pipeline", bson_util::to_bson_array(pipeline));
        }
    }

    if let Some(write_concern) = intent.write_concern() {
        if !write_concern.is_empty() {
            selector.insert("writeConcern", write_concern.to_document());
        }
    }

    selector
}

fn filter_cursor_option(mut selector: Document, capabilities: &ServerCapabilities) -> Document {
    if !capabilities.supports_command_protocol {
        selector.remove("cursor");
    }
    selector
}

fn filter_write_concern(
    mut selector: Document,
    intent: &CommandIntent,
    capabilities: &ServerCapabilities,
) -> Document {
    let writes = intent.pipeline().map(is_out_or_merge).unwrap_or(true);
    if !(capabilities.supports_write_concern_on_command && writes) {
        selector.remove("writeConcern");
    }
    selector
}

fn wrap_for_routing_node(
    selector: Document,
    intent: &CommandIntent,
    is_routing_target: bool,
) -> Document {
    if !is_routing_target {
        return selector;
    }

    let read_preference = match intent.read_preference().and_then(|rp| rp.to_mongos()) {
        Some(read_preference) => read_preference,
        None => return selector,
    };

    let mut wrapped = if matches!(selector.get("$query"), Some(Bson::Document(_))) {
        selector
    } else {
        let mut wrapped = Document::new();
        wrapped.insert("$query", selector);
        wrapped
    };
    wrapped.insert("$readPreference", read_preference);
    wrapped
}
