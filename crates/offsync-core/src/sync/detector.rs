//! Conflict detection between a queued change and the current server record

use crate::models::{is_bookkeeping_field, Conflict, PendingChange, ServerRecord};

/// Fields where the change disagrees with a server record written after the
/// client's base state.
///
/// Returns an empty list when the server is not newer than `enqueued_at`, even
/// if values differ: the client's view was current and its values apply as-is.
pub fn detect_conflicts(server: &ServerRecord, change: &PendingChange) -> Vec<Conflict> {
    if server.updated_at <= change.enqueued_at {
        return Vec::new();
    }

    change
        .payload
        .fields
        .iter()
        .filter(|(field, _)| !is_bookkeeping_field(field))
        .filter(|(field, client_value)| server.field(field) != *client_value)
        .map(|(field, client_value)| {
            Conflict::new(field.clone(), client_value.clone(), server.field(field).clone())
        })
        .collect()
}
