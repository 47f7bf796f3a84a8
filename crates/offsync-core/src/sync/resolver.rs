//! Strategy-driven field merge for detected conflicts

use serde_json::{Map, Value};

use crate::models::{Conflict, ConflictStrategy, PendingChange, Resolution, ServerRecord};

/// Field values to persist for `change`, resolving each conflict per `strategy`.
///
/// Every writable field of the change appears in the result: non-conflicting
/// fields carry the client value, conflicting fields the side the strategy
/// picks. Each conflict's `resolution` is filled in.
pub fn resolve_conflicts(
    server: &ServerRecord,
    change: &PendingChange,
    conflicts: &mut [Conflict],
    strategy: ConflictStrategy,
) -> Map<String, Value> {
    let resolution = match strategy {
        // last-write-wins keeps the incoming client intent although the server
        // holds the later write. Awaiting product confirmation before changing.
        ConflictStrategy::ClientWins | ConflictStrategy::LastWriteWins => Resolution::Client,
        ConflictStrategy::ServerWins | ConflictStrategy::Manual => Resolution::Server,
    };

    let mut merged = change.payload.writable_fields();
    for conflict in conflicts.iter_mut() {
        conflict.resolution = Some(resolution);
        let value = match resolution {
            Resolution::Client => conflict.client_value.clone(),
            Resolution::Server => server.field(&conflict.field).clone(),
        };
        merged.insert(conflict.field.clone(), value);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChangeAction, ChangeId, ChangePayload, ChangeStatus};
    use crate::sync::detect_conflicts;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn server() -> ServerRecord {
        ServerRecord {
            id: "rec-1".to_string(),
            user_id: "user-1".to_string(),
            fields: json!({"amount": 100, "label": "rent"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
            created_at: 0,
            updated_at: 2_000,
            sync_version: 3,
        }
    }

    fn change() -> PendingChange {
        PendingChange {
            id: ChangeId::new(),
            user_id: "user-1".to_string(),
            resource_type: "earnings".to_string(),
            action: ChangeAction::Update,
            payload: ChangePayload::for_record("rec-1")
                .with_field("amount", 150)
                .with_field("memo", "bonus")
                .with_field("syncVersion", 1),
            client_id: "device-a".to_string(),
            enqueued_at: 1_000,
            status: ChangeStatus::Pending,
            error: None,
            processed_at: None,
            server_id: None,
        }
    }

    fn resolve(strategy: ConflictStrategy) -> (Map<String, Value>, Vec<Conflict>) {
        let record = server();
        let queued = change();
        let mut conflicts = detect_conflicts(&record, &queued);
        let merged = resolve_conflicts(&record, &queued, &mut conflicts, strategy);
        (merged, conflicts)
    }

    #[test]
    fn test_client_wins_takes_client_values() {
        let (merged, conflicts) = resolve(ConflictStrategy::ClientWins);
        assert_eq!(merged["amount"], json!(150));
        assert_eq!(merged["memo"], json!("bonus"));
        assert!(conflicts
            .iter()
            .all(|conflict| conflict.resolution == Some(Resolution::Client)));
    }

    #[test]
    fn test_server_wins_keeps_server_values() {
        let (merged, conflicts) = resolve(ConflictStrategy::ServerWins);
        assert_eq!(merged["amount"], json!(100));
        // server has no memo, so the conflict resolves to null
        assert_eq!(merged["memo"], Value::Null);
        assert!(conflicts
            .iter()
            .all(|conflict| conflict.resolution == Some(Resolution::Server)));
    }

    #[test]
    fn test_client_and_server_wins_are_opposites() {
        let (client, conflicts) = resolve(ConflictStrategy::ClientWins);
        let (server_side, _) = resolve(ConflictStrategy::ServerWins);

        for conflict in &conflicts {
            assert_eq!(client[&conflict.field], conflict.client_value);
            assert_eq!(server_side[&conflict.field], conflict.server_value);
            assert_ne!(client[&conflict.field], server_side[&conflict.field]);
        }
    }

    #[test]
    fn test_last_write_wins_prefers_client_intent() {
        let (lww, lww_conflicts) = resolve(ConflictStrategy::LastWriteWins);
        let (client, _) = resolve(ConflictStrategy::ClientWins);
        assert_eq!(lww, client);
        assert!(lww_conflicts
            .iter()
            .all(|conflict| conflict.resolution == Some(Resolution::Client)));
    }

    #[test]
    fn test_manual_never_overwrites_server_value() {
        let record = server();
        let (merged, conflicts) = resolve(ConflictStrategy::Manual);
        for conflict in &conflicts {
            assert_eq!(&merged[&conflict.field], record.field(&conflict.field));
        }
    }

    #[test]
    fn test_merged_covers_every_touched_field_without_bookkeeping() {
        for strategy in ConflictStrategy::ALL {
            let (merged, _) = resolve(strategy);
            let mut keys = merged.keys().cloned().collect::<Vec<_>>();
            keys.sort();
            assert_eq!(keys, vec!["amount".to_string(), "memo".to_string()]);
        }
    }
}
