use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use offsync_core::models::{
    ChangeAction, ChangeId, ChangeStatus, Conflict, ConflictLogEntry, ConflictStrategy,
    FailureKind, Resolution, SyncResult, SyncStatusCounts, TempIdRemap,
};
use offsync_core::{EngineConfig, SyncService};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::cli::{Cli, Commands, StrategyArg};
use crate::commands::common::{
    format_conflict_lines, format_drain_summary, format_relative_time, format_result_lines,
    format_status_line, format_timestamp, normalize_user_id, resolve_db_path, value_preview,
};
use crate::commands::drain::run_drain;
use crate::commands::enqueue::{build_change, parse_payload, run_enqueue, EnqueueArgs};
use crate::error::CliError;

fn enqueue_args(action: ChangeAction, payload: &str) -> EnqueueArgs {
    EnqueueArgs {
        user: " user-1 ".to_string(),
        resource: "earnings".to_string(),
        action,
        payload: payload.to_string(),
        client: "laptop".to_string(),
        captured_at: None,
    }
}

#[test]
fn drain_requires_strategy() {
    assert!(Cli::try_parse_from(["offsync", "drain", "--user", "u1"]).is_err());

    let cli = Cli::try_parse_from(["offsync", "drain", "--user", "u1", "--strategy", "last-write-wins"])
        .unwrap();
    match cli.command {
        Commands::Drain { strategy, .. } => {
            assert_eq!(strategy, StrategyArg::LastWriteWins);
            assert_eq!(
                ConflictStrategy::from(strategy),
                ConflictStrategy::LastWriteWins
            );
        }
        _ => panic!("expected drain command"),
    }
}

#[test]
fn unknown_strategy_is_rejected() {
    assert!(
        Cli::try_parse_from(["offsync", "retry", "--user", "u1", "--strategy", "newest"]).is_err()
    );
}

#[test]
fn resolve_db_path_prefers_cli_then_config() {
    let config = EngineConfig {
        db_path: Some(PathBuf::from("/from/env.db")),
        ..EngineConfig::default()
    };

    assert_eq!(
        resolve_db_path(Some(PathBuf::from("/from/cli.db")), &config),
        PathBuf::from("/from/cli.db")
    );
    assert_eq!(resolve_db_path(None, &config), PathBuf::from("/from/env.db"));
    assert!(resolve_db_path(None, &EngineConfig::default()).ends_with("offsync/offsync.db"));
}

#[test]
fn normalize_user_id_rejects_blank() {
    assert_eq!(normalize_user_id("  u1 ").unwrap(), "u1");
    assert!(matches!(normalize_user_id("   "), Err(CliError::EmptyUserId)));
}

#[test]
fn parse_payload_splits_identity_and_fields() {
    let payload = parse_payload(r#"{"id": "rec-1", "tempId": "tmp-1", "amount": 12}"#).unwrap();
    assert_eq!(payload.id.as_deref(), Some("rec-1"));
    assert_eq!(payload.temp_id.as_deref(), Some("tmp-1"));
    assert_eq!(payload.fields.get("amount"), Some(&json!(12)));
}

#[test]
fn parse_payload_rejects_non_objects() {
    assert!(matches!(parse_payload("[1, 2]"), Err(CliError::InvalidPayload(_))));
    assert!(matches!(parse_payload("{not json"), Err(CliError::InvalidPayload(_))));
}

#[test]
fn build_change_requires_target_for_update() {
    let err = build_change(&enqueue_args(ChangeAction::Update, r#"{"amount": 1}"#)).unwrap_err();
    assert!(err.to_string().contains("\"id\""));

    let mut args = enqueue_args(ChangeAction::Create, r#"{"amount": 1}"#);
    args.captured_at = Some(1_000);
    let change = build_change(&args).unwrap();
    assert_eq!(change.user_id, "user-1");
    assert_eq!(change.enqueued_at, Some(1_000));
}

#[test]
fn format_result_lines_show_outcomes() {
    let ok_id = ChangeId::new();
    let failed_id = ChangeId::new();
    let mut conflict = Conflict::new("amount", json!(150), json!(100));
    conflict.resolution = Some(Resolution::Server);

    let results = vec![
        SyncResult::succeeded(ok_id)
            .with_conflicts(vec![conflict], true)
            .with_remap(Some(TempIdRemap {
                temp_id: "tmp-1".to_string(),
                server_id: "srv-1".to_string(),
            })),
        SyncResult::failed(failed_id, FailureKind::NotFound, "earnings record x"),
    ];

    let lines = format_result_lines(&results);
    assert_eq!(
        lines[0],
        format!("{ok_id}  ok      conflicts=amount (needs review)  tmp-1 -> srv-1")
    );
    assert_eq!(
        lines[1],
        format!("{failed_id}  FAILED  NotFound: earnings record x")
    );
    assert_eq!(
        format_drain_summary(&results),
        "Processed 2 change(s): 1 ok, 1 failed, 1 with conflicts"
    );
}

#[test]
fn format_status_line_lists_counts() {
    let counts = SyncStatusCounts {
        pending: 1,
        completed: 2,
        failed: 3,
        total: 6,
    };
    assert_eq!(
        format_status_line(&counts),
        "pending=1  completed=2  failed=3  total=6"
    );
}

#[test]
fn format_conflict_lines_flag_review() {
    let entry = ConflictLogEntry {
        id: 1,
        change_id: "c1".to_string(),
        user_id: "u1".to_string(),
        resource_type: "earnings".to_string(),
        record_id: "r1".to_string(),
        field: "amount".to_string(),
        client_value: json!(150),
        server_value: json!(100),
        resolution: Resolution::Server,
        strategy: ConflictStrategy::Manual,
        needs_review: true,
        resolved_at: 0,
    };

    assert_eq!(
        format_conflict_lines(&[entry]),
        vec![
            "1970-01-01 00:00:00 UTC  manual           earnings/r1  amount: client=150 server=100 -> server  [review]"
                .to_string()
        ]
    );
}

#[test]
fn value_preview_truncates_long_values() {
    assert_eq!(value_preview(&json!("short")), "\"short\"");
    let long = value_preview(&json!("x".repeat(100)));
    assert_eq!(long.chars().count(), 40);
    assert!(long.ends_with("..."));
}

#[test]
fn format_timestamp_and_relative_time() {
    assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
    assert_eq!(format_relative_time(1_000, 30_000), "just now");
    assert_eq!(format_relative_time(0, 5 * 60_000), "5m ago");
    assert_eq!(format_relative_time(0, 3 * 3_600_000), "3h ago");
    assert_eq!(format_relative_time(0, 2 * 86_400_000), "2d ago");
}

#[tokio::test(flavor = "current_thread")]
async fn enqueue_and_drain_through_commands() {
    let db_path = unique_test_db_path();
    let config = EngineConfig::default();

    run_enqueue(
        &enqueue_args(ChangeAction::Create, r#"{"tempId": "tmp-1", "amount": 25}"#),
        &config,
        &db_path,
    )
    .await
    .unwrap();
    run_drain("user-1", ConflictStrategy::ClientWins, true, &config, &db_path)
        .await
        .unwrap();

    {
        let service = SyncService::open_path(&db_path, &config).await.unwrap();
        let changes = service.list_changes("user-1", None, 10).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].status, ChangeStatus::Completed);
        assert!(changes[0].server_id.is_some());

        let records = service
            .list_records("earnings", "user-1", 10)
            .await
            .unwrap();
        assert_eq!(records[0].fields.get("amount"), Some(&json!(25)));
    }

    cleanup_db_files(&db_path);
}

fn unique_test_db_path() -> PathBuf {
    static NEXT_TEST_DB_ID: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let sequence = NEXT_TEST_DB_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("offsync-cli-test-{timestamp}-{sequence}.db"))
}

fn cleanup_db_files(path: &PathBuf) {
    // libsql can keep file handles alive briefly after drop on Windows
    if cfg!(windows) {
        return;
    }

    let _ = std::fs::remove_file(path);
    for suffix in ["-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}
