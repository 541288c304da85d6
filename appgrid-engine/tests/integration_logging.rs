//! Integration tests for activity logging

use appgrid_engine::{
    directory::CreateDirectory,
    field::CreateField,
    record::{CreateRecord, DeleteRecord, GetRecord, UpdateRecord},
    DirectoryId, EngineConfig, EngineContext, EngineOperationProcessor, RecordId,
};
use appgrid_fields::FieldDef;
use serde_json::Map;
use tempfile::TempDir;

#[test_log::test(tokio::test)]
async fn test_activity_logging_end_to_end() {
    let temp = TempDir::new().unwrap();
    let ctx = EngineContext::new(temp.path());
    let processor = EngineOperationProcessor::with_actor("test-user[session123]");

    let dir = processor
        .process(&CreateDirectory::new("app", "crm", "Contacts"), &ctx)
        .await
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    processor
        .process(&CreateField::new(dir.as_str(), FieldDef::new("name", "text")), &ctx)
        .await
        .unwrap();

    let record = processor
        .process(
            &CreateRecord::new(dir.as_str(), Map::new()).with_prop("name", "Ada"),
            &ctx,
        )
        .await
        .unwrap();
    let id = record["id"].as_str().unwrap().to_string();

    processor
        .process(
            &UpdateRecord::new(dir.as_str(), id.as_str(), 1).with_prop("name", "Ada L."),
            &ctx,
        )
        .await
        .unwrap();

    // Reads are not logged
    processor
        .process(&GetRecord::new(dir.as_str(), id.as_str()), &ctx)
        .await
        .unwrap();

    // Failures are logged too
    let conflict = processor
        .process(
            &UpdateRecord::new(dir.as_str(), id.as_str(), 1).with_prop("name", "stale"),
            &ctx,
        )
        .await;
    assert!(conflict.unwrap_err().is_retryable());

    let entries = ctx.read_activity(None).await.unwrap();
    let ops: Vec<&str> = entries.iter().map(|e| e.op.as_str()).collect();
    assert_eq!(
        ops,
        vec![
            "update record",
            "update record",
            "create record",
            "create field",
            "create directory"
        ]
    );
    assert!(entries[0].output["error"]
        .as_str()
        .unwrap()
        .contains("version conflict"));
    assert!(entries
        .iter()
        .all(|e| e.actor.as_deref() == Some("test-user[session123]")));

    // Only successful writes reach the record's own log
    let record_log = ctx
        .read_record_log(&DirectoryId::from(dir.as_str()), &RecordId::from(id.as_str()), None)
        .await
        .unwrap();
    assert_eq!(record_log.len(), 2);
    assert_eq!(record_log[0].op, "update record");
    assert_eq!(record_log[0].output["version"], 2);
    assert_eq!(record_log[1].op, "create record");
}

#[test_log::test(tokio::test)]
async fn test_hard_delete_leaves_only_activity() {
    let temp = TempDir::new().unwrap();
    let ctx = EngineContext::new(temp.path());
    let processor = EngineOperationProcessor::new();

    let dir = processor
        .process(&CreateDirectory::new("app", "m", "Notes"), &ctx)
        .await
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let id = processor
        .process(&CreateRecord::new(dir.as_str(), Map::new()), &ctx)
        .await
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    processor
        .process(&DeleteRecord::new(dir.as_str(), id.as_str()).hard(), &ctx)
        .await
        .unwrap();

    let dir_id = DirectoryId::from(dir.as_str());
    let record_id = RecordId::from(id.as_str());
    assert!(!ctx.record_log_path(&dir_id, &record_id).exists());

    let entries = ctx.read_activity(Some(1)).await.unwrap();
    assert_eq!(entries[0].op, "delete record");
    assert!(entries[0].actor.is_none());
}

#[test_log::test(tokio::test)]
async fn test_activity_log_can_be_disabled() {
    let temp = TempDir::new().unwrap();
    let config = EngineConfig {
        activity_log: false,
        ..EngineConfig::default()
    };
    let ctx = EngineContext::with_config(temp.path(), config);
    let processor = EngineOperationProcessor::with_actor("bot");

    processor
        .process(&CreateDirectory::new("app", "m", "Quiet"), &ctx)
        .await
        .unwrap();

    assert!(ctx.read_activity(None).await.unwrap().is_empty());
    assert!(!ctx.activity_path().exists());
}
