//! Sequential, per-record rewrites after a schema change

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::types::{
    DirectoryId, MigrationReport, MigrationStep, PendingMigration, Record, RecordId, CATEGORY_KEY,
};
use appgrid_fields::{coerce, FieldDef, FieldProcessorRegistry};
use tracing::{debug, info, warn};

/// Apply `change` to every record of a directory, soft-deleted ones included.
///
/// `change` returns false when a record needs no rewrite. Each rewritten
/// record is written under its own lock with the version bumped. A record
/// that cannot be read or written is counted as failed and the batch moves on.
pub(crate) async fn migrate_records<F>(
    ctx: &EngineContext,
    directory: &DirectoryId,
    change: F,
) -> Result<MigrationReport>
where
    F: FnMut(&mut Record) -> bool,
{
    let ids = ctx.list_record_ids(directory).await?;
    migrate_ids(ctx, directory, ids, change).await
}

/// Apply `change` to the listed records only. Ids that no longer exist are skipped.
pub(crate) async fn migrate_ids<F>(
    ctx: &EngineContext,
    directory: &DirectoryId,
    ids: Vec<RecordId>,
    mut change: F,
) -> Result<MigrationReport>
where
    F: FnMut(&mut Record) -> bool,
{
    let mut report = MigrationReport::default();

    for id in ids {
        let _guard = match ctx.lock_record(directory, &id).await {
            Ok(guard) => guard,
            Err(e) => {
                warn!(directory = %directory, record = %id, error = %e, "migration could not lock record");
                report.record_failure(id);
                continue;
            }
        };

        let mut record = match ctx.read_record(directory, &id).await {
            Ok(record) => record,
            Err(EngineError::RecordNotFound { .. }) => {
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                warn!(directory = %directory, record = %id, error = %e, "migration could not read record");
                report.record_failure(id);
                continue;
            }
        };

        if !change(&mut record) {
            report.skipped += 1;
            continue;
        }

        record.touch();
        match ctx.write_record(&record).await {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                warn!(directory = %directory, record = %id, error = %e, "migration could not write record");
                report.record_failure(id);
            }
        }
    }

    debug!(
        directory = %directory,
        succeeded = report.succeeded,
        skipped = report.skipped,
        failed = report.failed,
        "records migrated"
    );
    Ok(report)
}

/// Rewrite one record for `step`. Returns false when the record needs nothing.
///
/// `target` is the field a moved value lands in; `None` means the field is
/// gone and the value is dropped.
pub(crate) fn apply_step(
    step: &MigrationStep,
    record: &mut Record,
    target: Option<&FieldDef>,
    registry: &FieldProcessorRegistry,
) -> bool {
    match step {
        MigrationStep::MoveValue { from, retype, .. } => {
            let Some(value) = record.props.remove(from) else {
                return false;
            };
            let Some(def) = target else {
                return true;
            };
            let value = if *retype {
                let coerced = coerce(registry, &value, def);
                if !coerced.converted {
                    debug!(record = %record.id, key = %def.key, "value replaced with zero value");
                }
                coerced.value
            } else {
                value
            };
            if !value.is_null() {
                record.props.insert(def.key.clone(), value);
            }
            true
        }
        MigrationStep::RemoveKey { key } => record.props.remove(key).is_some(),
        MigrationStep::ClearCategory { nodes } => {
            if record.category_path().iter().any(|id| nodes.contains(id)) {
                record.props.remove(CATEGORY_KEY);
                true
            } else {
                false
            }
        }
    }
}

/// Keep the records a batch could not rewrite so a retry can finish them.
///
/// Returns the pending migration's id, or `None` when the batch completed.
pub(crate) async fn remember_failures(
    ctx: &EngineContext,
    directory: &DirectoryId,
    step: MigrationStep,
    report: &MigrationReport,
) -> Result<Option<String>> {
    if report.is_complete() {
        return Ok(None);
    }
    let pending = PendingMigration::new(step, report.failed_ids.clone());
    let id = pending.id.clone();

    let mut all = ctx.read_pending_migrations(directory).await?;
    all.push(pending);
    ctx.write_pending_migrations(directory, &all).await?;

    info!(directory = %directory, migration = %id, records = report.failed, "migration left pending");
    Ok(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Directory, Props};
    use appgrid_fields::Value;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_migration_skips_unchanged_and_bumps_versions() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());
        let directory = Directory::new("a", "m", "D");
        ctx.create_directory_dirs(&directory.id).await.unwrap();
        ctx.write_directory(&directory).await.unwrap();

        let mut with_key = Props::new();
        with_key.insert("old".into(), Value::from("x"));
        let a = Record::new(directory.id.clone(), with_key);
        let b = Record::new(directory.id.clone(), Props::new());
        ctx.write_record(&a).await.unwrap();
        ctx.write_record(&b).await.unwrap();

        let report = migrate_records(&ctx, &directory.id, |r| r.props.remove("old").is_some())
            .await
            .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.skipped, 1);
        assert!(report.is_complete());
        let a = ctx.read_record(&directory.id, &a.id).await.unwrap();
        assert_eq!(a.version, 2);
        assert!(a.props.is_empty());
        assert_eq!(ctx.read_record(&directory.id, &b.id).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_failures_are_kept_for_retry() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());
        let directory = Directory::new("a", "m", "D");
        ctx.create_directory_dirs(&directory.id).await.unwrap();
        ctx.write_directory(&directory).await.unwrap();

        let mut props = Props::new();
        props.insert("old".into(), Value::from("x"));
        let good = Record::new(directory.id.clone(), props.clone());
        let broken = Record::new(directory.id.clone(), props);
        ctx.write_record(&good).await.unwrap();
        ctx.write_record(&broken).await.unwrap();
        let path = ctx.record_path(&directory.id, &broken.id);
        let saved = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let step = MigrationStep::RemoveKey { key: "old".into() };
        let registry = FieldProcessorRegistry::builtin();
        let report = migrate_records(&ctx, &directory.id, |r| apply_step(&step, r, None, &registry))
            .await
            .unwrap();
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed_ids, vec![broken.id.clone()]);

        let id = remember_failures(&ctx, &directory.id, step.clone(), &report)
            .await
            .unwrap()
            .unwrap();
        let pending = ctx.read_pending_migrations(&directory.id).await.unwrap();
        assert_eq!(pending[0].id, id);
        assert_eq!(pending[0].record_ids, vec![broken.id.clone()]);

        std::fs::write(&path, saved).unwrap();
        let report = migrate_ids(&ctx, &directory.id, pending[0].record_ids.clone(), |r| {
            apply_step(&step, r, None, &registry)
        })
        .await
        .unwrap();
        assert!(report.is_complete());
        assert!(ctx.read_record(&directory.id, &broken.id).await.unwrap().props.is_empty());
    }

    #[test]
    fn test_move_value_to_current_key() {
        let registry = FieldProcessorRegistry::builtin();
        let def = FieldDef::new("qty", "number");
        let step = MigrationStep::MoveValue {
            field_id: def.id.to_string(),
            from: "amount".into(),
            retype: true,
        };
        let mut props = Props::new();
        props.insert("amount".into(), Value::from("7"));
        let mut record = Record::new(DirectoryId::from("d"), props);

        assert!(apply_step(&step, &mut record, Some(&def), &registry));
        assert_eq!(record.props["qty"], Value::Number(7.0));
        assert!(!record.props.contains_key("amount"));
        // Nothing left under the old key
        assert!(!apply_step(&step, &mut record, Some(&def), &registry));
    }
}
