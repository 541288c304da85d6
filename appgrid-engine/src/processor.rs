//! Operation processor: runs commands and writes their audit trail

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::Execute;
use serde_json::Value;
use tracing::{debug, warn};

/// Executes engine commands, stamping the actor onto every log entry.
///
/// Logged results go to the global activity log and to the log of every
/// affected record. Failed writes to the log never fail the command itself.
#[derive(Debug, Default, Clone)]
pub struct EngineOperationProcessor {
    actor: Option<String>,
}

impl EngineOperationProcessor {
    /// A processor without an actor
    pub fn new() -> Self {
        Self::default()
    }

    /// A processor that attributes every operation to `actor`
    pub fn with_actor(actor: impl Into<String>) -> Self {
        Self {
            actor: Some(actor.into()),
        }
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// Execute a command and record it
    pub async fn process<O>(&self, op: &O, ctx: &EngineContext) -> Result<Value>
    where
        O: Execute<EngineContext, EngineError>,
    {
        let (result, log_entry) = op.execute(ctx).await.split();

        if let Some(mut entry) = log_entry {
            if let Some(actor) = &self.actor {
                entry = entry.with_actor(actor.clone());
            }

            if ctx.config().activity_log {
                if let Err(e) = ctx.append_activity(&entry).await {
                    warn!(op = %entry.op, error = %e, "failed to append activity log");
                }

                if let Ok(value) = &result {
                    for (dir, id) in op.affected_records(value) {
                        if let Err(e) = ctx.append_record_log(&dir, &id, &entry).await {
                            warn!(op = %entry.op, record = %id, error = %e, "failed to append record log");
                        }
                    }
                }
            }

            debug!(op = %entry.op, actor = ?entry.actor, duration_ms = entry.duration_ms, ok = result.is_ok(), "operation processed");
        }

        result
    }
}
