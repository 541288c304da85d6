//! The command pattern shared by every engine operation
//!
//! Commands are structs whose fields are the parameters. Each implements
//! [`Operation`] (its canonical name) and [`Execute`] (the work), and returns
//! an [`ExecutionResult`] that says whether the call should be audited.

use crate::types::{DirectoryId, LogEntry, RecordId};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::time::Instant;

/// Canonical name of a command: "create record", "update field", ...
pub trait Operation {
    fn verb(&self) -> &'static str;
    fn noun(&self) -> &'static str;
    fn description(&self) -> &'static str;

    fn op_string(&self) -> String {
        format!("{} {}", self.verb(), self.noun())
    }
}

/// Implement [`Operation`] for a command struct.
macro_rules! operation {
    ($ty:ty, verb = $verb:literal, noun = $noun:literal, description = $desc:literal) => {
        impl $crate::operation::Operation for $ty {
            fn verb(&self) -> &'static str {
                $verb
            }
            fn noun(&self) -> &'static str {
                $noun
            }
            fn description(&self) -> &'static str {
                $desc
            }
        }
    };
}
pub(crate) use operation;

/// Execute a command against a context
#[async_trait]
pub trait Execute<C, E>: Operation + Send + Sync
where
    C: Send + Sync,
    E: Send,
{
    async fn execute(&self, ctx: &C) -> ExecutionResult<Value, E>;

    /// Records touched by a successful call; each gets the entry in its own log
    fn affected_records(&self, _result: &Value) -> Vec<(DirectoryId, RecordId)> {
        Vec::new()
    }
}

/// Result of executing an operation
///
/// Distinguishes between:
/// - Logged: Operations that mutate state and should be audited
/// - Unlogged: Read-only operations with no side effects
/// - Failed: Errors (optionally logged)
pub enum ExecutionResult<T, E> {
    /// Operation succeeded and should be logged
    Logged { value: T, log_entry: LogEntry },
    /// Operation succeeded but no logging needed (read-only)
    Unlogged { value: T },
    /// Operation failed
    Failed {
        error: E,
        log_entry: Option<LogEntry>,
    },
}

impl<T, E> ExecutionResult<T, E> {
    /// Extract the result (Ok or Err)
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Logged { value, .. } => Ok(value),
            Self::Unlogged { value } => Ok(value),
            Self::Failed { error, .. } => Err(error),
        }
    }

    /// Get the value and log entry separately
    pub fn split(self) -> (Result<T, E>, Option<LogEntry>) {
        match self {
            Self::Logged { value, log_entry } => (Ok(value), Some(log_entry)),
            Self::Unlogged { value } => (Ok(value), None),
            Self::Failed { error, log_entry } => (Err(error), log_entry),
        }
    }

    /// Check if this should be logged
    pub fn should_log(&self) -> bool {
        matches!(
            self,
            Self::Logged { .. }
                | Self::Failed {
                    log_entry: Some(_),
                    ..
                }
        )
    }
}

/// Wrap the outcome of a mutating command, logging success and failure alike.
pub(crate) fn logged<O, E>(op: &O, start: Instant, result: Result<Value, E>) -> ExecutionResult<Value, E>
where
    O: Operation + Serialize + ?Sized,
    E: Display,
{
    let duration_ms = start.elapsed().as_millis() as u64;
    let input = serde_json::to_value(op).unwrap_or(Value::Null);

    match result {
        Ok(value) => ExecutionResult::Logged {
            log_entry: LogEntry::new(op.op_string(), input, value.clone(), None, duration_ms),
            value,
        },
        Err(error) => ExecutionResult::Failed {
            log_entry: Some(LogEntry::failure(
                op.op_string(),
                input,
                &error.to_string(),
                duration_ms,
            )),
            error,
        },
    }
}

/// Wrap the outcome of a read-only command.
pub(crate) fn unlogged<E>(result: Result<Value, E>) -> ExecutionResult<Value, E> {
    match result {
        Ok(value) => ExecutionResult::Unlogged { value },
        Err(error) => ExecutionResult::Failed {
            error,
            log_entry: None,
        },
    }
}

/// The `(directoryId, id)` pair of a record-shaped result.
pub(crate) fn record_ref(result: &Value) -> Vec<(DirectoryId, RecordId)> {
    match (
        result.get("directoryId").and_then(Value::as_str),
        result.get("id").and_then(Value::as_str),
    ) {
        (Some(dir), Some(id)) => vec![(DirectoryId::from(dir), RecordId::from(id))],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Ping {
        n: u32,
    }
    operation!(Ping, verb = "send", noun = "ping", description = "Test op");

    #[test]
    fn test_op_string() {
        assert_eq!(Ping { n: 1 }.op_string(), "send ping");
    }

    #[test]
    fn test_logged_success_and_failure() {
        let op = Ping { n: 7 };
        let ok = logged::<_, String>(&op, Instant::now(), Ok(json!({"ok": true})));
        assert!(ok.should_log());
        let (value, entry) = ok.split();
        assert_eq!(value.unwrap()["ok"], true);
        let entry = entry.unwrap();
        assert_eq!(entry.op, "send ping");
        assert_eq!(entry.input["n"], 7);

        let failed = logged(&op, Instant::now(), Err("boom".to_string()));
        let (value, entry) = failed.split();
        assert_eq!(value.unwrap_err(), "boom");
        assert_eq!(entry.unwrap().output["error"], "boom");
    }

    #[test]
    fn test_unlogged_is_not_audited() {
        let result = unlogged::<String>(Ok(json!(1)));
        assert!(!result.should_log());
        assert!(!unlogged::<String>(Err("x".into())).should_log());
    }

    #[test]
    fn test_record_ref() {
        let refs = record_ref(&json!({"id": "r1", "directoryId": "d1"}));
        assert_eq!(refs, vec![(DirectoryId::from("d1"), RecordId::from("r1"))]);
        assert!(record_ref(&json!({"id": "r1"})).is_empty());
    }
}
