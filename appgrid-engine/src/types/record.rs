//! Record type

use super::ids::{DirectoryId, RecordId};
use appgrid_fields::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved property holding the record's category path (node ids, root first).
pub const CATEGORY_KEY: &str = "$category";

/// Property bag of a record, keyed by field key.
pub type Props = BTreeMap<String, Value>;

/// One entry in a directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub directory_id: DirectoryId,
    #[serde(default)]
    pub props: Props,
    /// Starts at 1, +1 per successful write; the only concurrency token
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record {
    /// A fresh record at version 1
    pub fn new(directory_id: DirectoryId, props: Props) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            directory_id,
            props,
            version: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// Category path stored under [`CATEGORY_KEY`], empty if unassigned.
    pub fn category_path(&self) -> Vec<String> {
        self.props
            .get(CATEGORY_KEY)
            .map(Value::ids)
            .unwrap_or_default()
    }

    /// Record a successful write: bump the version and the update time.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_starts_at_version_one() {
        let mut props = Props::new();
        props.insert("name".into(), Value::from("Alice"));
        let record = Record::new(DirectoryId::from_string("d"), props);
        assert_eq!(record.version, 1);
        assert!(!record.is_deleted());
        assert_eq!(record.get("name"), Some(&Value::from("Alice")));
    }

    #[test]
    fn test_touch_increments_version() {
        let mut record = Record::new(DirectoryId::new(), Props::new());
        let before = record.updated_at;
        record.touch();
        assert_eq!(record.version, 2);
        assert!(record.updated_at >= before);
    }

    #[test]
    fn test_json_shape() {
        let mut props = Props::new();
        props.insert("age".into(), Value::Number(30.0));
        props.insert(
            CATEGORY_KEY.into(),
            Value::StringArray(vec!["a".into(), "b".into()]),
        );
        let record = Record::new(DirectoryId::from_string("d"), props);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["directoryId"], "d");
        assert_eq!(json["props"]["age"], 30);
        assert_eq!(json["version"], 1);
        assert!(json.get("deletedAt").is_none());
        assert_eq!(record.category_path(), vec!["a", "b"]);

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back.props, record.props);
    }
}
