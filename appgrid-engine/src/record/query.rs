//! Filtering, search and ordering for record lists

use crate::types::{Directory, Record, SortOrder};
use appgrid_fields::{FieldDef, FieldKind, FieldProcessorRegistry, FieldsContext, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Fields searched by free text: the directory's configured keys, else the
/// fields marked searchable, else every stored field. Unreadable fields are
/// never searched.
pub(crate) fn search_fields<'a>(
    directory: &Directory,
    fields: &'a FieldsContext,
    roles: Option<&BTreeSet<String>>,
) -> Vec<&'a FieldDef> {
    let readable = |f: &&FieldDef| roles.is_none_or(|roles| f.can_read(roles));
    let configured = &directory.config.search_fields;

    let selected: Vec<&FieldDef> = if !configured.is_empty() {
        configured
            .iter()
            .filter_map(|key| fields.get_field_by_key(key))
            .collect()
    } else {
        let all: Vec<&FieldDef> = fields
            .all_fields()
            .into_iter()
            .filter(|f| f.kind != FieldKind::Lookup)
            .collect();
        let marked: Vec<&FieldDef> = all.iter().copied().filter(|f| f.searchable).collect();
        if marked.is_empty() {
            all
        } else {
            marked
        }
    };
    selected.into_iter().filter(readable).collect()
}

/// Case-insensitive substring match over the formatted values of `fields`.
pub(crate) fn matches_search(
    registry: &FieldProcessorRegistry,
    record: &Record,
    fields: &[&FieldDef],
    needle: &str,
) -> bool {
    let needle = needle.to_lowercase();
    fields.iter().any(|field| {
        record
            .get(&field.key)
            .is_some_and(|value| registry.format(field, value).to_lowercase().contains(&needle))
    })
}

/// Whether the record's category path starts with `prefix` (node ids).
pub(crate) fn in_category(record: &Record, prefix: &[String]) -> bool {
    record.category_path().starts_with(prefix)
}

#[derive(Debug, PartialEq, PartialOrd)]
enum SortKey {
    Number(f64),
    Text(String),
}

fn sort_key(record: &Record, by: &str) -> Option<SortKey> {
    match by {
        "createdAt" => return Some(SortKey::Number(record.created_at.timestamp_millis() as f64)),
        "updatedAt" => return Some(SortKey::Number(record.updated_at.timestamp_millis() as f64)),
        "version" => return Some(SortKey::Number(record.version as f64)),
        "id" => return Some(SortKey::Text(record.id.to_string())),
        _ => {}
    }
    let value = record.get(by)?;
    if value.is_empty() {
        return None;
    }
    Some(match value {
        Value::Number(n) => SortKey::Number(*n),
        Value::Bool(b) => SortKey::Number(f64::from(u8::from(*b))),
        Value::String(s) => SortKey::Text(s.to_lowercase()),
        Value::StringArray(items) => SortKey::Text(items.join(", ").to_lowercase()),
        other => SortKey::Text(other.to_json().to_string().to_lowercase()),
    })
}

/// Order records by a field key or `createdAt`/`updatedAt`/`version`.
///
/// Missing values sort last in both directions; ties fall back to creation
/// time, then id, so pages are stable.
pub(crate) fn sort_records(records: &mut [Record], by: &str, order: SortOrder) {
    records.sort_by(|a, b| {
        let primary = match (sort_key(a, by), sort_key(b, by)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            }
        };
        primary
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.as_str().cmp(b.id.as_str()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DirectoryId, Props, CATEGORY_KEY};
    use pretty_assertions::assert_eq;

    fn record(props: &[(&str, Value)]) -> Record {
        let props: Props = props
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Record::new(DirectoryId::from("d"), props)
    }

    fn keys(records: &[Record], key: &str) -> Vec<Option<Value>> {
        records.iter().map(|r| r.get(key).cloned()).collect()
    }

    #[test]
    fn test_numbers_sort_numerically_missing_last() {
        let mut records = vec![
            record(&[("n", Value::Number(10.0))]),
            record(&[]),
            record(&[("n", Value::Number(9.0))]),
            record(&[("n", Value::Number(100.0))]),
        ];

        sort_records(&mut records, "n", SortOrder::Asc);
        assert_eq!(
            keys(&records, "n"),
            vec![
                Some(Value::Number(9.0)),
                Some(Value::Number(10.0)),
                Some(Value::Number(100.0)),
                None
            ]
        );

        sort_records(&mut records, "n", SortOrder::Desc);
        assert_eq!(
            keys(&records, "n"),
            vec![
                Some(Value::Number(100.0)),
                Some(Value::Number(10.0)),
                Some(Value::Number(9.0)),
                None
            ]
        );
    }

    #[test]
    fn test_strings_sort_case_insensitively() {
        let mut records = vec![
            record(&[("name", Value::from("bob"))]),
            record(&[("name", Value::from("Alice"))]),
            record(&[("name", Value::from("carol"))]),
        ];
        sort_records(&mut records, "name", SortOrder::Asc);
        let names: Vec<_> = records
            .iter()
            .map(|r| r.get("name").and_then(Value::as_str).unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Alice", "bob", "carol"]);
    }

    #[test]
    fn test_category_prefix() {
        let r = record(&[(
            CATEGORY_KEY,
            Value::StringArray(vec!["a".into(), "b".into()]),
        )]);
        assert!(in_category(&r, &["a".to_string()]));
        assert!(in_category(&r, &["a".to_string(), "b".to_string()]));
        assert!(!in_category(&r, &["b".to_string()]));
        assert!(!in_category(&record(&[]), &["a".to_string()]));
    }

    #[test]
    fn test_search_uses_formatted_values() {
        let registry = FieldProcessorRegistry::builtin();
        let name = FieldDef::new("name", "text");
        let r = record(&[("name", Value::from("Ada Lovelace"))]);
        assert!(matches_search(&registry, &r, &[&name], "LOVE"));
        assert!(!matches_search(&registry, &r, &[&name], "turing"));
        assert!(!matches_search(&registry, &record(&[]), &[&name], "ada"));
    }
}
