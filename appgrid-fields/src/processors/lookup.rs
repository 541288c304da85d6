//! Read-only lookup fields.

use serde_json::Value as JsonValue;

use super::FieldProcessor;
use crate::error::FieldError;
use crate::types::FieldDef;
use crate::value::Value;

/// Lookup values are derived from a relation on read and never stored.
pub struct LookupProcessor;

impl FieldProcessor for LookupProcessor {
    fn validate(&self, _value: &JsonValue, _field: &FieldDef) -> Result<(), FieldError> {
        Err(FieldError::new("lookup fields are computed and cannot be written"))
    }

    fn transform(&self, _value: &JsonValue, _field: &FieldDef) -> Value {
        Value::Null
    }

    fn check_definition(&self, field: &FieldDef) -> Result<(), String> {
        let lookup = field
            .lookup
            .as_ref()
            .ok_or("lookup fields need a lookup source")?;
        lookup
            .parts()
            .map(|_| ())
            .ok_or_else(|| format!("lookup source '{}' must be 'relation.key'", lookup.source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn never_writable() {
        let field = FieldDef::new("owner_email", "lookup").with_lookup("owner.email");
        assert!(LookupProcessor.validate(&json!("x"), &field).is_err());
        assert!(LookupProcessor.check_definition(&field).is_ok());
        let bad = FieldDef::new("owner_email", "lookup").with_lookup("owner");
        assert!(LookupProcessor.check_definition(&bad).is_err());
    }
}
