//! Number and boolean processors.

use serde_json::Value as JsonValue;

use super::{format_number, FieldProcessor};
use crate::error::FieldError;
use crate::types::FieldDef;
use crate::value::Value;

/// Parse a JSON number or numeric string.
pub(crate) fn coerce_number(value: &JsonValue) -> Option<f64> {
    let n = match value {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Numeric values, optionally bounded by `validators.min`/`max`.
pub struct NumberProcessor;

impl FieldProcessor for NumberProcessor {
    fn validate(&self, value: &JsonValue, field: &FieldDef) -> Result<(), FieldError> {
        let n = coerce_number(value).ok_or_else(|| FieldError::new("must be a number"))?;
        if let Some(min) = field.validators.min {
            if n < min {
                return Err(FieldError::new(format!(
                    "must be at least {}",
                    format_number(min)
                )));
            }
        }
        if let Some(max) = field.validators.max {
            if n > max {
                return Err(FieldError::new(format!(
                    "must be at most {}",
                    format_number(max)
                )));
            }
        }
        Ok(())
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        coerce_number(value).map(Value::Number).unwrap_or_default()
    }

    fn format(&self, value: &Value, _field: &FieldDef) -> String {
        match value {
            Value::Number(n) => format_number(*n),
            _ => String::new(),
        }
    }

    fn zero_value(&self) -> Value {
        Value::Number(0.0)
    }

    fn check_definition(&self, field: &FieldDef) -> Result<(), String> {
        match (field.validators.min, field.validators.max) {
            (Some(min), Some(max)) if min > max => {
                Err(format!("min ({min}) is greater than max ({max})"))
            }
            _ => Ok(()),
        }
    }
}

pub(crate) fn coerce_bool(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => match n.as_f64() {
            Some(x) if x == 0.0 => Some(false),
            Some(x) if x == 1.0 => Some(true),
            _ => None,
        },
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Booleans, accepting `true`/`false`, `1`/`0` and `yes`/`no` spellings.
pub struct BooleanProcessor;

impl FieldProcessor for BooleanProcessor {
    fn validate(&self, value: &JsonValue, _field: &FieldDef) -> Result<(), FieldError> {
        coerce_bool(value)
            .map(|_| ())
            .ok_or_else(|| FieldError::new("must be true or false"))
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        coerce_bool(value).map(Value::Bool).unwrap_or_default()
    }

    fn format(&self, value: &Value, _field: &FieldDef) -> String {
        match value {
            Value::Bool(true) => "Yes".into(),
            Value::Bool(false) => "No".into(),
            _ => String::new(),
        }
    }

    fn zero_value(&self) -> Value {
        Value::Bool(false)
    }
}
