//! Field definitions and the runtime field type system
//!
//! `appgrid-fields` is a schema-only crate. It knows how to describe the
//! fields of a user-defined directory and how to validate, normalize and
//! display values for them, but it never stores record values itself.
//!
//! # Architecture
//!
//! - **String-typed dispatch**: a field's `type` selects a [`FieldProcessor`]
//!   from a [`FieldProcessorRegistry`]; adding a type means registering a processor
//! - **Injected registry**: built once by the consumer, no global state
//! - **YAML on disk**: one `.yaml` file per field definition ([`FieldsContext`])
//! - **Best-effort coercion**: [`coerce`] reshapes stored values when a field changes type

pub mod coercion;
pub mod context;
pub mod error;
pub mod processors;
pub mod registry;
pub mod types;
pub mod value;

pub use coercion::{coerce, Coerced};
pub use context::FieldsContext;
pub use error::{FieldError, FieldErrors, FieldsError, Result};
pub use processors::FieldProcessor;
pub use registry::{FieldProcessorRegistry, UnknownTypePolicy};
pub use types::{
    field_types, is_valid_key, FieldDef, FieldKind, LookupConfig, RelationConfig, RelationMode,
    SelectOption, Validators,
};
pub use value::{Object, Value};
