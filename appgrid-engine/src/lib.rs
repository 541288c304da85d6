//! Dynamic schema and record engine with file-backed storage
//!
//! Users define directories (tables) and typed fields at runtime; this crate
//! validates, normalizes and persists records against those definitions. Field
//! types are dispatched by name through the injected
//! [`FieldProcessorRegistry`](appgrid_fields::FieldProcessorRegistry), so the
//! record store never knows a type at compile time.
//!
//! ## Overview
//!
//! - **Commands** - every operation is a struct implementing [`Execute`]
//! - **Optimistic concurrency** - record updates carry the version they read;
//!   one concurrent writer wins, the others get [`EngineError::Conflict`]
//! - **Lazy relations** - relation values store foreign ids and are resolved on read
//! - **Best-effort migrations** - key renames, type changes and field deletes
//!   rewrite records one at a time and report a [`MigrationReport`]
//! - **Audit trail** - [`EngineOperationProcessor`] appends JSONL activity logs
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use appgrid_engine::{directory::CreateDirectory, field::CreateField, record::CreateRecord};
//! use appgrid_engine::{EngineContext, Execute};
//! use appgrid_fields::FieldDef;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = EngineContext::open("/path/to/data")?;
//!
//! let dir = CreateDirectory::new("crm", "sales", "Contacts")
//!     .execute(&ctx)
//!     .await
//!     .into_result()?;
//! let dir_id = dir["id"].as_str().unwrap_or_default();
//!
//! CreateField::new(dir_id, FieldDef::new("name", "text").required())
//!     .execute(&ctx)
//!     .await
//!     .into_result()?;
//!
//! let record = CreateRecord::new(dir_id, Default::default())
//!     .with_prop("name", "Alice")
//!     .execute(&ctx)
//!     .await
//!     .into_result()?;
//! println!("Created record {} at version {}", record["id"], record["version"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Structure
//!
//! ```text
//! root/
//! ├── appgrid.toml                       # Optional configuration
//! ├── activity/
//! │   └── current.jsonl                  # Global operation log
//! └── directories/
//!     └── {directory_id}/
//!         ├── directory.yaml             # Directory metadata
//!         ├── categories.yaml            # Record category tree
//!         ├── field_categories/{id}.yaml # Field groupings
//!         ├── fields/definitions/{key}.yaml
//!         ├── migrations.yaml            # Records a migration left behind
//!         └── records/
//!             ├── {id}.json              # Record
//!             ├── {id}.jsonl             # Per-record operation log
//!             └── {id}.lock              # Write lock
//! ```

pub mod config;
mod context;
mod error;
mod operation;
mod processor;
pub mod types;

// Command modules
pub mod activity;
pub mod category;
pub mod directory;
pub mod field;
pub mod field_category;
pub mod record;
pub mod relation;

pub use async_trait::async_trait;
pub use operation::{Execute, ExecutionResult, Operation};

pub use config::EngineConfig;
pub use context::{EngineContext, RecordLock};
pub use error::{EngineError, Result};
pub use processor::EngineOperationProcessor;
pub use relation::RelationResolver;

// Re-export commonly used types
pub use types::{
    CategoryId, CategoryNode, CategoryTree, Directory, DirectoryConfig, DirectoryId,
    DirectoryKind, FieldCategory, FieldCategoryId, LogEntry, MigrationReport, MigrationStep,
    Pagination, PendingMigration, Record, RecordId, RecordStatus, SortOrder, SortSpec,
    CATEGORY_KEY,
};
