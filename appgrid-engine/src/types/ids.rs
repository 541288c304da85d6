//! Newtype identifiers
//!
//! All ids are ULID strings. Wrapping them keeps a record id from being
//! passed where a directory id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ids come from callers and are joined into storage paths; anything that
/// could step outside its folder is refused.
pub(crate) fn is_path_safe(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\', '\0'])
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh ULID-based id
            pub fn new() -> Self {
                Self(ulid::Ulid::new().to_string())
            }

            /// Wrap an existing id string
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when the id can name a single file or folder
            pub fn is_path_safe(&self) -> bool {
                is_path_safe(&self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&String> for $name {
            fn from(s: &String) -> Self {
                Self(s.clone())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifies a directory (user-defined table)
    DirectoryId
);
define_id!(
    /// Identifies a record within a directory
    RecordId
);
define_id!(
    /// Identifies a node in a directory's category tree
    CategoryId
);
define_id!(
    /// Identifies a field category
    FieldCategoryId
);
define_id!(LogEntryId);
