//! Relation resolution
//!
//! Relation values are stored as foreign ids only and resolved lazily on
//! read, one level deep. Self-relations and mutual relations need no special
//! handling because nothing is ever materialized into an object graph.

mod resolve;
mod resolver;

pub use resolve::ResolveRelation;
pub use resolver::RelationResolver;
