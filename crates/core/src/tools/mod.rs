//! Built-in analyzers conforming to the [`Tool`](crate::tool::Tool) contract

pub mod bundle_size;
pub mod duplicate_rules;
pub mod module_location;
pub mod unused_classes;
