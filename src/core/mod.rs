//! Descriptor compiler core.
//!
//! - `annotation`: annotation kinds and attribute readers
//! - `signature`: JVM descriptor templates
//! - `property`: property table validation and encoding
//! - `entry`: descriptor entries
//! - `metatype`: configuration metadata graph
//! - `filter`: service filter verification
//! - `writer`: descriptor text serialization
//! - `collector`: per-class annotation collection
//! - `scan`: scanner records and their replay into a collector

pub mod annotation;
pub mod collector;
pub mod entry;
pub mod filter;
pub mod metatype;
pub mod property;
pub mod scan;
pub mod signature;
pub mod writer;

pub use annotation::{AnnotationKind, AttrValue, Attributes};
pub use collector::{AnnotationCollector, ServiceNameSets};
pub use entry::{Entry, EntryParam, EntryType};
pub use filter::{AcceptAllFilters, FilterVerifier, LdapFilterVerifier};
pub use metatype::MetaTypeRegistry;
pub use scan::ClassRecord;
