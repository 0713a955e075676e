//! Immutable per-schema metadata: physical data sources, logical tables and
//! the logic database snapshot that ties them to a rule set.

pub mod database;
pub mod datasource;
pub mod schema;

pub use database::LogicDatabase;
pub use datasource::{DataSourceIdentity, DatabaseType, PhysicalInstanceIndex, ReplicaGrouping};
pub use schema::{ColumnMetadata, SchemaMetadata, TableMetadata};
