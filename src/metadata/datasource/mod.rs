//! Physical data source identity
//!
//! Every configured logical data source carries a connection descriptor. The
//! descriptor is parsed once per schema load into a [`DataSourceIdentity`]
//! (host, port, catalog, schema) so that routing can tell when several
//! logical names address the same physical database instance.

pub mod dialect;
pub mod index;
pub mod url;

pub use dialect::{DataSourceMetaDataParser, DialectParsers};
pub use index::{PhysicalInstanceIndex, ReplicaGrouping};
pub use url::{append_query_properties, parse_query_properties};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// SQL dialects a logical database can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DatabaseType {
    MySQL,
    MariaDB,
    PostgreSQL,
    OpenGauss,
    Oracle,
    SQLServer,
    H2,
    /// Generic SQL-92 dialect. No connection parser is registered for it.
    SQL92,
}

impl DatabaseType {
    pub const ALL: [DatabaseType; 8] = [
        DatabaseType::MySQL,
        DatabaseType::MariaDB,
        DatabaseType::PostgreSQL,
        DatabaseType::OpenGauss,
        DatabaseType::Oracle,
        DatabaseType::SQLServer,
        DatabaseType::H2,
        DatabaseType::SQL92,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DatabaseType::MySQL => "MySQL",
            DatabaseType::MariaDB => "MariaDB",
            DatabaseType::PostgreSQL => "PostgreSQL",
            DatabaseType::OpenGauss => "openGauss",
            DatabaseType::Oracle => "Oracle",
            DatabaseType::SQLServer => "SQLServer",
            DatabaseType::H2 => "H2",
            DatabaseType::SQL92 => "SQL92",
        }
    }

    /// Port assumed when a descriptor omits one.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DatabaseType::MySQL | DatabaseType::MariaDB => Some(3306),
            DatabaseType::PostgreSQL => Some(5432),
            DatabaseType::OpenGauss => Some(5431),
            DatabaseType::Oracle => Some(1521),
            DatabaseType::SQLServer => Some(1433),
            DatabaseType::H2 => Some(9092),
            DatabaseType::SQL92 => None,
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatabaseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DatabaseType::ALL
            .iter()
            .copied()
            .find(|database_type| database_type.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedDialect(s.to_string()))
    }
}

/// Structured identity of one logical data source.
///
/// Two identities are the same instance iff host and port match; catalog and
/// schema only matter for schema addressing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSourceIdentity {
    pub name: String,
    pub database_type: DatabaseType,
    pub host: String,
    pub port: Option<u16>,
    pub catalog: String,
    pub schema: Option<String>,
    pub query_properties: BTreeMap<String, String>,
}

impl DataSourceIdentity {
    pub fn is_same_instance(&self, other: &DataSourceIdentity) -> bool {
        self.host == other.host && self.port == other.port
    }

    pub fn instance_key(&self) -> (&str, Option<u16>) {
        (self.host.as_str(), self.port)
    }

    /// Schema used to address tables on this data source, falling back to the
    /// catalog for dialects without a separate schema level.
    pub fn schema_name(&self) -> &str {
        self.schema.as_deref().unwrap_or(&self.catalog)
    }
}
