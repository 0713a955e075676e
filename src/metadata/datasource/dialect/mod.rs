//! Dialect-specific connection descriptor parsers

mod h2;
mod mysql;
mod oracle;
mod postgresql;
mod sqlserver;

pub use h2::H2DataSourceMetaDataParser;
pub use mysql::MySqlDataSourceMetaDataParser;
pub use oracle::OracleDataSourceMetaDataParser;
pub use postgresql::PostgreSqlDataSourceMetaDataParser;
pub use sqlserver::SqlServerDataSourceMetaDataParser;

use super::{DataSourceIdentity, DatabaseType};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Turns one connection descriptor into a [`DataSourceIdentity`].
pub trait DataSourceMetaDataParser: Send + Sync {
    fn parse(&self, name: &str, url: &str, database_type: DatabaseType) -> Result<DataSourceIdentity>;
}

/// Parser table keyed by dialect.
#[derive(Clone)]
pub struct DialectParsers {
    parsers: BTreeMap<DatabaseType, Arc<dyn DataSourceMetaDataParser>>,
}

impl DialectParsers {
    pub fn empty() -> Self {
        Self {
            parsers: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, database_type: DatabaseType, parser: Arc<dyn DataSourceMetaDataParser>) {
        self.parsers.insert(database_type, parser);
    }

    pub fn is_supported(&self, database_type: DatabaseType) -> bool {
        self.parsers.contains_key(&database_type)
    }

    pub fn parser_for(&self, database_type: DatabaseType) -> Result<Arc<dyn DataSourceMetaDataParser>> {
        self.parsers
            .get(&database_type)
            .cloned()
            .ok_or_else(|| Error::UnsupportedDialect(database_type.to_string()))
    }
}

impl Default for DialectParsers {
    fn default() -> Self {
        let mut parsers = Self::empty();
        let mysql: Arc<dyn DataSourceMetaDataParser> = Arc::new(MySqlDataSourceMetaDataParser);
        let postgresql: Arc<dyn DataSourceMetaDataParser> = Arc::new(PostgreSqlDataSourceMetaDataParser);
        parsers.register(DatabaseType::MySQL, Arc::clone(&mysql));
        parsers.register(DatabaseType::MariaDB, mysql);
        parsers.register(DatabaseType::PostgreSQL, Arc::clone(&postgresql));
        parsers.register(DatabaseType::OpenGauss, postgresql);
        parsers.register(DatabaseType::Oracle, Arc::new(OracleDataSourceMetaDataParser));
        parsers.register(DatabaseType::SQLServer, Arc::new(SqlServerDataSourceMetaDataParser));
        parsers.register(DatabaseType::H2, Arc::new(H2DataSourceMetaDataParser));
        parsers
    }
}

impl std::fmt::Debug for DialectParsers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialectParsers")
            .field("dialects", &self.parsers.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub(crate) fn malformed(name: &str, url: &str) -> Error {
    Error::MalformedConnectionDescriptor {
        name: name.to_string(),
        url: url.to_string(),
    }
}

/// Explicit port if present, otherwise the dialect default.
pub(crate) fn parse_port(
    raw: Option<&str>,
    database_type: DatabaseType,
    name: &str,
    url: &str,
) -> Result<Option<u16>> {
    match raw.filter(|port| !port.is_empty()) {
        Some(port) => port.parse::<u16>().map(Some).map_err(|_| malformed(name, url)),
        None => Ok(database_type.default_port()),
    }
}
