use super::{malformed, parse_port, DataSourceMetaDataParser};
use crate::error::Result;
use crate::metadata::datasource::url::parse_query_properties;
use crate::metadata::datasource::{DataSourceIdentity, DatabaseType};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref POSTGRESQL_URL: Regex = Regex::new(
        r"^(?:jdbc:)?(postgresql|opengauss)://([\w\-.]+)(?::(\d*))?/([\w\-$]+)(?:\?(.*))?$"
    )
    .unwrap();
}

const DEFAULT_SCHEMA: &str = "public";
const CURRENT_SCHEMA_PROPERTY: &str = "currentSchema";

/// PostgreSQL and openGauss descriptors, e.g.
/// `jdbc:postgresql://127.0.0.1:5432/demo_ds?currentSchema=sales`.
pub struct PostgreSqlDataSourceMetaDataParser;

impl DataSourceMetaDataParser for PostgreSqlDataSourceMetaDataParser {
    fn parse(&self, name: &str, url: &str, database_type: DatabaseType) -> Result<DataSourceIdentity> {
        let captures = POSTGRESQL_URL
            .captures(url.trim())
            .ok_or_else(|| malformed(name, url))?;

        // the scheme decides the default port, not the declared dialect
        let scheme_type = if captures[1].eq_ignore_ascii_case("opengauss") {
            DatabaseType::OpenGauss
        } else {
            DatabaseType::PostgreSQL
        };
        let host = captures[2].to_ascii_lowercase();
        let port = parse_port(captures.get(3).map(|m| m.as_str()), scheme_type, name, url)?;
        let catalog = captures[4].to_string();
        let query_properties = captures
            .get(5)
            .map(|m| parse_query_properties(m.as_str(), '&'))
            .unwrap_or_default();
        let schema = query_properties
            .get(CURRENT_SCHEMA_PROPERTY)
            .filter(|schema| !schema.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_SCHEMA.to_string());

        Ok(DataSourceIdentity {
            name: name.to_string(),
            database_type,
            host,
            port,
            catalog,
            schema: Some(schema),
            query_properties,
        })
    }
}
