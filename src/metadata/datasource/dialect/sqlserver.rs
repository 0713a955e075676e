use super::{malformed, parse_port, DataSourceMetaDataParser};
use crate::error::Result;
use crate::metadata::datasource::url::parse_query_properties;
use crate::metadata::datasource::{DataSourceIdentity, DatabaseType};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SQLSERVER_URL: Regex =
        Regex::new(r"^(?:jdbc:)?(?:microsoft:)?sqlserver://([\w\-.]+)(?::(\d*))?((?:;[^;]*)*)$").unwrap();
}

/// SQLServer descriptors, e.g. `jdbc:sqlserver://127.0.0.1:1433;DatabaseName=demo_ds`.
pub struct SqlServerDataSourceMetaDataParser;

impl DataSourceMetaDataParser for SqlServerDataSourceMetaDataParser {
    fn parse(&self, name: &str, url: &str, database_type: DatabaseType) -> Result<DataSourceIdentity> {
        let captures = SQLSERVER_URL.captures(url.trim()).ok_or_else(|| malformed(name, url))?;

        let query_properties = captures
            .get(3)
            .map(|m| parse_query_properties(m.as_str(), ';'))
            .unwrap_or_default();
        let catalog = query_properties
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("databaseName") || key.eq_ignore_ascii_case("database"))
            .map(|(_, value)| value.clone())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| malformed(name, url))?;

        Ok(DataSourceIdentity {
            name: name.to_string(),
            database_type,
            host: captures[1].to_ascii_lowercase(),
            port: parse_port(captures.get(2).map(|m| m.as_str()), DatabaseType::SQLServer, name, url)?,
            catalog,
            schema: None,
            query_properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_parse_descriptor() {
        let identity = SqlServerDataSourceMetaDataParser
            .parse(
                "ds0",
                "jdbc:microsoft:sqlserver://10.0.0.4;encrypt=false;DatabaseName=orders",
                DatabaseType::SQLServer,
            )
            .unwrap();
        assert_eq!(identity.port, Some(1433));
        assert_eq!(identity.catalog, "orders");
        assert_eq!(
            identity.query_properties.get("encrypt").map(String::as_str),
            Some("false")
        );
    }

    #[test]
    fn test_database_property_is_required() {
        let result = SqlServerDataSourceMetaDataParser.parse(
            "ds0",
            "jdbc:sqlserver://10.0.0.4:1433;encrypt=false",
            DatabaseType::SQLServer,
        );
        assert!(matches!(result, Err(Error::MalformedConnectionDescriptor { .. })));
    }
}
