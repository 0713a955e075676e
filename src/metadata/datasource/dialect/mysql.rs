use super::{malformed, parse_port, DataSourceMetaDataParser};
use crate::error::Result;
use crate::metadata::datasource::url::parse_query_properties;
use crate::metadata::datasource::{DataSourceIdentity, DatabaseType};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MYSQL_URL: Regex = Regex::new(
        r"^(?:jdbc:)?(?:mysql|mariadb)(?::loadbalance|:replication|:aurora)?://([\w\-.]+)(?::(\d*))?(?:/([\w\-$]*))?(?:\?(.*))?$"
    )
    .unwrap();
}

/// MySQL and MariaDB descriptors, e.g. `jdbc:mysql://127.0.0.1:3306/demo_ds?useSSL=false`.
pub struct MySqlDataSourceMetaDataParser;

impl DataSourceMetaDataParser for MySqlDataSourceMetaDataParser {
    fn parse(&self, name: &str, url: &str, database_type: DatabaseType) -> Result<DataSourceIdentity> {
        let captures = MYSQL_URL.captures(url.trim()).ok_or_else(|| malformed(name, url))?;

        let host = captures[1].to_ascii_lowercase();
        let port = parse_port(captures.get(2).map(|m| m.as_str()), database_type, name, url)?;
        let catalog = captures.get(3).map(|m| m.as_str()).unwrap_or_default().to_string();
        let query_properties = captures
            .get(4)
            .map(|m| parse_query_properties(m.as_str(), '&'))
            .unwrap_or_default();

        Ok(DataSourceIdentity {
            name: name.to_string(),
            database_type,
            host,
            port,
            schema: Some(catalog.clone()),
            catalog,
            query_properties,
        })
    }
}
