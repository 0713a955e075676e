use super::{malformed, parse_port, DataSourceMetaDataParser};
use crate::error::Result;
use crate::metadata::datasource::{DataSourceIdentity, DatabaseType};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref ORACLE_URL: Regex = Regex::new(
        r"^(?:jdbc:)?oracle:(?:thin|oci|kprb):@(?://)?([\w\-.]+)(?::(\d+))?[:/]([\w\-.]+)$"
    )
    .unwrap();
}

/// Oracle descriptors in SID (`host:port:sid`) or service (`//host:port/service`) form.
pub struct OracleDataSourceMetaDataParser;

impl DataSourceMetaDataParser for OracleDataSourceMetaDataParser {
    fn parse(&self, name: &str, url: &str, database_type: DatabaseType) -> Result<DataSourceIdentity> {
        let captures = ORACLE_URL.captures(url.trim()).ok_or_else(|| malformed(name, url))?;

        Ok(DataSourceIdentity {
            name: name.to_string(),
            database_type,
            host: captures[1].to_ascii_lowercase(),
            port: parse_port(captures.get(2).map(|m| m.as_str()), DatabaseType::Oracle, name, url)?,
            catalog: captures[3].to_string(),
            schema: None,
            query_properties: BTreeMap::new(),
        })
    }
}
