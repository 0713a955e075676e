use super::{malformed, parse_port, DataSourceMetaDataParser};
use crate::error::Result;
use crate::metadata::datasource::url::parse_query_properties;
use crate::metadata::datasource::{DataSourceIdentity, DatabaseType};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref H2_SERVER_URL: Regex =
        Regex::new(r"^(?:jdbc:)?h2:tcp://([\w\-.]+)(?::(\d*))?/([^;]+)(?:;(.*))?$").unwrap();
    static ref H2_EMBEDDED_URL: Regex =
        Regex::new(r"^(?:jdbc:)?h2:(?:(?:mem|file):)?([^;]+)(?:;(.*))?$").unwrap();
}

/// H2 descriptors.
///
/// Embedded databases (`mem:`, `file:`, `~/`) live inside the proxy process,
/// so they share one instance: empty host and no port.
pub struct H2DataSourceMetaDataParser;

impl DataSourceMetaDataParser for H2DataSourceMetaDataParser {
    fn parse(&self, name: &str, url: &str, database_type: DatabaseType) -> Result<DataSourceIdentity> {
        let url = url.trim();

        if let Some(captures) = H2_SERVER_URL.captures(url) {
            return Ok(DataSourceIdentity {
                name: name.to_string(),
                database_type,
                host: captures[1].to_ascii_lowercase(),
                port: parse_port(captures.get(2).map(|m| m.as_str()), DatabaseType::H2, name, url)?,
                catalog: database_name(&captures[3]),
                schema: None,
                query_properties: captures
                    .get(4)
                    .map(|m| parse_query_properties(m.as_str(), ';'))
                    .unwrap_or_default(),
            });
        }

        let captures = H2_EMBEDDED_URL.captures(url).ok_or_else(|| malformed(name, url))?;
        let catalog = database_name(&captures[1]);
        if catalog.is_empty() || captures[1].starts_with("tcp:") {
            return Err(malformed(name, url));
        }

        Ok(DataSourceIdentity {
            name: name.to_string(),
            database_type,
            host: String::new(),
            port: None,
            catalog,
            schema: None,
            query_properties: captures
                .get(2)
                .map(|m| parse_query_properties(m.as_str(), ';'))
                .unwrap_or_default(),
        })
    }
}

fn database_name(path: &str) -> String {
    path.rsplit(|c: char| matches!(c, '/' | '\\' | ':')).next().unwrap_or_default().to_string()
}
