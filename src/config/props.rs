use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Typed view over the string-keyed properties map.
///
/// Known keys are validated at construction so a malformed value fails the
/// configuration load instead of a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Value>", into = "BTreeMap<String, String>")]
pub struct ConfigurationProperties {
    raw: BTreeMap<String, String>,
    sql_show: bool,
    sql_comment_parse_enabled: bool,
}

impl ConfigurationProperties {
    pub const SQL_SHOW: &'static str = "sql-show";
    pub const SQL_COMMENT_PARSE_ENABLED: &'static str = "sql-comment-parse-enabled";

    pub fn new(raw: BTreeMap<String, String>) -> Result<Self> {
        let sql_show = parse_bool(&raw, Self::SQL_SHOW)?;
        let sql_comment_parse_enabled = parse_bool(&raw, Self::SQL_COMMENT_PARSE_ENABLED)?;
        Ok(Self {
            raw,
            sql_show,
            sql_comment_parse_enabled,
        })
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Log every routed statement with its units.
    pub fn sql_show(&self) -> bool {
        self.sql_show
    }

    /// Honour routing hints written as SQL comments.
    pub fn sql_comment_parse_enabled(&self) -> bool {
        self.sql_comment_parse_enabled
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw.get(key).map(String::as_str)
    }

    pub fn raw(&self) -> &BTreeMap<String, String> {
        &self.raw
    }
}

fn parse_bool(raw: &BTreeMap<String, String>, key: &str) -> Result<bool> {
    match raw.get(key).map(|value| value.trim()) {
        None => Ok(false),
        Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
        Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
        Some(value) => Err(Error::Config(format!(
            "property '{}' expects true or false, got '{}'",
            key, value
        ))),
    }
}

/// Scalar JSON values are accepted and kept in their string form.
impl TryFrom<BTreeMap<String, Value>> for ConfigurationProperties {
    type Error = Error;

    fn try_from(values: BTreeMap<String, Value>) -> Result<Self> {
        let raw = values
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(text) => text,
                    Value::Bool(flag) => flag.to_string(),
                    Value::Number(number) => number.to_string(),
                    other => {
                        return Err(Error::Config(format!(
                            "property '{}' must be a scalar, got {}",
                            key, other
                        )))
                    }
                };
                Ok((key, value))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Self::new(raw)
    }
}

impl From<ConfigurationProperties> for BTreeMap<String, String> {
    fn from(props: ConfigurationProperties) -> Self {
        props.raw
    }
}
