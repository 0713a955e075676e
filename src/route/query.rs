use crate::metadata::DatabaseType;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

lazy_static! {
    static ref SQL_HINT_COMMENT: Regex = Regex::new(r"/\*\s*(.*?)\s*\*/").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Ddl,
    Administrative,
    Tcl,
}

impl StatementKind {
    /// Statements that must reach a primary.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StatementKind::Insert | StatementKind::Update | StatementKind::Delete | StatementKind::Ddl
        )
    }

}

/// Value of a sharding or shadow column taken from a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShardingValue {
    Integer(i64),
    Text(String),
}

impl ShardingValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ShardingValue::Integer(value) => Some(*value),
            ShardingValue::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Integers and their text form are the same value; anything else
    /// compares by text.
    pub fn matches_value(&self, other: &ShardingValue) -> bool {
        match (self.as_integer(), other.as_integer()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl fmt::Display for ShardingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardingValue::Integer(value) => write!(f, "{}", value),
            ShardingValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for ShardingValue {
    fn from(value: i64) -> Self {
        ShardingValue::Integer(value)
    }
}

impl From<&str> for ShardingValue {
    fn from(value: &str) -> Self {
        ShardingValue::Text(value.to_string())
    }
}

impl From<String> for ShardingValue {
    fn from(value: String) -> Self {
        ShardingValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionValue {
    /// `=` or `IN`.
    Exact(Vec<ShardingValue>),
    /// Inclusive bounds; `None` is unbounded.
    Range {
        lower: Option<ShardingValue>,
        upper: Option<ShardingValue>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub table: String,
    pub column: String,
    pub value: ConditionValue,
}

impl Condition {
    pub fn equal(table: impl Into<String>, column: impl Into<String>, value: impl Into<ShardingValue>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            value: ConditionValue::Exact(vec![value.into()]),
        }
    }

    pub fn in_values<V: Into<ShardingValue>>(
        table: impl Into<String>,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            value: ConditionValue::Exact(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn range(
        table: impl Into<String>,
        column: impl Into<String>,
        lower: Option<ShardingValue>,
        upper: Option<ShardingValue>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            value: ConditionValue::Range { lower, upper },
        }
    }

    pub fn is_on(&self, table: &str, column: &str) -> bool {
        self.table.eq_ignore_ascii_case(table) && self.column.eq_ignore_ascii_case(column)
    }
}

/// A statement as handed over by the parser: referenced logical tables, the
/// column conditions routers care about and any comment hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryContext {
    pub sql: String,
    pub statement_kind: StatementKind,
    pub tables: Vec<String>,
    pub conditions: Vec<Condition>,
    pub hints: BTreeMap<String, String>,
    pub database_type: DatabaseType,
}

impl QueryContext {
    pub fn new(sql: impl Into<String>, statement_kind: StatementKind, database_type: DatabaseType) -> Self {
        Self {
            sql: sql.into(),
            statement_kind,
            tables: Vec::new(),
            conditions: Vec::new(),
            hints: BTreeMap::new(),
            database_type,
        }
    }

    /// Referenced tables are kept once each, in statement order.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        let table = table.into();
        if !self.contains_table(&table) {
            self.tables.push(table);
        }
        self
    }

    pub fn with_tables<T: Into<String>>(self, tables: impl IntoIterator<Item = T>) -> Self {
        tables.into_iter().fold(self, |query, table| query.with_table(table))
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_hint(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.hints
            .insert(key.as_ref().trim().to_ascii_lowercase(), value.into());
        self
    }

    /// Pick up `key:value` pairs from `/* ... */` comments in the SQL text.
    /// Pairs inside one comment are separated by commas.
    pub fn with_sql_hints(mut self) -> Self {
        let parsed: Vec<(String, String)> = SQL_HINT_COMMENT
            .captures_iter(&self.sql)
            .flat_map(|captures| {
                captures[1]
                    .split(',')
                    .filter_map(|pair| {
                        let (key, value) = pair.split_once(':').or_else(|| pair.split_once('='))?;
                        let key = key.trim();
                        (!key.is_empty()).then(|| (key.to_ascii_lowercase(), value.trim().to_string()))
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        self.hints.extend(parsed);
        self
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t.eq_ignore_ascii_case(table))
    }

    pub fn hint(&self, key: &str) -> Option<&str> {
        self.hints.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn hint_enabled(&self, key: &str) -> bool {
        self.hint(key)
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn conditions_on<'a>(&'a self, table: &'a str, column: &'a str) -> impl Iterator<Item = &'a Condition> {
        self.conditions
            .iter()
            .filter(move |condition| condition.is_on(table, column))
    }
}

/// Per-connection state that influences routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionContext {
    pub connection_id: u64,
    pub in_transaction: bool,
    /// Route every statement of the connection to primaries.
    pub primary_only: bool,
}

impl ConnectionContext {
    pub fn new(connection_id: u64) -> Self {
        Self {
            connection_id,
            ..Self::default()
        }
    }

    pub fn in_transaction(mut self, in_transaction: bool) -> Self {
        self.in_transaction = in_transaction;
        self
    }

    pub fn primary_only(mut self, primary_only: bool) -> Self {
        self.primary_only = primary_only;
        self
    }
}
