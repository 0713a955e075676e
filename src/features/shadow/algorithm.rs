use crate::config::ConfigurationProperties;
use crate::error::{Error, Result};
use crate::route::{ConditionValue, QueryContext, ShardingValue, StatementKind};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Hint key of the comment `/* SHADOW:true */`.
pub const SHADOW_HINT: &str = "shadow";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowOperation {
    Select,
    Insert,
    Update,
    Delete,
}

impl ShadowOperation {
    pub fn of(kind: StatementKind) -> Option<Self> {
        match kind {
            StatementKind::Select => Some(ShadowOperation::Select),
            StatementKind::Insert => Some(ShadowOperation::Insert),
            StatementKind::Update => Some(ShadowOperation::Update),
            StatementKind::Delete => Some(ShadowOperation::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ShadowAlgorithm {
    /// Every value the statement gives `column` equals `value`; `0` and
    /// `"0"` are the same value.
    ColumnValueMatch {
        column: String,
        operation: ShadowOperation,
        value: ShardingValue,
    },
    /// Every value the statement gives `column` matches `pattern`.
    ColumnRegexMatch {
        column: String,
        operation: ShadowOperation,
        pattern: Regex,
    },
    /// `/* SHADOW:true */` in the statement, honoured only with comment
    /// parsing enabled.
    Hint,
}

impl ShadowAlgorithm {
    pub fn column_value(column: impl Into<String>, operation: ShadowOperation, value: impl Into<ShardingValue>) -> Self {
        ShadowAlgorithm::ColumnValueMatch {
            column: column.into(),
            operation,
            value: value.into(),
        }
    }

    /// The pattern must match the whole value.
    pub fn column_regex(column: impl Into<String>, operation: ShadowOperation, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|err| Error::Config(format!("invalid shadow regex '{}': {}", pattern, err)))?;
        Ok(ShadowAlgorithm::ColumnRegexMatch {
            column: column.into(),
            operation,
            pattern,
        })
    }

    pub fn is_hint(&self) -> bool {
        matches!(self, ShadowAlgorithm::Hint)
    }

    /// Whether the statement, as it touches `table`, is shadow traffic.
    pub fn is_shadow(&self, query: &QueryContext, table: &str, props: &ConfigurationProperties) -> bool {
        match self {
            ShadowAlgorithm::Hint => props.sql_comment_parse_enabled() && query.hint_enabled(SHADOW_HINT),
            ShadowAlgorithm::ColumnValueMatch {
                column,
                operation,
                value,
            } => column_matches(query, table, column, *operation, |candidate| candidate.matches_value(value)),
            ShadowAlgorithm::ColumnRegexMatch {
                column,
                operation,
                pattern,
            } => column_matches(query, table, column, *operation, |candidate| {
                pattern.is_match(&candidate.to_string())
            }),
        }
    }
}

fn column_matches(
    query: &QueryContext,
    table: &str,
    column: &str,
    operation: ShadowOperation,
    matches: impl Fn(&ShardingValue) -> bool,
) -> bool {
    if ShadowOperation::of(query.statement_kind) != Some(operation) {
        return false;
    }
    let mut values = query
        .conditions_on(table, column)
        .filter_map(|condition| match &condition.value {
            ConditionValue::Exact(values) => Some(values),
            ConditionValue::Range { .. } => None,
        })
        .flatten()
        .peekable();
    values.peek().is_some() && values.all(matches)
}
