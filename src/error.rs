use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Malformed connection descriptor for data source '{name}': {url}")]
    MalformedConnectionDescriptor { name: String, url: String },

    #[error("Unsupported database type: {0}")]
    UnsupportedDialect(String),

    #[error("Unknown data source: {name}")]
    UnknownDataSource { name: String },

    #[error("Route decision failed for rule '{rule}' on table '{table}': {reason}")]
    RouteDecision {
        rule: String,
        table: String,
        reason: String,
    },

    #[error("Duplicate router registration for rule type {kind}: order {existing} conflicts with {attempted}")]
    DuplicateRouterRegistration {
        kind: String,
        existing: i32,
        attempted: i32,
    },

    #[error("Statement cannot be routed: {statement}")]
    Unroutable { statement: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn route_decision(
        rule: impl Into<String>,
        table: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::RouteDecision {
            rule: rule.into(),
            table: table.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_data_source(name: impl Into<String>) -> Self {
        Error::UnknownDataSource { name: name.into() }
    }

    /// Errors raised while a schema is being loaded. The schema must not
    /// become active when one of these surfaces.
    pub fn is_schema_load_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedConnectionDescriptor { .. }
                | Error::UnsupportedDialect(_)
                | Error::Config(_)
        )
    }

    pub fn error_code(&self) -> i32 {
        match self {
            Error::MalformedConnectionDescriptor { .. } => -1,
            Error::UnsupportedDialect(_) => -2,
            Error::UnknownDataSource { .. } => -3,
            Error::RouteDecision { .. } => -4,
            Error::DuplicateRouterRegistration { .. } => -5,
            Error::Unroutable { .. } => -6,
            Error::Config(_) => -13,
            Error::Io(_) => -14,
            Error::Serialization(_) => -15,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = vec![
            Error::MalformedConnectionDescriptor {
                name: "ds0".to_string(),
                url: "bogus".to_string(),
            },
            Error::UnsupportedDialect("SQL92".to_string()),
            Error::unknown_data_source("ds9"),
            Error::route_decision("sharding", "t_order", "missing"),
            Error::DuplicateRouterRegistration {
                kind: "sharding".to_string(),
                existing: 10,
                attempted: 11,
            },
            Error::Unroutable {
                statement: "SELECT 1".to_string(),
            },
            Error::Config("bad".to_string()),
            Error::Io("gone".to_string()),
            Error::Serialization("eof".to_string()),
        ];

        let mut codes: Vec<i32> = errors.iter().map(Error::error_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_route_decision_names_rule_and_table() {
        let err = Error::route_decision("sharding", "t_order", "table metadata not found");
        let message = err.to_string();
        assert!(message.contains("sharding"));
        assert!(message.contains("t_order"));
    }

    #[test]
    fn test_schema_load_errors() {
        assert!(Error::UnsupportedDialect("SQL92".to_string()).is_schema_load_error());
        assert!(!Error::unknown_data_source("ds0").is_schema_load_error());
    }
}
