use crate::rule::{RuleConfiguration, RuleKind};
use serde::{Deserialize, Serialize};
use std::any::Any;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptColumn {
    /// Column name used by statements.
    pub logic: String,
    /// Physical column holding the ciphertext.
    pub cipher: String,
    #[serde(default)]
    pub assisted_query: Option<String>,
    pub encryptor: String,
}

impl EncryptColumn {
    pub fn new(logic: impl Into<String>, cipher: impl Into<String>, encryptor: impl Into<String>) -> Self {
        Self {
            logic: logic.into(),
            cipher: cipher.into(),
            assisted_query: None,
            encryptor: encryptor.into(),
        }
    }

    pub fn with_assisted_query(mut self, column: impl Into<String>) -> Self {
        self.assisted_query = Some(column.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptTable {
    pub name: String,
    pub columns: Vec<EncryptColumn>,
}

impl EncryptTable {
    pub fn new(name: impl Into<String>, columns: Vec<EncryptColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, logic: &str) -> Option<&EncryptColumn> {
        self.columns
            .iter()
            .find(|column| column.logic.eq_ignore_ascii_case(logic))
    }
}

#[derive(Debug, Clone, Default)]
pub struct EncryptRule {
    tables: Vec<EncryptTable>,
}

impl EncryptRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table declared twice keeps the later column list.
    pub fn with_table(mut self, table: EncryptTable) -> Self {
        match self
            .tables
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(&table.name))
        {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
        self
    }

    pub fn find_table(&self, name: &str) -> Option<&EncryptTable> {
        self.tables
            .iter()
            .find(|table| table.name.eq_ignore_ascii_case(name))
    }

    pub fn tables(&self) -> &[EncryptTable] {
        &self.tables
    }
}

impl RuleConfiguration for EncryptRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Encrypt
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
