use crate::rule::{RuleConfiguration, RuleKind};
use std::any::Any;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleTable {
    pub table: String,
    pub data_source: String,
}

/// Table to owning data source. Lookup is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct SingleTableRule {
    tables: Vec<SingleTable>,
    positions: HashMap<String, usize>,
}

impl SingleTableRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: impl Into<String>, data_source: impl Into<String>) -> Self {
        self.put_table(table, data_source);
        self
    }

    /// A table declared twice moves to the later data source.
    pub fn put_table(&mut self, table: impl Into<String>, data_source: impl Into<String>) {
        let table = SingleTable {
            table: table.into(),
            data_source: data_source.into(),
        };
        let key = table.table.to_ascii_lowercase();
        match self.positions.get(&key) {
            Some(&position) => self.tables[position] = table,
            None => {
                self.positions.insert(key, self.tables.len());
                self.tables.push(table);
            }
        }
    }

    pub fn find(&self, table: &str) -> Option<&SingleTable> {
        self.positions
            .get(&table.to_ascii_lowercase())
            .map(|&position| &self.tables[position])
    }

    pub fn tables(&self) -> &[SingleTable] {
        &self.tables
    }

    pub fn data_source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for table in &self.tables {
            if !names.contains(&table.data_source.as_str()) {
                names.push(&table.data_source);
            }
        }
        names
    }
}

impl RuleConfiguration for SingleTableRule {
    fn kind(&self) -> RuleKind {
        RuleKind::SingleTable
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
