use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub primary_key: bool,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnMetadata>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Logical table metadata of one schema. Table names are case-insensitive and
/// stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaMetadata {
    pub name: String,
    tables: BTreeMap<String, TableMetadata>,
}

impl SchemaMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: BTreeMap::new(),
        }
    }

    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.put_table(table);
        self
    }

    pub fn from_tables(name: impl Into<String>, tables: impl IntoIterator<Item = TableMetadata>) -> Self {
        let mut schema = Self::new(name);
        for table in tables {
            schema.put_table(table);
        }
        schema
    }

    pub fn put_table(&mut self, table: TableMetadata) {
        self.tables.insert(table.name.to_ascii_lowercase(), table);
    }

    pub fn table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.get(&name.to_ascii_lowercase())
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.values().map(|table| table.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup_is_case_insensitive() {
        let schema = SchemaMetadata::new("logic_db").with_table(TableMetadata::new(
            "t_order",
            vec![
                ColumnMetadata::new("order_id", "BIGINT").primary_key(),
                ColumnMetadata::new("user_id", "INT"),
            ],
        ));

        let table = schema.table("T_ORDER").unwrap();
        assert!(table.has_column("USER_ID"));
        assert!(table.column("order_id").unwrap().primary_key);
        assert!(!schema.contains_table("t_order_item"));
    }
}
