use super::algorithm::{trailing_index, ShardingAlgorithm};
use super::expression;
use crate::error::{Error, Result};
use crate::rule::{RuleConfiguration, RuleKind};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// One physical table on one data source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataNode {
    pub data_source: String,
    pub table: String,
}

impl DataNode {
    pub fn new(data_source: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            table: table.into(),
        }
    }

    /// `data_source.table`
    pub fn parse(text: &str) -> Result<Self> {
        match text.trim().split_once('.') {
            Some((data_source, table)) if !data_source.is_empty() && !table.is_empty() => {
                Ok(Self::new(data_source, table))
            }
            _ => Err(Error::Config(format!(
                "data node '{}' must be written as data_source.table",
                text
            ))),
        }
    }
}

impl fmt::Display for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.data_source, self.table)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardingStrategy {
    pub column: String,
    pub algorithm: ShardingAlgorithm,
}

impl ShardingStrategy {
    pub fn new(column: impl Into<String>, algorithm: ShardingAlgorithm) -> Self {
        Self {
            column: column.into(),
            algorithm,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardingTableRule {
    pub logic_table: String,
    actual_data_nodes: Vec<DataNode>,
    pub database_strategy: Option<ShardingStrategy>,
    pub table_strategy: Option<ShardingStrategy>,
}

impl ShardingTableRule {
    pub fn new(logic_table: impl Into<String>, actual_data_nodes: Vec<DataNode>) -> Result<Self> {
        let logic_table = logic_table.into();
        if actual_data_nodes.is_empty() {
            return Err(Error::Config(format!(
                "sharding table '{}' has no actual data nodes",
                logic_table
            )));
        }
        let mut nodes: Vec<DataNode> = Vec::with_capacity(actual_data_nodes.len());
        for node in actual_data_nodes {
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }
        Ok(Self {
            logic_table,
            actual_data_nodes: nodes,
            database_strategy: None,
            table_strategy: None,
        })
    }

    /// Nodes from an inline expression such as `ds_${0..1}.t_order_${0..3}`.
    pub fn from_expression(logic_table: impl Into<String>, expression: &str) -> Result<Self> {
        let nodes = expression::expand(expression)?
            .iter()
            .map(|node| DataNode::parse(node))
            .collect::<Result<Vec<_>>>()?;
        Self::new(logic_table, nodes)
    }

    pub fn with_database_strategy(mut self, strategy: ShardingStrategy) -> Result<Self> {
        strategy.algorithm.validate()?;
        self.require_indexed(&strategy, self.data_source_names())?;
        self.database_strategy = Some(strategy);
        Ok(self)
    }

    pub fn with_table_strategy(mut self, strategy: ShardingStrategy) -> Result<Self> {
        strategy.algorithm.validate()?;
        let tables: Vec<&str> = self.actual_data_nodes.iter().map(|node| node.table.as_str()).collect();
        self.require_indexed(&strategy, tables)?;
        self.table_strategy = Some(strategy);
        Ok(self)
    }

    /// Strategy targets are found by trailing number, so every target name
    /// must end with one.
    fn require_indexed(&self, strategy: &ShardingStrategy, targets: Vec<&str>) -> Result<()> {
        match targets.iter().find(|target| trailing_index(target).is_none()) {
            Some(target) => Err(Error::Config(format!(
                "sharding table '{}': target '{}' of the {} strategy has no numeric suffix",
                self.logic_table, target, strategy.column
            ))),
            None => Ok(()),
        }
    }

    pub fn actual_data_nodes(&self) -> &[DataNode] {
        &self.actual_data_nodes
    }

    /// Distinct data sources in node order.
    pub fn data_source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for node in &self.actual_data_nodes {
            if !names.contains(&node.data_source.as_str()) {
                names.push(&node.data_source);
            }
        }
        names
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShardingRule {
    tables: Vec<ShardingTableRule>,
    positions: HashMap<String, usize>,
    broadcast_tables: Vec<String>,
    pub default_data_source: Option<String>,
}

impl ShardingRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: ShardingTableRule) -> Self {
        self.put_table(table);
        self
    }

    pub fn put_table(&mut self, table: ShardingTableRule) {
        let key = table.logic_table.to_ascii_lowercase();
        match self.positions.get(&key) {
            Some(&position) => self.tables[position] = table,
            None => {
                self.positions.insert(key, self.tables.len());
                self.tables.push(table);
            }
        }
    }

    pub fn with_broadcast_table(mut self, table: impl Into<String>) -> Self {
        let table = table.into();
        if !self.is_broadcast_table(&table) {
            self.broadcast_tables.push(table);
        }
        self
    }

    pub fn with_default_data_source(mut self, data_source: impl Into<String>) -> Self {
        self.default_data_source = Some(data_source.into());
        self
    }

    pub fn find_table_rule(&self, logic_table: &str) -> Option<&ShardingTableRule> {
        self.positions
            .get(&logic_table.to_ascii_lowercase())
            .map(|&position| &self.tables[position])
    }

    pub fn table_rules(&self) -> &[ShardingTableRule] {
        &self.tables
    }

    pub fn is_broadcast_table(&self, table: &str) -> bool {
        self.broadcast_tables
            .iter()
            .any(|broadcast| broadcast.eq_ignore_ascii_case(table))
    }

    pub fn broadcast_tables(&self) -> &[String] {
        &self.broadcast_tables
    }

    /// Data sources of every table rule in declaration order, then the
    /// default data source.
    pub fn data_source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let declared = self
            .tables
            .iter()
            .flat_map(|table| table.data_source_names())
            .chain(self.default_data_source.as_deref());
        for name in declared {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

impl RuleConfiguration for ShardingRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Sharding
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
