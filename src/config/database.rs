use crate::error::Result;
use crate::features::encrypt::{EncryptRule, EncryptTable};
use crate::features::readwrite_splitting::{LoadBalancer, ReadwriteSplittingGroup, ReadwriteSplittingRule};
use crate::features::shadow::{ShadowAlgorithm, ShadowDataSource, ShadowOperation, ShadowRule, ShadowTable};
use crate::features::sharding::{ShardingRule, ShardingStrategy, ShardingTableRule};
use crate::features::single::SingleTableRule;
use crate::metadata::{DatabaseType, LogicDatabase, PhysicalInstanceIndex, SchemaMetadata, TableMetadata};
use crate::route::ShardingValue;
use crate::rule::{RuleConfiguration, RuleSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub name: String,
    pub url: String,
}

/// Layout of one logical database as read from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,
    pub database_type: DatabaseType,
    /// Declaration order decides representatives and defaults.
    pub data_sources: Vec<DataSourceConfig>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub tables: Vec<TableMetadata>,
}

impl DatabaseConfig {
    /// Parse every descriptor and convert every rule into the snapshot
    /// routers read. Every data source a rule names must resolve.
    pub fn build(&self) -> Result<LogicDatabase> {
        let instances = PhysicalInstanceIndex::build(
            self.data_sources
                .iter()
                .map(|data_source| (data_source.name.as_str(), data_source.url.as_str())),
            self.database_type,
        )?;

        let mut rules = RuleSet::new();
        for rule in &self.rules {
            rules.push(rule.to_rule()?);
        }

        let database = LogicDatabase::new(
            self.name.as_str(),
            SchemaMetadata::from_tables(self.name.as_str(), self.tables.iter().cloned()),
            instances,
            rules,
        );
        for rule in &self.rules {
            for name in rule.data_source_names() {
                database.ensure_data_source(name)?;
            }
        }
        if let Some(sharding) = database.rules.find_typed::<ShardingRule>() {
            for name in sharding.data_source_names() {
                database.ensure_data_source(name)?;
            }
        }

        info!(
            database = %database.name,
            data_sources = database.instances.len(),
            rules = database.rules.len(),
            tables = database.schema.len(),
            "Logic database built"
        );
        Ok(database)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleTableConfig {
    pub table: String,
    pub data_source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardingTableConfig {
    pub logic_table: String,
    /// Inline expression such as `ds_${0..1}.t_order_${0..3}`.
    pub actual_data_nodes: String,
    #[serde(default)]
    pub database_strategy: Option<ShardingStrategy>,
    #[serde(default)]
    pub table_strategy: Option<ShardingStrategy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadwriteSplittingGroupConfig {
    pub name: String,
    pub write_data_source: String,
    #[serde(default)]
    pub read_data_sources: Vec<String>,
    #[serde(default)]
    pub load_balancer: LoadBalancer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowDataSourceConfig {
    pub name: String,
    pub production: String,
    pub shadow: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowTableConfig {
    pub name: String,
    #[serde(default)]
    pub data_sources: Vec<String>,
    pub algorithms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShadowAlgorithmConfig {
    ColumnValueMatch {
        column: String,
        operation: ShadowOperation,
        value: ShardingValue,
    },
    ColumnRegexMatch {
        column: String,
        operation: ShadowOperation,
        regex: String,
    },
    Hint,
}

impl ShadowAlgorithmConfig {
    fn to_algorithm(&self) -> Result<ShadowAlgorithm> {
        match self {
            ShadowAlgorithmConfig::ColumnValueMatch {
                column,
                operation,
                value,
            } => Ok(ShadowAlgorithm::column_value(column.as_str(), *operation, value.clone())),
            ShadowAlgorithmConfig::ColumnRegexMatch {
                column,
                operation,
                regex,
            } => ShadowAlgorithm::column_regex(column.as_str(), *operation, regex),
            ShadowAlgorithmConfig::Hint => Ok(ShadowAlgorithm::Hint),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfig {
    Single {
        tables: Vec<SingleTableConfig>,
    },
    Sharding {
        #[serde(default)]
        tables: Vec<ShardingTableConfig>,
        #[serde(default)]
        broadcast_tables: Vec<String>,
        #[serde(default)]
        default_data_source: Option<String>,
    },
    ReadwriteSplitting {
        groups: Vec<ReadwriteSplittingGroupConfig>,
        #[serde(default)]
        default_group: Option<String>,
    },
    Encrypt {
        tables: Vec<EncryptTable>,
    },
    Shadow {
        data_sources: Vec<ShadowDataSourceConfig>,
        #[serde(default)]
        tables: Vec<ShadowTableConfig>,
        #[serde(default)]
        algorithms: BTreeMap<String, ShadowAlgorithmConfig>,
        #[serde(default)]
        default_algorithm: Option<String>,
    },
}

impl RuleConfig {
    pub fn to_rule(&self) -> Result<Arc<dyn RuleConfiguration>> {
        match self {
            RuleConfig::Single { tables } => {
                let mut rule = SingleTableRule::new();
                for table in tables {
                    rule.put_table(table.table.as_str(), table.data_source.as_str());
                }
                Ok(Arc::new(rule))
            }
            RuleConfig::Sharding {
                tables,
                broadcast_tables,
                default_data_source,
            } => {
                let mut rule = ShardingRule::new();
                for table in tables {
                    let mut table_rule =
                        ShardingTableRule::from_expression(table.logic_table.as_str(), &table.actual_data_nodes)?;
                    if let Some(strategy) = &table.database_strategy {
                        table_rule = table_rule.with_database_strategy(strategy.clone())?;
                    }
                    if let Some(strategy) = &table.table_strategy {
                        table_rule = table_rule.with_table_strategy(strategy.clone())?;
                    }
                    rule.put_table(table_rule);
                }
                for table in broadcast_tables {
                    rule = rule.with_broadcast_table(table.as_str());
                }
                if let Some(data_source) = default_data_source {
                    rule = rule.with_default_data_source(data_source.as_str());
                }
                Ok(Arc::new(rule))
            }
            RuleConfig::ReadwriteSplitting { groups, default_group } => {
                let mut rule = ReadwriteSplittingRule::new();
                for group in groups {
                    rule = rule.with_group(
                        ReadwriteSplittingGroup::new(
                            group.name.as_str(),
                            group.write_data_source.as_str(),
                            group.read_data_sources.iter().map(String::as_str),
                        )
                        .with_load_balancer(group.load_balancer),
                    )?;
                }
                if let Some(name) = default_group {
                    rule = rule.with_default_group(name.as_str())?;
                }
                Ok(Arc::new(rule))
            }
            RuleConfig::Encrypt { tables } => Ok(Arc::new(
                tables
                    .iter()
                    .cloned()
                    .fold(EncryptRule::new(), |rule, table| rule.with_table(table)),
            )),
            RuleConfig::Shadow {
                data_sources,
                tables,
                algorithms,
                default_algorithm,
            } => {
                let mut rule = ShadowRule::new();
                for data_source in data_sources {
                    rule = rule.with_data_source(ShadowDataSource::new(
                        data_source.name.as_str(),
                        data_source.production.as_str(),
                        data_source.shadow.as_str(),
                    ))?;
                }
                for (name, algorithm) in algorithms {
                    rule = rule.with_algorithm(name.as_str(), algorithm.to_algorithm()?);
                }
                for table in tables {
                    rule = rule.with_table(
                        ShadowTable::new(table.name.as_str(), table.algorithms.iter().map(String::as_str))
                            .with_data_sources(table.data_sources.iter().map(String::as_str)),
                    )?;
                }
                if let Some(name) = default_algorithm {
                    rule = rule.with_default_algorithm(name.as_str())?;
                }
                Ok(Arc::new(rule))
            }
        }
    }

    /// Data source names the rule declares outside of sharding data nodes.
    fn data_source_names(&self) -> Vec<&str> {
        match self {
            RuleConfig::Single { tables } => tables.iter().map(|table| table.data_source.as_str()).collect(),
            RuleConfig::ReadwriteSplitting { groups, .. } => groups
                .iter()
                .flat_map(|group| {
                    std::iter::once(group.write_data_source.as_str())
                        .chain(group.read_data_sources.iter().map(String::as_str))
                })
                .collect(),
            RuleConfig::Sharding { .. } | RuleConfig::Encrypt { .. } => Vec::new(),
            RuleConfig::Shadow { data_sources, .. } => data_sources
                .iter()
                .flat_map(|data_source| [data_source.production.as_str(), data_source.shadow.as_str()])
                .collect(),
        }
    }
}
