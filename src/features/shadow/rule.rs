use super::algorithm::ShadowAlgorithm;
use crate::error::{Error, Result};
use crate::rule::{RuleConfiguration, RuleKind};
use std::any::Any;
use std::collections::BTreeMap;

/// Production data source paired with its shadow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowDataSource {
    pub name: String,
    pub production: String,
    pub shadow: String,
}

impl ShadowDataSource {
    pub fn new(name: impl Into<String>, production: impl Into<String>, shadow: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            production: production.into(),
            shadow: shadow.into(),
        }
    }

    /// Whether a unit with these data source names sits on the production side.
    pub fn is_production(&self, logic: &str, actual: &str) -> bool {
        self.production == logic || self.production == actual
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowTable {
    pub name: String,
    /// Shadow data source pairs the table is isolated on; empty means all.
    pub data_sources: Vec<String>,
    pub algorithms: Vec<String>,
}

impl ShadowTable {
    pub fn new(name: impl Into<String>, algorithms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            data_sources: Vec::new(),
            algorithms: algorithms.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_data_sources(mut self, data_sources: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.data_sources = data_sources.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShadowRule {
    data_sources: Vec<ShadowDataSource>,
    tables: Vec<ShadowTable>,
    algorithms: BTreeMap<String, ShadowAlgorithm>,
    default_algorithm: Option<String>,
}

impl ShadowRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_source(mut self, data_source: ShadowDataSource) -> Result<Self> {
        if self.data_source(&data_source.name).is_some() {
            return Err(Error::Config(format!(
                "duplicate shadow data source '{}'",
                data_source.name
            )));
        }
        self.data_sources.push(data_source);
        Ok(self)
    }

    pub fn with_algorithm(mut self, name: impl Into<String>, algorithm: ShadowAlgorithm) -> Self {
        self.algorithms.insert(name.into(), algorithm);
        self
    }

    /// Algorithms and data sources the table names must already be declared.
    pub fn with_table(mut self, table: ShadowTable) -> Result<Self> {
        if let Some(missing) = table.algorithms.iter().find(|name| !self.algorithms.contains_key(*name)) {
            return Err(Error::Config(format!(
                "shadow table '{}' uses undeclared algorithm '{}'",
                table.name, missing
            )));
        }
        if let Some(missing) = table
            .data_sources
            .iter()
            .find(|name| self.data_source(name).is_none())
        {
            return Err(Error::Config(format!(
                "shadow table '{}' uses undeclared shadow data source '{}'",
                table.name, missing
            )));
        }
        self.tables
            .retain(|existing| !existing.name.eq_ignore_ascii_case(&table.name));
        self.tables.push(table);
        Ok(self)
    }

    /// The default algorithm covers statements no table algorithm matched,
    /// so it can only be a hint.
    pub fn with_default_algorithm(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        match self.algorithms.get(&name) {
            Some(algorithm) if algorithm.is_hint() => {
                self.default_algorithm = Some(name);
                Ok(self)
            }
            Some(_) => Err(Error::Config(format!(
                "default shadow algorithm '{}' must be a hint algorithm",
                name
            ))),
            None => Err(Error::Config(format!(
                "default shadow algorithm '{}' is not declared",
                name
            ))),
        }
    }

    pub fn data_source(&self, name: &str) -> Option<&ShadowDataSource> {
        self.data_sources.iter().find(|data_source| data_source.name == name)
    }

    pub fn data_sources(&self) -> &[ShadowDataSource] {
        &self.data_sources
    }

    pub fn find_table(&self, name: &str) -> Option<&ShadowTable> {
        self.tables
            .iter()
            .find(|table| table.name.eq_ignore_ascii_case(name))
    }

    pub fn algorithm(&self, name: &str) -> Option<&ShadowAlgorithm> {
        self.algorithms.get(name)
    }

    pub fn default_algorithm(&self) -> Option<&ShadowAlgorithm> {
        self.default_algorithm
            .as_deref()
            .and_then(|name| self.algorithms.get(name))
    }

    /// Pairs a table is isolated on, in declaration order.
    pub fn data_sources_for(&self, table: &ShadowTable) -> Vec<&ShadowDataSource> {
        if table.data_sources.is_empty() {
            return self.data_sources.iter().collect();
        }
        self.data_sources
            .iter()
            .filter(|data_source| table.data_sources.contains(&data_source.name))
            .collect()
    }

    pub fn is_shadow_data_source(&self, name: &str) -> bool {
        self.data_sources.iter().any(|data_source| data_source.shadow == name)
    }
}

impl RuleConfiguration for ShadowRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Shadow
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
