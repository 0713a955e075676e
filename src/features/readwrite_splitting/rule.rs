use crate::error::{Error, Result};
use crate::metadata::ReplicaGrouping;
use crate::rule::{RuleConfiguration, RuleKind};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Deterministic replica selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancer {
    /// Always the first replica.
    #[default]
    First,
    /// Replica chosen by connection id, so a connection keeps its replica.
    ConnectionHash,
}

impl LoadBalancer {
    pub fn choose<'a>(&self, reads: &'a [String], connection_id: u64) -> Option<&'a str> {
        if reads.is_empty() {
            return None;
        }
        let index = match self {
            LoadBalancer::First => 0,
            LoadBalancer::ConnectionHash => (connection_id % reads.len() as u64) as usize,
        };
        Some(reads[index].as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadwriteSplittingGroup {
    pub name: String,
    pub write_data_source: String,
    pub read_data_sources: Vec<String>,
    pub load_balancer: LoadBalancer,
}

impl ReadwriteSplittingGroup {
    pub fn new(
        name: impl Into<String>,
        write_data_source: impl Into<String>,
        read_data_sources: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            write_data_source: write_data_source.into(),
            read_data_sources: read_data_sources.into_iter().map(Into::into).collect(),
            load_balancer: LoadBalancer::default(),
        }
    }

    pub fn with_load_balancer(mut self, load_balancer: LoadBalancer) -> Self {
        self.load_balancer = load_balancer;
        self
    }

    pub fn contains(&self, data_source: &str) -> bool {
        self.write_data_source == data_source || self.read_data_sources.iter().any(|read| read == data_source)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadwriteSplittingRule {
    groups: Vec<ReadwriteSplittingGroup>,
    default_group: Option<String>,
}

impl ReadwriteSplittingRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group names must be unique and a data source may belong to one group
    /// only.
    pub fn with_group(mut self, group: ReadwriteSplittingGroup) -> Result<Self> {
        if self.group(&group.name).is_some() {
            return Err(Error::Config(format!(
                "duplicate readwrite splitting group '{}'",
                group.name
            )));
        }
        let members = std::iter::once(&group.write_data_source).chain(&group.read_data_sources);
        for member in members {
            if let Some(owner) = self.groups.iter().find(|existing| existing.contains(member)) {
                return Err(Error::Config(format!(
                    "data source '{}' already belongs to readwrite splitting group '{}'",
                    member, owner.name
                )));
            }
        }
        self.groups.push(group);
        Ok(self)
    }

    pub fn with_default_group(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if self.group(&name).is_none() {
            return Err(Error::Config(format!(
                "default readwrite splitting group '{}' is not declared",
                name
            )));
        }
        self.default_group = Some(name);
        Ok(self)
    }

    pub fn group(&self, name: &str) -> Option<&ReadwriteSplittingGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn groups(&self) -> &[ReadwriteSplittingGroup] {
        &self.groups
    }

    /// The configured default group, else the first declared one.
    pub fn default_group(&self) -> Option<&ReadwriteSplittingGroup> {
        match &self.default_group {
            Some(name) => self.group(name),
            None => self.groups.first(),
        }
    }
}

impl ReplicaGrouping for ReadwriteSplittingRule {
    fn group_of(&self, data_source: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|group| group.contains(data_source))
            .map(|group| group.name.as_str())
    }

    fn is_group(&self, name: &str) -> bool {
        self.group(name).is_some()
    }
}

impl RuleConfiguration for ReadwriteSplittingRule {
    fn kind(&self) -> RuleKind {
        RuleKind::ReadwriteSplitting
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_replica_grouping(&self) -> Option<&dyn ReplicaGrouping> {
        Some(self)
    }
}
