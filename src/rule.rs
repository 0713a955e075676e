//! Configured rule set of a logical database
//!
//! Rules are opaque to the routing pipeline except for their [`RuleKind`];
//! each router downcasts the rule bound to its kind.

use crate::error::{Error, Result};
use crate::metadata::datasource::ReplicaGrouping;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Tag binding a rule configuration to the router that handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RuleKind {
    SingleTable,
    Sharding,
    ReadwriteSplitting,
    Encrypt,
    Shadow,
    /// Extension rule kinds registered outside this crate.
    Custom(&'static str),
}

impl RuleKind {
    pub const BUILTIN: [RuleKind; 5] = [
        RuleKind::SingleTable,
        RuleKind::Sharding,
        RuleKind::ReadwriteSplitting,
        RuleKind::Encrypt,
        RuleKind::Shadow,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::SingleTable => "single",
            RuleKind::Sharding => "sharding",
            RuleKind::ReadwriteSplitting => "readwrite_splitting",
            RuleKind::Encrypt => "encrypt",
            RuleKind::Shadow => "shadow",
            RuleKind::Custom(name) => name,
        }
    }

    /// Built-in kind for a configuration name, if any.
    pub fn from_builtin_name(name: &str) -> Option<Self> {
        Self::BUILTIN
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait RuleConfiguration: Any + Send + Sync + fmt::Debug {
    fn kind(&self) -> RuleKind;

    fn as_any(&self) -> &dyn Any;

    /// Replica grouping view, for rules that group physical data sources.
    fn as_replica_grouping(&self) -> Option<&dyn ReplicaGrouping> {
        None
    }
}

/// Downcast `rule` to the concrete type a router expects.
pub fn downcast_rule<T: RuleConfiguration>(rule: &dyn RuleConfiguration) -> Result<&T> {
    rule.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::Config(format!(
            "rule bound to kind {} is not a {}",
            rule.kind(),
            std::any::type_name::<T>()
        ))
    })
}

/// Ordered rule configurations of one logical database. At most one rule per
/// kind is active; a later rule of the same kind replaces the earlier one in
/// place.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<dyn RuleConfiguration>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: Arc<dyn RuleConfiguration>) -> Self {
        self.push(rule);
        self
    }

    pub fn push(&mut self, rule: Arc<dyn RuleConfiguration>) {
        match self.rules.iter().position(|existing| existing.kind() == rule.kind()) {
            Some(position) => self.rules[position] = rule,
            None => self.rules.push(rule),
        }
    }

    pub fn find(&self, kind: RuleKind) -> Option<&dyn RuleConfiguration> {
        self.rules
            .iter()
            .find(|rule| rule.kind() == kind)
            .map(|rule| rule.as_ref())
    }

    pub fn find_typed<T: RuleConfiguration>(&self) -> Option<&T> {
        self.rules
            .iter()
            .find_map(|rule| rule.as_any().downcast_ref::<T>())
    }

    pub fn contains(&self, kind: RuleKind) -> bool {
        self.find(kind).is_some()
    }

    pub fn kinds(&self) -> Vec<RuleKind> {
        self.rules.iter().map(|rule| rule.kind()).collect()
    }

    /// First rule exposing a replica grouping.
    pub fn replica_grouping(&self) -> Option<&dyn ReplicaGrouping> {
        self.rules.iter().find_map(|rule| rule.as_replica_grouping())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
