use super::datasource::{DatabaseType, PhysicalInstanceIndex};
use super::schema::SchemaMetadata;
use crate::error::{Error, Result};
use crate::rule::RuleSet;

/// Everything a router reads for one logical database. Built once per schema
/// load; routers only ever see it behind a shared reference.
#[derive(Debug, Clone)]
pub struct LogicDatabase {
    pub name: String,
    pub database_type: DatabaseType,
    pub schema: SchemaMetadata,
    pub instances: PhysicalInstanceIndex,
    pub rules: RuleSet,
}

impl LogicDatabase {
    pub fn new(
        name: impl Into<String>,
        schema: SchemaMetadata,
        instances: PhysicalInstanceIndex,
        rules: RuleSet,
    ) -> Self {
        Self {
            name: name.into(),
            database_type: instances.database_type(),
            schema,
            instances,
            rules,
        }
    }

    /// Names routers may emit as unit data sources: physical names from the
    /// index, plus group names declared by a replica grouping rule.
    pub fn ensure_data_source(&self, name: &str) -> Result<()> {
        if self.instances.contains(name) {
            return Ok(());
        }
        match self.rules.replica_grouping() {
            Some(grouping) if grouping.is_group(name) => Ok(()),
            _ => Err(Error::unknown_data_source(name)),
        }
    }

    /// Default route targets: one name per physical instance, grouped names
    /// collapsed to their group.
    pub fn representative_names(&self) -> Vec<String> {
        self.instances.representative_names(self.rules.replica_grouping())
    }
}
