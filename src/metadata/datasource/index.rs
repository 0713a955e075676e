use super::dialect::DialectParsers;
use super::{DataSourceIdentity, DatabaseType};
use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Maps member data sources onto replica groups (e.g. a primary and its
/// replicas configured under one read/write splitting group).
pub trait ReplicaGrouping {
    /// Canonical group name for `data_source`, if it belongs to a group.
    fn group_of(&self, data_source: &str) -> Option<&str>;

    /// Whether `name` is itself a group name.
    fn is_group(&self, name: &str) -> bool;
}

/// Logical data source name → physical identity, in configuration order.
///
/// Built once per schema load and never mutated afterwards; reconfiguration
/// builds a new index.
#[derive(Debug, Clone)]
pub struct PhysicalInstanceIndex {
    database_type: DatabaseType,
    identities: Vec<DataSourceIdentity>,
    positions: HashMap<String, usize>,
}

impl PhysicalInstanceIndex {
    pub fn empty(database_type: DatabaseType) -> Self {
        Self {
            database_type,
            identities: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Parse every descriptor with the default parser table.
    pub fn build<I, K, V>(descriptors: I, database_type: DatabaseType) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        Self::build_with_parsers(descriptors, database_type, &DialectParsers::default())
    }

    pub fn build_with_parsers<I, K, V>(
        descriptors: I,
        database_type: DatabaseType,
        parsers: &DialectParsers,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let parser = parsers.parser_for(database_type)?;
        let mut index = Self::empty(database_type);

        for (name, url) in descriptors {
            let name = name.into();
            let identity = parser.parse(&name, url.as_ref(), database_type)?;
            debug!(
                data_source = %name,
                host = %identity.host,
                port = ?identity.port,
                catalog = %identity.catalog,
                "Parsed data source descriptor"
            );
            index.insert(identity);
        }

        info!(
            database_type = %database_type,
            data_sources = index.len(),
            instances = index.instance_count(),
            "Physical instance index built"
        );
        Ok(index)
    }

    /// A repeated name keeps its original position and takes the new identity.
    fn insert(&mut self, identity: DataSourceIdentity) {
        match self.positions.get(&identity.name) {
            Some(&position) => self.identities[position] = identity,
            None => {
                self.positions.insert(identity.name.clone(), self.identities.len());
                self.identities.push(identity);
            }
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn identity(&self, name: &str) -> Option<&DataSourceIdentity> {
        self.positions.get(name).map(|&position| &self.identities[position])
    }

    pub fn identities(&self) -> &[DataSourceIdentity] {
        &self.identities
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.identities.iter().map(|identity| identity.name.as_str())
    }

    pub fn is_same_instance(&self, a: &str, b: &str) -> bool {
        match (self.identity(a), self.identity(b)) {
            (Some(a), Some(b)) => a.is_same_instance(b),
            _ => false,
        }
    }

    /// One name per distinct physical instance, first seen wins.
    ///
    /// With a grouping, a grouped data source is represented by its group name
    /// and later members of an already represented group are skipped.
    pub fn representative_names(&self, grouping: Option<&dyn ReplicaGrouping>) -> Vec<String> {
        let mut result = Vec::new();
        let mut seen_names = HashSet::new();
        let mut seen_instances = HashSet::new();

        for identity in &self.identities {
            let candidate = grouping
                .and_then(|grouping| grouping.group_of(&identity.name))
                .unwrap_or(&identity.name);
            if seen_names.contains(candidate) || seen_instances.contains(&identity.instance_key()) {
                continue;
            }
            seen_names.insert(candidate);
            seen_instances.insert(identity.instance_key());
            result.push(candidate.to_string());
        }

        result
    }

    pub fn instance_count(&self) -> usize {
        self.identities
            .iter()
            .map(DataSourceIdentity::instance_key)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn schema_name_for(&self, name: &str) -> Result<&str> {
        self.identity(name)
            .map(DataSourceIdentity::schema_name)
            .ok_or_else(|| Error::unknown_data_source(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct Groups(BTreeMap<&'static str, &'static str>);

    impl ReplicaGrouping for Groups {
        fn group_of(&self, data_source: &str) -> Option<&str> {
            self.0.get(data_source).copied()
        }

        fn is_group(&self, name: &str) -> bool {
            self.0.values().any(|group| *group == name)
        }
    }

    fn three_sources() -> PhysicalInstanceIndex {
        PhysicalInstanceIndex::build(
            vec![
                ("ds0", "jdbc:postgresql://10.0.0.2:5432/db0"),
                ("ds1", "jdbc:postgresql://10.0.0.1:5432/db1"),
                ("ds2", "jdbc:postgresql://10.0.0.1:5432/db2"),
            ],
            DatabaseType::PostgreSQL,
        )
        .unwrap()
    }

    #[test]
    fn test_first_seen_representative_wins() {
        let index = three_sources();
        assert_eq!(index.representative_names(None), vec!["ds0", "ds1"]);
        assert_eq!(index.instance_count(), 2);
    }

    #[test]
    fn test_is_same_instance() {
        let index = three_sources();
        assert!(index.is_same_instance("ds1", "ds2"));
        assert!(!index.is_same_instance("ds0", "ds1"));
        assert!(!index.is_same_instance("ds0", "missing"));
    }

    #[test]
    fn test_grouped_names_collapse_to_group() {
        let index = PhysicalInstanceIndex::build(
            vec![
                ("write_ds", "jdbc:mysql://10.0.0.1:3306/db"),
                ("read_ds_0", "jdbc:mysql://10.0.0.2:3306/db"),
                ("read_ds_1", "jdbc:mysql://10.0.0.3:3306/db"),
                ("other_ds", "jdbc:mysql://10.0.0.4:3306/db"),
            ],
            DatabaseType::MySQL,
        )
        .unwrap();
        let groups = Groups(BTreeMap::from([
            ("write_ds", "rw_group"),
            ("read_ds_0", "rw_group"),
            ("read_ds_1", "rw_group"),
        ]));

        assert_eq!(
            index.representative_names(Some(&groups)),
            vec!["rw_group", "other_ds"]
        );
    }

    #[test]
    fn test_skipped_member_does_not_block_its_group() {
        let index = PhysicalInstanceIndex::build(
            vec![
                ("plain_ds", "jdbc:mysql://10.0.0.1:3306/plain"),
                ("write_ds", "jdbc:mysql://10.0.0.1:3306/db"),
                ("read_ds", "jdbc:mysql://10.0.0.2:3306/db"),
            ],
            DatabaseType::MySQL,
        )
        .unwrap();
        let groups = Groups(BTreeMap::from([("write_ds", "rw_group"), ("read_ds", "rw_group")]));

        assert_eq!(
            index.representative_names(Some(&groups)),
            vec!["plain_ds", "rw_group"]
        );
    }

    #[test]
    fn test_schema_name_for_unknown() {
        let index = three_sources();
        assert_eq!(index.schema_name_for("ds0").unwrap(), "public");
        assert_eq!(
            index.schema_name_for("ds9"),
            Err(Error::UnknownDataSource {
                name: "ds9".to_string()
            })
        );
    }

    #[test]
    fn test_repeated_name_keeps_position() {
        let index = PhysicalInstanceIndex::build(
            vec![
                ("ds0", "jdbc:mysql://10.0.0.1:3306/a"),
                ("ds1", "jdbc:mysql://10.0.0.2:3306/b"),
                ("ds0", "jdbc:mysql://10.0.0.3:3306/c"),
            ],
            DatabaseType::MySQL,
        )
        .unwrap();

        assert_eq!(index.names().collect::<Vec<_>>(), vec!["ds0", "ds1"]);
        assert_eq!(index.identity("ds0").unwrap().host, "10.0.0.3");
    }

    #[test]
    fn test_build_failures() {
        let unsupported = PhysicalInstanceIndex::build(
            vec![("ds0", "jdbc:mysql://10.0.0.1:3306/a")],
            DatabaseType::SQL92,
        );
        assert!(matches!(unsupported, Err(Error::UnsupportedDialect(_))));

        let malformed = PhysicalInstanceIndex::build(
            vec![("ds0", "jdbc:mysql://10.0.0.1:3306/a"), ("ds1", "not a url")],
            DatabaseType::MySQL,
        );
        assert!(matches!(
            malformed,
            Err(Error::MalformedConnectionDescriptor { name, .. }) if name == "ds1"
        ));
    }
}
