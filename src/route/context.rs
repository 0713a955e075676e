use crate::error::{Error, Result};
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Logical name paired with the actual name chosen for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RouteMapper {
    pub logic_name: String,
    pub actual_name: String,
}

impl RouteMapper {
    pub fn new(logic_name: impl Into<String>, actual_name: impl Into<String>) -> Self {
        Self {
            logic_name: logic_name.into(),
            actual_name: actual_name.into(),
        }
    }

    /// Logical name routed to itself.
    pub fn identity(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            actual_name: name.clone(),
            logic_name: name,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.logic_name == self.actual_name
    }
}

pub type TableMappers = SmallVec<[RouteMapper; 4]>;

/// One physical data source and the tables chosen on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteUnit {
    pub data_source_mapper: RouteMapper,
    pub table_mappers: TableMappers,
}

impl RouteUnit {
    pub fn new(data_source_mapper: RouteMapper, table_mappers: impl IntoIterator<Item = RouteMapper>) -> Self {
        let mut unit = Self {
            data_source_mapper,
            table_mappers: TableMappers::new(),
        };
        for mapper in table_mappers {
            unit.add_table_mapper(mapper);
        }
        unit
    }

    /// Unit on `data_source` with identity mappers for `tables`.
    pub fn identity<S: AsRef<str>>(data_source: &str, tables: &[S]) -> Self {
        Self::new(
            RouteMapper::identity(data_source),
            tables.iter().map(|table| RouteMapper::identity(table.as_ref())),
        )
    }

    /// Table mappers form an ordered set; a repeated pair is ignored.
    pub fn add_table_mapper(&mut self, mapper: RouteMapper) -> bool {
        if self.table_mappers.contains(&mapper) {
            return false;
        }
        self.table_mappers.push(mapper);
        true
    }

    pub fn data_source_name(&self) -> &str {
        &self.data_source_mapper.actual_name
    }

    pub fn find_table_mapper(&self, logic_table: &str) -> Option<&RouteMapper> {
        self.table_mappers
            .iter()
            .find(|mapper| mapper.logic_name.eq_ignore_ascii_case(logic_table))
    }

    pub fn logic_table_names(&self) -> impl Iterator<Item = &str> {
        self.table_mappers.iter().map(|mapper| mapper.logic_name.as_str())
    }

    pub fn actual_table_names(&self) -> impl Iterator<Item = &str> {
        self.table_mappers.iter().map(|mapper| mapper.actual_name.as_str())
    }
}

/// Routing decision for one statement, built by the router chain.
///
/// Owned by a single routing pass. The first router creates it; every later
/// router receives it by `&mut` and refines it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteContext {
    route_units: Vec<RouteUnit>,
    annotations: BTreeMap<String, String>,
}

impl RouteContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route_units(&self) -> &[RouteUnit] {
        &self.route_units
    }

    pub fn route_units_mut(&mut self) -> std::slice::IterMut<'_, RouteUnit> {
        self.route_units.iter_mut()
    }

    /// Add `unit`, merging its table mappers into an existing unit that has
    /// the same data source mapper.
    pub fn put_route_unit(&mut self, unit: RouteUnit) {
        match self
            .route_units
            .iter_mut()
            .find(|existing| existing.data_source_mapper == unit.data_source_mapper)
        {
            Some(existing) => {
                for mapper in unit.table_mappers {
                    existing.add_table_mapper(mapper);
                }
            }
            None => self.route_units.push(unit),
        }
    }

    pub fn retain_route_units(&mut self, keep: impl FnMut(&RouteUnit) -> bool) {
        self.route_units.retain(keep);
    }

    /// Collapse units that ended up on the same data source mapper after an
    /// in-place rewrite, keeping the first position.
    pub fn merge_duplicate_units(&mut self) {
        let units = std::mem::take(&mut self.route_units);
        for unit in units {
            self.put_route_unit(unit);
        }
    }

    pub fn len(&self) -> usize {
        self.route_units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.route_units.is_empty()
    }

    pub fn is_single_routing(&self) -> bool {
        self.route_units.len() == 1
    }

    /// Distinct actual data source names in unit order.
    pub fn actual_data_source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.route_units.len());
        for unit in &self.route_units {
            let name = unit.data_source_name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn find_table_mapper(&self, actual_data_source: &str, logic_table: &str) -> Option<&RouteMapper> {
        self.route_units
            .iter()
            .filter(|unit| unit.data_source_name() == actual_data_source)
            .find_map(|unit| unit.find_table_mapper(logic_table))
    }

    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.annotations.insert(key.into(), value.into());
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    /// Execution-side guard: a context without units cannot be executed.
    pub fn require_routable(&self, sql: &str) -> Result<()> {
        if self.route_units.is_empty() {
            return Err(Error::Unroutable {
                statement: sql.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_route_unit_merges_same_data_source() {
        let mut context = RouteContext::new();
        context.put_route_unit(RouteUnit::new(
            RouteMapper::identity("ds0"),
            vec![RouteMapper::new("t_order", "t_order_0")],
        ));
        context.put_route_unit(RouteUnit::new(
            RouteMapper::identity("ds1"),
            vec![RouteMapper::new("t_order", "t_order_1")],
        ));
        context.put_route_unit(RouteUnit::new(
            RouteMapper::identity("ds0"),
            vec![
                RouteMapper::new("t_order", "t_order_0"),
                RouteMapper::identity("t_user"),
            ],
        ));

        assert_eq!(context.len(), 2);
        let first = &context.route_units()[0];
        assert_eq!(first.actual_table_names().collect::<Vec<_>>(), vec!["t_order_0", "t_user"]);
        assert_eq!(context.actual_data_source_names(), vec!["ds0", "ds1"]);
        assert_eq!(
            context.find_table_mapper("ds1", "T_ORDER").map(|m| m.actual_name.as_str()),
            Some("t_order_1")
        );
    }

    #[test]
    fn test_merge_duplicate_units_after_rewrite() {
        let mut context = RouteContext::new();
        context.put_route_unit(RouteUnit::identity("ds0", &["t_a"]));
        context.put_route_unit(RouteUnit::identity("ds1", &["t_b"]));
        for unit in context.route_units_mut() {
            unit.data_source_mapper.actual_name = "primary".to_string();
            unit.data_source_mapper.logic_name = "primary".to_string();
        }
        context.merge_duplicate_units();

        assert!(context.is_single_routing());
        assert_eq!(
            context.route_units()[0].logic_table_names().collect::<Vec<_>>(),
            vec!["t_a", "t_b"]
        );
    }

    #[test]
    fn test_require_routable() {
        let mut context = RouteContext::new();
        assert_eq!(
            context.require_routable("SELECT 1"),
            Err(Error::Unroutable {
                statement: "SELECT 1".to_string()
            })
        );

        context.annotate("shadow.matched", "false");
        context.put_route_unit(RouteUnit::identity("ds0", &["t_order"]));
        assert!(context.require_routable("SELECT 1").is_ok());
        assert_eq!(context.annotation("shadow.matched"), Some("false"));
        assert!(context.route_units()[0].table_mappers[0].is_identity());
    }
}
