use super::rule::SingleTableRule;
use crate::config::ConfigurationProperties;
use crate::error::Result;
use crate::metadata::LogicDatabase;
use crate::route::{
    fallback_route_context, ConnectionContext, QueryContext, RouteContext, RouteMapper, RouteUnit, RuleRouter,
};
use crate::rule::{downcast_rule, RuleConfiguration, RuleKind};
use tracing::debug;

/// Sends single tables to the data source that owns them.
#[derive(Debug, Clone, Copy)]
pub struct SingleTableRouter {
    order: i32,
}

impl SingleTableRouter {
    pub const DEFAULT_ORDER: i32 = 0;

    pub fn new() -> Self {
        Self {
            order: Self::DEFAULT_ORDER,
        }
    }

    pub fn with_order(self, order: i32) -> Self {
        Self { order }
    }

    /// Units for the queried single tables, grouped by owning data source in
    /// query table order.
    fn single_table_units(query: &QueryContext, database: &LogicDatabase, rule: &SingleTableRule) -> Result<Vec<RouteUnit>> {
        let mut units: Vec<RouteUnit> = Vec::new();
        for table in &query.tables {
            let Some(single) = rule.find(table) else {
                continue;
            };
            database.ensure_data_source(&single.data_source)?;
            match units
                .iter_mut()
                .find(|unit| unit.data_source_name() == single.data_source)
            {
                Some(unit) => {
                    unit.add_table_mapper(RouteMapper::identity(table.as_str()));
                }
                None => units.push(RouteUnit::identity(&single.data_source, &[table])),
            }
        }
        Ok(units)
    }
}

impl Default for SingleTableRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRouter for SingleTableRouter {
    fn rule_kind(&self) -> RuleKind {
        RuleKind::SingleTable
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn create_route_context(
        &self,
        query: &QueryContext,
        database: &LogicDatabase,
        rule: &dyn RuleConfiguration,
        _props: &ConfigurationProperties,
        _connection: &ConnectionContext,
    ) -> Result<RouteContext> {
        let rule = downcast_rule::<SingleTableRule>(rule)?;

        if query.tables.is_empty() {
            return Ok(fallback_route_context(query, database));
        }

        let mut context = RouteContext::new();
        for unit in Self::single_table_units(query, database, rule)? {
            context.put_route_unit(unit);
        }
        debug!(route_units = context.len(), "Single tables routed");
        Ok(context)
    }

    fn decorate_route_context(
        &self,
        context: &mut RouteContext,
        query: &QueryContext,
        database: &LogicDatabase,
        rule: &dyn RuleConfiguration,
        _props: &ConfigurationProperties,
        _connection: &ConnectionContext,
    ) -> Result<()> {
        let rule = downcast_rule::<SingleTableRule>(rule)?;
        for unit in Self::single_table_units(query, database, rule)? {
            context.put_route_unit(unit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::metadata::{DatabaseType, PhysicalInstanceIndex, SchemaMetadata};
    use crate::route::StatementKind;
    use crate::rule::RuleSet;
    use std::sync::Arc;

    fn database(rule: SingleTableRule) -> LogicDatabase {
        let instances = PhysicalInstanceIndex::build(
            vec![
                ("ds_0", "jdbc:mysql://10.0.0.1:3306/db0"),
                ("ds_1", "jdbc:mysql://10.0.0.2:3306/db1"),
            ],
            DatabaseType::MySQL,
        )
        .unwrap();
        LogicDatabase::new(
            "logic_db",
            SchemaMetadata::new("logic_db"),
            instances,
            RuleSet::new().with_rule(Arc::new(rule)),
        )
    }

    fn route(database: &LogicDatabase, query: &QueryContext) -> Result<RouteContext> {
        let rule = database.rules.find(RuleKind::SingleTable).unwrap();
        SingleTableRouter::new().create_route_context(
            query,
            database,
            rule,
            &ConfigurationProperties::default(),
            &ConnectionContext::default(),
        )
    }

    #[test]
    fn test_tables_grouped_by_data_source() {
        let database = database(
            SingleTableRule::new()
                .with_table("t_user", "ds_1")
                .with_table("t_config", "ds_0")
                .with_table("t_address", "ds_1"),
        );
        let query = QueryContext::new("SELECT ...", StatementKind::Select, DatabaseType::MySQL)
            .with_tables(["t_user", "t_config", "t_address", "t_unknown"]);

        let context = route(&database, &query).unwrap();
        assert_eq!(context.actual_data_source_names(), vec!["ds_1", "ds_0"]);
        assert_eq!(
            context.route_units()[0].logic_table_names().collect::<Vec<_>>(),
            vec!["t_user", "t_address"]
        );
    }

    #[test]
    fn test_unknown_table_is_not_routable() {
        let database = database(SingleTableRule::new().with_table("t_user", "ds_1"));
        let query = QueryContext::new("SELECT ...", StatementKind::Select, DatabaseType::MySQL)
            .with_table("t_other");
        assert!(route(&database, &query).unwrap().is_empty());
    }

    #[test]
    fn test_owner_must_exist() {
        let database = database(SingleTableRule::new().with_table("t_user", "ds_9"));
        let query = QueryContext::new("SELECT ...", StatementKind::Select, DatabaseType::MySQL)
            .with_table("t_user");
        assert_eq!(route(&database, &query), Err(Error::unknown_data_source("ds_9")));
    }

    #[test]
    fn test_decorate_merges_into_existing_unit() {
        let database = database(SingleTableRule::new().with_table("t_user", "ds_0"));
        let query = QueryContext::new("SELECT ...", StatementKind::Select, DatabaseType::MySQL)
            .with_tables(["t_order", "t_user"]);
        let mut context = RouteContext::new();
        context.put_route_unit(RouteUnit::new(
            RouteMapper::identity("ds_0"),
            vec![RouteMapper::new("t_order", "t_order_0")],
        ));

        SingleTableRouter::new()
            .decorate_route_context(
                &mut context,
                &query,
                &database,
                database.rules.find(RuleKind::SingleTable).unwrap(),
                &ConfigurationProperties::default(),
                &ConnectionContext::default(),
            )
            .unwrap();

        assert!(context.is_single_routing());
        assert_eq!(
            context.route_units()[0].actual_table_names().collect::<Vec<_>>(),
            vec!["t_order_0", "t_user"]
        );
    }
}
