use super::rule::{ReadwriteSplittingGroup, ReadwriteSplittingRule};
use crate::config::ConfigurationProperties;
use crate::error::{Error, Result};
use crate::metadata::LogicDatabase;
use crate::route::{ConnectionContext, QueryContext, RouteContext, RouteMapper, RouteUnit, RuleRouter, StatementKind};
use crate::rule::{downcast_rule, RuleConfiguration, RuleKind};
use tracing::debug;

/// Set to `write` or `read` for the last group decision.
pub const ROUTE_ANNOTATION: &str = "readwrite_splitting.route";

/// Hint forcing the primary, e.g. `/* primary:true */`.
pub const PRIMARY_HINT: &str = "primary";

#[derive(Debug, Clone, Copy)]
pub struct ReadwriteSplittingRouter {
    order: i32,
}

impl ReadwriteSplittingRouter {
    pub const DEFAULT_ORDER: i32 = 20;

    pub fn new() -> Self {
        Self {
            order: Self::DEFAULT_ORDER,
        }
    }

    pub fn with_order(self, order: i32) -> Self {
        Self { order }
    }

    fn route_to_primary(query: &QueryContext, props: &ConfigurationProperties, connection: &ConnectionContext) -> bool {
        query.statement_kind.is_write()
            || query.statement_kind == StatementKind::Tcl
            || connection.in_transaction
            || connection.primary_only
            || (props.sql_comment_parse_enabled() && query.hint_enabled(PRIMARY_HINT))
    }

    fn choose<'a>(
        group: &'a ReadwriteSplittingGroup,
        to_primary: bool,
        database: &LogicDatabase,
        connection: &ConnectionContext,
    ) -> Result<&'a str> {
        let chosen = if to_primary {
            group.write_data_source.as_str()
        } else {
            group
                .load_balancer
                .choose(&group.read_data_sources, connection.connection_id)
                .unwrap_or(group.write_data_source.as_str())
        };
        if !database.instances.contains(chosen) {
            return Err(Error::unknown_data_source(chosen));
        }
        Ok(chosen)
    }

    /// Rewrite every unit routed to a group name onto one member.
    fn rewrite_groups(
        context: &mut RouteContext,
        query: &QueryContext,
        database: &LogicDatabase,
        rule: &ReadwriteSplittingRule,
        props: &ConfigurationProperties,
        connection: &ConnectionContext,
    ) -> Result<()> {
        let to_primary = Self::route_to_primary(query, props, connection);
        let mut rewritten = false;

        for unit in context.route_units_mut() {
            let Some(group) = rule.group(unit.data_source_name()) else {
                continue;
            };
            let chosen = Self::choose(group, to_primary, database, connection)?;
            debug!(group = %group.name, data_source = chosen, to_primary, "Readwrite splitting group resolved");
            unit.data_source_mapper = RouteMapper::new(group.name.as_str(), chosen);
            rewritten = true;
        }

        if rewritten {
            context.merge_duplicate_units();
            context.annotate(ROUTE_ANNOTATION, if to_primary { "write" } else { "read" });
        }
        Ok(())
    }
}

impl Default for ReadwriteSplittingRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRouter for ReadwriteSplittingRouter {
    fn rule_kind(&self) -> RuleKind {
        RuleKind::ReadwriteSplitting
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn create_route_context(
        &self,
        query: &QueryContext,
        database: &LogicDatabase,
        rule: &dyn RuleConfiguration,
        props: &ConfigurationProperties,
        connection: &ConnectionContext,
    ) -> Result<RouteContext> {
        let rule = downcast_rule::<ReadwriteSplittingRule>(rule)?;
        let mut context = RouteContext::new();
        let Some(group) = rule.default_group() else {
            return Ok(context);
        };

        context.put_route_unit(RouteUnit::identity(&group.name, &query.tables));
        Self::rewrite_groups(&mut context, query, database, rule, props, connection)?;
        Ok(context)
    }

    fn decorate_route_context(
        &self,
        context: &mut RouteContext,
        query: &QueryContext,
        database: &LogicDatabase,
        rule: &dyn RuleConfiguration,
        props: &ConfigurationProperties,
        connection: &ConnectionContext,
    ) -> Result<()> {
        let rule = downcast_rule::<ReadwriteSplittingRule>(rule)?;
        Self::rewrite_groups(context, query, database, rule, props, connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::readwrite_splitting::LoadBalancer;
    use crate::metadata::{DatabaseType, PhysicalInstanceIndex, SchemaMetadata};
    use crate::rule::RuleSet;
    use std::sync::Arc;

    fn database(rule: ReadwriteSplittingRule) -> LogicDatabase {
        let instances = PhysicalInstanceIndex::build(
            vec![
                ("primary", "jdbc:postgresql://10.0.0.1:5432/db"),
                ("replica_0", "jdbc:postgresql://10.0.0.2:5432/db"),
                ("replica_1", "jdbc:postgresql://10.0.0.3:5432/db"),
            ],
            DatabaseType::PostgreSQL,
        )
        .unwrap();
        LogicDatabase::new(
            "logic_db",
            SchemaMetadata::new("logic_db"),
            instances,
            RuleSet::new().with_rule(Arc::new(rule)),
        )
    }

    fn rule() -> ReadwriteSplittingRule {
        ReadwriteSplittingRule::new()
            .with_group(
                ReadwriteSplittingGroup::new("rw", "primary", ["replica_0", "replica_1"])
                    .with_load_balancer(LoadBalancer::ConnectionHash),
            )
            .unwrap()
    }

    fn route(
        database: &LogicDatabase,
        query: &QueryContext,
        props: &ConfigurationProperties,
        connection: &ConnectionContext,
    ) -> Result<RouteContext> {
        ReadwriteSplittingRouter::new().create_route_context(
            query,
            database,
            database.rules.find(RuleKind::ReadwriteSplitting).unwrap(),
            props,
            connection,
        )
    }

    fn query(kind: StatementKind, sql: &str) -> QueryContext {
        QueryContext::new(sql, kind, DatabaseType::PostgreSQL)
            .with_table("t_user")
            .with_sql_hints()
    }

    #[test]
    fn test_reads_and_writes() {
        let database = database(rule());
        let props = ConfigurationProperties::default();
        let connection = ConnectionContext::new(3);

        let read = route(&database, &query(StatementKind::Select, "SELECT"), &props, &connection).unwrap();
        let unit = &read.route_units()[0];
        assert_eq!(unit.data_source_mapper, RouteMapper::new("rw", "replica_1"));
        assert_eq!(read.annotation(ROUTE_ANNOTATION), Some("read"));

        let write = route(&database, &query(StatementKind::Update, "UPDATE"), &props, &connection).unwrap();
        assert_eq!(write.actual_data_source_names(), vec!["primary"]);
        assert_eq!(write.annotation(ROUTE_ANNOTATION), Some("write"));

        let in_transaction = connection.in_transaction(true);
        let read = route(&database, &query(StatementKind::Select, "SELECT"), &props, &in_transaction).unwrap();
        assert_eq!(read.actual_data_source_names(), vec!["primary"]);
    }

    #[test]
    fn test_primary_hint_needs_comment_parsing() {
        let database = database(rule());
        let hinted = query(StatementKind::Select, "/* primary:true */ SELECT");
        let connection = ConnectionContext::new(0);

        let ignored = route(&database, &hinted, &ConfigurationProperties::default(), &connection).unwrap();
        assert_eq!(ignored.actual_data_source_names(), vec!["replica_0"]);

        let props = ConfigurationProperties::from_pairs([("sql-comment-parse-enabled", "true")]).unwrap();
        let honoured = route(&database, &hinted, &props, &connection).unwrap();
        assert_eq!(honoured.actual_data_source_names(), vec!["primary"]);
    }

    #[test]
    fn test_decorate_rewrites_only_group_units() {
        let database = database(rule());
        let mut context = RouteContext::new();
        context.put_route_unit(RouteUnit::identity("rw", &["t_user"]));
        context.put_route_unit(RouteUnit::identity("replica_0", &["t_log"]));

        ReadwriteSplittingRouter::new()
            .decorate_route_context(
                &mut context,
                &query(StatementKind::Select, "SELECT"),
                &database,
                database.rules.find(RuleKind::ReadwriteSplitting).unwrap(),
                &ConfigurationProperties::default(),
                &ConnectionContext::new(1),
            )
            .unwrap();

        assert_eq!(context.actual_data_source_names(), vec!["replica_1", "replica_0"]);
        assert_eq!(context.route_units()[1].data_source_mapper, RouteMapper::identity("replica_0"));
    }

    #[test]
    fn test_unknown_member() {
        let rule = ReadwriteSplittingRule::new()
            .with_group(ReadwriteSplittingGroup::new("rw", "primary_9", ["replica_0"]))
            .unwrap();
        let database = database(rule);
        let result = route(
            &database,
            &query(StatementKind::Insert, "INSERT"),
            &ConfigurationProperties::default(),
            &ConnectionContext::default(),
        );
        assert_eq!(result, Err(Error::unknown_data_source("primary_9")));
    }
}
