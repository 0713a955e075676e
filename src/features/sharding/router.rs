use super::algorithm::trailing_index;
use super::rule::{DataNode, ShardingRule, ShardingStrategy, ShardingTableRule};
use crate::config::ConfigurationProperties;
use crate::error::{Error, Result};
use crate::metadata::LogicDatabase;
use crate::route::{
    ConditionValue, ConnectionContext, QueryContext, RouteContext, RouteMapper, RouteUnit, RuleRouter,
    StatementKind,
};
use crate::rule::{downcast_rule, RuleConfiguration, RuleKind};
use tracing::debug;

/// Set to the comma separated logic tables that could not be narrowed by
/// their sharding conditions.
pub const FULL_ROUTE_ANNOTATION: &str = "sharding.full_route";

#[derive(Debug, Clone, Copy)]
pub struct ShardingRouter {
    order: i32,
}

impl ShardingRouter {
    pub const DEFAULT_ORDER: i32 = 10;

    pub fn new() -> Self {
        Self {
            order: Self::DEFAULT_ORDER,
        }
    }

    pub fn with_order(self, order: i32) -> Self {
        Self { order }
    }

    fn route_tables(
        context: &mut RouteContext,
        query: &QueryContext,
        database: &LogicDatabase,
        rule: &ShardingRule,
    ) -> Result<()> {
        let mut full_route_tables: Vec<&str> = Vec::new();

        for table in &query.tables {
            if let Some(table_rule) = rule.find_table_rule(table) {
                if !database.schema.contains_table(table) {
                    return Err(Error::route_decision(
                        RuleKind::Sharding.name(),
                        table.as_str(),
                        "sharded table is not present in schema metadata",
                    ));
                }
                let (nodes, full_route) = route_sharded_table(query, table, table_rule)?;
                if full_route {
                    full_route_tables.push(&table_rule.logic_table);
                }
                debug!(table = %table, nodes = nodes.len(), full_route, "Sharded table routed");
                for node in nodes {
                    database.ensure_data_source(&node.data_source)?;
                    context.put_route_unit(RouteUnit::new(
                        RouteMapper::identity(node.data_source.as_str()),
                        [RouteMapper::new(table.as_str(), node.table.as_str())],
                    ));
                }
            } else if rule.is_broadcast_table(table) {
                route_broadcast_table(context, query, database, rule, table)?;
            } else if let Some(default_data_source) = &rule.default_data_source {
                let routed = context
                    .route_units()
                    .iter()
                    .any(|unit| unit.find_table_mapper(table).is_some());
                if !routed {
                    database.ensure_data_source(default_data_source)?;
                    context.put_route_unit(RouteUnit::identity(default_data_source, &[table]));
                }
            }
        }

        if !full_route_tables.is_empty() {
            context.annotate(FULL_ROUTE_ANNOTATION, full_route_tables.join(","));
        }
        Ok(())
    }
}

impl Default for ShardingRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Nodes of one sharded table, and whether a strategy had to fan out.
fn route_sharded_table(
    query: &QueryContext,
    table: &str,
    table_rule: &ShardingTableRule,
) -> Result<(Vec<DataNode>, bool)> {
    let nodes = table_rule.actual_data_nodes();
    if query.statement_kind == StatementKind::Ddl {
        return Ok((nodes.to_vec(), false));
    }

    let mut full_route = false;
    let all_data_sources = table_rule.data_source_names();
    let data_sources = match &table_rule.database_strategy {
        Some(strategy) => match select_targets(query, table, strategy, &all_data_sources)? {
            Some(selected) => selected,
            None => {
                full_route = true;
                all_data_sources
            }
        },
        None => {
            full_route |= all_data_sources.len() > 1;
            all_data_sources
        }
    };

    let mut routed = Vec::new();
    for data_source in data_sources {
        let tables: Vec<&str> = nodes
            .iter()
            .filter(|node| node.data_source == data_source)
            .map(|node| node.table.as_str())
            .collect();
        let selected = match &table_rule.table_strategy {
            Some(strategy) => match select_targets(query, table, strategy, &tables)? {
                Some(selected) => selected,
                None => {
                    full_route = true;
                    tables
                }
            },
            None => {
                full_route |= tables.len() > 1;
                tables
            }
        };
        routed.extend(
            selected
                .into_iter()
                .map(|actual_table| DataNode::new(data_source, actual_table)),
        );
    }
    Ok((routed, full_route))
}

/// Targets selected by every condition on the strategy column, in target
/// order. `None` when no condition narrows the targets.
fn select_targets<'a>(
    query: &QueryContext,
    table: &str,
    strategy: &ShardingStrategy,
    targets: &[&'a str],
) -> Result<Option<Vec<&'a str>>> {
    let mut selected: Option<Vec<&'a str>> = None;

    for condition in query.conditions_on(table, &strategy.column) {
        let indexes = match &condition.value {
            ConditionValue::Exact(values) => values
                .iter()
                .map(|value| strategy.algorithm.shard_index(table, value))
                .collect::<Result<Vec<_>>>()?,
            ConditionValue::Range { lower, upper } => {
                match strategy
                    .algorithm
                    .range_indexes(table, lower.as_ref(), upper.as_ref())?
                {
                    Some(indexes) => indexes,
                    None => continue,
                }
            }
        };

        let mut matched = Vec::new();
        for index in indexes {
            let target = targets
                .iter()
                .copied()
                .find(|target| trailing_index(target) == Some(index))
                .ok_or_else(|| {
                    Error::route_decision(
                        RuleKind::Sharding.name(),
                        table,
                        format!(
                            "{} selected shard {} but no target among {:?} serves it",
                            strategy.column, index, targets
                        ),
                    )
                })?;
            if !matched.contains(&target) {
                matched.push(target);
            }
        }

        // Conditions on the same column are conjunctive.
        selected = Some(match selected {
            None => matched,
            Some(previous) => previous.into_iter().filter(|t| matched.contains(t)).collect(),
        });
    }

    Ok(selected.map(|chosen| {
        targets
            .iter()
            .copied()
            .filter(|target| chosen.contains(target))
            .collect()
    }))
}

/// Writes reach every data source of the rule; reads reuse a data source
/// already in the context when possible, else the first one.
fn route_broadcast_table(
    context: &mut RouteContext,
    query: &QueryContext,
    database: &LogicDatabase,
    rule: &ShardingRule,
    table: &str,
) -> Result<()> {
    let mut data_sources: Vec<String> = rule.data_source_names().into_iter().map(String::from).collect();
    if data_sources.is_empty() {
        data_sources = database.representative_names();
    }

    let targets: Vec<String> = if query.statement_kind.is_write() {
        data_sources
    } else {
        let existing = context
            .actual_data_source_names()
            .into_iter()
            .find(|name| data_sources.iter().any(|candidate| candidate.as_str() == *name))
            .map(String::from);
        existing.or_else(|| data_sources.into_iter().next()).into_iter().collect()
    };

    for data_source in targets {
        database.ensure_data_source(&data_source)?;
        context.put_route_unit(RouteUnit::identity(&data_source, &[table]));
    }
    Ok(())
}

impl RuleRouter for ShardingRouter {
    fn rule_kind(&self) -> RuleKind {
        RuleKind::Sharding
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
        let rule = downcast_rule::<ShardingRule>(rule)?;
        let mut context = RouteContext::new();

        // Statements without tables reach each instance once.
        if query.tables.is_empty() {
            for name in database.representative_names() {
                context.put_route_unit(RouteUnit::identity::<&str>(&name, &[]));
            }
            return Ok(context);
        }

        Self::route_tables(&mut context, query, database, rule)?;
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
        let rule = downcast_rule::<ShardingRule>(rule)?;
        Self::route_tables(context, query, database, rule)
    }
}
