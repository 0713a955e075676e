use super::context::{RouteContext, RouteUnit};
use super::query::{ConnectionContext, QueryContext};
use super::registry::RouterRegistry;
use crate::config::ConfigurationProperties;
use crate::error::{Error, Result};
use crate::metadata::LogicDatabase;
use tracing::{debug, info};

/// Runs the applicable routers of a database over one statement.
pub struct RoutingPipeline<'a> {
    registry: &'a RouterRegistry,
}

impl<'a> RoutingPipeline<'a> {
    pub fn new(registry: &'a RouterRegistry) -> Self {
        Self { registry }
    }

    /// The first applicable router creates the context, the rest decorate it
    /// in order. Without applicable routers the statement goes to every
    /// representative instance. An empty result is returned as is.
    pub fn route(
        &self,
        query: &QueryContext,
        database: &LogicDatabase,
        props: &ConfigurationProperties,
        connection: &ConnectionContext,
    ) -> Result<RouteContext> {
        let routers = self.registry.resolve(&database.rules);

        let context = match routers.split_first() {
            None => {
                debug!(
                    database = %database.name,
                    statement = ?query.statement_kind,
                    "No applicable router, using representative instances"
                );
                fallback_route_context(query, database)
            }
            Some((first, rest)) => {
                let rule_for = |kind| {
                    database.rules.find(kind).ok_or_else(|| {
                        Error::Config(format!(
                            "router for rule type {} applies to database '{}' without a configured rule",
                            kind, database.name
                        ))
                    })
                };

                let mut context = first.create_route_context(
                    query,
                    database,
                    rule_for(first.rule_kind())?,
                    props,
                    connection,
                )?;
                debug!(
                    router = first.type_name(),
                    route_units = context.len(),
                    "Route context created"
                );

                for router in rest {
                    router.decorate_route_context(
                        &mut context,
                        query,
                        database,
                        rule_for(router.rule_kind())?,
                        props,
                        connection,
                    )?;
                    debug!(
                        router = router.type_name(),
                        route_units = context.len(),
                        "Route context decorated"
                    );
                }
                context
            }
        };

        if props.sql_show() {
            log_route(query, database, &context);
        }
        Ok(context)
    }
}

/// One unit per representative instance, tables mapped to themselves.
pub fn fallback_route_context(query: &QueryContext, database: &LogicDatabase) -> RouteContext {
    let mut context = RouteContext::new();
    for name in database.representative_names() {
        context.put_route_unit(RouteUnit::identity(&name, &query.tables));
    }
    context
}

fn log_route(query: &QueryContext, database: &LogicDatabase, context: &RouteContext) {
    let units: Vec<String> = context
        .route_units()
        .iter()
        .map(|unit| {
            let tables: Vec<&str> = unit.actual_table_names().collect();
            format!("{}::[{}]", unit.data_source_name(), tables.join(", "))
        })
        .collect();
    info!(
        database = %database.name,
        logic_sql = %query.sql,
        route_units = ?units,
        "Statement routed"
    );
}
