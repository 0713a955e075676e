use super::rule::{ShadowDataSource, ShadowRule};
use crate::config::ConfigurationProperties;
use crate::error::Result;
use crate::metadata::LogicDatabase;
use crate::route::{ConnectionContext, QueryContext, RouteContext, RouteMapper, RouteUnit, RuleRouter};
use crate::rule::{downcast_rule, RuleConfiguration, RuleKind};
use tracing::debug;

/// `true` when the statement was classified as shadow traffic.
pub const MATCHED_ANNOTATION: &str = "shadow.matched";

#[derive(Debug, Clone, Copy)]
pub struct ShadowRouter {
    order: i32,
}

impl ShadowRouter {
    pub const DEFAULT_ORDER: i32 = 40;

    pub fn new() -> Self {
        Self {
            order: Self::DEFAULT_ORDER,
        }
    }

    pub fn with_order(self, order: i32) -> Self {
        Self { order }
    }

    /// Shadow pairs the statement must be isolated on. Empty when the
    /// statement is production traffic.
    fn matched_data_sources<'a>(
        query: &QueryContext,
        rule: &'a ShadowRule,
        props: &ConfigurationProperties,
    ) -> Vec<&'a ShadowDataSource> {
        let mut matched: Vec<&'a ShadowDataSource> = Vec::new();

        for table in &query.tables {
            let Some(shadow_table) = rule.find_table(table) else {
                continue;
            };
            let is_shadow = shadow_table
                .algorithms
                .iter()
                .filter_map(|name| rule.algorithm(name))
                .any(|algorithm| algorithm.is_shadow(query, table, props));
            if is_shadow {
                for data_source in rule.data_sources_for(shadow_table) {
                    if !matched.iter().any(|existing| existing.name == data_source.name) {
                        matched.push(data_source);
                    }
                }
            }
        }

        if matched.is_empty() {
            let default_matches = rule
                .default_algorithm()
                .map(|algorithm| algorithm.is_shadow(query, "", props))
                .unwrap_or(false);
            if default_matches {
                matched.extend(rule.data_sources());
            }
        }
        matched
    }
}

impl Default for ShadowRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRouter for ShadowRouter {
    fn rule_kind(&self) -> RuleKind {
        RuleKind::Shadow
    }

    fn order(&self) -> i32 {
        self.order
    }

    /// Matched statements go to the shadow side of each matched pair; other
    /// statements get no route from this rule.
    fn create_route_context(
        &self,
        query: &QueryContext,
        database: &LogicDatabase,
        rule: &dyn RuleConfiguration,
        props: &ConfigurationProperties,
        _connection: &ConnectionContext,
    ) -> Result<RouteContext> {
        let rule = downcast_rule::<ShadowRule>(rule)?;
        let matched = Self::matched_data_sources(query, rule, props);

        let mut context = RouteContext::new();
        for data_source in &matched {
            database.ensure_data_source(&data_source.shadow)?;
            context.put_route_unit(RouteUnit::new(
                RouteMapper::new(data_source.production.as_str(), data_source.shadow.as_str()),
                query.tables.iter().map(|table| RouteMapper::identity(table.as_str())),
            ));
        }
        context.annotate(MATCHED_ANNOTATION, (!matched.is_empty()).to_string());
        debug!(matched = matched.len(), route_units = context.len(), "Shadow route created");
        Ok(context)
    }

    /// Matched: production units move to their shadow, units outside the
    /// matched pairs are dropped. Not matched: units on any shadow data
    /// source are dropped.
    fn decorate_route_context(
        &self,
        context: &mut RouteContext,
        query: &QueryContext,
        database: &LogicDatabase,
        rule: &dyn RuleConfiguration,
        props: &ConfigurationProperties,
        _connection: &ConnectionContext,
    ) -> Result<()> {
        let rule = downcast_rule::<ShadowRule>(rule)?;
        let matched = Self::matched_data_sources(query, rule, props);

        if matched.is_empty() {
            context.retain_route_units(|unit| !rule.is_shadow_data_source(unit.data_source_name()));
        } else {
            for data_source in &matched {
                database.ensure_data_source(&data_source.shadow)?;
            }
            for unit in context.route_units_mut() {
                let mapper = &unit.data_source_mapper;
                if let Some(pair) = matched
                    .iter()
                    .find(|pair| pair.is_production(&mapper.logic_name, &mapper.actual_name))
                {
                    unit.data_source_mapper.actual_name = pair.shadow.clone();
                }
            }
            context.retain_route_units(|unit| {
                matched
                    .iter()
                    .any(|pair| pair.shadow == unit.data_source_name())
            });
            context.merge_duplicate_units();
        }

        context.annotate(MATCHED_ANNOTATION, (!matched.is_empty()).to_string());
        Ok(())
    }
}
