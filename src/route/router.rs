use super::context::RouteContext;
use super::query::{ConnectionContext, QueryContext};
use crate::config::ConfigurationProperties;
use crate::error::Result;
use crate::metadata::LogicDatabase;
use crate::rule::{RuleConfiguration, RuleKind, RuleSet};

/// Routing contract of one rule kind.
///
/// The first applicable router of a statement creates the context; every
/// later one decorates it. Both phases must be pure functions of their inputs
/// so concurrent statements can share a router.
///
/// "No target" is an empty context, never an error. Errors are reserved for
/// structurally invalid input such as a rule table with no schema metadata.
pub trait RuleRouter: Send + Sync {
    fn rule_kind(&self) -> RuleKind;

    /// Lower runs first.
    fn order(&self) -> i32;

    fn applies_to(&self, rules: &RuleSet) -> bool {
        rules.contains(self.rule_kind())
    }

    /// Implementation identity, used to tell an override of the same router
    /// apart from a conflicting one.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn create_route_context(
        &self,
        query: &QueryContext,
        database: &LogicDatabase,
        rule: &dyn RuleConfiguration,
        props: &ConfigurationProperties,
        connection: &ConnectionContext,
    ) -> Result<RouteContext>;

    fn decorate_route_context(
        &self,
        context: &mut RouteContext,
        query: &QueryContext,
        database: &LogicDatabase,
        rule: &dyn RuleConfiguration,
        props: &ConfigurationProperties,
        connection: &ConnectionContext,
    ) -> Result<()>;
}
