//! Rule-ordered routing: the context routers build, the router contract,
//! the registry that orders routers and the pipeline that runs them.

pub mod context;
pub mod engine;
pub mod query;
pub mod registry;
pub mod router;
pub mod runtime;

pub use context::{RouteContext, RouteMapper, RouteUnit, TableMappers};
pub use engine::{fallback_route_context, RoutingPipeline};
pub use query::{Condition, ConditionValue, ConnectionContext, QueryContext, ShardingValue, StatementKind};
pub use registry::RouterRegistry;
pub use router::RuleRouter;
pub use runtime::{RoutingSnapshot, RoutingStats, RoutingStatsSnapshot, SchemaRouter};
