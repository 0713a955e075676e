pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod metadata;
pub mod route;
pub mod rule;

pub use config::{ConfigurationProperties, DatabaseConfig, RouterConfig};
pub use error::{Error, Result};
pub use metadata::{DataSourceIdentity, DatabaseType, LogicDatabase, PhysicalInstanceIndex, SchemaMetadata};
pub use route::{
    ConnectionContext, QueryContext, RouteContext, RouteMapper, RouteUnit, RouterRegistry, RoutingPipeline,
    RuleRouter, SchemaRouter, StatementKind,
};
pub use rule::{RuleConfiguration, RuleKind, RuleSet};
