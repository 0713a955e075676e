//! File-backed configuration: process-wide router settings and the
//! per-database layout routers read.

pub mod database;
pub mod props;

pub use database::{
    DataSourceConfig, DatabaseConfig, ReadwriteSplittingGroupConfig, RuleConfig, ShadowAlgorithmConfig,
    ShadowDataSourceConfig, ShadowTableConfig, ShardingTableConfig, SingleTableConfig,
};
pub use props::ConfigurationProperties;

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Process-wide routing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Fail registration when a rule kind is claimed twice at different
    /// orders by different routers.
    pub reject_router_overrides: bool,
    /// Rule type name to router order, replacing the built-in default.
    pub orders: BTreeMap<String, i32>,
    pub props: ConfigurationProperties,
    pub logging: LoggingConfig,
}

pub fn load_router_config_from_file(path: impl AsRef<Path>) -> Result<RouterConfig> {
    load_json(path.as_ref())
}

pub fn load_database_config_from_file(path: impl AsRef<Path>) -> Result<DatabaseConfig> {
    load_json(path.as_ref())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))?;
    debug!(path = %path.display(), bytes = content.len(), "Loading configuration file");
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("JSON parse error in {}: {}", path.display(), e)))
}
