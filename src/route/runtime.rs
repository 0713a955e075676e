use super::context::RouteContext;
use super::engine::RoutingPipeline;
use super::query::{ConnectionContext, QueryContext};
use super::registry::RouterRegistry;
use crate::config::ConfigurationProperties;
use crate::error::Result;
use crate::metadata::LogicDatabase;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything one routing pass reads, published as a unit.
#[derive(Debug)]
pub struct RoutingSnapshot {
    pub database: Arc<LogicDatabase>,
    pub registry: Arc<RouterRegistry>,
    pub version: u64,
}

#[derive(Debug, Default)]
pub struct RoutingStats {
    routed: AtomicU64,
    unroutable: AtomicU64,
    failed: AtomicU64,
    route_units: AtomicU64,
    reloads: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoutingStatsSnapshot {
    /// Statements routed to at least one unit.
    pub routed: u64,
    /// Statements that produced an empty context.
    pub unroutable: u64,
    pub failed: u64,
    pub route_units: u64,
    pub reloads: u64,
}

impl RoutingStats {
    fn record(&self, result: &Result<RouteContext>) {
        match result {
            Ok(context) if context.is_empty() => {
                self.unroutable.fetch_add(1, Ordering::Relaxed);
            }
            Ok(context) => {
                self.routed.fetch_add(1, Ordering::Relaxed);
                self.route_units
                    .fetch_add(context.len() as u64, Ordering::Relaxed);
            }
            Err(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> RoutingStatsSnapshot {
        RoutingStatsSnapshot {
            routed: self.routed.load(Ordering::Relaxed),
            unroutable: self.unroutable.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            route_units: self.route_units.load(Ordering::Relaxed),
            reloads: self.reloads.load(Ordering::Relaxed),
        }
    }
}

/// Entry point for one logical database.
///
/// Routing loads the current snapshot without locking and keeps it for the
/// whole pass. Reloads publish a new snapshot; passes that already started
/// finish against the old one.
pub struct SchemaRouter {
    current: ArcSwap<RoutingSnapshot>,
    reload_lock: Mutex<()>,
    stats: RoutingStats,
}

impl SchemaRouter {
    /// Router bound to the process-wide registry.
    pub fn new(database: LogicDatabase) -> Self {
        Self::with_registry(database, RouterRegistry::global())
    }

    pub fn with_registry(database: LogicDatabase, registry: Arc<RouterRegistry>) -> Self {
        Self {
            current: ArcSwap::from_pointee(RoutingSnapshot {
                database: Arc::new(database),
                registry,
                version: 0,
            }),
            reload_lock: Mutex::new(()),
            stats: RoutingStats::default(),
        }
    }

    pub fn route(
        &self,
        query: &QueryContext,
        props: &ConfigurationProperties,
        connection: &ConnectionContext,
    ) -> Result<RouteContext> {
        let snapshot = self.current.load_full();
        let result = RoutingPipeline::new(&snapshot.registry).route(
            query,
            &snapshot.database,
            props,
            connection,
        );

        self.stats.record(&result);
        if let Err(err) = &result {
            warn!(
                database = %snapshot.database.name,
                version = snapshot.version,
                error = %err,
                "Routing failed"
            );
        }
        result
    }

    /// Swap in a rebuilt database, keeping the registry. Returns the new
    /// snapshot version.
    pub fn reload(&self, database: LogicDatabase) -> u64 {
        self.publish(|current| RoutingSnapshot {
            database: Arc::new(database),
            registry: current.registry.clone(),
            version: current.version + 1,
        })
    }

    pub fn reload_registry(&self, registry: Arc<RouterRegistry>) -> u64 {
        self.publish(|current| RoutingSnapshot {
            database: current.database.clone(),
            registry,
            version: current.version + 1,
        })
    }

    fn publish(&self, next: impl FnOnce(&RoutingSnapshot) -> RoutingSnapshot) -> u64 {
        let _guard = self.reload_lock.lock();
        let current = self.current.load_full();
        let snapshot = next(&current);
        let version = snapshot.version;

        info!(
            database = %snapshot.database.name,
            previous_version = current.version,
            version,
            data_sources = snapshot.database.instances.len(),
            rules = ?snapshot.database.rules.kinds(),
            "Routing snapshot published"
        );
        self.current.store(Arc::new(snapshot));
        self.stats.reloads.fetch_add(1, Ordering::Relaxed);
        version
    }

    pub fn snapshot(&self) -> Arc<RoutingSnapshot> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    pub fn stats(&self) -> RoutingStatsSnapshot {
        self.stats.snapshot()
    }
}
