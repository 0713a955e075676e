use super::router::RuleRouter;
use crate::config::RouterConfig;
use crate::error::{Error, Result};
use crate::features::encrypt::EncryptRouter;
use crate::features::readwrite_splitting::ReadwriteSplittingRouter;
use crate::features::shadow::ShadowRouter;
use crate::features::sharding::ShardingRouter;
use crate::features::single::SingleTableRouter;
use crate::rule::{RuleKind, RuleSet};
use arc_swap::ArcSwap;
use lazy_static::lazy_static;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

lazy_static! {
    static ref GLOBAL_REGISTRY: ArcSwap<RouterRegistry> =
        ArcSwap::from_pointee(RouterRegistry::with_builtin_routers());
}

#[derive(Clone)]
struct RouterRegistration {
    kind: RuleKind,
    order: i32,
    router: Arc<dyn RuleRouter>,
}

/// Pool of routers keyed by rule kind, in registration order.
///
/// Registering a kind twice replaces the earlier router in its original slot.
/// With `reject_overrides`, replacing it with a different implementation at
/// a different order fails instead.
#[derive(Clone, Default)]
pub struct RouterRegistry {
    registrations: Vec<RouterRegistration>,
    reject_overrides: bool,
}

impl RouterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            registrations: Vec::new(),
            reject_overrides: true,
        }
    }

    pub fn reject_overrides(&self) -> bool {
        self.reject_overrides
    }

    /// Every built-in router at its default order.
    pub fn with_builtin_routers() -> Self {
        let mut registry = Self::new();
        registry.register_builtin(|_| None);
        registry
    }

    /// Built-in routers with configured orders and strictness.
    pub fn from_config(config: &RouterConfig) -> Result<Self> {
        if let Some(unknown) = config
            .orders
            .keys()
            .find(|name| RuleKind::from_builtin_name(name).is_none())
        {
            return Err(Error::Config(format!(
                "router order configured for unknown rule type '{}'",
                unknown
            )));
        }

        let mut registry = Self {
            registrations: Vec::new(),
            reject_overrides: config.reject_router_overrides,
        };
        registry.register_builtin(|kind| {
            config
                .orders
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(kind.name()))
                .map(|(_, order)| *order)
        });
        Ok(registry)
    }

    fn register_builtin(&mut self, order_for: impl Fn(RuleKind) -> Option<i32>) {
        let order = |kind: RuleKind, default: i32| order_for(kind).unwrap_or(default);
        let routers: [Arc<dyn RuleRouter>; 5] = [
            Arc::new(SingleTableRouter::new().with_order(order(
                RuleKind::SingleTable,
                SingleTableRouter::DEFAULT_ORDER,
            ))),
            Arc::new(ShardingRouter::new().with_order(order(
                RuleKind::Sharding,
                ShardingRouter::DEFAULT_ORDER,
            ))),
            Arc::new(ReadwriteSplittingRouter::new().with_order(order(
                RuleKind::ReadwriteSplitting,
                ReadwriteSplittingRouter::DEFAULT_ORDER,
            ))),
            Arc::new(EncryptRouter::new().with_order(order(
                RuleKind::Encrypt,
                EncryptRouter::DEFAULT_ORDER,
            ))),
            Arc::new(ShadowRouter::new().with_order(order(
                RuleKind::Shadow,
                ShadowRouter::DEFAULT_ORDER,
            ))),
        ];
        // Built-ins have distinct kinds, so registration cannot conflict.
        for router in routers {
            self.push_registration(router);
        }
    }

    fn push_registration(&mut self, router: Arc<dyn RuleRouter>) {
        self.registrations.push(RouterRegistration {
            kind: router.rule_kind(),
            order: router.order(),
            router,
        });
    }

    pub fn register(&mut self, router: Arc<dyn RuleRouter>) -> Result<()> {
        let kind = router.rule_kind();
        let order = router.order();

        let Some(position) = self.registrations.iter().position(|entry| entry.kind == kind) else {
            debug!(rule_kind = %kind, order, router = router.type_name(), "Router registered");
            self.push_registration(router);
            return Ok(());
        };
        let reject_overrides = self.reject_overrides;
        let existing = &mut self.registrations[position];

        let distinct = existing.router.type_name() != router.type_name();
        if reject_overrides && distinct && existing.order != order {
            return Err(Error::DuplicateRouterRegistration {
                kind: kind.to_string(),
                existing: existing.order,
                attempted: order,
            });
        }

        info!(
            rule_kind = %kind,
            previous = existing.router.type_name(),
            replacement = router.type_name(),
            previous_order = existing.order,
            order,
            "Router overridden"
        );
        existing.order = order;
        existing.router = router;
        Ok(())
    }

    pub fn with_router(mut self, router: Arc<dyn RuleRouter>) -> Result<Self> {
        self.register(router)?;
        Ok(self)
    }

    /// Routers applicable to `rules`, ascending by order. Equal orders keep
    /// registration order.
    pub fn resolve(&self, rules: &RuleSet) -> Vec<Arc<dyn RuleRouter>> {
        let mut applicable: Vec<&RouterRegistration> = self
            .registrations
            .iter()
            .filter(|entry| entry.router.applies_to(rules))
            .collect();
        applicable.sort_by_key(|entry| entry.order);
        applicable.into_iter().map(|entry| entry.router.clone()).collect()
    }

    pub fn order_of(&self, kind: RuleKind) -> Option<i32> {
        self.registrations
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.order)
    }

    pub fn kinds(&self) -> Vec<RuleKind> {
        self.registrations.iter().map(|entry| entry.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Process-wide registry, the built-in routers until one is installed.
    pub fn global() -> Arc<RouterRegistry> {
        GLOBAL_REGISTRY.load_full()
    }

    /// Publish `registry` process-wide and return the one it replaces.
    /// Routing passes already holding the previous registry finish with it.
    pub fn install_global(registry: RouterRegistry) -> Arc<RouterRegistry> {
        let registry = Arc::new(registry);
        if registry.is_empty() {
            warn!("Installing an empty router registry, every statement will use the fallback route");
        }
        info!(kinds = ?registry.kinds(), "Global router registry installed");
        GLOBAL_REGISTRY.swap(registry)
    }
}

impl fmt::Debug for RouterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterRegistry")
            .field(
                "routers",
                &self
                    .registrations
                    .iter()
                    .map(|entry| (entry.kind, entry.order, entry.router.type_name()))
                    .collect::<Vec<_>>(),
            )
            .field("reject_overrides", &self.reject_overrides)
            .finish()
    }
}
