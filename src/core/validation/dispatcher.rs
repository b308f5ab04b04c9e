//! Query parameter validation for resource operations
//!
//! The [`ValidationDispatcher`] listens to every resource operation. For each
//! call it resolves the ruleset configured for the targeted resource and
//! operation, runs it over the query parameters, and then either:
//!
//! - lets the call proceed, with the parameters replaced by the ruleset's
//!   normalized values
//! - stops it with a `400 Failed Validation` problem carrying the ruleset's
//!   messages
//! - stops it with a `500` problem when the configured ruleset cannot be
//!   supplied by the registry

use super::registry::RulesetRegistry;
use super::ruleset::{Ruleset, ValidationOutcome};
use crate::config::QueryValidationConfig;
use crate::core::error::{ApiProblem, ConfigError};
use crate::core::events::{RESOURCE_TARGET, ResourceListener, SharedEventManager, SubscriptionHandle};
use crate::core::operation::ResourceOperation;
use crate::core::resource_event::ResourceEvent;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, trace, warn};

/// Priority of the dispatcher's subscriptions
///
/// Higher runs first; default resource listeners use `1`.
pub const LISTENER_PRIORITY: i32 = 10;

/// Validates query parameters of resource operations against configured rulesets
pub struct ValidationDispatcher {
    config: Arc<QueryValidationConfig>,
    registry: Arc<dyn RulesetRegistry>,
    /// Rulesets resolved so far, by identifier. Failed lookups are never stored.
    rulesets: RwLock<HashMap<String, Arc<dyn Ruleset>>>,
    subscriptions: Mutex<Vec<SubscriptionHandle>>,
}

impl ValidationDispatcher {
    /// Create a dispatcher over a configuration and a ruleset registry
    pub fn new(config: QueryValidationConfig, registry: Arc<dyn RulesetRegistry>) -> Self {
        Self::with_shared_config(Arc::new(config), registry)
    }

    /// Create a dispatcher sharing an already loaded configuration
    pub fn with_shared_config(
        config: Arc<QueryValidationConfig>,
        registry: Arc<dyn RulesetRegistry>,
    ) -> Self {
        Self {
            config,
            registry,
            rulesets: RwLock::new(HashMap::new()),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Create a dispatcher from a whole application config
    ///
    /// Reads the `api-tools-content-validation` section; a missing section
    /// gives a dispatcher that never intercepts.
    pub fn from_app_config(
        app_config: &serde_yaml::Value,
        registry: Arc<dyn RulesetRegistry>,
    ) -> Result<Self, ConfigError> {
        let config = QueryValidationConfig::from_app_config(app_config)?;
        Ok(Self::new(config, registry))
    }

    pub fn config(&self) -> &QueryValidationConfig {
        &self.config
    }

    /// Ruleset identifier configured for an operation on a resource
    pub fn resolve_ruleset_id(&self, resource_id: &str, operation: &str) -> Option<&str> {
        self.config.resolve(resource_id, operation)
    }

    /// Validate the query parameters of a resource call
    ///
    /// Returns `Ok(None)` when the call may proceed (possibly with normalized
    /// parameters) and `Ok(Some(problem))` when it must be answered with the
    /// problem instead. Failures of the registry or the ruleset itself are
    /// returned as `Err`.
    pub fn handle(&self, event: &mut ResourceEvent) -> Result<Option<ApiProblem>> {
        let Some(resource_id) = event.resource_id() else {
            trace!(operation = event.name(), "no resource targeted, skipping query validation");
            return Ok(None);
        };

        let Some(ruleset_id) = self.config.resolve(resource_id, event.name()) else {
            trace!(resource_id, operation = event.name(), "no query ruleset configured");
            return Ok(None);
        };

        let Some(ruleset) = self.ruleset(ruleset_id)? else {
            warn!(
                resource_id,
                operation = event.name(),
                ruleset_id,
                "configured query ruleset is not available"
            );
            return Ok(Some(ApiProblem::missing_ruleset(ruleset_id)));
        };

        match ruleset.validate(event.query_params())? {
            ValidationOutcome::Proceed(values) => {
                event.query_params_mut().replace(values);
                Ok(None)
            }
            ValidationOutcome::Failed(messages) => {
                debug!(
                    resource_id,
                    operation = event.name(),
                    ruleset_id,
                    fields = messages.len(),
                    "query parameters failed validation"
                );
                Ok(Some(ApiProblem::failed_validation(messages)))
            }
        }
    }

    /// Resolve a ruleset, caching it on success
    ///
    /// `Ok(None)` when the registry does not know the identifier or the
    /// service it holds is not a ruleset.
    fn ruleset(&self, id: &str) -> Result<Option<Arc<dyn Ruleset>>> {
        {
            let cache = self
                .rulesets
                .read()
                .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
            if let Some(ruleset) = cache.get(id) {
                trace!(ruleset_id = id, "query ruleset cache hit");
                return Ok(Some(ruleset.clone()));
            }
        }

        if !self.registry.has(id) {
            return Ok(None);
        }
        let Some(ruleset) = self.registry.get(id)?.into_ruleset() else {
            return Ok(None);
        };

        // Concurrent first lookups may both land here; the entries are equivalent.
        let mut cache = self
            .rulesets
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        cache.insert(id.to_string(), ruleset.clone());

        Ok(Some(ruleset))
    }

    /// Number of rulesets resolved and cached so far
    pub fn cached_ruleset_count(&self) -> usize {
        self.rulesets.read().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Subscribe to all nine resource operations on a shared event manager
    pub fn attach_shared(self: &Arc<Self>, events: &SharedEventManager) -> Result<()> {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .map_err(|e| anyhow!("Failed to acquire subscriptions lock: {}", e))?;

        for operation in ResourceOperation::ALL {
            let listener: Arc<dyn ResourceListener> = self.clone();
            let handle = events.attach(RESOURCE_TARGET, operation, listener, LISTENER_PRIORITY)?;
            subscriptions.push(handle);
        }

        debug!(
            subscriptions = subscriptions.len(),
            "query validation attached to resource events"
        );
        Ok(())
    }

    /// Remove the subscriptions made by [`attach_shared`](Self::attach_shared)
    ///
    /// Other listeners on the manager are untouched. Calling it again, or on a
    /// dispatcher that never attached, does nothing.
    pub fn detach_shared(&self, events: &SharedEventManager) -> Result<()> {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .map_err(|e| anyhow!("Failed to acquire subscriptions lock: {}", e))?;

        let mut kept = Vec::new();
        for handle in subscriptions.drain(..) {
            if !events.detach(RESOURCE_TARGET, handle)? {
                kept.push(handle);
            }
        }
        *subscriptions = kept;

        debug!(
            remaining = subscriptions.len(),
            "query validation detached from resource events"
        );
        Ok(())
    }

    /// Number of live subscriptions made by this dispatcher
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl ResourceListener for ValidationDispatcher {
    fn on_resource_event(&self, event: &mut ResourceEvent) -> Result<Option<ApiProblem>> {
        self.handle(event)
    }
}

impl fmt::Debug for ValidationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationDispatcher")
            .field("resources", &self.config.resource_ids())
            .field("cached_rulesets", &self.cached_ruleset_count())
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}
