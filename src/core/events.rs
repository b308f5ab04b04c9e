//! Shared event bus for resource operations
//!
//! Before a REST resource handles a call, the host triggers a
//! [`ResourceEvent`] on the bus. Listeners attached for that operation run in
//! priority order and may short-circuit the call by returning an
//! [`ApiProblem`].
//!
//! # Architecture
//!
//! ```text
//! REST resource ──▶ SharedEventManager::trigger() ──▶ listener (priority 10)
//!                                                 ──▶ listener (priority 1)
//!                                                 ──▶ ... until one returns a problem
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let events = SharedEventManager::new();
//! let handle = events.attach(RESOURCE_TARGET, ResourceOperation::FetchAll, listener, 10)?;
//!
//! let mut event = ResourceEvent::new("fetchAll").with_route_match(route);
//! if let Some(problem) = events.trigger(RESOURCE_TARGET, &mut event)? {
//!     return problem.into_response();
//! }
//!
//! events.detach(RESOURCE_TARGET, handle)?;
//! ```

use super::error::ApiProblem;
use super::operation::ResourceOperation;
use super::resource_event::ResourceEvent;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::trace;
use uuid::Uuid;

/// Target type under which REST resource listeners are attached
pub const RESOURCE_TARGET: &str = "resource";

/// Listener notified of resource operations
pub trait ResourceListener: Send + Sync {
    /// Handle an operation before the resource runs
    ///
    /// `Ok(None)` lets the call continue; `Ok(Some(problem))` stops it and
    /// the problem becomes the response.
    fn on_resource_event(&self, event: &mut ResourceEvent) -> Result<Option<ApiProblem>>;
}

impl<F> ResourceListener for F
where
    F: Fn(&mut ResourceEvent) -> Result<Option<ApiProblem>> + Send + Sync,
{
    fn on_resource_event(&self, event: &mut ResourceEvent) -> Result<Option<ApiProblem>> {
        self(event)
    }
}

/// Opaque handle returned by [`SharedEventManager::attach`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionHandle(Uuid);

impl SubscriptionHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Subscription {
    handle: SubscriptionHandle,
    operation: ResourceOperation,
    priority: i32,
    listener: Arc<dyn ResourceListener>,
}

/// Event bus shared by every resource of an application
///
/// Listeners are grouped by target type, so detaching from one target never
/// touches subscriptions made on another. Thread-safe via `RwLock`: triggers
/// are frequent, attach/detach only happen at bootstrap and shutdown.
#[derive(Default)]
pub struct SharedEventManager {
    targets: RwLock<HashMap<String, Vec<Subscription>>>,
}

impl SharedEventManager {
    /// Create an empty event manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener for one operation on a target type
    ///
    /// Higher `priority` runs first; equal priorities run in attach order.
    pub fn attach(
        &self,
        target: &str,
        operation: ResourceOperation,
        listener: Arc<dyn ResourceListener>,
        priority: i32,
    ) -> Result<SubscriptionHandle> {
        let mut targets = self
            .targets
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let handle = SubscriptionHandle::new();
        targets.entry(target.to_string()).or_default().push(Subscription {
            handle,
            operation,
            priority,
            listener,
        });

        trace!(target_type = target, %operation, priority, %handle, "listener attached");
        Ok(handle)
    }

    /// Detach a subscription from a target type
    ///
    /// Returns `false` when the handle is unknown for that target.
    pub fn detach(&self, target: &str, handle: SubscriptionHandle) -> Result<bool> {
        let mut targets = self
            .targets
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(subscriptions) = targets.get_mut(target) else {
            return Ok(false);
        };

        let before = subscriptions.len();
        subscriptions.retain(|s| s.handle != handle);
        let removed = subscriptions.len() != before;

        if subscriptions.is_empty() {
            targets.remove(target);
        }

        if removed {
            trace!(target_type = target, %handle, "listener detached");
        }
        Ok(removed)
    }

    /// Run the listeners of `target` registered for the event's operation
    ///
    /// Stops at the first listener returning a problem. Events whose name is
    /// not a known operation reach no listener.
    pub fn trigger(&self, target: &str, event: &mut ResourceEvent) -> Result<Option<ApiProblem>> {
        let Ok(operation) = event.name().parse::<ResourceOperation>() else {
            return Ok(None);
        };

        // Listeners are collected first so none runs while the lock is held.
        let listeners = {
            let targets = self
                .targets
                .read()
                .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

            let mut matching: Vec<(i32, Arc<dyn ResourceListener>)> = targets
                .get(target)
                .into_iter()
                .flatten()
                .filter(|s| s.operation == operation)
                .map(|s| (s.priority, s.listener.clone()))
                .collect();
            // Stable sort keeps attach order among equal priorities.
            matching.sort_by(|a, b| b.0.cmp(&a.0));
            matching
        };

        for (_, listener) in listeners {
            if let Some(problem) = listener.on_resource_event(event)? {
                return Ok(Some(problem));
            }
        }

        Ok(None)
    }

    /// Number of subscriptions on a target type
    pub fn listener_count(&self, target: &str) -> usize {
        self.targets
            .read()
            .map(|targets| targets.get(target).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Number of subscriptions on a target type for one operation
    pub fn listener_count_for(&self, target: &str, operation: ResourceOperation) -> usize {
        self.targets
            .read()
            .map(|targets| {
                targets
                    .get(target)
                    .map_or(0, |subs| subs.iter().filter(|s| s.operation == operation).count())
            })
            .unwrap_or(0)
    }

    /// Priorities of the subscriptions on a target type for one operation, in run order
    pub fn priorities_for(&self, target: &str, operation: ResourceOperation) -> Vec<i32> {
        let mut priorities: Vec<i32> = self
            .targets
            .read()
            .map(|targets| {
                targets
                    .get(target)
                    .into_iter()
                    .flatten()
                    .filter(|s| s.operation == operation)
                    .map(|s| s.priority)
                    .collect()
            })
            .unwrap_or_default();
        priorities.sort_by(|a, b| b.cmp(a));
        priorities
    }
}

impl fmt::Debug for SharedEventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<String, usize> = self
            .targets
            .read()
            .map(|targets| targets.iter().map(|(k, v)| (k.clone(), v.len())).collect())
            .unwrap_or_default();
        f.debug_struct("SharedEventManager")
            .field("targets", &counts)
            .finish()
    }
}
