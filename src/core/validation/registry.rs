//! Ruleset registry
//!
//! The registry is the application's catalogue of named services that may
//! serve as rulesets. Not every registered service is one: the dispatcher
//! checks the capability and treats anything else as missing.

use super::ruleset::Ruleset;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// A service held by a registry
#[derive(Clone)]
pub enum RegistryEntry {
    /// Service providing the validation capability
    Ruleset(Arc<dyn Ruleset>),
    /// Service of some other kind, registered under the same namespace
    Other { type_name: String },
}

impl RegistryEntry {
    /// The validation capability, if the service has it
    pub fn into_ruleset(self) -> Option<Arc<dyn Ruleset>> {
        match self {
            RegistryEntry::Ruleset(ruleset) => Some(ruleset),
            RegistryEntry::Other { .. } => None,
        }
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEntry::Ruleset(_) => f.write_str("RegistryEntry::Ruleset"),
            RegistryEntry::Other { type_name } => {
                write!(f, "RegistryEntry::Other({})", type_name)
            }
        }
    }
}

/// Lookup of rulesets by identifier
pub trait RulesetRegistry: Send + Sync {
    /// Whether a service is registered under `id`
    fn has(&self, id: &str) -> bool;

    /// Retrieve the service registered under `id`
    ///
    /// Callers check [`has`](Self::has) first; an `Err` here is a failure of
    /// the registry and is propagated.
    fn get(&self, id: &str) -> Result<RegistryEntry>;
}

/// In-memory ruleset registry
///
/// Useful for testing and for applications that build their rulesets at
/// startup. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryRulesetRegistry {
    entries: Arc<RwLock<HashMap<String, RegistryEntry>>>,
}

impl InMemoryRulesetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ruleset under `id`, replacing any previous service
    pub fn register(&self, id: impl Into<String>, ruleset: Arc<dyn Ruleset>) -> Result<()> {
        self.register_entry(id, RegistryEntry::Ruleset(ruleset))
    }

    /// Register any service under `id`, replacing any previous one
    pub fn register_entry(&self, id: impl Into<String>, entry: RegistryEntry) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        entries.insert(id.into(), entry);
        Ok(())
    }

    /// Remove the service registered under `id`
    pub fn unregister(&self, id: &str) -> Result<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(entries.remove(id).is_some())
    }

    /// Registered identifiers
    pub fn ids(&self) -> Vec<String> {
        self.entries
            .read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl RulesetRegistry for InMemoryRulesetRegistry {
    fn has(&self, id: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(id))
            .unwrap_or(false)
    }

    fn get(&self, id: &str) -> Result<RegistryEntry> {
        let entries = self
            .entries
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        entries
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("No service registered under '{}'", id))
    }
}

impl fmt::Debug for InMemoryRulesetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRulesetRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
