//! Query parameter validation
//!
//! Rulesets are looked up by name in a [`RulesetRegistry`] and applied by the
//! [`ValidationDispatcher`] before a resource operation runs.

pub mod dispatcher;
pub mod registry;
pub mod ruleset;

pub use dispatcher::{LISTENER_PRIORITY, ValidationDispatcher};
pub use registry::{InMemoryRulesetRegistry, RegistryEntry, RulesetRegistry};
pub use ruleset::{Ruleset, ValidationOutcome};
