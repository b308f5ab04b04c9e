//! Core module containing fundamental traits and types for query validation

pub mod error;
pub mod events;
pub mod operation;
pub mod query;
pub mod resource_event;
pub mod validation;

pub use error::{ApiProblem, ConfigError, ValidationMessages};
pub use events::{RESOURCE_TARGET, ResourceListener, SharedEventManager, SubscriptionHandle};
pub use operation::ResourceOperation;
pub use query::{QueryParams, QueryValues};
pub use resource_event::{ResourceEvent, RouteMatch};
pub use validation::{
    InMemoryRulesetRegistry, RegistryEntry, Ruleset, RulesetRegistry, ValidationDispatcher,
    ValidationOutcome,
};
