//! # This-RS Query Validation
//!
//! Query parameter validation for REST resources built on the this-rs
//! event model.
//!
//! ## Features
//!
//! - **Per-Resource Rulesets**: Map each resource to the ruleset validating its query string
//! - **Per-Operation Overrides**: Pick a ruleset per operation, with a `default` fallback
//! - **Normalized Input**: Resources see the ruleset's coerced values, not the raw strings
//! - **Problem Responses**: Rejections answered as `application/problem+json`
//! - **Configuration-Based**: Define rules via YAML configuration
//! - **Thread-Safe**: One dispatcher shared by every request, rulesets cached on first use
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use query_validation::prelude::*;
//!
//! let config = QueryValidationConfig::from_yaml_str(r#"
//! orders:
//!   query_filter:
//!     fetchAll: OrderListQuery
//!     default: OrderQuery
//! "#)?;
//!
//! let registry = InMemoryRulesetRegistry::new();
//! registry.register("OrderListQuery", Arc::new(order_list_ruleset))?;
//!
//! let dispatcher = Arc::new(ValidationDispatcher::new(config, Arc::new(registry)));
//! let events = SharedEventManager::new();
//! dispatcher.attach_shared(&events)?;
//!
//! // For every resource call:
//! let mut event = ResourceEvent::new("fetchAll")
//!     .with_route_match(RouteMatch::for_controller("orders"))
//!     .with_query_params(QueryParams::from_pairs(pairs));
//! if let Some(problem) = events.trigger(RESOURCE_TARGET, &mut event)? {
//!     return Ok(problem.into_response());
//! }
//! ```

pub mod config;
pub mod core;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        error::{ApiProblem, ConfigError, ValidationMessages},
        events::{RESOURCE_TARGET, ResourceListener, SharedEventManager, SubscriptionHandle},
        operation::ResourceOperation,
        query::{QueryParams, QueryValues},
        resource_event::{ResourceEvent, RouteMatch},
    };

    // === Validation ===
    pub use crate::core::validation::{
        InMemoryRulesetRegistry, LISTENER_PRIORITY, RegistryEntry, Ruleset, RulesetRegistry,
        ValidationDispatcher, ValidationOutcome,
    };

    // === Config ===
    pub use crate::config::{QueryFilterRule, QueryValidationConfig, ResourceValidationConfig};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use axum::http::StatusCode;
    pub use axum::response::IntoResponse;
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
}
