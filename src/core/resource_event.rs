//! Resource event delivered to listeners before a REST resource runs

use super::query::QueryParams;
use std::collections::HashMap;

/// Route parameter holding the resource identifier
pub const CONTROLLER_PARAM: &str = "controller";

/// Result of matching the request against the router
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    route_name: Option<String>,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Create a route match with the given parameters
    pub fn new<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            route_name: None,
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Shorthand for a match that only names the targeted controller
    pub fn for_controller(controller: impl Into<String>) -> Self {
        Self::new([(CONTROLLER_PARAM, controller.into())])
    }

    pub fn with_route_name(mut self, name: impl Into<String>) -> Self {
        self.route_name = Some(name.into());
        self
    }

    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    /// Get a route parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Get a route parameter, falling back to `default` when absent
    pub fn param_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.param(name).unwrap_or(default)
    }

    /// Identifier of the targeted resource, if the route names a non-empty one
    pub fn resource_id(&self) -> Option<&str> {
        self.param(CONTROLLER_PARAM).filter(|id| !id.is_empty())
    }
}

/// A single call to a REST resource
///
/// Listeners receive it mutably: the query parameters may be replaced with
/// normalized values, which the resource then sees instead of the raw input.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEvent {
    name: String,
    route_match: Option<RouteMatch>,
    query_params: QueryParams,
}

impl ResourceEvent {
    /// Create an event for the named operation, with no route and no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            route_match: None,
            query_params: QueryParams::new(),
        }
    }

    pub fn with_route_match(mut self, route_match: RouteMatch) -> Self {
        self.route_match = Some(route_match);
        self
    }

    pub fn with_query_params(mut self, query_params: QueryParams) -> Self {
        self.query_params = query_params;
        self
    }

    /// Operation name (e.g. `fetchAll`)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn route_match(&self) -> Option<&RouteMatch> {
        self.route_match.as_ref()
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    pub fn query_params_mut(&mut self) -> &mut QueryParams {
        &mut self.query_params
    }

    /// Identifier of the targeted resource, if the event carries one
    pub fn resource_id(&self) -> Option<&str> {
        self.route_match.as_ref().and_then(RouteMatch::resource_id)
    }
}
