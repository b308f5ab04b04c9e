//! Ruleset capability
//!
//! A ruleset turns a bag of raw query values into either normalized values
//! (coerced, defaulted) or per-field rejection messages. How rules are
//! authored is up to the application; the dispatcher only needs [`Ruleset`].

use crate::core::error::ValidationMessages;
use crate::core::query::{QueryParams, QueryValues};
use anyhow::Result;

/// Outcome of running a ruleset over query parameters
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Input accepted; the request continues with these values
    Proceed(QueryValues),
    /// Input rejected, with messages per field
    Failed(ValidationMessages),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Proceed(_))
    }

    /// Build a failure from `(field, message)` pairs, grouping by field
    pub fn failed<I, F, M>(messages: I) -> Self
    where
        I: IntoIterator<Item = (F, M)>,
        F: Into<String>,
        M: Into<String>,
    {
        let mut grouped = ValidationMessages::new();
        for (field, message) in messages {
            grouped.entry(field.into()).or_default().push(message.into());
        }
        ValidationOutcome::Failed(grouped)
    }
}

/// Validation capability applied to a resource's query parameters
///
/// Implementations must be deterministic for a given input; the dispatcher
/// shares one instance between all requests and threads.
///
/// Closures with the matching signature are rulesets:
///
/// ```rust,ignore
/// let ruleset = |params: &QueryParams| -> anyhow::Result<ValidationOutcome> {
///     match params.get("page") {
///         Some(_) => Ok(ValidationOutcome::Proceed(params.as_map().clone())),
///         None => Ok(ValidationOutcome::failed([("page", "Value is required")])),
///     }
/// };
/// registry.register("PageQuery", Arc::new(ruleset))?;
/// ```
pub trait Ruleset: Send + Sync {
    /// Validate the given parameters
    ///
    /// An `Err` is a failure of the ruleset itself, not a rejection of the
    /// input, and is propagated to the host.
    fn validate(&self, params: &QueryParams) -> Result<ValidationOutcome>;
}

impl<F> Ruleset for F
where
    F: Fn(&QueryParams) -> Result<ValidationOutcome> + Send + Sync,
{
    fn validate(&self, params: &QueryParams) -> Result<ValidationOutcome> {
        self(params)
    }
}
