//! Configuration loading and ruleset resolution
//!
//! Configuration maps a resource identifier to the ruleset validating its
//! query parameters:
//!
//! ```yaml
//! api-tools-content-validation:
//!   Api\V1\Rest\Order\Controller:
//!     query_filter: OrderQuery            # every operation
//!   Api\V1\Rest\Invoice\Controller:
//!     query_filter:
//!       fetchAll: InvoiceListQuery        # only fetchAll
//!       default: InvoiceQuery             # everything else
//! ```

use crate::core::error::ConfigError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application config key holding the validation section
pub const CONFIG_KEY: &str = "api-tools-content-validation";

/// Key of the fallback entry in a per-operation mapping
pub const DEFAULT_OPERATION_KEY: &str = "default";

/// Which ruleset applies to which operation of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawQueryFilterRule", into = "RawQueryFilterRule")]
pub enum QueryFilterRule {
    /// One ruleset for every operation
    Single(String),
    /// Rulesets by operation name, with an optional fallback
    PerOperation {
        operations: IndexMap<String, String>,
        default: Option<String>,
    },
}

/// Wire shape: a bare identifier or a mapping whose `null` values count as absent
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawQueryFilterRule {
    Single(String),
    Map(IndexMap<String, Option<String>>),
}

impl From<RawQueryFilterRule> for QueryFilterRule {
    fn from(raw: RawQueryFilterRule) -> Self {
        match raw {
            RawQueryFilterRule::Single(id) => QueryFilterRule::Single(id),
            RawQueryFilterRule::Map(map) => {
                let mut operations = IndexMap::new();
                let mut default = None;
                for (key, id) in map {
                    let Some(id) = id else { continue };
                    if key == DEFAULT_OPERATION_KEY {
                        default = Some(id);
                    } else {
                        operations.insert(key, id);
                    }
                }
                QueryFilterRule::PerOperation {
                    operations,
                    default,
                }
            }
        }
    }
}

impl From<QueryFilterRule> for RawQueryFilterRule {
    fn from(rule: QueryFilterRule) -> Self {
        match rule {
            QueryFilterRule::Single(id) => RawQueryFilterRule::Single(id),
            QueryFilterRule::PerOperation {
                operations,
                default,
            } => {
                let mut map: IndexMap<String, Option<String>> = operations
                    .into_iter()
                    .map(|(k, v)| (k, Some(v)))
                    .collect();
                if let Some(default) = default {
                    map.insert(DEFAULT_OPERATION_KEY.to_string(), Some(default));
                }
                RawQueryFilterRule::Map(map)
            }
        }
    }
}

impl QueryFilterRule {
    /// Ruleset identifier for an operation
    ///
    /// The operation-specific entry wins, then `default`, then nothing. An
    /// empty identifier means "no ruleset"; an empty operation-specific entry
    /// does not fall back to `default`.
    pub fn ruleset_for(&self, operation: &str) -> Option<&str> {
        let id = match self {
            QueryFilterRule::Single(id) => id.as_str(),
            QueryFilterRule::PerOperation {
                operations,
                default,
            } => match operations.get(operation) {
                Some(id) => id.as_str(),
                None => default.as_deref()?,
            },
        };

        (!id.is_empty()).then_some(id)
    }

    /// Whether the rule can never yield a ruleset
    pub fn is_empty(&self) -> bool {
        match self {
            QueryFilterRule::Single(id) => id.is_empty(),
            QueryFilterRule::PerOperation {
                operations,
                default,
            } => operations.is_empty() && default.is_none(),
        }
    }
}

/// Validation settings of one resource
///
/// Other keys of the resource's entry (body input filters and the like) are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceValidationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_filter: Option<QueryFilterRule>,
}

/// Query validation configuration keyed by resource identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryValidationConfig {
    pub resources: IndexMap<String, ResourceValidationConfig>,
}

impl QueryValidationConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rule of a resource, replacing any previous one
    pub fn with_rule(mut self, resource_id: impl Into<String>, rule: QueryFilterRule) -> Self {
        self.resources.insert(
            resource_id.into(),
            ResourceValidationConfig {
                query_filter: Some(rule),
            },
        );
        self
    }

    /// Load configuration from a YAML string holding the resource map
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Option<Self> = serde_yaml::from_str(yaml)?;
        Ok(config.unwrap_or_default())
    }

    /// Load configuration from a YAML file holding the resource map
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: display.clone(),
            },
            _ => ConfigError::Io {
                path: display.clone(),
                message: e.to_string(),
            },
        })?;

        Self::from_yaml_str(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                file: Some(display),
                message,
            },
            other => other,
        })
    }

    /// Extract the validation section from a whole application config
    ///
    /// A missing or `null` section yields an empty configuration.
    pub fn from_app_config(app_config: &serde_yaml::Value) -> Result<Self, ConfigError> {
        match app_config.get(CONFIG_KEY) {
            None | Some(serde_yaml::Value::Null) => Ok(Self::default()),
            Some(section) => Ok(serde_yaml::from_value(section.clone())?),
        }
    }

    /// Merge module configurations, later ones winning per resource
    pub fn merge(configs: Vec<Self>) -> Self {
        let mut merged = Self::default();
        for config in configs {
            merged.resources.extend(config.resources);
        }
        merged
    }

    /// Ruleset identifier for an operation on a resource
    ///
    /// Returns `None` when the resource is not configured, has no query
    /// rule, or its rule yields nothing for the operation.
    pub fn resolve(&self, resource_id: &str, operation: &str) -> Option<&str> {
        self.resources
            .get(resource_id)?
            .query_filter
            .as_ref()?
            .ruleset_for(operation)
    }

    /// Configured resource identifiers
    pub fn resource_ids(&self) -> Vec<&str> {
        self.resources.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn per_operation(entries: &[(&str, &str)], default: Option<&str>) -> QueryFilterRule {
        QueryFilterRule::PerOperation {
            operations: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            default: default.map(str::to_string),
        }
    }

    #[test]
    fn test_single_rule_applies_to_every_operation() {
        let rule = QueryFilterRule::Single("inputFilterName".to_string());
        assert_eq!(rule.ruleset_for("fetch"), Some("inputFilterName"));
        assert_eq!(rule.ruleset_for("dummy"), Some("inputFilterName"));
    }

    #[test]
    fn test_specific_then_default_then_none() {
        let rule = per_operation(&[("fetch", "filterA")], Some("filterB"));
        assert_eq!(rule.ruleset_for("fetch"), Some("filterA"));
        assert_eq!(rule.ruleset_for("patch"), Some("filterB"));

        let rule = per_operation(&[("fetch", "filterA")], None);
        assert_eq!(rule.ruleset_for("patch"), None);
    }

    #[test]
    fn test_empty_identifiers_resolve_to_none() {
        assert_eq!(QueryFilterRule::Single(String::new()).ruleset_for("fetch"), None);

        let rule = per_operation(&[("fetch", "")], Some("filterB"));
        assert_eq!(rule.ruleset_for("fetch"), None);
        assert_eq!(rule.ruleset_for("patch"), Some("filterB"));

        let rule = per_operation(&[], Some(""));
        assert_eq!(rule.ruleset_for("patch"), None);
    }

    #[test]
    fn test_yaml_single_and_mapping() {
        let yaml = r#"
controllerName:
  query_filter: inputFilterName
other:
  query_filter:
    fetch: filterA
    default: filterB
"#;
        let config = QueryValidationConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.resources["controllerName"].query_filter,
            Some(QueryFilterRule::Single("inputFilterName".to_string()))
        );
        assert_eq!(
            config.resources["other"].query_filter,
            Some(per_operation(&[("fetch", "filterA")], Some("filterB")))
        );
    }

    #[test]
    fn test_yaml_null_entry_falls_back_to_default() {
        let yaml = r#"
orders:
  query_filter:
    fetch: ~
    default: filterB
"#;
        let config = QueryValidationConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.resolve("orders", "fetch"), Some("filterB"));
    }

    #[test]
    fn test_yaml_missing_or_null_query_filter() {
        let yaml = r#"
orders:
  input_filter: OrderInput
invoices:
  query_filter: ~
"#;
        let config = QueryValidationConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.resources["orders"].query_filter, None);
        assert_eq!(config.resources["invoices"].query_filter, None);
        assert_eq!(config.resolve("orders", "fetch"), None);
        assert_eq!(config.resolve("invoices", "fetch"), None);
    }

    #[test]
    fn test_empty_yaml_is_empty_config() {
        assert!(QueryValidationConfig::from_yaml_str("").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let err = QueryValidationConfig::from_yaml_str("orders: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { file: None, .. }));
    }

    #[test]
    fn test_yaml_serialization() {
        let config = QueryValidationConfig::new()
            .with_rule("orders", QueryFilterRule::Single("OrderQuery".to_string()))
            .with_rule("invoices", per_operation(&[("fetchAll", "ListQuery")], Some("Query")));

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = QueryValidationConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_resolve_unknown_resource() {
        let config = QueryValidationConfig::new()
            .with_rule("orders", QueryFilterRule::Single("OrderQuery".to_string()));
        assert_eq!(config.resolve("invoices", "fetch"), None);
        assert_eq!(config.resolve("orders", "fetch"), Some("OrderQuery"));
    }

    #[test]
    fn test_from_app_config_extracts_section() {
        let app: serde_yaml::Value = serde_yaml::from_str(
            r#"
router:
  routes: {}
api-tools-content-validation:
  orders:
    query_filter: OrderQuery
"#,
        )
        .unwrap();

        let config = QueryValidationConfig::from_app_config(&app).unwrap();
        assert_eq!(config.resource_ids(), vec!["orders"]);
    }

    #[test]
    fn test_from_app_config_without_section_is_empty() {
        let app: serde_yaml::Value = serde_yaml::from_str("router: {}").unwrap();
        assert!(QueryValidationConfig::from_app_config(&app).unwrap().is_empty());
    }

    #[test]
    fn test_merge_later_config_wins() {
        let first = QueryValidationConfig::new()
            .with_rule("orders", QueryFilterRule::Single("Old".to_string()))
            .with_rule("invoices", QueryFilterRule::Single("InvoiceQuery".to_string()));
        let second = QueryValidationConfig::new()
            .with_rule("orders", QueryFilterRule::Single("New".to_string()));

        let merged = QueryValidationConfig::merge(vec![first, second]);
        assert_eq!(merged.resolve("orders", "fetch"), Some("New"));
        assert_eq!(merged.resolve("invoices", "fetch"), Some("InvoiceQuery"));
    }

    #[test]
    fn test_rule_is_empty() {
        assert!(QueryFilterRule::Single(String::new()).is_empty());
        assert!(per_operation(&[], None).is_empty());
        assert!(!per_operation(&[], Some("x")).is_empty());
    }
}
