//! Integration tests for loading validation configuration

use query_validation::prelude::*;
use std::io::Write;

const APP_CONFIG: &str = r#"
router:
  routes:
    orders:
      route: /orders[/:order_id]
api-tools-content-validation:
  Api\V1\Rest\Order\Controller:
    input_filter: Api\V1\Rest\Order\Validator
    query_filter:
      fetchAll: OrderListQuery
      default: OrderQuery
  Api\V1\Rest\Invoice\Controller:
    query_filter: InvoiceQuery
"#;

#[test]
fn test_from_app_config_resolves_per_operation() {
    let app: serde_yaml::Value = serde_yaml::from_str(APP_CONFIG).unwrap();
    let config = QueryValidationConfig::from_app_config(&app).unwrap();

    let order = r"Api\V1\Rest\Order\Controller";
    assert_eq!(config.resolve(order, "fetchAll"), Some("OrderListQuery"));
    assert_eq!(config.resolve(order, "fetch"), Some("OrderQuery"));
    assert_eq!(config.resolve(order, "patchList"), Some("OrderQuery"));

    let invoice = r"Api\V1\Rest\Invoice\Controller";
    for operation in ResourceOperation::ALL {
        assert_eq!(config.resolve(invoice, operation.as_str()), Some("InvoiceQuery"));
    }
}

#[test]
fn test_from_app_config_invalid_section_is_parse_error() {
    let app: serde_yaml::Value = serde_yaml::from_str(
        r#"
api-tools-content-validation:
  - not
  - a
  - map
"#,
    )
    .unwrap();

    let err = QueryValidationConfig::from_app_config(&app).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
orders:
  query_filter: OrderQuery
"#
    )
    .unwrap();

    let config = QueryValidationConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.resolve("orders", "fetch"), Some("OrderQuery"));
}

#[test]
fn test_from_yaml_file_not_found() {
    let err = QueryValidationConfig::from_yaml_file("/nonexistent/validation.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
    assert!(err.to_string().contains("/nonexistent/validation.yaml"));
}

#[test]
fn test_from_yaml_file_parse_error_names_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "orders: [unclosed").unwrap();

    let err = QueryValidationConfig::from_yaml_file(file.path()).unwrap_err();
    match err {
        ConfigError::Parse { file: Some(name), .. } => {
            assert_eq!(name, file.path().display().to_string());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_merge_module_configs() {
    let orders = QueryValidationConfig::from_yaml_str(
        r#"
orders:
  query_filter: OrderQuery
shared:
  query_filter: FirstQuery
"#,
    )
    .unwrap();
    let invoices = QueryValidationConfig::from_yaml_str(
        r#"
invoices:
  query_filter:
    fetch: InvoiceQuery
shared:
  query_filter: SecondQuery
"#,
    )
    .unwrap();

    let merged = QueryValidationConfig::merge(vec![orders, invoices]);

    assert_eq!(merged.resource_ids().len(), 3);
    assert_eq!(merged.resolve("orders", "update"), Some("OrderQuery"));
    assert_eq!(merged.resolve("invoices", "fetch"), Some("InvoiceQuery"));
    assert_eq!(merged.resolve("invoices", "update"), None);
    assert_eq!(merged.resolve("shared", "fetch"), Some("SecondQuery"));
}

#[test]
fn test_merge_empty_configs() {
    assert!(QueryValidationConfig::merge(vec![]).is_empty());
}

#[test]
fn test_dispatcher_from_app_config_validates() {
    let app: serde_yaml::Value = serde_yaml::from_str(APP_CONFIG).unwrap();
    let registry = InMemoryRulesetRegistry::new();
    registry
        .register(
            "OrderListQuery",
            Arc::new(|_: &QueryParams| -> Result<ValidationOutcome> {
                Ok(ValidationOutcome::failed([("status", "Unknown status")]))
            }),
        )
        .unwrap();
    let dispatcher = ValidationDispatcher::from_app_config(&app, Arc::new(registry)).unwrap();

    let mut list = ResourceEvent::new("fetchAll")
        .with_route_match(RouteMatch::for_controller(r"Api\V1\Rest\Order\Controller"));
    let problem = dispatcher.handle(&mut list).unwrap().unwrap();
    assert_eq!(problem.status_code(), StatusCode::BAD_REQUEST);

    // OrderQuery is configured but never registered
    let mut single = ResourceEvent::new("fetch")
        .with_route_match(RouteMatch::for_controller(r"Api\V1\Rest\Order\Controller"));
    let problem = dispatcher.handle(&mut single).unwrap().unwrap();
    assert_eq!(problem.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(problem.detail().unwrap().contains("OrderQuery"));
}
