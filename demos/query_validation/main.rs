//! Query validation example: an order collection with paging rules
//!
//! Run with `RUST_LOG=query_validation=trace` to see the dispatcher decisions.

use query_validation::prelude::*;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
orders:
  query_filter:
    fetchAll: OrderListQuery
    default: OrderQuery
invoices:
  query_filter: InvoiceQuery
"#;

/// `page` and `limit` as positive integers, defaulting to 1 and 20
fn order_list_query(params: &QueryParams) -> Result<ValidationOutcome> {
    let mut values = QueryValues::new();
    let mut errors = Vec::new();

    for (field, default) in [("page", 1), ("limit", 20)] {
        match params.get(field).and_then(Value::as_str) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => {
                    values.insert(field.to_string(), json!(n));
                }
                _ => errors.push((field, format!("'{}' is not a positive integer", raw))),
            },
            None => {
                values.insert(field.to_string(), json!(default));
            }
        }
    }

    if errors.is_empty() {
        Ok(ValidationOutcome::Proceed(values))
    } else {
        Ok(ValidationOutcome::failed(errors))
    }
}

fn pairs(items: &[(&str, &str)]) -> QueryParams {
    QueryParams::from_pairs(items.iter().map(|(k, v)| (k.to_string(), v.to_string())))
}

fn call(events: &SharedEventManager, operation: &str, controller: &str, query: QueryParams) -> Result<()> {
    let mut event = ResourceEvent::new(operation)
        .with_route_match(RouteMatch::for_controller(controller))
        .with_query_params(query);

    match events.trigger(RESOURCE_TARGET, &mut event)? {
        None => println!(
            "✅ {} {} proceeds with {}",
            controller,
            operation,
            serde_json::to_string(event.query_params())?
        ),
        Some(problem) => println!(
            "❌ {} {} rejected: {}",
            controller,
            operation,
            serde_json::to_string_pretty(&problem)?
        ),
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("🚀 Query Validation Example\n");

    let config = QueryValidationConfig::from_yaml_str(CONFIG)?;

    let registry = InMemoryRulesetRegistry::new();
    registry.register("OrderListQuery", Arc::new(order_list_query))?;

    let dispatcher = Arc::new(ValidationDispatcher::new(config, Arc::new(registry)));
    let events = SharedEventManager::new();
    dispatcher.attach_shared(&events)?;
    println!(
        "📋 Listening on {} resource operations\n",
        events.listener_count(RESOURCE_TARGET)
    );

    // Normalized: strings coerced, limit defaulted
    call(&events, "fetchAll", "orders", pairs(&[("page", "2")]))?;

    // Rejected by the ruleset
    call(&events, "fetchAll", "orders", pairs(&[("page", "zero"), ("limit", "-1")]))?;

    // OrderQuery is configured but never registered
    call(&events, "fetch", "orders", pairs(&[]))?;

    // No rule for this resource
    call(&events, "fetchAll", "customers", pairs(&[("anything", "goes")]))?;

    dispatcher.detach_shared(&events)?;
    println!(
        "\n🧹 Detached, {} listeners left",
        events.listener_count(RESOURCE_TARGET)
    );

    Ok(())
}
