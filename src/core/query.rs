//! Query parameter bag carried by resource events

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered mapping of query parameter names to values
pub type QueryValues = IndexMap<String, Value>;

/// Query parameters of a resource call
///
/// Raw input holds strings and arrays of strings. After a ruleset accepts
/// the input the bag is replaced with the normalized output, which may hold
/// any JSON value (numbers, booleans, defaults filled in by the ruleset).
///
/// # Example
/// ```rust,ignore
/// // GET /orders?status=open&tags[]=a&tags[]=b
/// let params = QueryParams::from_pairs(vec![
///     ("status".to_string(), "open".to_string()),
///     ("tags[]".to_string(), "a".to_string()),
///     ("tags[]".to_string(), "b".to_string()),
/// ]);
/// assert_eq!(params.get("tags"), Some(&json!(["a", "b"])));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams {
    values: QueryValues,
}

impl QueryParams {
    /// Create an empty parameter bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already decoded `(key, value)` pairs, in request order
    ///
    /// A key ending in `[]` collects its values into an array stored under the
    /// stripped key. A plain key given more than once keeps its last value.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut values = QueryValues::new();

        for (key, value) in pairs {
            if let Some(name) = key.strip_suffix("[]") {
                let entry = values
                    .entry(name.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                match entry {
                    Value::Array(items) => items.push(Value::String(value)),
                    other => *other = Value::Array(vec![Value::String(value)]),
                }
            } else {
                values.insert(key, Value::String(value));
            }
        }

        Self { values }
    }

    /// Get a parameter by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Whether a parameter is present
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Borrow the underlying ordered map
    pub fn as_map(&self) -> &QueryValues {
        &self.values
    }

    /// Replace the whole bag with new values
    ///
    /// Previous contents are discarded, including keys absent from `values`.
    pub fn replace(&mut self, values: QueryValues) {
        self.values = values;
    }

    pub fn into_inner(self) -> QueryValues {
        self.values
    }
}

impl From<QueryValues> for QueryParams {
    fn from(values: QueryValues) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
