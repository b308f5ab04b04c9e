//! REST resource operations
//!
//! Every resource call is announced on the event bus under one of these
//! names before the resource itself runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the nine CRUD-style operations a REST resource exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceOperation {
    /// POST on a collection
    Create,
    /// DELETE on an entity
    Delete,
    /// DELETE on a collection
    DeleteList,
    /// GET on an entity
    Fetch,
    /// GET on a collection
    FetchAll,
    /// PATCH on an entity
    Patch,
    /// PATCH on a collection
    PatchList,
    /// PUT on a collection
    ReplaceList,
    /// PUT on an entity
    Update,
}

impl ResourceOperation {
    /// All operations, in the order listeners subscribe to them
    pub const ALL: [ResourceOperation; 9] = [
        ResourceOperation::Create,
        ResourceOperation::Delete,
        ResourceOperation::DeleteList,
        ResourceOperation::Fetch,
        ResourceOperation::FetchAll,
        ResourceOperation::Patch,
        ResourceOperation::PatchList,
        ResourceOperation::ReplaceList,
        ResourceOperation::Update,
    ];

    /// Event name as it appears in configuration (e.g. `fetchAll`)
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceOperation::Create => "create",
            ResourceOperation::Delete => "delete",
            ResourceOperation::DeleteList => "deleteList",
            ResourceOperation::Fetch => "fetch",
            ResourceOperation::FetchAll => "fetchAll",
            ResourceOperation::Patch => "patch",
            ResourceOperation::PatchList => "patchList",
            ResourceOperation::ReplaceList => "replaceList",
            ResourceOperation::Update => "update",
        }
    }

    /// Whether the operation targets a collection rather than a single entity
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            ResourceOperation::Create
                | ResourceOperation::DeleteList
                | ResourceOperation::FetchAll
                | ResourceOperation::PatchList
                | ResourceOperation::ReplaceList
        )
    }
}

impl fmt::Display for ResourceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a name outside the nine operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown resource operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for ResourceOperation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceOperation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_contains_nine_distinct_operations() {
        let mut names: Vec<&str> = ResourceOperation::ALL.iter().map(|op| op.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn test_parse_round_trips_every_name() {
        for op in ResourceOperation::ALL {
            assert_eq!(op.as_str().parse::<ResourceOperation>(), Ok(op));
        }
    }

    #[test]
    fn test_parse_unknown_name_fails() {
        let err = "dummy".parse::<ResourceOperation>().unwrap_err();
        assert_eq!(err, UnknownOperation("dummy".to_string()));
        assert!(err.to_string().contains("dummy"));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("FetchAll".parse::<ResourceOperation>().is_err());
    }

    #[test]
    fn test_serde_uses_event_names() {
        let json = serde_json::to_value(ResourceOperation::ReplaceList).unwrap();
        assert_eq!(json, serde_json::json!("replaceList"));

        let op: ResourceOperation = serde_json::from_str("\"deleteList\"").unwrap();
        assert_eq!(op, ResourceOperation::DeleteList);
    }

    #[test]
    fn test_collection_operations() {
        assert!(ResourceOperation::FetchAll.is_collection());
        assert!(!ResourceOperation::Fetch.is_collection());
        assert!(!ResourceOperation::Update.is_collection());
    }
}
