use serde::{Deserialize, Serialize};
use std::fmt;

/// The label under which core API group resources are indexed.
pub const CORE_GROUP: &str = "v1";

/// The resources served by a single API group-version.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList {
    pub group_version: String,
    pub resources: Vec<ApiResource>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResource {
    pub name: String,
    pub namespaced: bool,
}

/// An operation published by a cloud resource provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    pub is_data_action: bool,
}

/// A Kubernetes API group, as it is keyed in an operations table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApiGroup {
    Core,
    Named(String),
}

// === impl ApiResource ===

impl ApiResource {
    pub fn new(name: impl ToString, namespaced: bool) -> Self {
        Self {
            name: name.to_string(),
            namespaced,
        }
    }

    /// Subresources, like `pods/log`, are named with a path separator.
    pub fn is_subresource(&self) -> bool {
        self.name.contains('/')
    }
}

// === impl Operation ===

impl Operation {
    pub fn data_action(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            is_data_action: true,
        }
    }
}

// === impl ApiGroup ===

impl ApiGroup {
    /// Derives the group from a group-version string like `apps/v1`.
    ///
    /// The core group is reported either as an empty string or as `v1`.
    pub fn from_group_version(group_version: &str) -> Self {
        if group_version.is_empty() || group_version == CORE_GROUP {
            return Self::Core;
        }
        let group = group_version
            .split_once('/')
            .map_or(group_version, |(group, _)| group);
        Self::Named(group.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Core => CORE_GROUP,
            Self::Named(group) => group,
        }
    }

    pub fn is_core(&self) -> bool {
        matches!(self, Self::Core)
    }
}

impl fmt::Display for ApiGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}
