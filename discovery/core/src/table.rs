use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Records that a verb on a resource is governed by a cloud data action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAction {
    /// The full cloud operation identifier.
    pub id: String,
    pub is_data_action: bool,
    pub is_namespaced_resource: bool,
}

pub type VerbActions = BTreeMap<String, DataAction>;

pub type ResourceVerbs = BTreeMap<String, VerbActions>;

/// Maps an API group, a resource, and a verb to the data action that
/// governs it.
///
/// Each table is built from scratch by a single discovery; it is never
/// updated incrementally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationsTable(BTreeMap<String, ResourceVerbs>);

// === impl OperationsTable ===

impl OperationsTable {
    /// Inserts an action, returning the action it replaced, if any.
    pub fn insert(
        &mut self,
        group: impl Into<String>,
        resource: impl Into<String>,
        verb: impl Into<String>,
        action: DataAction,
    ) -> Option<DataAction> {
        self.0
            .entry(group.into())
            .or_default()
            .entry(resource.into())
            .or_default()
            .insert(verb.into(), action)
    }

    pub fn get(&self, group: &str, resource: &str, verb: &str) -> Option<&DataAction> {
        self.resource(group, resource)?.get(verb)
    }

    pub fn group(&self, group: &str) -> Option<&ResourceVerbs> {
        self.0.get(group)
    }

    pub fn resource(&self, group: &str, resource: &str) -> Option<&VerbActions> {
        self.group(group)?.get(resource)
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over all `(group, resource, verb, action)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str, &DataAction)> + '_ {
        self.0.iter().flat_map(|(group, resources)| {
            resources.iter().flat_map(move |(resource, verbs)| {
                verbs
                    .iter()
                    .map(move |(verb, action)| (group.as_str(), resource.as_str(), verb.as_str(), action))
            })
        })
    }

    /// The number of actions in the table.
    pub fn len(&self) -> usize {
        self.0
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Formats the table as compact JSON.
impl fmt::Display for OperationsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl FromStr for OperationsTable {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}
