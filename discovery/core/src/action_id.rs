use crate::ApiGroup;
use std::{fmt, str::FromStr};

/// A parsed cloud operation identifier.
///
/// Identifiers are slash-delimited paths of the form
/// `<provider>/<resource type>/<selector>/.../<verb>`, e.g.
/// `Microsoft.Kubernetes/connectedClusters/apps/deployments/write`. The
/// selector is the segment that immediately follows the resource type: it
/// names the API group for grouped resources, or the resource itself for
/// resources in the core group. The verb is always the last segment, so in a
/// three-segment identifier the selector doubles as the verb.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionId {
    id: String,
    provider: String,
    resource_type: String,
    selector: String,
    verb: Verb,
}

/// The verb an action grants.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    /// A standard verb like `read` or `write`.
    Standard(String),

    /// A custom action, e.g. `restart/action`.
    Action(String),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("operation identifier {0:?} must have at least three path segments")]
pub struct InvalidActionId(pub String);

// === impl ActionId ===

impl ActionId {
    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    /// Indicates whether this action targets the given resource.
    ///
    /// Substring matches on the identifier alone conflate resources whose
    /// paths share a prefix (`.../events/...` in the core group and
    /// `.../events.k8s.io/events/...`), so the selector must name the group
    /// exactly or, for the core group, the resource exactly.
    pub fn selects(&self, group: &ApiGroup, resource: &str) -> bool {
        match group {
            ApiGroup::Core => self.selector == resource,
            ApiGroup::Named(group) => self.selector == *group,
        }
    }
}

impl FromStr for ActionId {
    type Err = InvalidActionId;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidActionId(id.to_string());

        let segments = id.split('/').collect::<Vec<_>>();
        let [provider, resource_type, selector, ..] = segments.as_slice() else {
            return Err(invalid());
        };

        let verb = match segments.as_slice() {
            [.., name, "action"] => Verb::Action(name.to_string()),
            [.., last] => Verb::Standard(last.to_string()),
            [] => return Err(invalid()),
        };

        Ok(Self {
            id: id.to_string(),
            provider: provider.to_string(),
            resource_type: resource_type.to_string(),
            selector: selector.to_string(),
            verb,
        })
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

// === impl Verb ===

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(verb) => verb.fmt(f),
            Self::Action(name) => write!(f, "{name}/action"),
        }
    }
}
