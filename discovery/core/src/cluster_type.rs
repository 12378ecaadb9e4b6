use std::{fmt, str::FromStr};

/// The kind of Azure-managed or Azure-connected Kubernetes offering.
///
/// The cluster type selects the operations endpoint, the token flow, and the
/// prefix that every relevant data action carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClusterType {
    /// An Arc-enabled cluster.
    Connected,

    /// An AKS cluster.
    Managed,

    /// An AKS fleet.
    Fleet,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cluster type {0:?} is not supported")]
pub struct UnsupportedClusterType(pub String);

// === impl ClusterType ===

impl ClusterType {
    pub const ALL: [Self; 3] = [Self::Connected, Self::Managed, Self::Fleet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "Microsoft.Kubernetes/connectedClusters",
            Self::Managed => "Microsoft.ContainerService/managedClusters",
            Self::Fleet => "Microsoft.ContainerService/fleets",
        }
    }

    /// The resource provider namespace that publishes this cluster type's
    /// operations.
    pub fn provider_namespace(&self) -> &'static str {
        match self {
            Self::Connected => "Microsoft.Kubernetes",
            Self::Managed | Self::Fleet => "Microsoft.ContainerService",
        }
    }
}

impl FromStr for ClusterType {
    type Err = UnsupportedClusterType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ct| ct.as_str() == s)
            .ok_or_else(|| UnsupportedClusterType(s.to_string()))
    }
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}
