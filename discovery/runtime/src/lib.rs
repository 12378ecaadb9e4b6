#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;
mod discover;
pub mod metrics;

pub use self::{
    args::Args,
    discover::{discover, DiscoverError},
    metrics::{DiscoveryMetrics, Metrics, NoopMetrics},
};
pub use dataaction_discovery_azure as azure;
pub use dataaction_discovery_core as core;
pub use dataaction_discovery_k8s as k8s;
