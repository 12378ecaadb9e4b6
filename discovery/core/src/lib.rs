#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod action_id;
mod cluster_type;
mod correlate;
mod resource;
mod table;

pub use self::{
    action_id::{ActionId, InvalidActionId, Verb},
    cluster_type::{ClusterType, UnsupportedClusterType},
    correlate::correlate,
    resource::{ApiGroup, ApiResource, Operation, ResourceList, CORE_GROUP},
    table::{DataAction, OperationsTable, ResourceVerbs, VerbActions},
};
