use crate::{ActionId, ApiGroup, ClusterType, DataAction, Operation, OperationsTable, ResourceList};

/// Builds an operations table by matching each top-level cluster resource
/// against the cloud operations that name it.
///
/// Operations are matched in two steps. First, an operation's identifier must
/// contain the resource's path (`<cluster type>[/<group>]/<resource>`); this
/// is a substring test because identifiers carry additional segments after the
/// resource name. Second, the operation must actually select the resource's
/// group (see [`ActionId::selects`]).
///
/// When several operations map to the same group, resource, and verb, the last
/// one wins. Operations with malformed identifiers are ignored.
pub fn correlate(
    resources: &[ResourceList],
    operations: &[Operation],
    cluster_type: ClusterType,
) -> OperationsTable {
    let actions = operations
        .iter()
        .filter_map(|op| op.name.parse::<ActionId>().ok())
        .collect::<Vec<_>>();

    let mut table = OperationsTable::default();

    for list in resources.iter().filter(|l| !l.resources.is_empty()) {
        let group = ApiGroup::from_group_version(&list.group_version);

        for resource in list.resources.iter().filter(|r| !r.is_subresource()) {
            let prefix = match &group {
                ApiGroup::Core => format!("{cluster_type}/{}", resource.name),
                ApiGroup::Named(name) => format!("{cluster_type}/{name}/{}", resource.name),
            };

            let matches = actions.iter().filter(|action| {
                action.as_str().contains(&prefix) && action.selects(&group, &resource.name)
            });
            for action in matches {
                table.insert(
                    group.as_str(),
                    resource.name.as_str(),
                    action.verb().to_string(),
                    DataAction {
                        id: action.to_string(),
                        is_data_action: true,
                        is_namespaced_resource: resource.namespaced,
                    },
                );
            }
        }
    }

    table
}
