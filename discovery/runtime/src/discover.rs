use crate::metrics::Metrics;
use dataaction_discovery_azure::{self as azure, DataActionSource};
use dataaction_discovery_core::{correlate, ClusterType, OperationsTable};
use dataaction_discovery_k8s::{self as k8s, ResourceCatalog};
use tokio::time;
use tracing::{debug, info, instrument};

#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    #[error("failed to fetch API resources from the apiserver: {0}")]
    ApiResources(#[source] k8s::Error),

    #[error("failed to fetch operations from Azure: {0}")]
    Operations(#[source] azure::Error),
}

/// Builds an operations table from the API resources a cluster serves and
/// the data actions Azure publishes for its cluster type.
///
/// The two catalogs are fetched concurrently; if either fetch fails, discovery
/// fails. Each fetch's latency is observed only if it succeeds, and the total
/// latency only if discovery succeeds.
#[instrument(skip_all, fields(%cluster_type))]
pub async fn discover<C, D>(
    catalog: &C,
    actions: &D,
    cluster_type: ClusterType,
    metrics: &dyn Metrics,
) -> Result<OperationsTable, DiscoverError>
where
    C: ResourceCatalog + ?Sized,
    D: DataActionSource + ?Sized,
{
    let start = time::Instant::now();

    let resources = async {
        let start = time::Instant::now();
        let resources = catalog
            .preferred_resources()
            .await
            .map_err(DiscoverError::ApiResources)?;
        metrics.observe_api_server_call(start.elapsed());
        Ok::<_, DiscoverError>(resources)
    };

    let operations = async {
        let start = time::Instant::now();
        let operations = actions
            .data_actions()
            .await
            .map_err(DiscoverError::Operations)?;
        metrics.observe_cloud_call(start.elapsed());
        Ok::<_, DiscoverError>(operations)
    };

    let (resources, operations) = tokio::try_join!(resources, operations)?;

    let table = correlate(&resources, &operations, cluster_type);
    metrics.observe_total(start.elapsed());

    info!(
        groups = table.groups().count(),
        actions = table.len(),
        "Discovered data actions"
    );
    debug!(%table, "Operations table created");
    Ok(table)
}
