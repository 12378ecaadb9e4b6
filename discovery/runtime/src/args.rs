use crate::{
    azure::{Identity, Settings},
    discover,
    k8s::ClusterCatalog,
    DiscoveryMetrics,
};
use anyhow::{Context, Result};
use clap::Parser;
use prometheus_client::{encoding::text, registry::Registry};
use std::{path::PathBuf, time::Duration};
use tracing::info;

#[derive(Debug, Parser)]
#[clap(
    name = "dataaction-discovery",
    about = "Maps Kubernetes API resources to Azure data actions"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "dataaction_discovery=info,warn",
        env = "DATAACTION_DISCOVERY_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    /// The Azure resource type of the cluster, e.g.
    /// `Microsoft.Kubernetes/connectedClusters`.
    #[clap(long)]
    cluster_type: String,

    /// The Azure environment name. Defaults to the public cloud.
    #[clap(long, default_value = "")]
    environment: String,

    #[clap(long, default_value = "")]
    aks_login_url: String,

    /// Reads cluster credentials from this kubeconfig file instead of the
    /// in-cluster service account.
    #[clap(long)]
    kubeconfig: Option<PathBuf>,

    #[clap(long, default_value = "")]
    tenant_id: String,

    #[clap(long, default_value = "")]
    client_id: String,

    #[clap(
        long,
        default_value = "",
        env = "AZURE_CLIENT_SECRET",
        hide_env_values = true
    )]
    client_secret: String,

    /// The maximum number of operations pages to read.
    #[clap(long, default_value = "1")]
    operations_max_pages: usize,

    #[clap(long, default_value = "30")]
    request_timeout_secs: u64,

    /// Prints discovery latencies in the Prometheus text format.
    #[clap(long)]
    print_metrics: bool,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            cluster_type,
            environment,
            aks_login_url,
            kubeconfig,
            tenant_id,
            client_id,
            client_secret,
            operations_max_pages,
            request_timeout_secs,
            print_metrics,
        } = self;

        log_format.try_init(log_level)?;

        let identity = Identity {
            aks_login_url,
            tenant_id,
            client_id,
            client_secret,
        };
        let settings = Settings::new(&cluster_type, &environment, identity, kubeconfig)?;
        info!(
            cluster_type = %settings.cluster_type(),
            environment = %settings.environment().name,
            endpoint = %settings.operations_endpoint(),
            "Resolved settings"
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        let mut prom = <Registry>::default();
        let metrics = DiscoveryMetrics::register(prom.sub_registry_with_prefix("discovery"));

        let catalog = ClusterCatalog::from_kubeconfig(settings.kubeconfig()).await?;
        let operations = settings
            .operations_client(http)
            .with_max_pages(operations_max_pages);

        let table = discover(&catalog, &operations, settings.cluster_type(), &metrics).await?;
        println!("{}", serde_json::to_string_pretty(&table)?);

        if print_metrics {
            let mut buf = String::new();
            text::encode(&mut buf, &prom)?;
            print!("{buf}");
        }

        Ok(())
    }
}
