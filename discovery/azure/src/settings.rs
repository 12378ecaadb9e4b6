use crate::{
    environment::{self, Environment},
    operations::OperationsClient,
    token::{AksTokenProvider, ClientCredentialTokenProvider, TokenProvider},
    Error,
};
use dataaction_discovery_core::ClusterType;
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Credentials used to acquire tokens for the operations endpoint.
#[derive(Clone, Default)]
pub struct Identity {
    /// The AKS login service, used for managed clusters and fleets.
    pub aks_login_url: String,
    pub tenant_id: String,

    /// The service principal used for connected clusters.
    pub client_id: String,
    pub client_secret: String,
}

/// Resolved discovery configuration.
#[derive(Clone)]
pub struct Settings {
    cluster_type: ClusterType,
    environment: &'static Environment,
    operations_endpoint: String,
    kubeconfig: Option<PathBuf>,
    identity: Identity,
}

/// Returns the URL that lists a cluster type's provider operations.
pub fn operations_endpoint(environment: &Environment, cluster_type: ClusterType) -> String {
    let api_version = match cluster_type {
        ClusterType::Connected => "2021-10-01",
        ClusterType::Managed | ClusterType::Fleet => "2018-10-31",
    };
    format!(
        "{}/providers/{}/operations?api-version={api_version}",
        environment.resource_manager(),
        cluster_type.provider_namespace(),
    )
}

// === impl Settings ===

impl Settings {
    /// Resolves settings for a cluster type in the named Azure environment.
    ///
    /// An empty environment name selects the public cloud.
    pub fn new(
        cluster_type: &str,
        environment_name: &str,
        identity: Identity,
        kubeconfig: Option<PathBuf>,
    ) -> Result<Self, Error> {
        let cluster_type = cluster_type.parse::<ClusterType>()?;
        let environment = if environment_name.is_empty() {
            &environment::PUBLIC_CLOUD
        } else {
            Environment::from_name(environment_name)
                .ok_or_else(|| Error::UnknownEnvironment(environment_name.to_string()))?
        };

        Ok(Self {
            cluster_type,
            environment,
            operations_endpoint: operations_endpoint(environment, cluster_type),
            kubeconfig,
            identity,
        })
    }

    pub fn cluster_type(&self) -> ClusterType {
        self.cluster_type
    }

    pub fn environment(&self) -> &'static Environment {
        self.environment
    }

    pub fn operations_endpoint(&self) -> &str {
        &self.operations_endpoint
    }

    pub fn kubeconfig(&self) -> Option<&Path> {
        self.kubeconfig.as_deref()
    }

    /// The AAD v2 token endpoint for the configured tenant.
    pub fn token_url(&self) -> String {
        format!(
            "{}{}/oauth2/v2.0/token",
            self.environment.active_directory_endpoint, self.identity.tenant_id
        )
    }

    pub fn token_scope(&self) -> String {
        format!("{}/.default", self.environment.resource_manager())
    }

    /// Connected clusters authenticate as a service principal; managed
    /// clusters and fleets go through the AKS login service.
    pub fn token_provider(&self, http: reqwest::Client) -> Arc<dyn TokenProvider> {
        match self.cluster_type {
            ClusterType::Connected => Arc::new(ClientCredentialTokenProvider::new(
                http,
                self.token_url(),
                self.identity.client_id.clone(),
                self.identity.client_secret.clone(),
            )),
            ClusterType::Managed | ClusterType::Fleet => Arc::new(AksTokenProvider::new(
                http,
                self.identity.aks_login_url.clone(),
                self.identity.tenant_id.clone(),
            )),
        }
    }

    pub fn operations_client(&self, http: reqwest::Client) -> OperationsClient {
        OperationsClient::new(
            http.clone(),
            self.operations_endpoint.clone(),
            self.cluster_type,
            self.token_scope(),
            self.token_provider(http),
        )
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("cluster_type", &self.cluster_type)
            .field("environment", &self.environment.name)
            .field("operations_endpoint", &self.operations_endpoint)
            .field("kubeconfig", &self.kubeconfig)
            .field("identity", &self.identity)
            .finish()
    }
}

// === impl Identity ===

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("aks_login_url", &self.aks_login_url)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataaction_discovery_core::UnsupportedClusterType;

    fn identity() -> Identity {
        Identity {
            aks_login_url: "http://localhost:7070/authz/token".to_string(),
            tenant_id: "tenant".to_string(),
            client_id: "client".to_string(),
            client_secret: "s3cr3t".to_string(),
        }
    }

    #[test]
    fn unsupported_cluster_types() {
        for ct in [
            "",
            "connectedClusters",
            "Microsoft.Kubernetes/provisionedClusters",
            "Microsoft.ContainerService/managedclusters",
        ] {
            for env in ["", "AzurePublicCloud", "AzureChinaCloud", "AzureMoonCloud"] {
                match Settings::new(ct, env, identity(), None) {
                    Err(Error::UnsupportedClusterType(UnsupportedClusterType(s))) => {
                        assert_eq!(s, ct)
                    }
                    res => panic!("unexpected result for {ct:?} in {env:?}: {res:?}"),
                }
            }
        }
    }

    #[test]
    fn unknown_environment() {
        match Settings::new(ClusterType::Managed.as_str(), "AzureMoonCloud", identity(), None) {
            Err(Error::UnknownEnvironment(name)) => assert_eq!(name, "AzureMoonCloud"),
            res => panic!("unexpected result: {res:?}"),
        }
    }

    #[test]
    fn connected_cluster_endpoint() {
        let settings =
            Settings::new(ClusterType::Connected.as_str(), "", identity(), None).unwrap();
        assert_eq!(settings.environment(), &environment::PUBLIC_CLOUD);
        assert_eq!(
            settings.operations_endpoint(),
            "https://management.azure.com/providers/Microsoft.Kubernetes/operations?api-version=2021-10-01"
        );
        assert_eq!(
            settings.token_url(),
            "https://login.microsoftonline.com/tenant/oauth2/v2.0/token"
        );
        assert_eq!(settings.token_scope(), "https://management.azure.com/.default");
    }

    #[test]
    fn managed_cluster_and_fleet_endpoints() {
        for ct in [ClusterType::Managed, ClusterType::Fleet] {
            let settings = Settings::new(ct.as_str(), "AzureChinaCloud", identity(), None).unwrap();
            assert_eq!(
                settings.operations_endpoint(),
                "https://management.chinacloudapi.cn/providers/Microsoft.ContainerService/operations?api-version=2018-10-31"
            );
            assert_eq!(settings.cluster_type(), ct);
        }
    }

    #[test]
    fn endpoints_follow_environment() {
        for env in [
            &environment::PUBLIC_CLOUD,
            &environment::CHINA_CLOUD,
            &environment::US_GOVERNMENT_CLOUD,
            &environment::GERMAN_CLOUD,
        ] {
            let settings = Settings::new(
                ClusterType::Connected.as_str(),
                &env.name.to_ascii_uppercase(),
                identity(),
                Some(PathBuf::from("/etc/kubernetes/kubeconfig")),
            )
            .unwrap();
            assert!(settings
                .operations_endpoint()
                .starts_with(&format!("{}/providers/", env.resource_manager())));
            assert_eq!(
                settings.kubeconfig(),
                Some(Path::new("/etc/kubernetes/kubeconfig"))
            );
        }
    }

    #[test]
    fn debug_redacts_secret() {
        let settings =
            Settings::new(ClusterType::Connected.as_str(), "", identity(), None).unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("s3cr3t"), "{debug}");
        assert!(debug.contains("client"), "{debug}");
    }
}
