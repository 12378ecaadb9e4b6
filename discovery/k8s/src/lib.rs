#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Discovers the API resources a cluster serves.

use dataaction_discovery_core::{ApiResource, ResourceList};
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};
use std::{
    collections::{hash_map::Entry, HashMap},
    path::Path,
};
use tracing::{debug, instrument};

/// Lists the resources a cluster serves, one list per group-version.
#[async_trait::async_trait]
pub trait ResourceCatalog {
    async fn preferred_resources(&self) -> Result<Vec<ResourceList>, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to build cluster configuration: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("failed to discover API resources: {0}")]
    Discovery(#[from] kube::Error),
}

/// Discovers the preferred version of every API group a cluster serves.
#[derive(Clone)]
pub struct ClusterCatalog {
    client: Client,
}

// === impl ClusterCatalog ===

impl ClusterCatalog {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the kubeconfig at `path` or, if no path is given,
    /// from the in-cluster service account.
    pub async fn from_kubeconfig(path: Option<&Path>) -> Result<Self, Error> {
        let config = match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading kubeconfig");
                let kubeconfig = Kubeconfig::read_from(path).map_err(Error::config)?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(Error::config)?
            }
            None => {
                debug!("Loading in-cluster config");
                Config::incluster().map_err(Error::config)?
            }
        };
        let client = Client::try_from(config).map_err(Error::config)?;
        Ok(Self::new(client))
    }
}

#[async_trait::async_trait]
impl ResourceCatalog for ClusterCatalog {
    /// Lists every top-level resource the server serves, each under a single
    /// group-version.
    ///
    /// All versions of every group are read. A resource served by several
    /// versions of its group is reported under the group's preferred version
    /// when that version serves it, or else under the first version that does.
    /// Subresources and group-versions without resources are omitted.
    #[instrument(skip(self))]
    async fn preferred_resources(&self) -> Result<Vec<ResourceList>, Error> {
        debug!("Fetching API resources from the apiserver");
        let mut index = PreferredIndex::default();

        let core = self.client.list_core_api_versions().await?;
        let preferred = core.versions.first().cloned();
        for version in &core.versions {
            let list = self.client.list_core_api_resources(version).await?;
            index.insert("", preferred.as_ref() == Some(version), list);
        }

        let groups = self.client.list_api_groups().await?;
        for group in &groups.groups {
            let preferred = group
                .preferred_version
                .as_ref()
                .map(|v| v.group_version.as_str());
            for version in &group.versions {
                let list = self
                    .client
                    .list_api_group_resources(&version.group_version)
                    .await?;
                let is_preferred = preferred == Some(version.group_version.as_str());
                index.insert(&group.name, is_preferred, list);
            }
        }

        let lists = index.into_lists();
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(json) = serde_json::to_string(&lists) {
                debug!(resources = %json, "Fetched API resources");
            }
        }

        Ok(lists)
    }
}

/// Resolves each `(group, resource)` to the group-version that serves it.
#[derive(Debug, Default)]
struct PreferredIndex {
    /// Group-versions in discovery order.
    group_versions: Vec<String>,
    resources: Vec<(String, ApiResource)>,
    by_name: HashMap<(String, String), usize>,
}

// === impl PreferredIndex ===

impl PreferredIndex {
    fn insert(&mut self, group: &str, preferred: bool, list: metav1::APIResourceList) {
        let group_version = list.group_version;
        if !self.group_versions.contains(&group_version) {
            self.group_versions.push(group_version.clone());
        }

        for resource in list.resources {
            if resource.name.contains('/') {
                continue;
            }
            let resource = ApiResource::new(resource.name, resource.namespaced);
            match self.by_name.entry((group.to_string(), resource.name.clone())) {
                Entry::Occupied(entry) => {
                    if preferred {
                        self.resources[*entry.get()] = (group_version.clone(), resource);
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(self.resources.len());
                    self.resources.push((group_version.clone(), resource));
                }
            }
        }
    }

    fn into_lists(self) -> Vec<ResourceList> {
        let Self {
            group_versions,
            resources,
            ..
        } = self;
        group_versions
            .into_iter()
            .filter_map(|group_version| {
                let resources = resources
                    .iter()
                    .filter(|(gv, _)| *gv == group_version)
                    .map(|(_, r)| r.clone())
                    .collect::<Vec<_>>();
                if resources.is_empty() {
                    return None;
                }
                Some(ResourceList {
                    group_version,
                    resources,
                })
            })
            .collect()
    }
}

// === impl Error ===

impl Error {
    fn config(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Config(Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, Request, Response, StatusCode};
    use hyper::Body;
    use metav1::{
        APIGroup, APIGroupList, APIResource, APIResourceList, APIVersions,
        GroupVersionForDiscovery,
    };
    use serde::Serialize;
    use tower_test::mock::{self, Handle, SendResponse};

    fn group_version(group_version: &str, version: &str) -> GroupVersionForDiscovery {
        GroupVersionForDiscovery {
            group_version: group_version.to_string(),
            version: version.to_string(),
        }
    }

    fn api_resource(name: &str, namespaced: bool) -> APIResource {
        APIResource {
            name: name.to_string(),
            namespaced,
            ..Default::default()
        }
    }

    fn core_versions() -> APIVersions {
        APIVersions {
            versions: vec!["v1".to_string()],
            ..Default::default()
        }
    }

    fn groups() -> APIGroupList {
        APIGroupList {
            groups: vec![
                APIGroup {
                    name: "apps".to_string(),
                    versions: vec![group_version("apps/v1", "v1")],
                    preferred_version: Some(group_version("apps/v1", "v1")),
                    ..Default::default()
                },
                APIGroup {
                    name: "autoscaling".to_string(),
                    versions: vec![
                        group_version("autoscaling/v2", "v2"),
                        group_version("autoscaling/v1", "v1"),
                    ],
                    preferred_version: None,
                    ..Default::default()
                },
                APIGroup {
                    name: "flowcontrol.apiserver.k8s.io".to_string(),
                    versions: vec![
                        group_version("flowcontrol.apiserver.k8s.io/v1beta2", "v1beta2"),
                        group_version("flowcontrol.apiserver.k8s.io/v1beta3", "v1beta3"),
                    ],
                    preferred_version: Some(group_version(
                        "flowcontrol.apiserver.k8s.io/v1beta3",
                        "v1beta3",
                    )),
                    ..Default::default()
                },
            ],
        }
    }

    fn resources(group_version: &str, resources: Vec<APIResource>) -> APIResourceList {
        APIResourceList {
            group_version: group_version.to_string(),
            resources,
        }
    }

    fn send<T: Serialize>(send: SendResponse<Response<Body>>, status: StatusCode, body: T) {
        let body = serde_json::to_vec(&body).expect("response must serialize");
        send.send_response(
            Response::builder()
                .status(status)
                .body(Body::from(body))
                .expect("response must be valid"),
        );
    }

    fn serve_discovery(mut handle: Handle<Request<Body>, Response<Body>>, fail_groups: bool) {
        tokio::spawn(async move {
            while let Some((request, rsp)) = handle.next_request().await {
                assert_eq!(request.method(), Method::GET);
                match request.uri().path() {
                    "/api" => send(rsp, StatusCode::OK, core_versions()),
                    "/api/v1" => send(
                        rsp,
                        StatusCode::OK,
                        resources(
                            "v1",
                            vec![api_resource("pods", true), api_resource("pods/log", true)],
                        ),
                    ),
                    "/apis" if fail_groups => send(
                        rsp,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        serde_json::json!({
                            "kind": "Status",
                            "apiVersion": "v1",
                            "status": "Failure",
                            "message": "etcdserver: request timed out",
                            "reason": "InternalError",
                            "code": 500,
                        }),
                    ),
                    "/apis" => send(rsp, StatusCode::OK, groups()),
                    "/apis/apps/v1" => send(
                        rsp,
                        StatusCode::OK,
                        resources("apps/v1", vec![api_resource("deployments", true)]),
                    ),
                    "/apis/autoscaling/v2" => send(
                        rsp,
                        StatusCode::OK,
                        resources(
                            "autoscaling/v2",
                            vec![api_resource("horizontalpodautoscalers", true)],
                        ),
                    ),
                    "/apis/autoscaling/v1" => send(
                        rsp,
                        StatusCode::OK,
                        resources(
                            "autoscaling/v1",
                            vec![
                                api_resource("horizontalpodautoscalers", true),
                                api_resource("horizontalpodautoscalers/status", true),
                            ],
                        ),
                    ),
                    "/apis/flowcontrol.apiserver.k8s.io/v1beta2" => send(
                        rsp,
                        StatusCode::OK,
                        resources(
                            "flowcontrol.apiserver.k8s.io/v1beta2",
                            vec![
                                api_resource("flowschemas", false),
                                api_resource("legacyonly", false),
                            ],
                        ),
                    ),
                    "/apis/flowcontrol.apiserver.k8s.io/v1beta3" => send(
                        rsp,
                        StatusCode::OK,
                        resources(
                            "flowcontrol.apiserver.k8s.io/v1beta3",
                            vec![api_resource("flowschemas", false)],
                        ),
                    ),
                    path => panic!("unexpected request: {path}"),
                }
            }
        });
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lists_preferred_resources() {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .try_init()
            .ok();

        let (svc, handle) = mock::pair::<Request<Body>, Response<Body>>();
        serve_discovery(handle, false);
        let catalog = ClusterCatalog::new(Client::new(svc, "default"));

        let lists = catalog
            .preferred_resources()
            .await
            .expect("discovery must succeed");
        assert_eq!(
            lists,
            vec![
                ResourceList {
                    group_version: "v1".to_string(),
                    resources: vec![ApiResource::new("pods", true)],
                },
                ResourceList {
                    group_version: "apps/v1".to_string(),
                    resources: vec![ApiResource::new("deployments", true)],
                },
                ResourceList {
                    group_version: "autoscaling/v2".to_string(),
                    resources: vec![ApiResource::new("horizontalpodautoscalers", true)],
                },
                ResourceList {
                    group_version: "flowcontrol.apiserver.k8s.io/v1beta2".to_string(),
                    resources: vec![ApiResource::new("legacyonly", false)],
                },
                ResourceList {
                    group_version: "flowcontrol.apiserver.k8s.io/v1beta3".to_string(),
                    resources: vec![ApiResource::new("flowschemas", false)],
                },
            ]
        );
    }

    #[test]
    fn same_resource_name_in_different_groups() {
        let mut index = PreferredIndex::default();
        index.insert(
            "",
            true,
            resources("v1", vec![api_resource("events", true)]),
        );
        index.insert(
            "events.k8s.io",
            true,
            resources("events.k8s.io/v1", vec![api_resource("events", true)]),
        );
        index.insert(
            "events.k8s.io",
            false,
            resources("events.k8s.io/v1beta1", vec![api_resource("events", true)]),
        );

        assert_eq!(
            index.into_lists(),
            vec![
                ResourceList {
                    group_version: "v1".to_string(),
                    resources: vec![ApiResource::new("events", true)],
                },
                ResourceList {
                    group_version: "events.k8s.io/v1".to_string(),
                    resources: vec![ApiResource::new("events", true)],
                },
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn discovery_failure() {
        let (svc, handle) = mock::pair::<Request<Body>, Response<Body>>();
        serve_discovery(handle, true);
        let catalog = ClusterCatalog::new(Client::new(svc, "default"));

        let error = catalog
            .preferred_resources()
            .await
            .expect_err("discovery must fail");
        assert!(matches!(error, Error::Discovery(_)), "{error}");
    }

    #[tokio::test]
    async fn missing_kubeconfig() {
        let error = ClusterCatalog::from_kubeconfig(Some(Path::new(
            "/nonexistent/dataaction-discovery/kubeconfig",
        )))
        .await
        .err()
        .expect("kubeconfig must not load");
        assert!(matches!(error, Error::Config(_)), "{error}");
    }
}
