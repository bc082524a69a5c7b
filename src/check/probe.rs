//! 集群探针：对 Kubernetes API / Pod exec / HTTP 的只读访问
//! 每次调用都有超时上限，错误交给检查层转成 CheckResult

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    Endpoints, Node, PersistentVolume, PersistentVolumeClaim, Pod, Service,
};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, AttachParams, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, Resource};
use serde::de::DeserializeOwned;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::config::{Settings, HTTP_CONNECT_TIMEOUT, HTTP_TOTAL_TIMEOUT};
use crate::utils::{KubecheckError, Result};

/// Everything a check needs from the outside world.
#[async_trait]
pub trait ClusterProbe: Send + Sync {
    /// Kubeconfig context the probe talks to, if known.
    fn context_name(&self) -> Option<String>;

    async fn list_nodes(&self) -> Result<Vec<Node>>;
    async fn list_pods(&self) -> Result<Vec<Pod>>;
    async fn list_deployments(&self) -> Result<Vec<Deployment>>;
    async fn list_services(&self) -> Result<Vec<Service>>;
    async fn list_endpoints(&self) -> Result<Vec<Endpoints>>;
    async fn list_persistent_volumes(&self) -> Result<Vec<PersistentVolume>>;
    async fn list_persistent_volume_claims(&self) -> Result<Vec<PersistentVolumeClaim>>;
    async fn list_ingresses(&self) -> Result<Vec<Ingress>>;

    /// Name of the first running pod matching `selector`, `None` when there is none.
    async fn find_pod(&self, namespace: &str, selector: &str) -> Result<Option<String>>;

    /// Run `command` in a pod and return its stdout.
    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: Option<&str>,
        command: &[String],
    ) -> Result<String>;

    /// HTTP status code of a GET on `url`; `None` when no response arrived.
    async fn http_status(&self, url: &str) -> Option<u16>;
}

// ── kube-rs 实现 ─────────────────────────────────────────────────────────────

pub struct KubeProbe {
    /// Client, or the reason it could not be built.
    client: std::result::Result<Client, String>,
    context: Option<String>,
    http: reqwest::Client,
    probe_timeout: Duration,
    exec_timeout: Duration,
}

impl KubeProbe {
    /// Build the probe. An unreachable or misconfigured cluster is not an
    /// error here; it surfaces from every cluster call instead.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_TOTAL_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(settings.insecure_tls)
            .build()?;

        let client = match build_client(settings).await {
            Ok(c) => Ok(c),
            Err(e) => {
                warn!(error = %e, "Kubernetes client unavailable, cluster checks will fail");
                Err(e.to_string())
            }
        };

        Ok(Self {
            client,
            context: resolve_context(settings),
            http,
            probe_timeout: settings.probe_timeout,
            exec_timeout: settings.exec_timeout,
        })
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .map_err(|reason| KubecheckError::Cluster(reason.clone()))
    }

    async fn list_all<K>(&self, operation: &str) -> Result<Vec<K>>
    where
        K: Resource + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = Api::all(self.client()?.clone());
        debug!(operation, "listing");
        let list = bounded(operation, self.probe_timeout, async {
            api.list(&ListParams::default()).await.map_err(KubecheckError::from)
        })
        .await?;
        Ok(list.items)
    }
}

async fn build_client(settings: &Settings) -> Result<Client> {
    let config = if settings.kubeconfig.is_none() && settings.context.is_none() {
        Config::infer()
            .await
            .map_err(|e| KubecheckError::Cluster(format!("cannot infer kube config: {}", e)))?
    } else {
        let kubeconfig = match &settings.kubeconfig {
            Some(path) => Kubeconfig::read_from(path),
            None => Kubeconfig::read(),
        }
        .map_err(|e| KubecheckError::Cluster(format!("cannot read kubeconfig: {}", e)))?;

        let options = KubeConfigOptions {
            context: settings.context.clone(),
            ..KubeConfigOptions::default()
        };
        Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| KubecheckError::Cluster(format!("invalid kubeconfig: {}", e)))?
    };

    Ok(Client::try_from(config)?)
}

fn resolve_context(settings: &Settings) -> Option<String> {
    if settings.context.is_some() {
        return settings.context.clone();
    }
    let kubeconfig = match &settings.kubeconfig {
        Some(path) => Kubeconfig::read_from(path).ok(),
        None => Kubeconfig::read().ok(),
    };
    kubeconfig.and_then(|k| k.current_context)
}

async fn run_exec(
    api: Api<Pod>,
    pod: &str,
    command: Vec<String>,
    params: AttachParams,
) -> Result<String> {
    let exec_error = |reason: String| KubecheckError::Exec {
        pod: pod.to_string(),
        reason,
    };

    let mut attached = api.exec(pod, command, &params).await?;

    let mut stdout = String::new();
    if let Some(mut out) = attached.stdout() {
        out.read_to_string(&mut stdout).await?;
    }
    let status = match attached.take_status() {
        Some(s) => s.await,
        None => None,
    };
    attached.join().await.map_err(|e| exec_error(e.to_string()))?;

    // 非零退出码时 API server 返回 Failure
    if let Some(s) = status {
        if s.status.as_deref() == Some("Failure") {
            return Err(exec_error(s.message.unwrap_or_else(|| "command failed".to_string())));
        }
    }
    Ok(stdout)
}

/// Bound `fut` by `limit`, turning expiry into `KubecheckError::Timeout`.
async fn bounded<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(KubecheckError::Timeout {
            operation: operation.to_string(),
            seconds: limit.as_secs(),
        }),
    }
}

#[async_trait]
impl ClusterProbe for KubeProbe {
    fn context_name(&self) -> Option<String> {
        self.context.clone()
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.list_all("list nodes").await
    }

    async fn list_pods(&self) -> Result<Vec<Pod>> {
        self.list_all("list pods").await
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        self.list_all("list deployments").await
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        self.list_all("list services").await
    }

    async fn list_endpoints(&self) -> Result<Vec<Endpoints>> {
        self.list_all("list endpoints").await
    }

    async fn list_persistent_volumes(&self) -> Result<Vec<PersistentVolume>> {
        self.list_all("list persistentvolumes").await
    }

    async fn list_persistent_volume_claims(&self) -> Result<Vec<PersistentVolumeClaim>> {
        self.list_all("list persistentvolumeclaims").await
    }

    async fn list_ingresses(&self) -> Result<Vec<Ingress>> {
        self.list_all("list ingresses").await
    }

    async fn find_pod(&self, namespace: &str, selector: &str) -> Result<Option<String>> {
        let api: Api<Pod> = Api::namespaced(self.client()?.clone(), namespace);
        let params = ListParams::default().labels(selector);
        let pods = bounded("find pod", self.probe_timeout, async {
            api.list(&params).await.map_err(KubecheckError::from)
        })
        .await?;

        Ok(pods
            .items
            .into_iter()
            .find(|p| p.status.as_ref().and_then(|s| s.phase.as_deref()) == Some("Running"))
            .and_then(|p| p.metadata.name))
    }

    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: Option<&str>,
        command: &[String],
    ) -> Result<String> {
        let api: Api<Pod> = Api::namespaced(self.client()?.clone(), namespace);
        let mut params = AttachParams::default().stdout(true).stderr(false);
        if let Some(c) = container {
            params = params.container(c);
        }
        debug!(namespace, pod, ?command, "exec");

        bounded("exec", self.exec_timeout, run_exec(api, pod, command.to_vec(), params)).await
    }

    async fn http_status(&self, url: &str) -> Option<u16> {
        match self.http.get(url).send().await {
            Ok(resp) => Some(resp.status().as_u16()),
            Err(e) => {
                debug!(url, error = %e, "HTTP request failed");
                None
            }
        }
    }
}
