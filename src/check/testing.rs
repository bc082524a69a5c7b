//! 测试用的内存探针

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    Endpoints, Node, PersistentVolume, PersistentVolumeClaim, Pod, Service,
};
use k8s_openapi::api::networking::v1::Ingress;
use serde_json::json;

use crate::check::probe::ClusterProbe;
use crate::utils::{KubecheckError, Result};

pub(crate) struct FakeProbe {
    pub nodes: Vec<Node>,
    pub pods: Vec<Pod>,
    pub deployments: Vec<Deployment>,
    pub services: Vec<Service>,
    pub endpoints: Vec<Endpoints>,
    pub pvs: Vec<PersistentVolume>,
    pub pvcs: Vec<PersistentVolumeClaim>,
    pub ingresses: Vec<Ingress>,
    /// namespace → running pod name
    pub component_pods: BTreeMap<String, String>,
    /// namespace → Use% reported by df
    pub disk_percent: BTreeMap<String, u8>,
    pub ceph_health: String,
    pub http_code: Option<u16>,
    /// Operations that return an error.
    pub failing: BTreeSet<&'static str>,
    /// Operation that panics.
    pub panicking: Option<&'static str>,
    pub unreachable: bool,
}

fn from_json<T: serde::de::DeserializeOwned>(v: serde_json::Value) -> T {
    serde_json::from_value(v).expect("valid test fixture")
}

fn node(name: &str) -> Node {
    from_json(json!({
        "metadata": {"name": name},
        "status": {
            "conditions": [{"type": "Ready", "status": "True"}],
            "allocatable": {"cpu": "4", "memory": "8Gi", "pods": "110"}
        }
    }))
}

fn pod(namespace: &str, name: &str, node: &str, phase: &str) -> Pod {
    from_json(json!({
        "metadata": {"name": name, "namespace": namespace},
        "spec": {
            "nodeName": node,
            "containers": [{
                "name": "main",
                "resources": {"requests": {"cpu": "250m", "memory": "256Mi"}}
            }]
        },
        "status": {"phase": phase}
    }))
}

impl FakeProbe {
    /// A small cluster on which every check passes.
    pub fn healthy() -> Self {
        Self {
            nodes: vec![node("cp-1"), node("worker-1")],
            pods: vec![
                pod("kube-system", "coredns-1", "cp-1", "Running"),
                pod("app", "web-1", "worker-1", "Running"),
                pod("app", "web-2", "worker-1", "Running"),
                pod("app", "migrate-1", "worker-1", "Succeeded"),
            ],
            deployments: vec![from_json(json!({
                "metadata": {"name": "web", "namespace": "app"},
                "spec": {
                    "replicas": 2,
                    "selector": {"matchLabels": {"app": "web"}},
                    "template": {"metadata": {"labels": {"app": "web"}}}
                },
                "status": {"replicas": 2, "readyReplicas": 2, "availableReplicas": 2}
            }))],
            services: vec![from_json(json!({
                "metadata": {"name": "web", "namespace": "app"},
                "spec": {"type": "ClusterIP", "selector": {"app": "web"}}
            }))],
            endpoints: vec![from_json(json!({
                "metadata": {"name": "web", "namespace": "app"},
                "subsets": [{"addresses": [{"ip": "10.42.0.10"}, {"ip": "10.42.0.11"}]}]
            }))],
            pvs: vec![from_json(json!({
                "metadata": {"name": "pv-web"},
                "status": {"phase": "Bound"}
            }))],
            pvcs: vec![from_json(json!({
                "metadata": {"name": "data", "namespace": "app"},
                "status": {"phase": "Bound"}
            }))],
            ingresses: vec![from_json(json!({
                "metadata": {"name": "web", "namespace": "app"},
                "spec": {"rules": [{
                    "host": "apps.example.com",
                    "http": {"paths": [{
                        "path": "/", "pathType": "Prefix",
                        "backend": {"service": {"name": "web", "port": {"number": 80}}}
                    }]}
                }]}
            }))],
            component_pods: [
                ("rook-ceph", "rook-ceph-tools-7d9f"),
                ("harbor", "harbor-registry-0"),
                ("minio", "minio-0"),
            ]
            .into_iter()
            .map(|(ns, pod)| (ns.to_string(), pod.to_string()))
            .collect(),
            disk_percent: [("harbor".to_string(), 41), ("minio".to_string(), 57)]
                .into_iter()
                .collect(),
            ceph_health: "HEALTH_OK\n".to_string(),
            http_code: Some(200),
            failing: BTreeSet::new(),
            panicking: None,
            unreachable: false,
        }
    }

    /// Every cluster call errors and HTTP gets no response.
    pub fn unreachable() -> Self {
        Self { unreachable: true, http_code: None, ..Self::healthy() }
    }

    fn guard(&self, operation: &'static str) -> Result<()> {
        if self.panicking == Some(operation) {
            panic!("injected panic in {}", operation);
        }
        if self.unreachable || self.failing.contains(operation) {
            return Err(KubecheckError::Cluster(format!("{}: connection refused", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterProbe for FakeProbe {
    fn context_name(&self) -> Option<String> {
        Some("test-cluster".to_string())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.guard("list_nodes")?;
        Ok(self.nodes.clone())
    }

    async fn list_pods(&self) -> Result<Vec<Pod>> {
        self.guard("list_pods")?;
        Ok(self.pods.clone())
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        self.guard("list_deployments")?;
        Ok(self.deployments.clone())
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        self.guard("list_services")?;
        Ok(self.services.clone())
    }

    async fn list_endpoints(&self) -> Result<Vec<Endpoints>> {
        self.guard("list_endpoints")?;
        Ok(self.endpoints.clone())
    }

    async fn list_persistent_volumes(&self) -> Result<Vec<PersistentVolume>> {
        self.guard("list_persistent_volumes")?;
        Ok(self.pvs.clone())
    }

    async fn list_persistent_volume_claims(&self) -> Result<Vec<PersistentVolumeClaim>> {
        self.guard("list_persistent_volume_claims")?;
        Ok(self.pvcs.clone())
    }

    async fn list_ingresses(&self) -> Result<Vec<Ingress>> {
        self.guard("list_ingresses")?;
        Ok(self.ingresses.clone())
    }

    async fn find_pod(&self, namespace: &str, _selector: &str) -> Result<Option<String>> {
        self.guard("find_pod")?;
        Ok(self.component_pods.get(namespace).cloned())
    }

    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        _container: Option<&str>,
        command: &[String],
    ) -> Result<String> {
        self.guard("exec")?;
        match command.first().map(String::as_str) {
            Some("ceph") => Ok(self.ceph_health.clone()),
            Some("df") => {
                let percent = u32::from(self.disk_percent.get(namespace).copied().unwrap_or(0));
                let mount = command.last().cloned().unwrap_or_default();
                Ok(format!(
                    "Filesystem 1024-blocks Used Available Capacity Mounted on\n\
                     /dev/sdb 1000 {} {} {}% {}\n",
                    percent * 10,
                    1000 - percent * 10,
                    percent,
                    mount
                ))
            }
            _ => Err(KubecheckError::Exec {
                pod: format!("{}/{}", namespace, pod),
                reason: "command not found".to_string(),
            }),
        }
    }

    async fn http_status(&self, _url: &str) -> Option<u16> {
        if self.unreachable {
            None
        } else {
            self.http_code
        }
    }
}
