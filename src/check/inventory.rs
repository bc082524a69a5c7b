//! 从 k8s-openapi 对象中提取分类器需要的字段
//! 缺失字段一律按"不健康"的默认值处理，不会 panic

use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    Endpoints, Node, PersistentVolume, PersistentVolumeClaim, Pod, Service,
};
use k8s_openapi::api::networking::v1::{Ingress, IngressBackend};

// ── 视图结构 ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReadiness {
    pub name: String,
    /// Status of the `Ready` condition ("True", "False", "Unknown"); `None` if absent.
    pub ready: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodPhase {
    pub namespace: String,
    pub name: String,
    pub phase: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReplicas {
    pub namespace: String,
    pub name: String,
    pub desired: i32,
    pub ready: i32,
    pub available: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    pub namespace: String,
    pub name: String,
    pub external_name: bool,
    pub addresses: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumePhase {
    /// `name` for PVs, `namespace/name` for PVCs.
    pub name: String,
    pub phase: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressBackends {
    pub namespace: String,
    pub name: String,
    pub services: Vec<String>,
}

// ── 提取函数 ────────────────────────────────────────────────────────────────

pub fn node_readiness(nodes: &[Node]) -> Vec<NodeReadiness> {
    nodes
        .iter()
        .map(|n| NodeReadiness {
            name: name_of(n.metadata.name.as_deref()),
            ready: n
                .status
                .as_ref()
                .and_then(|s| s.conditions.as_ref())
                .and_then(|cs| cs.iter().find(|c| c.type_ == "Ready"))
                .map(|c| c.status.clone()),
        })
        .collect()
}

pub fn pod_phases(pods: &[Pod]) -> Vec<PodPhase> {
    pods.iter()
        .map(|p| PodPhase {
            namespace: name_of(p.metadata.namespace.as_deref()),
            name: name_of(p.metadata.name.as_deref()),
            phase: p.status.as_ref().and_then(|s| s.phase.clone()),
        })
        .collect()
}

pub fn deployment_replicas(deployments: &[Deployment]) -> Vec<DeploymentReplicas> {
    deployments
        .iter()
        .map(|d| {
            let status = d.status.as_ref();
            DeploymentReplicas {
                namespace: name_of(d.metadata.namespace.as_deref()),
                name: name_of(d.metadata.name.as_deref()),
                // API server 默认 replicas=1
                desired: d.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1),
                ready: status.and_then(|s| s.ready_replicas).unwrap_or(0),
                available: status.and_then(|s| s.available_replicas).unwrap_or(0),
            }
        })
        .collect()
}

pub fn service_endpoints(services: &[Service], endpoints: &[Endpoints]) -> Vec<ServiceEndpoints> {
    let mut address_counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for ep in endpoints {
        let key = (
            name_of(ep.metadata.namespace.as_deref()),
            name_of(ep.metadata.name.as_deref()),
        );
        let count = ep
            .subsets
            .as_ref()
            .map(|subsets| {
                subsets
                    .iter()
                    .map(|s| s.addresses.as_ref().map_or(0, Vec::len))
                    .sum::<usize>()
            })
            .unwrap_or(0);
        *address_counts.entry(key).or_insert(0) += count;
    }

    services
        .iter()
        .map(|svc| {
            let namespace = name_of(svc.metadata.namespace.as_deref());
            let name = name_of(svc.metadata.name.as_deref());
            let external_name = svc
                .spec
                .as_ref()
                .and_then(|s| s.type_.as_deref())
                == Some("ExternalName");
            let addresses = address_counts
                .get(&(namespace.clone(), name.clone()))
                .copied()
                .unwrap_or(0);
            ServiceEndpoints { namespace, name, external_name, addresses }
        })
        .collect()
}

pub fn pv_phases(pvs: &[PersistentVolume]) -> Vec<VolumePhase> {
    pvs.iter()
        .map(|pv| VolumePhase {
            name: name_of(pv.metadata.name.as_deref()),
            phase: pv.status.as_ref().and_then(|s| s.phase.clone()),
        })
        .collect()
}

pub fn pvc_phases(pvcs: &[PersistentVolumeClaim]) -> Vec<VolumePhase> {
    pvcs.iter()
        .map(|pvc| VolumePhase {
            name: format!(
                "{}/{}",
                name_of(pvc.metadata.namespace.as_deref()),
                name_of(pvc.metadata.name.as_deref())
            ),
            phase: pvc.status.as_ref().and_then(|s| s.phase.clone()),
        })
        .collect()
}

pub fn ingress_backends(ingresses: &[Ingress]) -> Vec<IngressBackends> {
    ingresses
        .iter()
        .map(|ing| {
            let mut services = BTreeSet::new();
            if let Some(spec) = &ing.spec {
                if let Some(name) = spec.default_backend.as_ref().and_then(backend_service) {
                    services.insert(name);
                }
                for rule in spec.rules.iter().flatten() {
                    let paths = rule.http.as_ref().map(|h| h.paths.as_slice()).unwrap_or(&[]);
                    for p in paths {
                        if let Some(name) = backend_service(&p.backend) {
                            services.insert(name);
                        }
                    }
                }
            }
            IngressBackends {
                namespace: name_of(ing.metadata.namespace.as_deref()),
                name: name_of(ing.metadata.name.as_deref()),
                services: services.into_iter().collect(),
            }
        })
        .collect()
}

/// Every `(namespace, name)` service that exists.
pub fn service_index(services: &[Service]) -> BTreeSet<(String, String)> {
    services
        .iter()
        .map(|s| {
            (
                name_of(s.metadata.namespace.as_deref()),
                name_of(s.metadata.name.as_deref()),
            )
        })
        .collect()
}

// ── 工具 ────────────────────────────────────────────────────────────────────

fn backend_service(backend: &IngressBackend) -> Option<String> {
    backend.service.as_ref().map(|s| s.name.clone())
}

fn name_of(v: Option<&str>) -> String {
    v.unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn from_json<T: serde::de::DeserializeOwned>(v: serde_json::Value) -> T {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn node_ready_condition_is_extracted() {
        let nodes: Vec<Node> = vec![
            from_json(json!({
                "metadata": {"name": "n1"},
                "status": {"conditions": [
                    {"type": "MemoryPressure", "status": "False"},
                    {"type": "Ready", "status": "True"}
                ]}
            })),
            from_json(json!({"metadata": {"name": "n2"}})),
        ];
        let views = node_readiness(&nodes);
        assert_eq!(views[0].ready.as_deref(), Some("True"));
        assert_eq!(views[1].ready, None);
    }

    #[test]
    fn deployment_defaults() {
        let d: Deployment = from_json(json!({
            "metadata": {"name": "web", "namespace": "default"},
            "spec": {
                "selector": {"matchLabels": {"app": "web"}},
                "template": {"metadata": {"labels": {"app": "web"}}}
            }
        }));
        let v = &deployment_replicas(&[d])[0];
        assert_eq!((v.desired, v.ready, v.available), (1, 0, 0));
    }

    #[test]
    fn endpoint_addresses_are_summed_per_service() {
        let services: Vec<Service> = vec![
            from_json(json!({"metadata": {"name": "api", "namespace": "app"}, "spec": {}})),
            from_json(json!({
                "metadata": {"name": "ext", "namespace": "app"},
                "spec": {"type": "ExternalName", "externalName": "example.com"}
            })),
            from_json(json!({"metadata": {"name": "api", "namespace": "other"}, "spec": {}})),
        ];
        let endpoints: Vec<Endpoints> = vec![from_json(json!({
            "metadata": {"name": "api", "namespace": "app"},
            "subsets": [
                {"addresses": [{"ip": "10.0.0.1"}, {"ip": "10.0.0.2"}]},
                {"notReadyAddresses": [{"ip": "10.0.0.3"}]}
            ]
        }))];

        let views = service_endpoints(&services, &endpoints);
        assert_eq!(views[0].addresses, 2);
        assert!(views[1].external_name);
        assert_eq!(views[2].addresses, 0);
    }

    #[test]
    fn ingress_backends_include_default_backend() {
        let ing: Ingress = from_json(json!({
            "metadata": {"name": "web", "namespace": "app"},
            "spec": {
                "defaultBackend": {"service": {"name": "fallback", "port": {"number": 80}}},
                "rules": [{
                    "host": "example.com",
                    "http": {"paths": [
                        {"path": "/", "pathType": "Prefix",
                         "backend": {"service": {"name": "frontend", "port": {"number": 80}}}},
                        {"path": "/api", "pathType": "Prefix",
                         "backend": {"service": {"name": "frontend", "port": {"number": 8080}}}}
                    ]}
                }]
            }
        }));
        let v = &ingress_backends(&[ing])[0];
        assert_eq!(v.services, vec!["fallback".to_string(), "frontend".to_string()]);
    }

    #[test]
    fn pvc_names_are_namespaced() {
        let pvc: PersistentVolumeClaim = from_json(json!({
            "metadata": {"name": "data", "namespace": "db"},
            "status": {"phase": "Bound"}
        }));
        let v = &pvc_phases(&[pvc])[0];
        assert_eq!(v.name, "db/data");
        assert_eq!(v.phase.as_deref(), Some("Bound"));
    }
}
