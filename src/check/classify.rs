//! 状态分类：把探针输出映射为 SUCCESS / WARNING / FAILED
//! 纯函数，不读时钟、不做 I/O；相同输入必得相同结果

use std::collections::BTreeSet;

use crate::check::inventory::{
    DeploymentReplicas, IngressBackends, NodeReadiness, PodPhase, ServiceEndpoints, VolumePhase,
};
use crate::utils::{CheckName, CheckResult, NodeResourceSample};

/// Offending items listed in a result's details before truncating.
const MAX_LISTED: usize = 10;

pub const DISK_WARNING_PERCENT: u8 = 80;
pub const DISK_FAILED_PERCENT: u8 = 90;

/// What came back from running a command in a component's pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// No running pod matched the component's selector.
    NoPod,
    /// The pod exists but the command could not be run or failed.
    Error(String),
    Output(String),
}

// ── Nodes ───────────────────────────────────────────────────────────────────

pub fn classify_nodes(nodes: &[NodeReadiness]) -> CheckResult {
    if nodes.is_empty() {
        return CheckResult::failed(CheckName::Nodes, "No nodes found in the cluster")
            .with_explanation("The API server returned no nodes. Verify the kubeconfig points at the right cluster.");
    }

    let not_ready: Vec<String> = nodes
        .iter()
        .filter(|n| n.ready.as_deref() != Some("True"))
        .map(|n| format!("{} (Ready={})", n.name, n.ready.as_deref().unwrap_or("missing")))
        .collect();

    if not_ready.is_empty() {
        CheckResult::success(CheckName::Nodes, format!("All {} nodes are Ready", nodes.len()))
    } else {
        CheckResult::failed(
            CheckName::Nodes,
            format!(
                "{}/{} nodes not Ready: {}",
                not_ready.len(),
                nodes.len(),
                list(&not_ready)
            ),
        )
        .with_explanation(
            "Check kubelet status and logs on the listed nodes (systemctl status kubelet, journalctl -u kubelet).",
        )
    }
}

// ── Pods ────────────────────────────────────────────────────────────────────

pub fn classify_pods(pods: &[PodPhase]) -> CheckResult {
    let mut running = 0usize;
    let mut succeeded = 0usize;
    let mut pending = Vec::new();
    let mut broken = Vec::new();

    for p in pods {
        let entry = || {
            format!("{}/{} ({})", p.namespace, p.name, p.phase.as_deref().unwrap_or("no phase"))
        };
        match p.phase.as_deref() {
            Some("Running") => running += 1,
            Some("Succeeded") => succeeded += 1,
            Some("Pending") => pending.push(entry()),
            _ => broken.push(entry()),
        }
    }

    let counts = format!(
        "Running: {}, Succeeded: {}, Pending: {}, Other: {}",
        running,
        succeeded,
        pending.len(),
        broken.len()
    );

    if !broken.is_empty() {
        CheckResult::failed(CheckName::Pods, format!("{}. Problem pods: {}", counts, list(&broken)))
            .with_explanation("Inspect the failing pods with kubectl describe pod and kubectl logs --previous.")
    } else if !pending.is_empty() {
        CheckResult::warning(CheckName::Pods, format!("{}. Pending pods: {}", counts, list(&pending)))
            .with_explanation(
                "Pending pods usually wait on scheduling (insufficient resources, taints) or image pulls.",
            )
    } else {
        CheckResult::success(CheckName::Pods, counts)
    }
}

// ── Deployments ─────────────────────────────────────────────────────────────

pub fn classify_deployments(deployments: &[DeploymentReplicas]) -> CheckResult {
    let unhealthy: Vec<String> = deployments
        .iter()
        .filter(|d| !(d.desired == d.ready && d.ready == d.available))
        .map(|d| {
            format!(
                "{}/{} (desired {}, ready {}, available {})",
                d.namespace, d.name, d.desired, d.ready, d.available
            )
        })
        .collect();

    if unhealthy.is_empty() {
        CheckResult::success(
            CheckName::Deployments,
            format!("All {} deployments have their desired replicas ready", deployments.len()),
        )
    } else {
        CheckResult::failed(
            CheckName::Deployments,
            format!(
                "{}/{} deployments degraded: {}",
                unhealthy.len(),
                deployments.len(),
                list(&unhealthy)
            ),
        )
        .with_explanation("Check rollout status and the events of the deployment's pods.")
    }
}

// ── Services ────────────────────────────────────────────────────────────────

pub fn classify_services(
    services: &[ServiceEndpoints],
    exceptions: &[(String, String)],
) -> CheckResult {
    let excepted = |s: &ServiceEndpoints| {
        exceptions
            .iter()
            .any(|(ns, name)| *ns == s.namespace && *name == s.name)
    };

    let without_endpoints: Vec<String> = services
        .iter()
        .filter(|s| !s.external_name && s.addresses == 0 && !excepted(s))
        .map(|s| format!("{}/{}", s.namespace, s.name))
        .collect();

    if without_endpoints.is_empty() {
        CheckResult::success(
            CheckName::Services,
            format!("All {} services have endpoints", services.len()),
        )
    } else {
        CheckResult::failed(
            CheckName::Services,
            format!(
                "{}/{} services have no endpoints: {}",
                without_endpoints.len(),
                services.len(),
                list(&without_endpoints)
            ),
        )
        .with_explanation(
            "The service selector matches no ready pods. Compare the selector with pod labels and readiness.",
        )
    }
}

// ── Storage ─────────────────────────────────────────────────────────────────

pub fn classify_storage(pvs: &[VolumePhase], pvcs: &[VolumePhase]) -> CheckResult {
    let bad_pvs: Vec<String> = pvs
        .iter()
        .filter(|v| !matches!(v.phase.as_deref(), Some("Bound") | Some("Available")))
        .map(phase_entry)
        .collect();
    let bad_pvcs: Vec<String> = pvcs
        .iter()
        .filter(|v| v.phase.as_deref() != Some("Bound"))
        .map(phase_entry)
        .collect();

    if bad_pvs.is_empty() && bad_pvcs.is_empty() {
        return CheckResult::success(
            CheckName::Storage,
            format!("{} PVs and {} PVCs healthy", pvs.len(), pvcs.len()),
        );
    }

    let mut parts = Vec::new();
    if !bad_pvs.is_empty() {
        parts.push(format!("PVs not Bound/Available: {}", list(&bad_pvs)));
    }
    if !bad_pvcs.is_empty() {
        parts.push(format!("PVCs not Bound: {}", list(&bad_pvcs)));
    }
    CheckResult::failed(CheckName::Storage, parts.join("; ")).with_explanation(
        "Check the storage class provisioner and the events of the listed claims (kubectl describe pvc).",
    )
}

fn phase_entry(v: &VolumePhase) -> String {
    format!("{} ({})", v.name, v.phase.as_deref().unwrap_or("no phase"))
}

// ── Ingress ─────────────────────────────────────────────────────────────────

pub fn classify_ingress(
    ingresses: &[IngressBackends],
    services: &BTreeSet<(String, String)>,
) -> CheckResult {
    if ingresses.is_empty() {
        return CheckResult::success(CheckName::Ingress, "No ingresses defined");
    }

    let mut dangling = Vec::new();
    for ing in ingresses {
        for svc in &ing.services {
            if !services.contains(&(ing.namespace.clone(), svc.clone())) {
                dangling.push(format!("{}/{} -> {}", ing.namespace, ing.name, svc));
            }
        }
    }

    if dangling.is_empty() {
        CheckResult::success(
            CheckName::Ingress,
            format!("All backends of {} ingresses exist", ingresses.len()),
        )
    } else {
        CheckResult::failed(
            CheckName::Ingress,
            format!("Missing backend services: {}", list(&dangling)),
        )
        .with_explanation("Create the referenced services or fix the backend names in the ingress rules.")
    }
}

// ── URL ─────────────────────────────────────────────────────────────────────

/// 2xx, 3xx, 401 and 403 mean the endpoint answers.
pub fn url_reachable(code: u16) -> bool {
    matches!(code, 200..=399 | 401 | 403)
}

pub fn classify_url(url: &str, code: Option<u16>) -> CheckResult {
    match code {
        Some(c) if url_reachable(c) => {
            CheckResult::success(CheckName::UrlCheck, format!("{} responded with HTTP {}", url, c))
        }
        Some(c) => CheckResult::failed(CheckName::UrlCheck, format!("{} responded with HTTP {}", url, c))
            .with_explanation("The endpoint answers with an error. Check the backing service and ingress."),
        None => CheckResult::failed(CheckName::UrlCheck, format!("{}: connection error", url))
            .with_explanation("No HTTP response within the timeout. Check DNS, TLS and load balancer reachability."),
    }
}

// ── Rook-Ceph ───────────────────────────────────────────────────────────────

pub fn classify_ceph(outcome: &ExecOutcome) -> CheckResult {
    match outcome {
        ExecOutcome::NoPod => CheckResult::warning(
            CheckName::RookCeph,
            "Rook-Ceph tools pod not found (not installed)",
        )
        .with_explanation("Deploy the rook-ceph-tools pod to enable Ceph health reporting."),
        ExecOutcome::Error(e) => CheckResult::failed(
            CheckName::RookCeph,
            format!("ceph health could not be read: {}", e),
        )
        .with_explanation("The tools pod is present but ceph did not answer. Check the mons and the tools pod."),
        ExecOutcome::Output(out) => {
            let health = out.split_whitespace().next().unwrap_or("");
            match health {
                "HEALTH_OK" => CheckResult::success(CheckName::RookCeph, "HEALTH_OK"),
                "HEALTH_WARN" => CheckResult::warning(CheckName::RookCeph, out.trim())
                    .with_explanation("Run ceph health detail in the tools pod for the warning causes."),
                _ => CheckResult::failed(
                    CheckName::RookCeph,
                    if out.trim().is_empty() { "empty ceph health output" } else { out.trim() },
                )
                .with_explanation("Run ceph health detail and ceph status in the tools pod."),
            }
        }
    }
}

// ── Disk usage ──────────────────────────────────────────────────────────────

pub fn classify_disk_usage(name: CheckName, percent: u8) -> CheckResult {
    let details = format!("Disk usage {}%", percent);
    if percent >= DISK_FAILED_PERCENT {
        CheckResult::failed(name, details)
            .with_explanation("Storage is nearly full. Run garbage collection or expand the volume.")
    } else if percent >= DISK_WARNING_PERCENT {
        CheckResult::warning(name, details)
            .with_explanation("Storage is filling up. Plan cleanup or volume expansion.")
    } else {
        CheckResult::success(name, details)
    }
}

pub fn classify_disk(name: CheckName, outcome: &ExecOutcome) -> CheckResult {
    let unknown = |why: String| {
        CheckResult::warning(name, format!("Cannot determine disk usage: {}", why))
            .with_explanation("Usage is unknown, not necessarily bad. Verify the pod and mount path.")
    };
    match outcome {
        ExecOutcome::NoPod => unknown("pod not found".to_string()),
        ExecOutcome::Error(e) => unknown(e.clone()),
        ExecOutcome::Output(out) => match parse_df_percent(out) {
            Some(p) => classify_disk_usage(name, p),
            None => unknown("unrecognised df output".to_string()),
        },
    }
}

/// Use% of the last line of `df -P` output.
pub fn parse_df_percent(output: &str) -> Option<u8> {
    output
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())?
        .split_whitespace()
        .find_map(|field| field.strip_suffix('%'))
        .and_then(|v| v.parse::<u8>().ok())
        .filter(|p| *p <= 100)
}

// ── Node resources ──────────────────────────────────────────────────────────

pub fn classify_node_resources(samples: &[NodeResourceSample], threshold: f64) -> CheckResult {
    if samples.is_empty() {
        return CheckResult::warning(CheckName::NodeResources, "No node resource data available")
            .with_explanation("Node allocatable figures could not be read.");
    }

    let mut flagged = Vec::new();
    for s in samples {
        let mut over = Vec::new();
        if s.cpu_percent >= threshold {
            over.push(format!("CPU {:.1}%", s.cpu_percent));
        }
        if s.memory_percent >= threshold {
            over.push(format!("Memory {:.1}%", s.memory_percent));
        }
        if s.pod_percent >= threshold {
            over.push(format!("Pods {:.1}%", s.pod_percent));
        }
        if !over.is_empty() {
            flagged.push(format!("{}: {}", s.name, over.join(", ")));
        }
    }

    if flagged.is_empty() {
        CheckResult::success(
            CheckName::NodeResources,
            format!("All {} nodes below {}% CPU, memory and pod usage", samples.len(), threshold),
        )
    } else {
        CheckResult::warning(
            CheckName::NodeResources,
            format!("Nodes at or above {}%: {}", threshold, flagged.join("; ")),
        )
        .with_explanation("Rebalance workloads, lower requests or add capacity to the listed nodes.")
    }
}

// ── 工具 ────────────────────────────────────────────────────────────────────

fn list(items: &[String]) -> String {
    if items.len() <= MAX_LISTED {
        items.join(", ")
    } else {
        format!(
            "{} and {} more",
            items[..MAX_LISTED].join(", "),
            items.len() - MAX_LISTED
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Status;

    fn node(name: &str, ready: &str) -> NodeReadiness {
        NodeReadiness { name: name.to_string(), ready: Some(ready.to_string()) }
    }

    fn pod(name: &str, phase: &str) -> PodPhase {
        PodPhase {
            namespace: "default".to_string(),
            name: name.to_string(),
            phase: Some(phase.to_string()),
        }
    }

    fn svc(ns: &str, name: &str, addresses: usize) -> ServiceEndpoints {
        ServiceEndpoints {
            namespace: ns.to_string(),
            name: name.to_string(),
            external_name: false,
            addresses,
        }
    }

    fn vol(name: &str, phase: &str) -> VolumePhase {
        VolumePhase { name: name.to_string(), phase: Some(phase.to_string()) }
    }

    #[test]
    fn nodes_not_ready_are_named() {
        let r = classify_nodes(&[node("n1", "True"), node("n2", "False")]);
        assert_eq!(r.status, Status::Failed);
        assert!(r.details.contains("n2"));
        assert!(!r.details.contains("n1 "));
        assert!(r.explanation.is_some());

        let r = classify_nodes(&[node("n1", "True"), node("n2", "True")]);
        assert_eq!(r.status, Status::Success);
    }

    #[test]
    fn node_without_ready_condition_fails() {
        let r = classify_nodes(&[NodeReadiness { name: "n3".into(), ready: None }]);
        assert_eq!(r.status, Status::Failed);
        assert!(r.details.contains("n3"));
    }

    #[test]
    fn no_nodes_fails() {
        assert_eq!(classify_nodes(&[]).status, Status::Failed);
    }

    #[test]
    fn pending_pods_warn_failed_pods_fail() {
        let r = classify_pods(&[pod("a", "Running"), pod("b", "Running"), pod("c", "Pending")]);
        assert_eq!(r.status, Status::Warning);
        assert!(r.details.contains("default/c"));

        let r = classify_pods(&[pod("a", "Running"), pod("b", "Failed")]);
        assert_eq!(r.status, Status::Failed);
        assert!(r.details.contains("default/b (Failed)"));

        let r = classify_pods(&[pod("a", "Running"), pod("b", "Pending"), pod("c", "Unknown")]);
        assert_eq!(r.status, Status::Failed);

        let r = classify_pods(&[pod("a", "Running"), pod("job", "Succeeded")]);
        assert_eq!(r.status, Status::Success);
        assert!(r.details.contains("Succeeded: 1"));
    }

    #[test]
    fn long_lists_are_truncated() {
        let pods: Vec<PodPhase> = (0..15).map(|i| pod(&format!("p{}", i), "Failed")).collect();
        let r = classify_pods(&pods);
        assert!(r.details.ends_with("and 5 more"));
    }

    #[test]
    fn deployment_replicas_must_all_match() {
        let d = |desired, ready, available| DeploymentReplicas {
            namespace: "app".into(),
            name: "web".into(),
            desired,
            ready,
            available,
        };
        assert_eq!(classify_deployments(&[d(3, 3, 3), d(0, 0, 0)]).status, Status::Success);
        assert_eq!(classify_deployments(&[d(3, 2, 3)]).status, Status::Failed);
        assert_eq!(classify_deployments(&[d(3, 3, 2)]).status, Status::Failed);
        assert_eq!(classify_deployments(&[]).status, Status::Success);
    }

    #[test]
    fn services_without_endpoints_fail_unless_excepted() {
        let mut external = svc("app", "ext", 0);
        external.external_name = true;
        let services = vec![svc("app", "api", 2), external, svc("serving", "activator", 0)];

        let r = classify_services(&services, &[]);
        assert_eq!(r.status, Status::Failed);
        assert!(r.details.contains("serving/activator"));
        assert!(!r.details.contains("app/ext"));

        let exceptions = vec![("serving".to_string(), "activator".to_string())];
        assert_eq!(classify_services(&services, &exceptions).status, Status::Success);
    }

    #[test]
    fn storage_phases() {
        let ok = classify_storage(&[vol("pv1", "Bound"), vol("pv2", "Available")], &[vol("a/c", "Bound")]);
        assert_eq!(ok.status, Status::Success);

        let r = classify_storage(&[vol("pv1", "Released")], &[vol("a/c", "Bound")]);
        assert_eq!(r.status, Status::Failed);
        assert!(r.details.contains("pv1 (Released)"));

        let r = classify_storage(&[], &[vol("a/c", "Pending")]);
        assert_eq!(r.status, Status::Failed);
        assert!(r.details.contains("PVCs not Bound: a/c (Pending)"));
    }

    #[test]
    fn ingress_backends_must_exist_in_namespace() {
        assert_eq!(classify_ingress(&[], &BTreeSet::new()).status, Status::Success);

        let ing = IngressBackends {
            namespace: "app".into(),
            name: "web".into(),
            services: vec!["frontend".into(), "api".into()],
        };
        let mut services = BTreeSet::new();
        services.insert(("app".to_string(), "frontend".to_string()));
        services.insert(("other".to_string(), "api".to_string()));

        let r = classify_ingress(&[ing.clone()], &services);
        assert_eq!(r.status, Status::Failed);
        assert!(r.details.contains("app/web -> api"));

        services.insert(("app".to_string(), "api".to_string()));
        assert_eq!(classify_ingress(&[ing], &services).status, Status::Success);
    }

    #[test]
    fn url_codes() {
        let url = "https://example.com";
        assert_eq!(classify_url(url, Some(200)).status, Status::Success);
        assert_eq!(classify_url(url, Some(302)).status, Status::Success);
        assert_eq!(classify_url(url, Some(401)).status, Status::Success);
        assert_eq!(classify_url(url, Some(403)).status, Status::Success);
        assert_eq!(classify_url(url, Some(404)).status, Status::Failed);
        assert_eq!(classify_url(url, Some(503)).status, Status::Failed);

        let r = classify_url(url, None);
        assert_eq!(r.status, Status::Failed);
        assert!(r.details.contains("connection error"));
    }

    #[test]
    fn ceph_health_mapping() {
        let out = |s: &str| ExecOutcome::Output(s.to_string());
        assert_eq!(classify_ceph(&out("HEALTH_OK\n")).status, Status::Success);
        assert_eq!(
            classify_ceph(&out("HEALTH_WARN 1 pool(s) have no replicas configured")).status,
            Status::Warning
        );
        assert_eq!(classify_ceph(&out("HEALTH_ERR 1 full osd(s)")).status, Status::Failed);
        assert_eq!(classify_ceph(&out("")).status, Status::Failed);

        let missing = classify_ceph(&ExecOutcome::NoPod);
        assert_eq!(missing.status, Status::Warning);
        assert!(missing.details.contains("not installed"));

        let broken = classify_ceph(&ExecOutcome::Error("timed out".into()));
        assert_eq!(broken.status, Status::Failed);
    }

    #[test]
    fn disk_usage_boundaries() {
        let h = CheckName::HarborDisk;
        assert_eq!(classify_disk_usage(h, 0).status, Status::Success);
        assert_eq!(classify_disk_usage(h, 79).status, Status::Success);
        assert_eq!(classify_disk_usage(h, 80).status, Status::Warning);
        assert_eq!(classify_disk_usage(h, 89).status, Status::Warning);
        assert_eq!(classify_disk_usage(h, 90).status, Status::Failed);
        assert_eq!(classify_disk_usage(h, 100).status, Status::Failed);
    }

    #[test]
    fn df_output_is_parsed() {
        let df = "Filesystem     1024-blocks      Used Available Capacity Mounted on\n\
                  /dev/rbd0        103081248  84527624  18537240      83% /storage\n";
        assert_eq!(parse_df_percent(df), Some(83));
        assert_eq!(parse_df_percent("garbage"), None);
        assert_eq!(parse_df_percent(""), None);

        let r = classify_disk(CheckName::MinioDisk, &ExecOutcome::Output(df.to_string()));
        assert_eq!(r.status, Status::Warning);
        assert_eq!(r.name, CheckName::MinioDisk);
    }

    #[test]
    fn unknown_disk_usage_is_a_warning() {
        for outcome in [
            ExecOutcome::NoPod,
            ExecOutcome::Error("exec failed".into()),
            ExecOutcome::Output("no percentages here".into()),
        ] {
            let r = classify_disk(CheckName::HarborDisk, &outcome);
            assert_eq!(r.status, Status::Warning);
            assert!(r.details.starts_with("Cannot determine"));
        }
    }

    #[test]
    fn node_resource_threshold() {
        let sample = |name: &str, cpu: f64, mem: f64, pods: f64| NodeResourceSample {
            name: name.to_string(),
            pod_count: 0,
            max_pods: 110,
            pod_percent: pods,
            cpu_allocatable_millicores: 4000,
            cpu_requests_millicores: 0,
            cpu_percent: cpu,
            memory_allocatable_bytes: 0,
            memory_requests_bytes: 0,
            memory_percent: mem,
            gpu_allocatable: None,
            gpu_requests: None,
            gpu_percent: None,
        };
        let r = classify_node_resources(&[sample("a", 79.9, 10.0, 10.0)], 80.0);
        assert_eq!(r.status, Status::Success);

        let r = classify_node_resources(
            &[sample("a", 10.0, 10.0, 10.0), sample("b", 80.0, 95.0, 10.0)],
            80.0,
        );
        assert_eq!(r.status, Status::Warning);
        assert!(r.details.contains("b: CPU 80.0%, Memory 95.0%"));
        assert!(!r.details.contains("a:"));
    }

    #[test]
    fn classification_is_idempotent() {
        let pods = vec![pod("a", "Running"), pod("b", "Pending")];
        assert_eq!(classify_pods(&pods), classify_pods(&pods));

        let nodes = vec![node("n1", "True"), node("n2", "False")];
        assert_eq!(classify_nodes(&nodes), classify_nodes(&nodes));

        let out = ExecOutcome::Output("HEALTH_WARN clock skew".into());
        assert_eq!(classify_ceph(&out), classify_ceph(&out));
    }
}
