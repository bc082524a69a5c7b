//! 节点资源采样：allocatable 与 Pod requests 汇总

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::utils::NodeResourceSample;

pub const GPU_RESOURCE: &str = "nvidia.com/gpu";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Requests {
    cpu_millicores: u64,
    memory_bytes: u64,
    gpus: u64,
}

impl Requests {
    fn add(self, other: Requests) -> Requests {
        Requests {
            cpu_millicores: self.cpu_millicores + other.cpu_millicores,
            memory_bytes: self.memory_bytes + other.memory_bytes,
            gpus: self.gpus + other.gpus,
        }
    }

    fn max(self, other: Requests) -> Requests {
        Requests {
            cpu_millicores: self.cpu_millicores.max(other.cpu_millicores),
            memory_bytes: self.memory_bytes.max(other.memory_bytes),
            gpus: self.gpus.max(other.gpus),
        }
    }
}

/// One sample per node, built from allocatable capacity and the requests of
/// the non-terminated pods scheduled on it.
pub fn sample_nodes(nodes: &[Node], pods: &[Pod]) -> Vec<NodeResourceSample> {
    let mut per_node: BTreeMap<&str, (u64, Requests)> = BTreeMap::new();
    for pod in pods {
        if is_terminated(pod) {
            continue;
        }
        let Some(node) = pod.spec.as_ref().and_then(|s| s.node_name.as_deref()) else {
            continue;
        };
        let entry = per_node.entry(node).or_default();
        entry.0 += 1;
        entry.1 = entry.1.add(pod_requests(pod));
    }

    nodes
        .iter()
        .filter_map(|node| {
            let name = node.metadata.name.as_deref()?;
            let allocatable = node.status.as_ref().and_then(|s| s.allocatable.as_ref());
            let get = |key: &str| allocatable.and_then(|a| a.get(key));

            let cpu_allocatable = get("cpu").and_then(|q| parse_cpu_millicores(&q.0)).unwrap_or(0);
            let memory_allocatable = get("memory").and_then(|q| parse_memory_bytes(&q.0)).unwrap_or(0);
            let max_pods = get("pods").and_then(|q| q.0.trim().parse().ok()).unwrap_or(0);
            let gpu_allocatable = get(GPU_RESOURCE)
                .and_then(|q| q.0.trim().parse::<u64>().ok())
                .filter(|n| *n > 0);

            let (pod_count, requests) = per_node.get(name).copied().unwrap_or_default();

            Some(NodeResourceSample {
                name: name.to_string(),
                pod_count,
                max_pods,
                pod_percent: percent(pod_count, max_pods),
                cpu_allocatable_millicores: cpu_allocatable,
                cpu_requests_millicores: requests.cpu_millicores,
                cpu_percent: percent(requests.cpu_millicores, cpu_allocatable),
                memory_allocatable_bytes: memory_allocatable,
                memory_requests_bytes: requests.memory_bytes,
                memory_percent: percent(requests.memory_bytes, memory_allocatable),
                gpu_allocatable,
                gpu_requests: gpu_allocatable.map(|_| requests.gpus),
                gpu_percent: gpu_allocatable.map(|total| percent(requests.gpus, total)),
            })
        })
        .collect()
}

fn is_terminated(pod: &Pod) -> bool {
    matches!(
        pod.status.as_ref().and_then(|s| s.phase.as_deref()),
        Some("Succeeded") | Some("Failed")
    )
}

/// Effective requests: sum of app containers, or the largest init container
/// if that is bigger (init containers run one at a time).
fn pod_requests(pod: &Pod) -> Requests {
    let Some(spec) = pod.spec.as_ref() else {
        return Requests::default();
    };
    let app = spec
        .containers
        .iter()
        .map(container_requests)
        .fold(Requests::default(), Requests::add);
    let init = spec
        .init_containers
        .iter()
        .flatten()
        .map(container_requests)
        .fold(Requests::default(), Requests::max);
    app.max(init)
}

fn container_requests(c: &Container) -> Requests {
    let requests = c.resources.as_ref().and_then(|r| r.requests.as_ref());
    let get = |key: &str| requests.and_then(|r| r.get(key)).map(|q: &Quantity| q.0.as_str());
    Requests {
        cpu_millicores: get("cpu").and_then(parse_cpu_millicores).unwrap_or(0),
        memory_bytes: get("memory").and_then(parse_memory_bytes).unwrap_or(0),
        gpus: get(GPU_RESOURCE).and_then(|s| s.trim().parse().ok()).unwrap_or(0),
    }
}

/// Percentage rounded to one decimal; 0 when `total` is 0.
pub fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64 * 1000.0).round() / 10.0
}

// ── Quantity 解析 ───────────────────────────────────────────────────────────

/// "250m" → 250, "2" → 2000, "1.5" → 1500, "100000u" → 100
pub fn parse_cpu_millicores(s: &str) -> Option<u64> {
    let s = s.trim();
    let (num, unit) = match s.char_indices().last() {
        Some((i, c @ ('m' | 'u' | 'n'))) => (&s[..i], c),
        _ => (s, ' '),
    };
    let value: f64 = num.parse().ok()?;
    if value < 0.0 {
        return None;
    }
    let millis = match unit {
        'm' => value,
        'u' => value / 1_000.0,
        'n' => value / 1_000_000.0,
        _ => value * 1_000.0,
    };
    Some(millis.round() as u64)
}

/// "128Mi" → 134217728, "1G" → 1000000000, "1e3" → 1000
pub fn parse_memory_bytes(s: &str) -> Option<u64> {
    const SUFFIXES: [(&str, f64); 12] = [
        ("Ki", 1024.0),
        ("Mi", 1_048_576.0),
        ("Gi", 1_073_741_824.0),
        ("Ti", 1_099_511_627_776.0),
        ("Pi", 1_125_899_906_842_624.0),
        ("Ei", 1_152_921_504_606_846_976.0),
        ("k", 1e3),
        ("M", 1e6),
        ("G", 1e9),
        ("T", 1e12),
        ("P", 1e15),
        ("E", 1e18),
    ];

    let s = s.trim();
    let (num, scale) = SUFFIXES
        .iter()
        .find_map(|(suffix, scale)| s.strip_suffix(suffix).map(|n| (n, *scale)))
        .or_else(|| s.strip_suffix('m').map(|n| (n, 0.001)))
        .unwrap_or((s, 1.0));
    let value: f64 = num.parse().ok()?;
    if value < 0.0 {
        return None;
    }
    Some((value * scale).round() as u64)
}
