use serde::{Deserialize, Serialize};

/// Outcome of a single check. Declaration order is severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Success,
    Warning,
    Failed,
}

impl Status {
    /// The more severe of two statuses.
    pub fn worst(self, other: Status) -> Status {
        self.max(other)
    }

    /// Process exit code for a run whose overall status is `self`.
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Failed => 1,
            Status::Warning => 2,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Status::Success => "✔",
            Status::Warning => "⚠",
            Status::Failed => "✘",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Warning => "warning",
            Status::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Success => write!(f, "SUCCESS"),
            Status::Warning => write!(f, "WARNING"),
            Status::Failed => write!(f, "FAILED"),
        }
    }
}

/// The fixed set of checks. Declaration order is the canonical display order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum CheckName {
    Nodes,
    NodeResources,
    Pods,
    Deployments,
    Services,
    Storage,
    Ingress,
    UrlCheck,
    RookCeph,
    HarborDisk,
    MinioDisk,
}

impl CheckName {
    pub const ALL: [CheckName; 11] = [
        CheckName::Nodes,
        CheckName::NodeResources,
        CheckName::Pods,
        CheckName::Deployments,
        CheckName::Services,
        CheckName::Storage,
        CheckName::Ingress,
        CheckName::UrlCheck,
        CheckName::RookCeph,
        CheckName::HarborDisk,
        CheckName::MinioDisk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CheckName::Nodes => "nodes",
            CheckName::NodeResources => "node_resources",
            CheckName::Pods => "pods",
            CheckName::Deployments => "deployments",
            CheckName::Services => "services",
            CheckName::Storage => "storage",
            CheckName::Ingress => "ingress",
            CheckName::UrlCheck => "url_check",
            CheckName::RookCeph => "rook_ceph",
            CheckName::HarborDisk => "harbor_disk",
            CheckName::MinioDisk => "minio_disk",
        }
    }

    /// Human-readable heading used by the renderers.
    pub fn title(self) -> &'static str {
        match self {
            CheckName::Nodes => "Node Readiness",
            CheckName::NodeResources => "Node Resource Usage",
            CheckName::Pods => "Pod Status",
            CheckName::Deployments => "Deployment Health",
            CheckName::Services => "Service Endpoints",
            CheckName::Storage => "Persistent Storage",
            CheckName::Ingress => "Ingress Backends",
            CheckName::UrlCheck => "External URL",
            CheckName::RookCeph => "Rook-Ceph Health",
            CheckName::HarborDisk => "Harbor Disk Usage",
            CheckName::MinioDisk => "MinIO Disk Usage",
        }
    }
}

impl std::fmt::Display for CheckName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: CheckName,
    pub status: Status,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl CheckResult {
    pub fn new(name: CheckName, status: Status, details: impl Into<String>) -> Self {
        Self { name, status, details: details.into(), explanation: None }
    }

    pub fn success(name: CheckName, details: impl Into<String>) -> Self {
        Self::new(name, Status::Success, details)
    }

    pub fn warning(name: CheckName, details: impl Into<String>) -> Self {
        Self::new(name, Status::Warning, details)
    }

    pub fn failed(name: CheckName, details: impl Into<String>) -> Self {
        Self::new(name, Status::Failed, details)
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

/// Point-in-time utilisation of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResourceSample {
    pub name: String,
    pub pod_count: u64,
    pub max_pods: u64,
    pub pod_percent: f64,
    pub cpu_allocatable_millicores: u64,
    pub cpu_requests_millicores: u64,
    pub cpu_percent: f64,
    pub memory_allocatable_bytes: u64,
    pub memory_requests_bytes: u64,
    pub memory_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_allocatable: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_requests: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_percent: Option<f64>,
}
