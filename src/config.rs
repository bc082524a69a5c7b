//! 运行配置：CLI 参数折叠成不可变的 Settings

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CheckArgs;
use crate::utils::{CheckName, KubecheckError, Result};

pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const HTTP_TOTAL_TIMEOUT: Duration = Duration::from_secs(30);

/// A pod a command is executed in, located by label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecTarget {
    pub namespace: String,
    pub selector: String,
    pub container: Option<String>,
}

/// A pod plus the mount point whose usage is reported by `df`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskTarget {
    pub pod: ExecTarget,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub target_url: Option<String>,
    pub parallel: bool,
    pub skipped: BTreeSet<CheckName>,
    pub probe_timeout: Duration,
    pub exec_timeout: Duration,
    pub insecure_tls: bool,
    /// (namespace, service) pairs that never need endpoints.
    pub endpoint_exceptions: Vec<(String, String)>,
    pub resource_threshold: f64,
    pub ceph: ExecTarget,
    pub harbor: DiskTarget,
    pub minio: DiskTarget,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            target_url: None,
            parallel: false,
            skipped: BTreeSet::new(),
            probe_timeout: Duration::from_secs(15),
            exec_timeout: Duration::from_secs(20),
            insecure_tls: false,
            endpoint_exceptions: Vec::new(),
            resource_threshold: 80.0,
            ceph: ExecTarget {
                namespace: "rook-ceph".to_string(),
                selector: "app=rook-ceph-tools".to_string(),
                container: None,
            },
            harbor: DiskTarget {
                pod: ExecTarget {
                    namespace: "harbor".to_string(),
                    selector: "component=registry".to_string(),
                    container: Some("registry".to_string()),
                },
                path: "/storage".to_string(),
            },
            minio: DiskTarget {
                pod: ExecTarget {
                    namespace: "minio".to_string(),
                    selector: "app=minio".to_string(),
                    container: Some("minio".to_string()),
                },
                path: "/data".to_string(),
            },
        }
    }
}

impl Settings {
    pub fn from_args(
        kubeconfig: Option<PathBuf>,
        context: Option<String>,
        args: &CheckArgs,
    ) -> Result<Self> {
        if let Some(url) = &args.url {
            reqwest::Url::parse(url)
                .map_err(|e| KubecheckError::Config(format!("invalid --url {}: {}", url, e)))?;
        }
        if !(0.0..=100.0).contains(&args.resource_threshold) {
            return Err(KubecheckError::Config(format!(
                "--resource-threshold must be within 0..=100, got {}",
                args.resource_threshold
            )));
        }

        let endpoint_exceptions = args
            .endpoint_exceptions
            .iter()
            .map(|s| parse_exception(s))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            kubeconfig,
            context,
            target_url: args.url.clone(),
            parallel: args.parallel,
            skipped: args.skip.iter().copied().collect(),
            probe_timeout: Duration::from_secs(args.probe_timeout.max(1)),
            exec_timeout: Duration::from_secs(args.exec_timeout.max(1)),
            insecure_tls: args.insecure,
            endpoint_exceptions,
            resource_threshold: args.resource_threshold,
            ceph: ExecTarget {
                namespace: args.ceph_namespace.clone(),
                selector: args.ceph_selector.clone(),
                container: None,
            },
            harbor: DiskTarget {
                pod: ExecTarget {
                    namespace: args.harbor_namespace.clone(),
                    selector: args.harbor_selector.clone(),
                    container: non_empty(&args.harbor_container),
                },
                path: args.harbor_path.clone(),
            },
            minio: DiskTarget {
                pod: ExecTarget {
                    namespace: args.minio_namespace.clone(),
                    selector: args.minio_selector.clone(),
                    container: non_empty(&args.minio_container),
                },
                path: args.minio_path.clone(),
            },
        })
    }

    /// Checks this run executes, in canonical order.
    /// `url_check` only runs when a target URL is configured.
    pub fn enabled_checks(&self) -> Vec<CheckName> {
        CheckName::ALL
            .into_iter()
            .filter(|c| !self.skipped.contains(c))
            .filter(|c| *c != CheckName::UrlCheck || self.target_url.is_some())
            .collect()
    }
}

fn parse_exception(s: &str) -> Result<(String, String)> {
    match s.split_once('/') {
        Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((ns.to_string(), name.to_string()))
        }
        _ => Err(KubecheckError::Config(format!(
            "endpoint exception must be namespace/name, got {:?}",
            s
        ))),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}
