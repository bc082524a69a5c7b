pub mod classify;
pub mod inventory;
pub mod probe;
pub mod resources;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::cli::ReportFormat;
use crate::config::{DiskTarget, ExecTarget, Settings};
use crate::report::{self, Report};
use crate::utils::{CheckName, CheckResult, KubecheckError, NodeResourceSample, Result, Status};
use classify::ExecOutcome;
use probe::{ClusterProbe, KubeProbe};
use store::{ResultStore, Summary};

/// A check's result plus the node samples it produced, if any.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub result: CheckResult,
    pub node_samples: Vec<NodeResourceSample>,
}

impl From<CheckResult> for CheckOutcome {
    fn from(result: CheckResult) -> Self {
        Self { result, node_samples: Vec::new() }
    }
}

// ── 入口 ────────────────────────────────────────────────────────────────────

/// Run every enabled check once and write a single report.
/// Returns the process exit code for the run.
pub async fn run_check(settings: Settings, format: ReportFormat, output_dir: &Path) -> Result<i32> {
    let settings = Arc::new(settings);
    info!("Connecting to cluster...");
    let probe: Arc<dyn ClusterProbe> = Arc::new(KubeProbe::connect(&settings).await?);

    let (path, summary) = check_and_report(probe, settings, format, output_dir).await?;
    info!(
        path = %path.display(),
        success = summary.success,
        warning = summary.warning,
        failed = summary.failed,
        "Report written, overall status {}",
        summary.overall
    );
    Ok(summary.overall.exit_code())
}

/// Refresh the terminal dashboard every `interval` until Ctrl+C.
pub async fn run_watch(settings: Settings, interval: Duration) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| KubecheckError::System(format!("cannot install Ctrl+C handler: {}", e)))?;

    let settings = Arc::new(settings);
    let probe: Arc<dyn ClusterProbe> = Arc::new(KubeProbe::connect(&settings).await?);

    while running.load(Ordering::SeqCst) {
        let started = chrono::Local::now();
        let store = run_checks(probe.clone(), settings.clone()).await;
        let report = Report::new(started, probe.context_name(), &store);
        report::dashboard::draw(&report, interval);

        // 分段睡眠，及时响应 Ctrl+C
        let deadline = Instant::now() + interval;
        while running.load(Ordering::SeqCst) && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    eprintln!("\nCtrl+C received, exiting...");
    Ok(())
}

/// Run the checks against `probe`, render and write one report.
pub async fn check_and_report(
    probe: Arc<dyn ClusterProbe>,
    settings: Arc<Settings>,
    format: ReportFormat,
    output_dir: &Path,
) -> Result<(PathBuf, Summary)> {
    let started = chrono::Local::now();
    let store = run_checks(probe.clone(), settings).await;
    let report = Report::new(started, probe.context_name(), &store);
    let path = report::write(&report, format, output_dir)?;
    Ok((path, report.summary))
}

// ── 调度 ────────────────────────────────────────────────────────────────────

/// Every enabled check yields exactly one result, even if its probe errors or
/// its task panics. Sequential mode awaits each task before spawning the next;
/// parallel mode spawns them all, then joins.
pub async fn run_checks(probe: Arc<dyn ClusterProbe>, settings: Arc<Settings>) -> ResultStore {
    let checks = settings.enabled_checks();
    info!(
        checks = checks.len(),
        parallel = settings.parallel,
        "Running cluster checks"
    );

    let spawn = |name: CheckName| {
        let probe = Arc::clone(&probe);
        let settings = Arc::clone(&settings);
        tokio::spawn(async move { run_one(name, probe.as_ref(), &settings).await })
    };

    let mut store = ResultStore::new();
    if settings.parallel {
        let handles: Vec<_> = checks.iter().map(|&name| (name, spawn(name))).collect();
        for (name, handle) in handles {
            absorb(&mut store, name, handle.await);
        }
    } else {
        for name in checks {
            let joined = spawn(name).await;
            absorb(&mut store, name, joined);
        }
    }

    debug!(results = store.len(), "Checks finished");
    store
}

fn absorb(
    store: &mut ResultStore,
    name: CheckName,
    joined: std::result::Result<CheckOutcome, tokio::task::JoinError>,
) {
    let outcome = joined.unwrap_or_else(|e| {
        error!(check = %name, error = %e, "Check task aborted");
        CheckResult::failed(name, format!("Check aborted unexpectedly: {}", e)).into()
    });
    for sample in outcome.node_samples {
        store.record_node_sample(sample);
    }
    store.record(outcome.result);
}

pub async fn run_one(name: CheckName, probe: &dyn ClusterProbe, settings: &Settings) -> CheckOutcome {
    debug!(check = %name, "Starting check");
    let outcome: CheckOutcome = match name {
        CheckName::Nodes => check_nodes(probe).await.into(),
        CheckName::NodeResources => check_node_resources(probe, settings.resource_threshold).await,
        CheckName::Pods => check_pods(probe).await.into(),
        CheckName::Deployments => check_deployments(probe).await.into(),
        CheckName::Services => check_services(probe, &settings.endpoint_exceptions).await.into(),
        CheckName::Storage => check_storage(probe).await.into(),
        CheckName::Ingress => check_ingress(probe).await.into(),
        CheckName::UrlCheck => check_url(probe, settings.target_url.as_deref()).await.into(),
        CheckName::RookCeph => check_ceph(probe, &settings.ceph).await.into(),
        CheckName::HarborDisk => check_disk(probe, CheckName::HarborDisk, &settings.harbor).await.into(),
        CheckName::MinioDisk => check_disk(probe, CheckName::MinioDisk, &settings.minio).await.into(),
    };

    let r = &outcome.result;
    match r.status {
        Status::Success => info!(check = %name, "{}", r.details),
        Status::Warning | Status::Failed => warn!(check = %name, status = %r.status, "{}", r.details),
    }
    outcome
}

// ── 各项检查 ────────────────────────────────────────────────────────────────

fn unreachable_result(name: CheckName, err: &KubecheckError) -> CheckResult {
    CheckResult::failed(name, format!("Could not query the cluster: {}", err))
        .with_explanation("Verify cluster connectivity, kubeconfig context and RBAC permissions.")
}

async fn check_nodes(probe: &dyn ClusterProbe) -> CheckResult {
    match probe.list_nodes().await {
        Ok(nodes) => classify::classify_nodes(&inventory::node_readiness(&nodes)),
        Err(e) => unreachable_result(CheckName::Nodes, &e),
    }
}

async fn check_node_resources(probe: &dyn ClusterProbe, threshold: f64) -> CheckOutcome {
    let name = CheckName::NodeResources;
    let nodes = match probe.list_nodes().await {
        Ok(n) => n,
        Err(e) => return unreachable_result(name, &e).into(),
    };
    let pods = match probe.list_pods().await {
        Ok(p) => p,
        Err(e) => return unreachable_result(name, &e).into(),
    };

    let samples = resources::sample_nodes(&nodes, &pods);
    CheckOutcome {
        result: classify::classify_node_resources(&samples, threshold),
        node_samples: samples,
    }
}

async fn check_pods(probe: &dyn ClusterProbe) -> CheckResult {
    match probe.list_pods().await {
        Ok(pods) => classify::classify_pods(&inventory::pod_phases(&pods)),
        Err(e) => unreachable_result(CheckName::Pods, &e),
    }
}

async fn check_deployments(probe: &dyn ClusterProbe) -> CheckResult {
    match probe.list_deployments().await {
        Ok(d) => classify::classify_deployments(&inventory::deployment_replicas(&d)),
        Err(e) => unreachable_result(CheckName::Deployments, &e),
    }
}

async fn check_services(probe: &dyn ClusterProbe, exceptions: &[(String, String)]) -> CheckResult {
    let services = match probe.list_services().await {
        Ok(s) => s,
        Err(e) => return unreachable_result(CheckName::Services, &e),
    };
    let endpoints = match probe.list_endpoints().await {
        Ok(e) => e,
        Err(e) => return unreachable_result(CheckName::Services, &e),
    };
    classify::classify_services(&inventory::service_endpoints(&services, &endpoints), exceptions)
}

async fn check_storage(probe: &dyn ClusterProbe) -> CheckResult {
    let pvs = match probe.list_persistent_volumes().await {
        Ok(v) => v,
        Err(e) => return unreachable_result(CheckName::Storage, &e),
    };
    let pvcs = match probe.list_persistent_volume_claims().await {
        Ok(v) => v,
        Err(e) => return unreachable_result(CheckName::Storage, &e),
    };
    classify::classify_storage(&inventory::pv_phases(&pvs), &inventory::pvc_phases(&pvcs))
}

async fn check_ingress(probe: &dyn ClusterProbe) -> CheckResult {
    let ingresses = match probe.list_ingresses().await {
        Ok(i) => i,
        Err(e) => return unreachable_result(CheckName::Ingress, &e),
    };
    if ingresses.is_empty() {
        return classify::classify_ingress(&[], &Default::default());
    }
    let services = match probe.list_services().await {
        Ok(s) => s,
        Err(e) => return unreachable_result(CheckName::Ingress, &e),
    };
    classify::classify_ingress(
        &inventory::ingress_backends(&ingresses),
        &inventory::service_index(&services),
    )
}

async fn check_url(probe: &dyn ClusterProbe, url: Option<&str>) -> CheckResult {
    let Some(url) = url else {
        return CheckResult::warning(CheckName::UrlCheck, "No target URL configured");
    };
    classify::classify_url(url, probe.http_status(url).await)
}

async fn check_ceph(probe: &dyn ClusterProbe, target: &ExecTarget) -> CheckResult {
    let outcome = exec_in_component(probe, target, vec!["ceph".into(), "health".into()]).await;
    classify::classify_ceph(&outcome)
}

async fn check_disk(probe: &dyn ClusterProbe, name: CheckName, target: &DiskTarget) -> CheckResult {
    let command = vec!["df".to_string(), "-P".to_string(), target.path.clone()];
    let outcome = exec_in_component(probe, &target.pod, command).await;
    classify::classify_disk(name, &outcome)
}

async fn exec_in_component(
    probe: &dyn ClusterProbe,
    target: &ExecTarget,
    command: Vec<String>,
) -> ExecOutcome {
    let pod = match probe.find_pod(&target.namespace, &target.selector).await {
        Ok(Some(pod)) => pod,
        Ok(None) => return ExecOutcome::NoPod,
        Err(e) => return ExecOutcome::Error(format!("pod lookup failed: {}", e)),
    };
    match probe
        .exec(&target.namespace, &pod, target.container.as_deref(), &command)
        .await
    {
        Ok(out) => ExecOutcome::Output(out),
        Err(e) => ExecOutcome::Error(e.to_string()),
    }
}
