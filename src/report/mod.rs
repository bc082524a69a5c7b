//! 报告层：把一次运行的结果渲染成 html / json / log 文件，或终端面板

pub mod dashboard;
pub mod html;
pub mod json;
pub mod log;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::check::store::{ResultStore, Summary};
use crate::cli::ReportFormat;
use crate::utils::{CheckResult, NodeResourceSample, Result};

/// Snapshot of one run, detached from the store it was built from.
#[derive(Debug, Clone)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    pub context: Option<String>,
    pub summary: Summary,
    pub results: Vec<CheckResult>,
    pub node_samples: Vec<NodeResourceSample>,
}

impl Report {
    pub fn new(generated_at: DateTime<Local>, context: Option<String>, store: &ResultStore) -> Self {
        Self {
            generated_at,
            context,
            summary: store.summary(),
            results: store.results().cloned().collect(),
            node_samples: store.node_samples().cloned().collect(),
        }
    }

    pub fn timestamp(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn context_label(&self) -> &str {
        self.context.as_deref().unwrap_or("(default)")
    }
}

pub fn render(report: &Report, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Html => html::render(report),
        ReportFormat::Json => json::render(report),
        ReportFormat::Log => log::render(report),
    }
}

/// `k8s_health_<YYYYmmdd_HHMMSS>.<ext>`
pub fn file_name(report: &Report, format: ReportFormat) -> String {
    format!(
        "k8s_health_{}.{}",
        report.generated_at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Render and write the report into `dir`, creating it if needed.
pub fn write(report: &Report, format: ReportFormat, dir: &Path) -> Result<PathBuf> {
    let body = render(report, format)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name(report, format));
    std::fs::write(&path, body)?;
    Ok(path)
}

/// One utilisation row of a node sample, shared by every renderer.
pub(crate) struct Metric {
    pub label: &'static str,
    pub value: String,
    pub percent: f64,
}

pub(crate) fn metrics(s: &NodeResourceSample) -> Vec<Metric> {
    let mut rows = vec![
        Metric {
            label: "CPU",
            value: format!(
                "{} / {} cores",
                fmt_cores(s.cpu_requests_millicores),
                fmt_cores(s.cpu_allocatable_millicores)
            ),
            percent: s.cpu_percent,
        },
        Metric {
            label: "Memory",
            value: format!(
                "{} / {}",
                fmt_bytes(s.memory_requests_bytes),
                fmt_bytes(s.memory_allocatable_bytes)
            ),
            percent: s.memory_percent,
        },
        Metric {
            label: "Pods",
            value: format!("{} / {}", s.pod_count, s.max_pods),
            percent: s.pod_percent,
        },
    ];
    if let (Some(req), Some(alloc), Some(pct)) = (s.gpu_requests, s.gpu_allocatable, s.gpu_percent) {
        rows.push(Metric { label: "GPU", value: format!("{} / {}", req, alloc), percent: pct });
    }
    rows
}

/// Human-readable byte count.
pub(crate) fn fmt_bytes(b: u64) -> String {
    if b >= 1 << 30 {
        format!("{:.1}GiB", b as f64 / (1u64 << 30) as f64)
    } else if b >= 1 << 20 {
        format!("{:.1}MiB", b as f64 / (1u64 << 20) as f64)
    } else if b >= 1 << 10 {
        format!("{:.1}KiB", b as f64 / (1u64 << 10) as f64)
    } else {
        format!("{}B", b)
    }
}

/// Millicores as cores, e.g. `1500` → `1.50`.
pub(crate) fn fmt_cores(millicores: u64) -> String {
    let cores = millicores as f64 / 1000.0;
    if millicores % 1000 == 0 {
        format!("{}", millicores / 1000)
    } else {
        format!("{:.2}", cores)
    }
}
