//! HTML report rendered from a handlebars template

use handlebars::Handlebars;
use serde::Serialize;

use crate::check::store::Summary;
use crate::report::{metrics, Report};
use crate::utils::{CheckResult, KubecheckError, NodeResourceSample, Result, Status};

const TEMPLATE_NAME: &str = "report";
const TEMPLATE: &str = include_str!("templates/report.hbs");

/// Colour class for a utilisation percentage.
pub fn color_bucket(percent: f64) -> &'static str {
    if percent < 50.0 {
        "green"
    } else if percent < 70.0 {
        "yellow"
    } else if percent < 85.0 {
        "orange"
    } else {
        "red"
    }
}

// ── 模板上下文 ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PageContext<'a> {
    timestamp: String,
    context: &'a str,
    summary: Summary,
    overall: StatusView,
    nodes: Vec<NodeView<'a>>,
    checks: Vec<CheckView<'a>>,
}

#[derive(Serialize)]
struct StatusView {
    label: String,
    class: &'static str,
    icon: &'static str,
}

impl From<Status> for StatusView {
    fn from(s: Status) -> Self {
        Self { label: s.to_string(), class: s.css_class(), icon: s.icon() }
    }
}

#[derive(Serialize)]
struct NodeView<'a> {
    name: &'a str,
    metrics: Vec<MetricView>,
}

#[derive(Serialize)]
struct MetricView {
    label: &'static str,
    value: String,
    percent: String,
    width: String,
    color: &'static str,
}

#[derive(Serialize)]
struct CheckView<'a> {
    name: &'static str,
    title: &'static str,
    status: String,
    class: &'static str,
    icon: &'static str,
    details: &'a str,
    explanation: Option<&'a str>,
}

fn node_view(s: &NodeResourceSample) -> NodeView<'_> {
    let metrics = metrics(s)
        .into_iter()
        .map(|m| MetricView {
            label: m.label,
            value: m.value,
            percent: format!("{:.1}", m.percent),
            width: format!("{:.1}", m.percent.clamp(0.0, 100.0)),
            color: color_bucket(m.percent),
        })
        .collect();
    NodeView { name: &s.name, metrics }
}

fn check_view(r: &CheckResult) -> CheckView<'_> {
    CheckView {
        name: r.name.as_str(),
        title: r.name.title(),
        status: r.status.to_string(),
        class: r.status.css_class(),
        icon: r.status.icon(),
        details: &r.details,
        explanation: r.explanation.as_deref(),
    }
}

pub fn render(report: &Report) -> Result<String> {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(true);
    hb.register_template_string(TEMPLATE_NAME, TEMPLATE)
        .map_err(|e| KubecheckError::Render(format!("template: {}", e)))?;

    let page = PageContext {
        timestamp: report.timestamp(),
        context: report.context_label(),
        summary: report.summary,
        overall: report.summary.overall.into(),
        nodes: report.node_samples.iter().map(node_view).collect(),
        checks: report.results.iter().map(check_view).collect(),
    };
    hb.render(TEMPLATE_NAME, &page)
        .map_err(|e| KubecheckError::Render(format!("HTML: {}", e)))
}
