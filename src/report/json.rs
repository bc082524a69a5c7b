//! JSON report. Other tooling reads this, so field names are fixed.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::report::Report;
use crate::utils::{CheckResult, KubecheckError, NodeResourceSample, Result, Status};

#[derive(Serialize)]
struct JsonReport<'a> {
    timestamp: String,
    context: Option<&'a str>,
    summary: JsonSummary,
    overall_status: Status,
    node_resources: NodeMap<'a>,
    check_results: CheckMap<'a>,
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    success: usize,
    warning: usize,
    failed: usize,
}

#[derive(Serialize)]
struct JsonCheck<'a> {
    status: Status,
    details: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<&'a str>,
}

// Objects keep the report's order (canonical check order, node name order)
// instead of whatever a map type would sort them into.
struct CheckMap<'a>(&'a [CheckResult]);
struct NodeMap<'a>(&'a [NodeResourceSample]);

impl Serialize for CheckMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for r in self.0 {
            let entry = JsonCheck {
                status: r.status,
                details: &r.details,
                explanation: r.explanation.as_deref(),
            };
            map.serialize_entry(r.name.as_str(), &entry)?;
        }
        map.end()
    }
}

impl Serialize for NodeMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for s in self.0 {
            map.serialize_entry(&s.name, s)?;
        }
        map.end()
    }
}

pub fn render(report: &Report) -> Result<String> {
    let s = &report.summary;
    let doc = JsonReport {
        timestamp: report.generated_at.to_rfc3339(),
        context: report.context.as_deref(),
        summary: JsonSummary {
            total: s.total,
            success: s.success,
            warning: s.warning,
            failed: s.failed,
        },
        overall_status: s.overall,
        node_resources: NodeMap(&report.node_samples),
        check_results: CheckMap(&report.results),
    };
    serde_json::to_string_pretty(&doc)
        .map_err(|e| KubecheckError::Render(format!("JSON serialize: {}", e)))
}
