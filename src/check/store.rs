//! 本次运行的检查结果集合

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::utils::{CheckName, CheckResult, NodeResourceSample, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub success: usize,
    pub warning: usize,
    pub failed: usize,
    pub overall: Status,
}

/// Results keyed by check name. Keys order by `CheckName`, so iteration is
/// always the canonical check order no matter when a result was recorded.
#[derive(Debug, Default, Clone)]
pub struct ResultStore {
    results: BTreeMap<CheckName, CheckResult>,
    node_samples: BTreeMap<String, NodeResourceSample>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write for a name wins.
    pub fn record(&mut self, result: CheckResult) {
        self.results.insert(result.name, result);
    }

    pub fn record_node_sample(&mut self, sample: NodeResourceSample) {
        self.node_samples.insert(sample.name.clone(), sample);
    }

    pub fn results(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.values()
    }

    pub fn node_samples(&self) -> impl Iterator<Item = &NodeResourceSample> {
        self.node_samples.values()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn summary(&self) -> Summary {
        let count = |s: Status| self.results.values().filter(|r| r.status == s).count();
        let success = count(Status::Success);
        let warning = count(Status::Warning);
        let failed = count(Status::Failed);

        // FAILED if any failed, else WARNING if any warned, else SUCCESS
        let overall = self
            .results
            .values()
            .map(|r| r.status)
            .fold(Status::Success, Status::worst);

        Summary { total: self.results.len(), success, warning, failed, overall }
    }
}
