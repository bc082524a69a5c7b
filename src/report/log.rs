//! 纯文本报告

use std::fmt::Write;

use crate::report::{metrics, Report};
use crate::utils::{KubecheckError, Result};

pub fn render(report: &Report) -> Result<String> {
    let mut out = String::new();
    write_report(&mut out, report)
        .map_err(|e| KubecheckError::Render(format!("log: {}", e)))?;
    Ok(out)
}

fn write_report(out: &mut String, report: &Report) -> std::fmt::Result {
    section(out, "KUBERNETES HEALTH REPORT")?;
    writeln!(out, "  Generated at : {}", report.timestamp())?;
    writeln!(out, "  Context      : {}", report.context_label())?;

    // ── Summary ───────────────────────────────────────────────────────────
    let s = &report.summary;
    section(out, "SUMMARY")?;
    writeln!(out, "  Total        : {}", s.total)?;
    writeln!(out, "  Success      : {}", s.success)?;
    writeln!(out, "  Warning      : {}", s.warning)?;
    writeln!(out, "  Failed       : {}", s.failed)?;
    writeln!(out, "  Overall      : {} {}", s.overall.icon(), s.overall)?;

    // ── Nodes ─────────────────────────────────────────────────────────────
    if !report.node_samples.is_empty() {
        section(out, &format!("NODE RESOURCES ({})", report.node_samples.len()))?;
        for n in &report.node_samples {
            writeln!(out, "  {}", n.name)?;
            for m in metrics(n) {
                let warn = if m.percent >= 85.0 { " ⚠" } else { "" };
                writeln!(out, "      {:<8}: {:<24} {:>5.1}%{}", m.label, m.value, m.percent, warn)?;
            }
        }
    }

    // ── Checks ────────────────────────────────────────────────────────────
    section(out, &format!("CHECKS ({})", report.results.len()))?;
    for r in &report.results {
        writeln!(out, "  {} [{}] {}", r.status.icon(), r.status, r.name.title())?;
        for line in r.details.lines() {
            writeln!(out, "      {}", line)?;
        }
        if let Some(e) = &r.explanation {
            writeln!(out, "      → {}", e)?;
        }
    }
    Ok(())
}

fn section(out: &mut String, title: &str) -> std::fmt::Result {
    writeln!(out, "\n{}", "─".repeat(60))?;
    writeln!(out, "  {}", title)?;
    writeln!(out, "{}", "─".repeat(60))
}
