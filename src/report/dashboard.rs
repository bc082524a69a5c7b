//! 终端面板（watch 模式）

use std::fmt::Write;
use std::time::Duration;

use colored::{ColoredString, Colorize};

use crate::report::{metrics, Report};
use crate::utils::Status;

/// Clear the terminal and draw `report` at the top.
pub fn draw(report: &Report, interval: Duration) {
    // 清屏并把光标移到左上角
    print!("\x1B[2J\x1B[1;1H");
    print!("{}", render(report, interval));
}

fn paint(status: Status, text: &str) -> ColoredString {
    match status {
        Status::Success => text.green(),
        Status::Warning => text.yellow(),
        Status::Failed => text.red().bold(),
    }
}

fn paint_percent(percent: f64) -> ColoredString {
    let text = format!("{:>5.1}%", percent);
    if percent < 50.0 {
        text.green()
    } else if percent < 70.0 {
        text.yellow()
    } else if percent < 85.0 {
        text.truecolor(255, 140, 0)
    } else {
        text.red().bold()
    }
}

pub fn render(report: &Report, interval: Duration) -> String {
    let mut out = String::new();
    // String 写入不会失败
    let _ = write_dashboard(&mut out, report, interval);
    out
}

fn write_dashboard(out: &mut String, report: &Report, interval: Duration) -> std::fmt::Result {
    let s = &report.summary;
    writeln!(out, "{}", "═".repeat(70).bright_black())?;
    writeln!(
        out,
        "{}  {}",
        "Kubernetes Health".cyan().bold(),
        format!("context {}  ·  {}", report.context_label(), report.timestamp()).bright_black()
    )?;
    writeln!(out, "{}", "═".repeat(70).bright_black())?;
    writeln!(
        out,
        "  Overall {}   {} ok  {} warn  {} failed  ({} checks)",
        paint(s.overall, &format!("{} {}", s.overall.icon(), s.overall)),
        s.success.to_string().green(),
        s.warning.to_string().yellow(),
        s.failed.to_string().red(),
        s.total
    )?;

    if !report.node_samples.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "Nodes".cyan().bold())?;
        for n in &report.node_samples {
            let cells: Vec<String> = metrics(n)
                .into_iter()
                .map(|m| format!("{} {}", m.label, paint_percent(m.percent)))
                .collect();
            writeln!(out, "  {:<24} {}", n.name, cells.join("   "))?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", "Checks".cyan().bold())?;
    for r in &report.results {
        writeln!(
            out,
            "  {} {:<22} {}",
            paint(r.status, r.status.icon()),
            r.name.title(),
            first_line(&r.details)
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("Refreshing every {}s · Ctrl+C to exit", interval.as_secs()).bright_black()
    )
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
