//! Per-stage statistics reports.

use crate::stage::StageStats;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde::Serialize;

/// Statistics of one stage, as reported after (or during) a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub id: usize,
    pub name: String,
    pub count: u64,
    /// Mean seconds per call (NaN before the first call)
    pub mean: f64,
    /// Standard deviation of seconds per call
    pub stddev: f64,
}

impl StageReport {
    pub fn new(id: usize, name: impl Into<String>, stats: &StageStats) -> Self {
        Self {
            id,
            name: name.into(),
            count: stats.count,
            mean: stats.mean(),
            stddev: stats.stddev(),
        }
    }

    /// One-line summary: `name: calls: N  mean: Xs  stddev: Ys`.
    pub fn summary_line(&self) -> String {
        format!(
            "{}: calls: {}  mean: {}  stddev: {}",
            self.name,
            self.count,
            format_secs(self.mean),
            format_secs(self.stddev)
        )
    }
}

fn format_secs(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.6}s", value)
    }
}

/// Render reports as a table, one row per stage.
pub fn format_stats_table(reports: &[StageReport]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Stage", "Calls", "Mean", "Stddev"]);
    for report in reports {
        table.add_row(vec![
            report.name.clone(),
            report.count.to_string(),
            format_secs(report.mean),
            format_secs(report.stddev),
        ]);
    }
    table.to_string()
}
