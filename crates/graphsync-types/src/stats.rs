//! Per-run statistics and report artifacts.
//!
//! `RunStats` is a run-scoped accumulator owned by the caller and passed
//! by reference into the orchestration step. At run end it renders two
//! fixed-width text artifacts: the run summary (documents or `ERROR` per
//! index) and the average source-query-time report.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;

/// Outcome of processing one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Index completed; total documents written across its queries.
    Completed { documents: u64 },
    /// Index aborted; the duration records the partial elapsed time.
    Failed,
}

/// Statistics for one processed index.
#[derive(Debug, Clone)]
pub struct IndexStat {
    pub index: String,
    pub outcome: IndexOutcome,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
struct QueryTiming {
    index: String,
    query: String,
    durations: Vec<Duration>,
}

/// Run-scoped statistics accumulator.
#[derive(Debug, Default)]
pub struct RunStats {
    indices: Vec<IndexStat>,
    query_timings: Vec<QueryTiming>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed index.
    pub fn record_completed(&mut self, index: &str, documents: u64, duration: Duration) {
        self.indices.push(IndexStat {
            index: index.to_string(),
            outcome: IndexOutcome::Completed { documents },
            duration,
        });
    }

    /// Record an aborted index with its partial elapsed time.
    pub fn record_failed(&mut self, index: &str, duration: Duration) {
        self.indices.push(IndexStat {
            index: index.to_string(),
            outcome: IndexOutcome::Failed,
            duration,
        });
    }

    /// Record the accumulated source-side durations of one query.
    pub fn record_query_timings(&mut self, index: &str, query: &str, durations: Vec<Duration>) {
        if durations.is_empty() {
            return;
        }
        self.query_timings.push(QueryTiming {
            index: index.to_string(),
            query: query.to_string(),
            durations,
        });
    }

    /// Per-index statistics in processing order.
    pub fn indices(&self) -> &[IndexStat] {
        &self.indices
    }

    /// Total documents written across completed indices.
    pub fn total_documents(&self) -> u64 {
        self.indices
            .iter()
            .map(|stat| match stat.outcome {
                IndexOutcome::Completed { documents } => documents,
                IndexOutcome::Failed => 0,
            })
            .sum()
    }

    /// Whether any index aborted.
    pub fn has_errors(&self) -> bool {
        self.indices
            .iter()
            .any(|stat| stat.outcome == IndexOutcome::Failed)
    }

    /// Render the fixed-width run summary table.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<40} {:>12} {:>12}\n",
            "Index", "Documents", "Duration"
        ));
        out.push_str(&format!("{:-<40} {:-<12} {:-<12}\n", "", "", ""));
        let mut total_duration = Duration::ZERO;
        for stat in &self.indices {
            let documents = match stat.outcome {
                IndexOutcome::Completed { documents } => documents.to_string(),
                IndexOutcome::Failed => "ERROR".to_string(),
            };
            total_duration += stat.duration;
            out.push_str(&format!(
                "{:<40} {:>12} {:>12}\n",
                stat.index,
                documents,
                format_duration(stat.duration)
            ));
        }
        out.push_str(&format!("{:-<40} {:-<12} {:-<12}\n", "", "", ""));
        out.push_str(&format!(
            "{:<40} {:>12} {:>12}\n",
            "TOTAL",
            self.total_documents(),
            format_duration(total_duration)
        ));
        out
    }

    /// Render the fixed-width average source-query-time table.
    pub fn render_query_report(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<40} {:<24} {:>6} {:>14}\n",
            "Index", "Query", "Pages", "Avg source"
        ));
        out.push_str(&format!("{:-<40} {:-<24} {:-<6} {:-<14}\n", "", "", "", ""));
        for timing in &self.query_timings {
            let total: Duration = timing.durations.iter().sum();
            let avg = total / timing.durations.len() as u32;
            out.push_str(&format!(
                "{:<40} {:<24} {:>6} {:>14}\n",
                timing.index,
                timing.query,
                timing.durations.len(),
                format_duration(avg)
            ));
        }
        out
    }

    /// Write both reports as timestamped artifacts under `dir`.
    ///
    /// Returns the summary and query-report paths.
    pub fn write_reports(&self, dir: &Path) -> std::io::Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)?;
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let summary_path = dir.join(format!("run-summary-{stamp}.txt"));
        let query_path = dir.join(format!("query-times-{stamp}.txt"));
        std::fs::write(&summary_path, self.render_summary())?;
        std::fs::write(&query_path, self.render_query_report())?;
        Ok((summary_path, query_path))
    }
}

/// Render a duration as seconds with centisecond precision.
fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_exclude_failed() {
        let mut stats = RunStats::new();
        stats.record_completed("products", 6, Duration::from_secs(2));
        stats.record_failed("orders", Duration::from_secs(1));
        assert_eq!(stats.total_documents(), 6);
        assert!(stats.has_errors());
        assert_eq!(stats.indices().len(), 2);
    }

    #[test]
    fn test_summary_marks_errors() {
        let mut stats = RunStats::new();
        stats.record_completed("products", 6, Duration::from_secs(2));
        stats.record_failed("orders", Duration::from_millis(3100));
        let summary = stats.render_summary();
        assert!(summary.contains("products"));
        assert!(summary.contains("ERROR"));
        assert!(summary.contains("3.10s"));
        assert!(summary.contains("TOTAL"));
    }

    #[test]
    fn test_query_report_averages() {
        let mut stats = RunStats::new();
        stats.record_query_timings(
            "products",
            "unnamed",
            vec![Duration::from_secs(1), Duration::from_secs(3)],
        );
        let report = stats.render_query_report();
        assert!(report.contains("products"));
        assert!(report.contains("unnamed"));
        assert!(report.contains("2.00s"));
    }

    #[test]
    fn test_empty_timings_not_recorded() {
        let mut stats = RunStats::new();
        stats.record_query_timings("products", "unnamed", vec![]);
        let report = stats.render_query_report();
        assert!(!report.contains("products"));
    }

    #[test]
    fn test_write_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut stats = RunStats::new();
        stats.record_completed("products", 6, Duration::from_secs(2));
        stats.record_query_timings("products", "unnamed", vec![Duration::from_secs(1)]);
        let (summary, query) = stats.write_reports(dir.path()).unwrap();
        assert!(summary.exists());
        assert!(query.exists());
        let text = std::fs::read_to_string(summary).unwrap();
        assert!(text.contains("products"));
    }
}
