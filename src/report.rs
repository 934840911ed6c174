use serde::Serialize;
use serde_json::Value;

use crate::{
    GcBenchError,
    labeling::{LabeledResultSet, LabeledResults},
    metrics::{DerivedMetrics, LatencySummary, Metric, derive_runs, mean},
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricMeans {
    pub avg_gc_us: f64,
    pub max_gc_us: f64,
    pub gc_calls: f64,
    pub avg_mem_kb: f64,
    pub peak_mem_kb: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabelSummary {
    pub label: String,
    pub strategy: String,
    pub source: Option<String>,
    pub runs: usize,
    pub skipped_lines: usize,
    pub latency: LatencySummary,
    pub means: MetricMeans,
}

impl LabelSummary {
    pub fn from_entry(entry: &LabeledResultSet) -> Self {
        let derived = derive_runs(&entry.results);
        let avg = |metric: Metric| {
            let values: Vec<f64> = derived.iter().map(|run| run.value(metric)).collect();
            mean(&values)
        };
        Self {
            label: entry.label.clone(),
            strategy: entry.strategy.to_string(),
            source: entry
                .results
                .source
                .as_ref()
                .map(|path| path.display().to_string()),
            runs: entry.results.runs.len(),
            skipped_lines: entry.results.skipped_lines,
            latency: LatencySummary::from(&entry.results.summary),
            means: MetricMeans {
                avg_gc_us: avg(Metric::AvgGcTime),
                max_gc_us: avg(Metric::MaxGcTime),
                gc_calls: avg(Metric::GcCalls),
                avg_mem_kb: avg(Metric::AvgMemory),
                peak_mem_kb: avg(Metric::PeakMemory),
            },
        }
    }
}

pub fn summarize(results: &LabeledResults) -> Vec<LabelSummary> {
    results.iter().map(LabelSummary::from_entry).collect()
}

/// JSON document listing every labeled result set.
pub fn summary_json(results: &LabeledResults) -> Result<String, GcBenchError> {
    let labels = serde_json::to_value(summarize(results))
        .map_err(|e| GcBenchError::serialization(e.to_string()))?;
    let mut object = serde_json::Map::new();
    object.insert("command".into(), Value::String("summary".into()));
    object.insert("count".into(), Value::from(results.len()));
    object.insert("labels".into(), labels);
    serde_json::to_string_pretty(&Value::Object(object))
        .map_err(|e| GcBenchError::serialization(e.to_string()))
}

/// Per-run table for one labeled set, in the benchmarker's own layout.
pub fn run_table(entry: &LabeledResultSet) -> String {
    let mut out = String::new();
    let rule = "-".repeat(84);
    out.push_str(&format!(
        "{} ({} runs, source {})\n",
        entry.label,
        entry.results.runs.len(),
        entry.results.name
    ));
    out.push_str(&format!(
        "{:<6}{:<16}{:<10}{:<14}{:<14}{:<12}{:<12}\n",
        "Run", "Total (ns)", "Calls", "Avg (µs)", "Max (µs)", "Avg (KB)", "Peak (KB)"
    ));
    out.push_str(&rule);
    out.push('\n');
    for (raw, derived) in entry.results.runs.iter().zip(derive_runs(&entry.results)) {
        out.push_str(&table_row(raw.total_gc_time_ns, &derived));
    }
    out.push_str(&rule);
    out.push('\n');
    let latency = LatencySummary::from(&entry.results.summary);
    out.push_str(&format!(
        "P50: {:.3} µs  P99: {:.3} µs  Jitter: {:.1}%\n",
        latency.p50_us, latency.p99_us, latency.jitter_pct
    ));
    out
}

fn table_row(total_ns: i64, derived: &DerivedMetrics) -> String {
    format!(
        "{:<6}{:<16}{:<10}{:<14.3}{:<14.3}{:<12.1}{:<12.1}\n",
        derived.run_index,
        total_ns,
        derived.gc_calls as i64,
        derived.avg_gc_us,
        derived.max_gc_us,
        derived.avg_mem_kb,
        derived.peak_mem_kb
    )
}
