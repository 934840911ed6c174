use serde::Serialize;

use crate::record::{RawRunRecord, ResultSet, SummaryRecord};

const NS_PER_US: f64 = 1e3;
const BYTES_PER_KB: f64 = 1024.0;

/// Per-run values as they appear on the chart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub run_index: i64,
    pub avg_gc_us: f64,
    pub max_gc_us: f64,
    pub gc_calls: f64,
    pub avg_mem_kb: f64,
    pub peak_mem_kb: f64,
}

impl DerivedMetrics {
    pub fn from_record(record: &RawRunRecord) -> Self {
        Self {
            run_index: record.run_index,
            avg_gc_us: avg_gc_time_us(record),
            max_gc_us: max_gc_time_us(record),
            gc_calls: record.gc_call_count as f64,
            avg_mem_kb: avg_memory_kb(record),
            peak_mem_kb: peak_memory_kb(record),
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::AvgGcTime => self.avg_gc_us,
            Metric::MaxGcTime => self.max_gc_us,
            Metric::GcCalls => self.gc_calls,
            Metric::AvgMemory => self.avg_mem_kb,
            Metric::PeakMemory => self.peak_mem_kb,
        }
    }
}

/// Average time per GC call in microseconds; zero when no calls were made.
pub fn avg_gc_time_us(record: &RawRunRecord) -> f64 {
    if record.gc_call_count == 0 {
        return 0.0;
    }
    record.total_gc_time_ns as f64 / record.gc_call_count as f64 / NS_PER_US
}

pub fn max_gc_time_us(record: &RawRunRecord) -> f64 {
    record.max_gc_time_ns as f64 / NS_PER_US
}

pub fn avg_memory_kb(record: &RawRunRecord) -> f64 {
    record.avg_resident_bytes as f64 / BYTES_PER_KB
}

pub fn peak_memory_kb(record: &RawRunRecord) -> f64 {
    record.peak_resident_bytes as f64 / BYTES_PER_KB
}

pub fn derive_runs(set: &ResultSet) -> Vec<DerivedMetrics> {
    set.runs.iter().map(DerivedMetrics::from_record).collect()
}

/// Summary latencies in microseconds and jitter as a percentage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub p50_us: f64,
    pub p99_us: f64,
    pub jitter_pct: f64,
}

impl From<&SummaryRecord> for LatencySummary {
    fn from(summary: &SummaryRecord) -> Self {
        Self {
            p50_us: summary.p50_ns as f64 / NS_PER_US,
            p99_us: summary.p99_ns as f64 / NS_PER_US,
            jitter_pct: summary.jitter * 100.0,
        }
    }
}

/// The per-run quantities a chart panel can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    AvgGcTime,
    MaxGcTime,
    GcCalls,
    AvgMemory,
    PeakMemory,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::AvgGcTime,
        Metric::MaxGcTime,
        Metric::GcCalls,
        Metric::AvgMemory,
        Metric::PeakMemory,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Metric::AvgGcTime => "Average GC Time per Run",
            Metric::MaxGcTime => "Max GC Time per Run",
            Metric::GcCalls => "GC Calls per Run",
            Metric::AvgMemory => "Average Memory per Run",
            Metric::PeakMemory => "Peak Memory per Run",
        }
    }

    pub fn axis_label(self) -> &'static str {
        match self {
            Metric::AvgGcTime => "Avg GC Time (µs)",
            Metric::MaxGcTime => "Max GC Time (µs)",
            Metric::GcCalls => "GC Calls",
            Metric::AvgMemory => "Avg Memory (KB)",
            Metric::PeakMemory => "Peak Memory (KB)",
        }
    }

    /// Time axes are logarithmic; memory and counts stay linear.
    pub fn log_scale(self) -> bool {
        matches!(self, Metric::AvgGcTime | Metric::MaxGcTime)
    }
}

/// Arithmetic mean, zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
