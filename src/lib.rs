//! Runs GC benchmark workloads and charts their CSV results side by side.
//! Run Criterion benchmarks with `cargo bench` to inspect reports under `target/criterion`.

pub mod bench_utils;
pub mod chart;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod labeling;
pub mod metrics;
pub mod orchestrator;
pub mod record;
pub mod render;
pub mod report;

pub use crate::chart::{ChartLayout, ChartPlan};
pub use crate::config::{Catalog, HarnessConfig};
pub use crate::errors::GcBenchError;
pub use crate::labeling::{LabeledResults, Strategy, StrategyClassifier};
pub use crate::orchestrator::{ExitPolicy, Orchestrator, RunRequest};
pub use crate::record::{RawRunRecord, ResultSet, SummaryRecord};
