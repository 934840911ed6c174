use std::{
    fs,
    path::{Path, PathBuf},
};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{GcBenchError, RawRunRecord, SummaryRecord};

pub const CSV_HEADER: &str = "run,total_gc_time_ns,gc_call_count,max_gc_time_ns,avg_resident_bytes,peak_resident_bytes,reserved";

/// Shape of the synthetic runs, loosely modelled on each collector.
#[derive(Clone, Copy, Debug)]
pub enum RunProfile {
    /// Many short pauses, large resident set.
    Tracing,
    /// Few collections, flat memory.
    Arena,
    /// No pauses, steady memory.
    RefCounted,
}

#[derive(Clone, Debug)]
pub struct SyntheticResults {
    pub runs: Vec<RawRunRecord>,
    pub summary: SummaryRecord,
}

impl SyntheticResults {
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(64 * (self.runs.len() + 2));
        out.push_str(CSV_HEADER);
        out.push('\n');
        for run in &self.runs {
            let (a, b, c, d, e, f, g) = run.as_tuple();
            out.push_str(&format!("{a},{b},{c},{d},{e},{f},{g}\n"));
        }
        out.push_str(&format!(
            "#p50_ns={},p99_ns={},jitter={:.6}\n",
            self.summary.p50_ns, self.summary.p99_ns, self.summary.jitter
        ));
        out
    }
}

pub fn generate_results(profile: RunProfile, runs: usize, seed: u64) -> SyntheticResults {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = (1..=runs)
        .map(|run| generate_run(&mut rng, profile, run as i64))
        .collect();
    let p50_ns: i64 = rng.gen_range(800..2_000);
    let p99_ns = p50_ns + rng.gen_range(0..20_000);
    let jitter = (p99_ns - p50_ns) as f64 / p50_ns as f64;
    SyntheticResults {
        runs: records,
        summary: SummaryRecord {
            p50_ns,
            p99_ns,
            jitter,
        },
    }
}

fn generate_run(rng: &mut StdRng, profile: RunProfile, run_index: i64) -> RawRunRecord {
    let (calls, pause_ns, resident) = match profile {
        RunProfile::Tracing => (rng.gen_range(5..40), rng.gen_range(5_000..80_000), 1 << 22),
        RunProfile::Arena => (rng.gen_range(0..3), rng.gen_range(1_000..10_000), 1 << 20),
        RunProfile::RefCounted => (0, 0, 1 << 19),
    };
    let max_gc_time_ns = if calls == 0 { 0 } else { pause_ns * 2 };
    let avg_resident_bytes = resident + rng.gen_range(0..resident / 4);
    RawRunRecord {
        run_index,
        total_gc_time_ns: calls * pause_ns,
        gc_call_count: calls,
        max_gc_time_ns,
        avg_resident_bytes,
        peak_resident_bytes: avg_resident_bytes * 2,
        reserved: 0,
    }
}

/// Writes `<dir>/<name>.csv` and returns its path.
pub fn write_result_file(
    dir: &Path,
    name: &str,
    results: &SyntheticResults,
) -> Result<PathBuf, GcBenchError> {
    fs::create_dir_all(dir)
        .map_err(|e| GcBenchError::io(format!("unable to create {}: {e}", dir.display())))?;
    let path = dir.join(format!("{name}.csv"));
    fs::write(&path, results.to_csv())
        .map_err(|e| GcBenchError::io(format!("unable to write {}: {e}", path.display())))?;
    Ok(path)
}
