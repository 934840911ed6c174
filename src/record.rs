//! CSV result files written by the benchmarker.
//!
//! A file holds an optional `run,...` header, one data line per measured run
//! and a `#`-prefixed summary line carrying `p50_ns`, `p99_ns` and `jitter`.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::debug;

use crate::GcBenchError;

const HEADER_PREFIX: &str = "run,";
const SUMMARY_MARKER: char = '#';
const RECORD_FIELDS: usize = 7;
const FIELD_NAMES: [&str; RECORD_FIELDS] = [
    "run",
    "total_gc_time_ns",
    "gc_call_count",
    "max_gc_time_ns",
    "avg_resident_bytes",
    "peak_resident_bytes",
    "reserved",
];

/// One measured run, in the column order the benchmarker writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RawRunRecord {
    pub run_index: i64,
    pub total_gc_time_ns: i64,
    pub gc_call_count: i64,
    pub max_gc_time_ns: i64,
    pub avg_resident_bytes: i64,
    pub peak_resident_bytes: i64,
    pub reserved: i64,
}

impl RawRunRecord {
    pub fn from_fields(fields: [i64; RECORD_FIELDS]) -> Self {
        let [
            run_index,
            total_gc_time_ns,
            gc_call_count,
            max_gc_time_ns,
            avg_resident_bytes,
            peak_resident_bytes,
            reserved,
        ] = fields;
        Self {
            run_index,
            total_gc_time_ns,
            gc_call_count,
            max_gc_time_ns,
            avg_resident_bytes,
            peak_resident_bytes,
            reserved,
        }
    }

    pub fn as_tuple(&self) -> (i64, i64, i64, i64, i64, i64, i64) {
        (
            self.run_index,
            self.total_gc_time_ns,
            self.gc_call_count,
            self.max_gc_time_ns,
            self.avg_resident_bytes,
            self.peak_resident_bytes,
            self.reserved,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub p50_ns: i64,
    pub p99_ns: i64,
    pub jitter: f64,
}

/// Parsed contents of a single CSV file.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultSet {
    pub name: String,
    pub source: Option<PathBuf>,
    pub runs: Vec<RawRunRecord>,
    pub summary: SummaryRecord,
    pub skipped_lines: usize,
}

impl ResultSet {
    pub fn empty<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            source: None,
            runs: Vec::new(),
            summary: SummaryRecord::default(),
            skipped_lines: 0,
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }
}

/// Parses the CSV file at `path`; the result set is named after the file stem.
pub fn parse_file(path: &Path) -> Result<ResultSet, GcBenchError> {
    let file = File::open(path)
        .map_err(|e| GcBenchError::io(format!("unable to open {}: {e}", path.display())))?;
    let mut set = parse_reader(&file_stem(path), BufReader::new(file))
        .map_err(|err| attribute(err, path))?;
    set.source = Some(path.to_path_buf());
    debug!(
        path = %path.display(),
        runs = set.runs.len(),
        skipped = set.skipped_lines,
        "parsed result file"
    );
    Ok(set)
}

/// Parses CSV content from any reader. `name` labels errors and the result.
pub fn parse_reader<R: BufRead>(name: &str, reader: R) -> Result<ResultSet, GcBenchError> {
    let mut set = ResultSet::empty(name);
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| GcBenchError::io(format!("{name}:{line_no}: {e}")))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with(HEADER_PREFIX) {
            continue;
        }
        if let Some(rest) = line.strip_prefix(SUMMARY_MARKER) {
            set.summary = parse_summary(name, line_no, rest)?;
            continue;
        }
        match parse_data_line(name, line_no, line)? {
            Some(record) => set.runs.push(record),
            None => {
                debug!(source = name, line = line_no, "skipping short data line");
                set.skipped_lines += 1;
            }
        }
    }
    Ok(set)
}

/// Parses `key=value` pairs of a summary line (without the `#` marker).
pub fn parse_summary(name: &str, line_no: usize, body: &str) -> Result<SummaryRecord, GcBenchError> {
    let mut summary = SummaryRecord::default();
    for segment in body.split(',') {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "p50_ns" => summary.p50_ns = parse_int(name, line_no, "p50_ns", value)?,
            "p99_ns" => summary.p99_ns = parse_int(name, line_no, "p99_ns", value)?,
            "jitter" => {
                summary.jitter = value
                    .parse::<f64>()
                    .map_err(|_| GcBenchError::malformed_value(name, line_no, "jitter", value))?
            }
            _ => {}
        }
    }
    Ok(summary)
}

/// Returns `None` for lines with fewer than seven fields.
pub fn parse_data_line(
    name: &str,
    line_no: usize,
    line: &str,
) -> Result<Option<RawRunRecord>, GcBenchError> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < RECORD_FIELDS {
        return Ok(None);
    }
    let mut fields = [0i64; RECORD_FIELDS];
    for (slot, (raw, field)) in fields.iter_mut().zip(parts.iter().zip(FIELD_NAMES)) {
        *slot = parse_int(name, line_no, field, raw.trim())?;
    }
    Ok(Some(RawRunRecord::from_fields(fields)))
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parse_int(name: &str, line_no: usize, field: &str, value: &str) -> Result<i64, GcBenchError> {
    value
        .parse::<i64>()
        .map_err(|_| GcBenchError::malformed_value(name, line_no, field, value))
}

fn attribute(err: GcBenchError, path: &Path) -> GcBenchError {
    match err {
        GcBenchError::MalformedCsvValue {
            line, field, value, ..
        } => GcBenchError::malformed_value(path.display().to_string(), line, field, value),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ResultSet {
        parse_reader("sample", text.as_bytes()).expect("parse")
    }

    #[test]
    fn data_line_is_taken_verbatim() {
        let set = parse("3,150000,10,50000,204800,409600,0\n");
        assert_eq!(
            set.runs[0].as_tuple(),
            (3, 150000, 10, 50000, 204800, 409600, 0)
        );
    }

    #[test]
    fn summary_line_parses_all_keys() {
        let set = parse("#p50_ns=1200,p99_ns=9800,jitter=0.15\n");
        assert_eq!(
            set.summary,
            SummaryRecord {
                p50_ns: 1200,
                p99_ns: 9800,
                jitter: 0.15
            }
        );
    }

    #[test]
    fn summary_skips_segments_without_equals() {
        let set = parse("# summary,p50_ns=5,garbage,jitter=0.5\n");
        assert_eq!(set.summary.p50_ns, 5);
        assert_eq!(set.summary.p99_ns, 0);
        assert_eq!(set.summary.jitter, 0.5);
    }

    #[test]
    fn last_summary_line_wins() {
        let set = parse("#p50_ns=1,p99_ns=2,jitter=0.1\n#p50_ns=7\n");
        assert_eq!(
            set.summary,
            SummaryRecord {
                p50_ns: 7,
                p99_ns: 0,
                jitter: 0.0
            }
        );
    }

    #[test]
    fn short_lines_are_counted_not_fatal() {
        let set = parse("1,2,3\n1,2,3,4,5,6,7\n");
        assert_eq!(set.runs.len(), 1);
        assert_eq!(set.skipped_lines, 1);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let set = parse("1,2,3,4,5,6,7,8,nine\n");
        assert_eq!(set.runs[0].reserved, 7);
    }

    #[test]
    fn non_numeric_field_aborts() {
        let err = parse_reader("trace", "run,total\n1,2,x,4,5,6,7\n".as_bytes()).unwrap_err();
        match err {
            GcBenchError::MalformedCsvValue {
                path, line, field, ..
            } => {
                assert_eq!(path, "trace");
                assert_eq!(line, 2);
                assert_eq!(field, "gc_call_count");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn bad_jitter_aborts() {
        let err = parse_reader("rc", "#jitter=lots\n".as_bytes()).unwrap_err();
        assert!(matches!(err, GcBenchError::MalformedCsvValue { ref field, .. } if field == "jitter"));
    }
}
