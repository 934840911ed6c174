use std::path::{Path, PathBuf};

use crate::{
    chart::ChartLayout,
    config::Catalog,
    discovery::is_csv,
    orchestrator::{ExitPolicy, RunRequest},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// Launch the benchmarker for a workload, then chart its CSVs.
    Run(RunRequest),
    /// Chart one existing CSV file.
    CsvFile(PathBuf),
    /// Chart CSVs in the results directory whose name contains the fragment.
    CsvFragment(String),
    Help,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLineConfig {
    pub invocation: Invocation,
    pub layout: ChartLayout,
    pub exit_policy: ExitPolicy,
    pub strict_labels: bool,
    pub summary_only: bool,
    pub root: Option<PathBuf>,
    pub verbose: bool,
}

impl CommandLineConfig {
    /// Parses `args` including the program name at index 0.
    ///
    /// `--sys` is accepted anywhere. Other flags are only read before the
    /// workload name; everything after it goes to the benchmarker untouched.
    pub fn from_args(args: &[&str]) -> Result<Self, String> {
        let mut catalog = Catalog::Con;
        let mut rest: Vec<&str> = Vec::new();
        for arg in args.iter().skip(1) {
            if *arg == "--sys" {
                catalog = Catalog::Sys;
            } else {
                rest.push(arg);
            }
        }

        let mut config = Self {
            invocation: Invocation::Help,
            layout: ChartLayout::default(),
            exit_policy: ExitPolicy::default(),
            strict_labels: false,
            summary_only: false,
            root: None,
            verbose: false,
        };
        let mut fragment: Option<String> = None;
        let mut iter = rest.into_iter().peekable();
        while let Some(arg) = iter.next_if(|a| a.starts_with('-')) {
            match arg {
                "-h" | "--help" => return Ok(config),
                "--csv" => {
                    fragment = Some(
                        iter.next()
                            .ok_or_else(|| "--csv requires a name fragment".to_string())?
                            .to_string(),
                    );
                }
                "--layout" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| "--layout requires bars or box".to_string())?;
                    config.layout = ChartLayout::parse(value)
                        .ok_or_else(|| format!("unknown layout {value}, expected bars or box"))?;
                }
                "--root" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| "--root requires a directory".to_string())?;
                    config.root = Some(PathBuf::from(value));
                }
                "--strict" => config.exit_policy = ExitPolicy::Strict,
                "--strict-labels" => config.strict_labels = true,
                "--summary" => config.summary_only = true,
                "-v" | "--verbose" => config.verbose = true,
                other => return Err(format!("unknown flag {other}")),
            }
        }
        let positional: Vec<String> = iter.map(str::to_string).collect();

        config.invocation = match fragment {
            Some(fragment) => {
                if let Some(extra) = positional.first() {
                    return Err(format!("unexpected argument {extra} with --csv"));
                }
                Invocation::CsvFragment(fragment)
            }
            None => positional_invocation(positional, catalog)?,
        };
        Ok(config)
    }

    pub fn help() -> &'static str {
        "Usage: gcbench [options] [--sys] [runs] [warmup_runs] <test_name|csv_file> [args...]\n\
         \x20      gcbench [options] --csv <name_fragment>\n\
         \n\
         runs and warmup_runs are unsigned 64-bit counts.\n\
         \n\
         Options (before the test name):\n\
         \x20 --layout bars|box   per-run panels as grouped bars (default) or box plots\n\
         \x20 --strict            fail when the benchmarker exits unsuccessfully\n\
         \x20 --strict-labels     match trace/arena/rc as whole name tokens only\n\
         \x20 --summary           print a JSON summary instead of drawing the chart\n\
         \x20 --root <dir>        project root holding the build tree (or GCBENCH_ROOT)\n\
         \x20 -v, --verbose       debug logging\n"
    }
}

/// Leading integers are runs and warmup runs:
/// `N M name ...`, `N name ...` (warmup 0) or `name ...` (1 and 1).
fn positional_invocation(args: Vec<String>, catalog: Catalog) -> Result<Invocation, String> {
    let (runs, warmup_runs, skip) = if args.len() >= 3 && is_digits(&args[0]) && is_digits(&args[1]) {
        (parse_count(&args[0])?, parse_count(&args[1])?, 2)
    } else if args.len() >= 2 && is_digits(&args[0]) {
        (parse_count(&args[0])?, 0, 1)
    } else if !args.is_empty() {
        (1, 1, 0)
    } else {
        return Err("missing test name or csv file".to_string());
    };
    let mut rest = args.into_iter().skip(skip);
    let name = rest
        .next()
        .ok_or_else(|| "missing test name or csv file".to_string())?;
    let candidate = Path::new(&name);
    if is_csv(candidate) && candidate.is_file() {
        return Ok(Invocation::CsvFile(candidate.to_path_buf()));
    }
    Ok(Invocation::Run(RunRequest {
        runs,
        warmup_runs,
        workload: name,
        catalog,
        extra_args: rest.collect(),
    }))
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

fn parse_count(value: &str) -> Result<u64, String> {
    value
        .parse::<u64>()
        .map_err(|_| format!("count {value} does not fit in 64 bits"))
}
