use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
};

use gcbench::{
    Catalog, ExitPolicy, GcBenchError, HarnessConfig, Orchestrator, RunRequest,
    bench_utils::{RunProfile, generate_results, write_result_file},
    orchestrator::{ProcessOutput, ProcessRunner, RunObserver},
};
use tempfile::TempDir;

/// Stands in for the benchmarker: writes result files and reports a status.
struct FakeBenchmarker {
    results_dir: PathBuf,
    outputs: Vec<(&'static str, RunProfile)>,
    success: bool,
    calls: RefCell<Vec<Vec<String>>>,
}

impl FakeBenchmarker {
    fn new(results_dir: PathBuf, outputs: Vec<(&'static str, RunProfile)>) -> Self {
        Self {
            results_dir,
            outputs,
            success: true,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ProcessRunner for &FakeBenchmarker {
    fn run(&self, _program: &Path, args: &[String]) -> Result<ProcessOutput, GcBenchError> {
        self.calls.borrow_mut().push(args.to_vec());
        for (idx, (name, profile)) in self.outputs.iter().enumerate() {
            write_result_file(
                &self.results_dir,
                name,
                &generate_results(*profile, 3, idx as u64),
            )?;
        }
        Ok(ProcessOutput {
            code: Some(if self.success { 0 } else { 3 }),
            success: self.success,
            stdout: "done\n".into(),
            stderr: "bench log\n".into(),
        })
    }
}

#[derive(Default)]
struct RecordingObserver {
    commands: RefCell<Vec<Vec<String>>>,
    stderr: RefCell<Vec<String>>,
}

impl RunObserver for RecordingObserver {
    fn launching(&self, command: &[String]) {
        self.commands.borrow_mut().push(command.to_vec());
    }

    fn finished(&self, output: &ProcessOutput) {
        self.stderr.borrow_mut().push(output.stderr.clone());
    }
}

fn build_tree(libraries: &[&str]) -> (TempDir, HarnessConfig) {
    let dir = TempDir::new().expect("tempdir");
    let config = HarnessConfig::unix(dir.path());
    let exe = config.executable_path();
    fs::create_dir_all(exe.parent().expect("parent")).expect("mkdir");
    fs::write(&exe, b"").expect("exe");
    fs::create_dir_all(config.library_dir()).expect("mkdir");
    for name in libraries {
        fs::write(config.library_path(Catalog::Con, name), b"").expect("lib");
    }
    (dir, config)
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_run_collects_fresh_csvs_only() {
    let (_dir, config) = build_tree(&["gol"]);
    let results_dir = config.results_dir();
    fs::create_dir_all(&results_dir).unwrap();
    fs::write(results_dir.join("old-run.csv"), "1,1,1,1,1,1,1\n").unwrap();

    let fake = FakeBenchmarker::new(
        results_dir.clone(),
        vec![
            ("gol-trace-1", RunProfile::Tracing),
            ("gol-arena-1", RunProfile::Arena),
        ],
    );
    let mut request = RunRequest::new("gol");
    request.runs = 3;
    request.warmup_runs = 0;
    let outcome = Orchestrator::new(&config, &fake)
        .run_and_collect(&request)
        .expect("run");

    assert_eq!(
        file_names(&outcome.csv_files),
        vec!["gol-arena-1.csv", "gol-trace-1.csv"]
    );
    assert_eq!(outcome.results_dir, results_dir);
    assert_eq!(outcome.output.stdout, "done\n");

    let calls = fake.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(&calls[0][..4], ["--runs", "3", "--warmup_runs", "0"]);
    assert!(calls[0][4].ends_with("libbenchmarks-con-gol.so"));
}

#[test]
fn test_missing_executable_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = HarnessConfig::unix(dir.path());
    let fake = FakeBenchmarker::new(config.results_dir(), vec![]);
    let err = Orchestrator::new(&config, &fake)
        .run_and_collect(&RunRequest::new("gol"))
        .unwrap_err();
    assert!(matches!(err, GcBenchError::MissingExecutable { .. }));
    assert!(fake.calls.borrow().is_empty());
}

#[test]
fn test_missing_library_lists_available_workloads() {
    let (_dir, config) = build_tree(&["gol", "bag"]);
    let fake = FakeBenchmarker::new(config.results_dir(), vec![]);
    let err = Orchestrator::new(&config, &fake)
        .run_and_collect(&RunRequest::new("tree"))
        .unwrap_err();
    match &err {
        GcBenchError::MissingWorkloadLibrary { path, available } => {
            assert!(path.ends_with("libbenchmarks-con-tree.so"));
            assert_eq!(
                available,
                &vec![
                    "libbenchmarks-con-bag.so".to_string(),
                    "libbenchmarks-con-gol.so".to_string()
                ]
            );
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.is_missing_input());
}

#[test]
fn test_sys_catalog_uses_sys_library() {
    let (_dir, config) = build_tree(&[]);
    fs::write(config.library_path(Catalog::Sys, "bag"), b"").unwrap();
    let fake = FakeBenchmarker::new(
        config.results_dir(),
        vec![("bag-rc", RunProfile::RefCounted)],
    );
    let mut request = RunRequest::new("bag");
    request.catalog = Catalog::Sys;
    let outcome = Orchestrator::new(&config, &fake)
        .run_and_collect(&request)
        .expect("run");
    assert_eq!(outcome.csv_files.len(), 1);
    assert!(fake.calls.borrow()[0][4].ends_with("libbenchmarks-sys-bag.so"));
}

#[test]
fn test_no_csvs_gives_summary_hint() {
    let (_dir, config) = build_tree(&["gol"]);
    let fake = FakeBenchmarker::new(config.results_dir(), vec![]);
    let err = Orchestrator::new(&config, &fake)
        .run_and_collect(&RunRequest::new("gol"))
        .unwrap_err();
    match err {
        GcBenchError::NoCsvFilesFound { hint, available, .. } => {
            assert!(hint.contains("print_summary"));
            assert_eq!(available, vec!["libbenchmarks-con-gol.so".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_failed_run_is_best_effort_by_default() {
    let (_dir, config) = build_tree(&["gol"]);
    let mut fake = FakeBenchmarker::new(
        config.results_dir(),
        vec![("gol-trace", RunProfile::Tracing)],
    );
    fake.success = false;
    let outcome = Orchestrator::new(&config, &fake)
        .run_and_collect(&RunRequest::new("gol"))
        .expect("best effort");
    assert_eq!(outcome.output.code, Some(3));
    assert_eq!(outcome.csv_files.len(), 1);
}

#[test]
fn test_failed_run_is_fatal_when_strict() {
    let (_dir, config) = build_tree(&["gol"]);
    let mut fake = FakeBenchmarker::new(
        config.results_dir(),
        vec![("gol-trace", RunProfile::Tracing)],
    );
    fake.success = false;
    let err = Orchestrator::new(&config, &fake)
        .with_policy(ExitPolicy::Strict)
        .run_and_collect(&RunRequest::new("gol"))
        .unwrap_err();
    assert!(matches!(err, GcBenchError::BenchmarkFailed { code: Some(3) }));
}

#[test]
fn test_output_is_observed_before_missing_csv_error() {
    let (_dir, config) = build_tree(&["gol"]);
    let mut fake = FakeBenchmarker::new(config.results_dir(), vec![]);
    fake.success = false;
    let observer = RecordingObserver::default();
    let err = Orchestrator::new(&config, &fake)
        .with_observer(&observer)
        .run_and_collect(&RunRequest::new("gol"))
        .unwrap_err();
    assert!(matches!(err, GcBenchError::NoCsvFilesFound { .. }));
    assert_eq!(*observer.stderr.borrow(), vec!["bench log\n".to_string()]);
    let commands = observer.commands.borrow();
    assert_eq!(commands.len(), 1);
    assert!(commands[0][0].ends_with("benchmarker"));
    assert_eq!(commands[0][1], "--runs");
}

#[test]
fn test_output_is_observed_before_strict_failure() {
    let (_dir, config) = build_tree(&["gol"]);
    let mut fake = FakeBenchmarker::new(config.results_dir(), vec![]);
    fake.success = false;
    let observer = RecordingObserver::default();
    let err = Orchestrator::new(&config, &fake)
        .with_policy(ExitPolicy::Strict)
        .with_observer(&observer)
        .run_and_collect(&RunRequest::new("gol"))
        .unwrap_err();
    assert!(matches!(err, GcBenchError::BenchmarkFailed { code: Some(3) }));
    assert_eq!(observer.stderr.borrow().len(), 1);
}

#[test]
fn test_missing_library_launches_nothing() {
    let (_dir, config) = build_tree(&[]);
    let fake = FakeBenchmarker::new(config.results_dir(), vec![]);
    let observer = RecordingObserver::default();
    let _ = Orchestrator::new(&config, &fake)
        .with_observer(&observer)
        .run_and_collect(&RunRequest::new("gol"));
    assert!(observer.commands.borrow().is_empty());
    assert!(observer.stderr.borrow().is_empty());
}
