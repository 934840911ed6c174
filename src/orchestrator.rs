//! Launching the benchmarker and collecting the CSVs it leaves behind.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{info, warn};

use crate::{
    GcBenchError,
    config::{Catalog, HarnessConfig},
    discovery::{list_csv_files, list_names_matching, remove_stale_csvs},
};

const SUMMARY_HINT: &str = "make sure the test uses GCBenchmark::print_summary()";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunRequest {
    pub runs: u64,
    pub warmup_runs: u64,
    pub workload: String,
    pub catalog: Catalog,
    pub extra_args: Vec<String>,
}

impl RunRequest {
    pub fn new<T: Into<String>>(workload: T) -> Self {
        Self {
            runs: 1,
            warmup_runs: 1,
            workload: workload.into(),
            catalog: Catalog::Con,
            extra_args: Vec::new(),
        }
    }

    /// Arguments passed to the benchmarker, library path included.
    pub fn command_args(&self, library: &Path) -> Vec<String> {
        let mut args = vec![
            "--runs".to_string(),
            self.runs.to_string(),
            "--warmup_runs".to_string(),
            self.warmup_runs.to_string(),
            library.display().to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// How a non-zero benchmarker exit is treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Log it and go on to read whatever CSVs were written.
    #[default]
    BestEffort,
    /// Fail with [`GcBenchError::BenchmarkFailed`].
    Strict,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

pub trait ProcessRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, GcBenchError>;
}

/// Runs the program to completion with captured output.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, GcBenchError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| GcBenchError::io(format!("unable to run {}: {e}", program.display())))?;
        Ok(ProcessOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Sees the command line before launch and the captured output as soon as
/// the process exits, ahead of the exit policy and CSV checks.
pub trait RunObserver {
    fn launching(&self, command: &[String]);
    fn finished(&self, output: &ProcessOutput);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Quiet;

impl RunObserver for Quiet {
    fn launching(&self, _command: &[String]) {}
    fn finished(&self, _output: &ProcessOutput) {}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub command: Vec<String>,
    pub output: ProcessOutput,
    pub results_dir: PathBuf,
    pub csv_files: Vec<PathBuf>,
}

pub struct Orchestrator<'a, R> {
    config: &'a HarnessConfig,
    runner: R,
    policy: ExitPolicy,
    observer: &'a dyn RunObserver,
}

impl<'a, R> Orchestrator<'a, R>
where
    R: ProcessRunner,
{
    pub fn new(config: &'a HarnessConfig, runner: R) -> Self {
        Self {
            config,
            runner,
            policy: ExitPolicy::default(),
            observer: &Quiet,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn RunObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_policy(mut self, policy: ExitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ExitPolicy {
        self.policy
    }

    pub fn resolve_executable(&self) -> Result<PathBuf, GcBenchError> {
        let path = self.config.executable_path();
        if path.is_file() {
            return Ok(path);
        }
        let available = path
            .parent()
            .map(|dir| list_names_matching(dir, "benchmarker", ""))
            .unwrap_or_default();
        Err(GcBenchError::MissingExecutable { path, available })
    }

    pub fn resolve_library(&self, catalog: Catalog, workload: &str) -> Result<PathBuf, GcBenchError> {
        let path = self.config.library_path(catalog, workload);
        if path.is_file() {
            return Ok(path);
        }
        Err(GcBenchError::MissingWorkloadLibrary {
            path,
            available: self.available_libraries(catalog),
        })
    }

    /// Workload libraries of `catalog` present in the build tree.
    pub fn available_libraries(&self, catalog: Catalog) -> Vec<String> {
        list_names_matching(
            &self.config.library_dir(),
            &format!("benchmarks-{}-", catalog.as_str()),
            &self.config.library_extension,
        )
    }

    pub fn run_and_collect(&self, request: &RunRequest) -> Result<RunOutcome, GcBenchError> {
        let executable = self.resolve_executable()?;
        let library = self.resolve_library(request.catalog, &request.workload)?;
        let results_dir = self.config.results_dir();
        let removed = remove_stale_csvs(&results_dir)?;
        if removed > 0 {
            info!(removed, dir = %results_dir.display(), "deleted previous csv files");
        }

        let args = request.command_args(&library);
        let mut command = vec![executable.display().to_string()];
        command.extend(args.iter().cloned());
        info!(command = %command.join(" "), "running benchmark");
        self.observer.launching(&command);
        let output = self.runner.run(&executable, &args)?;
        self.observer.finished(&output);
        if !output.success {
            match self.policy {
                ExitPolicy::BestEffort => {
                    warn!(code = ?output.code, "benchmark exited unsuccessfully, reading results anyway")
                }
                ExitPolicy::Strict => {
                    return Err(GcBenchError::BenchmarkFailed { code: output.code });
                }
            }
        }

        let csv_files = list_csv_files(&results_dir)?;
        if csv_files.is_empty() {
            return Err(GcBenchError::NoCsvFilesFound {
                dir: results_dir,
                hint: SUMMARY_HINT.to_string(),
                available: self.available_libraries(request.catalog),
            });
        }
        info!(count = csv_files.len(), "collected csv files");
        Ok(RunOutcome {
            command,
            output,
            results_dir,
            csv_files,
        })
    }
}
