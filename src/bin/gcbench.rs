use std::{
    env, io,
    path::{Path, PathBuf},
    process,
};

use gcbench::{
    GcBenchError, HarnessConfig,
    cli::{CommandLineConfig, Invocation},
    config::comparison_image_path,
    discovery::find_csv_matching,
    labeling::{LabeledResults, StrategyClassifier, SubstringClassifier, TokenClassifier, label_files},
    orchestrator::{Orchestrator, ProcessOutput, RunObserver, SystemRunner},
    render::compose,
    report::{run_table, summary_json},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "GCBENCH_LOG";

/// Announces the benchmarker command and echoes whatever it printed.
struct ConsoleEcho;

impl RunObserver for ConsoleEcho {
    fn launching(&self, command: &[String]) {
        println!("Running: {}", command.join(" "));
    }

    fn finished(&self, output: &ProcessOutput) {
        print!("{}", output.stdout);
        eprint!("{}", output.stderr);
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    let config = match CommandLineConfig::from_args(&arg_refs) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("{}", CommandLineConfig::help());
            process::exit(1);
        }
    };
    if config.invocation == Invocation::Help {
        println!("{}", CommandLineConfig::help());
        return;
    }
    init_logging(config.verbose);

    if let Err(err) = run(&config) {
        eprintln!("error: {err}");
        if !err.available().is_empty() {
            eprintln!("available:");
            for name in err.available() {
                eprintln!("  {name}");
            }
        }
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(config: &CommandLineConfig) -> Result<(), GcBenchError> {
    let harness = HarnessConfig::resolve(config.root.as_deref());
    debug!(root = %harness.root.display(), "resolved project root");
    let (files, output_dir) = match &config.invocation {
        Invocation::Run(request) => {
            let outcome = Orchestrator::new(&harness, SystemRunner)
                .with_policy(config.exit_policy)
                .with_observer(&ConsoleEcho)
                .run_and_collect(request)?;
            (outcome.csv_files, outcome.results_dir)
        }
        Invocation::CsvFile(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            (vec![path.clone()], dir)
        }
        Invocation::CsvFragment(fragment) => {
            let dir = harness.results_dir();
            let files = find_csv_matching(&dir, fragment)?;
            if files.is_empty() {
                return Err(GcBenchError::NoCsvFilesFound {
                    dir,
                    hint: format!("no file name contains {fragment:?}"),
                    available: Vec::new(),
                });
            }
            (files, dir)
        }
        Invocation::Help => return Ok(()),
    };

    println!("Found {} CSV file(s)", files.len());
    let classifier: &dyn StrategyClassifier = if config.strict_labels {
        &TokenClassifier
    } else {
        &SubstringClassifier
    };
    let results = label_files(&files, classifier)?;
    for entry in &results {
        println!("\n{}", run_table(entry));
    }

    if config.summary_only {
        println!("{}", summary_json(&results)?);
        return Ok(());
    }
    draw(&results, config, &output_dir)
}

fn draw(
    results: &LabeledResults,
    config: &CommandLineConfig,
    output_dir: &Path,
) -> Result<(), GcBenchError> {
    let saved = compose(results, config.layout, &comparison_image_path(output_dir))?;
    println!("Saved: {}", saved.display());
    Ok(())
}
