//! Build-tree layout of the GC test harness.
//!
//! Everything that depends on the host platform is resolved once into a
//! [`HarnessConfig`] and passed to the orchestrator and discovery code.

use std::{
    env,
    path::{Path, PathBuf},
};

pub const ROOT_ENV: &str = "GCBENCH_ROOT";
pub const COMPARISON_FILE: &str = "benchmark_comparison.png";

/// Which family of workload libraries to load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Catalog {
    #[default]
    Con,
    Sys,
}

impl Catalog {
    pub fn as_str(self) -> &'static str {
        match self {
            Catalog::Con => "con",
            Catalog::Sys => "sys",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarnessConfig {
    pub root: PathBuf,
    pub build_dir_name: String,
    pub executable_name: String,
    pub library_extension: String,
}

impl HarnessConfig {
    /// Layout for the platform this binary was compiled for.
    pub fn for_host(root: impl Into<PathBuf>) -> Self {
        if cfg!(windows) {
            Self::windows(root)
        } else {
            Self::unix(root)
        }
    }

    pub fn unix(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            build_dir_name: "build_ninja".into(),
            executable_name: "benchmarker".into(),
            library_extension: ".so".into(),
        }
    }

    pub fn windows(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            build_dir_name: "build".into(),
            executable_name: "benchmarker.exe".into(),
            library_extension: ".dll".into(),
        }
    }

    /// Root from an explicit flag, then `GCBENCH_ROOT`, then the working directory.
    pub fn resolve(root_flag: Option<&Path>) -> Self {
        let root = root_flag
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(ROOT_ENV).map(PathBuf::from))
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::for_host(root)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(&self.build_dir_name)
    }

    pub fn executable_path(&self) -> PathBuf {
        self.build_dir()
            .join("src")
            .join("benchmarker")
            .join(&self.executable_name)
    }

    pub fn library_dir(&self) -> PathBuf {
        self.build_dir().join("test").join("benchmarks")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.build_dir().join("CSVs")
    }

    pub fn library_file_name(&self, catalog: Catalog, workload: &str) -> String {
        format!(
            "libbenchmarks-{}-{workload}{}",
            catalog.as_str(),
            self.library_extension
        )
    }

    pub fn library_path(&self, catalog: Catalog, workload: &str) -> PathBuf {
        self.library_dir()
            .join(self.library_file_name(catalog, workload))
    }
}

/// Where the comparison image for CSVs in `dir` is written.
pub fn comparison_image_path(dir: &Path) -> PathBuf {
    dir.join(COMPARISON_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_layout() {
        let cfg = HarnessConfig::unix("/repo");
        assert_eq!(
            cfg.executable_path(),
            PathBuf::from("/repo/build_ninja/src/benchmarker/benchmarker")
        );
        assert_eq!(
            cfg.library_path(Catalog::Sys, "bag"),
            PathBuf::from("/repo/build_ninja/test/benchmarks/libbenchmarks-sys-bag.so")
        );
        assert_eq!(cfg.results_dir(), PathBuf::from("/repo/build_ninja/CSVs"));
    }

    #[test]
    fn windows_layout() {
        let cfg = HarnessConfig::windows("C:/repo");
        assert_eq!(cfg.build_dir_name, "build");
        assert_eq!(cfg.library_file_name(Catalog::Con, "gol"), "libbenchmarks-con-gol.dll");
    }

    #[test]
    fn explicit_root_wins() {
        let cfg = HarnessConfig::resolve(Some(Path::new("/explicit")));
        assert_eq!(cfg.root, PathBuf::from("/explicit"));
    }
}
