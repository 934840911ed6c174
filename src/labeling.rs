//! Strategy classification and display labels for result sets.
//!
//! The strategy is read from the file name only. The default substring match
//! is coarse: a stem such as `search` classifies as `rc`.

use std::{fmt, path::PathBuf};

use ahash::{AHashMap, AHashSet};

use crate::{
    GcBenchError,
    record::{ResultSet, file_stem, parse_file},
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    Trace,
    Arena,
    Rc,
    Other(String),
}

impl Strategy {
    /// Label base before deduplication.
    pub fn base(&self) -> &str {
        match self {
            Strategy::Trace => "trace",
            Strategy::Arena => "arena",
            Strategy::Rc => "rc",
            Strategy::Other(stem) => stem,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Strategy::Other(_))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base())
    }
}

pub trait StrategyClassifier {
    fn classify(&self, stem: &str) -> Strategy;
}

/// Case-insensitive substring match, checked in trace, arena, rc order.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubstringClassifier;

impl StrategyClassifier for SubstringClassifier {
    fn classify(&self, stem: &str) -> Strategy {
        let lower = stem.to_lowercase();
        if lower.contains("trace") {
            Strategy::Trace
        } else if lower.contains("arena") {
            Strategy::Arena
        } else if lower.contains("rc") {
            Strategy::Rc
        } else {
            Strategy::Other(stem.to_string())
        }
    }
}

/// Matches whole tokens only, splitting the stem on `-`, `_`, `.` and spaces.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenClassifier;

impl StrategyClassifier for TokenClassifier {
    fn classify(&self, stem: &str) -> Strategy {
        let lower = stem.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| c == '-' || c == '_' || c == '.' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        let has = |name: &str| tokens.iter().any(|t| *t == name);
        if has("trace") {
            Strategy::Trace
        } else if has("arena") {
            Strategy::Arena
        } else if has("rc") {
            Strategy::Rc
        } else {
            Strategy::Other(stem.to_string())
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabeledResultSet {
    pub label: String,
    pub strategy: Strategy,
    pub results: ResultSet,
}

/// Insertion-ordered label → result set mapping with unique labels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabeledResults {
    entries: Vec<LabeledResultSet>,
}

impl LabeledResults {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabeledResultSet> {
        self.entries.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn get(&self, label: &str) -> Option<&ResultSet> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.results)
    }

    pub fn first(&self) -> Option<&LabeledResultSet> {
        self.entries.first()
    }
}

impl<'a> IntoIterator for &'a LabeledResults {
    type Item = &'a LabeledResultSet;
    type IntoIter = std::slice::Iter<'a, LabeledResultSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Assigns `base`, `base_2`, `base_3`, ... per strategy base.
///
/// A suffixed label that collides with one handed out earlier (an unclassified
/// stem literally named `foo_2`) moves on to the next count.
#[derive(Debug, Default)]
pub struct LabelAllocator {
    counts: AHashMap<String, usize>,
    used: AHashSet<String>,
}

impl LabelAllocator {
    pub fn next_label(&mut self, base: &str) -> String {
        let count = self.counts.entry(base.to_string()).or_insert(0);
        loop {
            *count += 1;
            let label = if *count == 1 {
                base.to_string()
            } else {
                format!("{base}_{count}")
            };
            if self.used.insert(label.clone()) {
                return label;
            }
        }
    }
}

/// Labels already-parsed sets. `sets` pairs each set with its file stem and
/// is processed in `<stem>.csv` order, matching [`label_files`].
pub fn label_sets<C: StrategyClassifier + ?Sized>(
    mut sets: Vec<(String, ResultSet)>,
    classifier: &C,
) -> LabeledResults {
    sets.sort_by_cached_key(|(stem, _)| format!("{stem}.csv"));
    let mut allocator = LabelAllocator::default();
    let entries = sets
        .into_iter()
        .map(|(stem, results)| {
            let strategy = classifier.classify(&stem);
            let label = allocator.next_label(strategy.base());
            LabeledResultSet {
                label,
                strategy,
                results,
            }
        })
        .collect();
    LabeledResults { entries }
}

/// Sorts `paths`, parses every file and labels the results.
pub fn label_files<C: StrategyClassifier + ?Sized>(
    paths: &[PathBuf],
    classifier: &C,
) -> Result<LabeledResults, GcBenchError> {
    let mut sorted = paths.to_vec();
    sorted.sort();
    let mut allocator = LabelAllocator::default();
    let mut entries = Vec::with_capacity(sorted.len());
    for path in sorted {
        let results = parse_file(&path)?;
        let strategy = classifier.classify(&file_stem(&path));
        let label = allocator.next_label(strategy.base());
        entries.push(LabeledResultSet {
            label,
            strategy,
            results,
        });
    }
    Ok(LabeledResults { entries })
}
