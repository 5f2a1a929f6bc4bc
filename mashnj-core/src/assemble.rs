//! Turn pairwise distance records into a dense, name-ordered matrix.
//!
//! Pairs are unordered: `(a, b)` and `(b, a)` are the same key, stored with
//! the smaller name first. A later record for the same pair replaces the
//! earlier one. Self pairs register the name but never a distance, so the
//! diagonal is always zero.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::{MashError, MashResult};
use crate::io::mash::{list_distance_files, read_mash_file, PairwiseDistance};
use crate::io::{OnError, SkippedRecord};
use crate::phylo::DistanceMatrix;

/// How to fill an off-diagonal cell whose pair never appeared in the input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Use 0, the same value as the diagonal. An unmeasured pair is then
    /// indistinguishable from two identical genomes.
    #[default]
    Zero,
    /// Fail on the first unmeasured pair in row-major order.
    Error,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssembleOptions {
    pub on_error: OnError,
    pub missing: MissingPolicy,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PairKey(Box<str>, Box<str>);

impl PairKey {
    fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.into(), b.into())
        } else {
            Self(b.into(), a.into())
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DistanceAssembler {
    index: HashMap<PairKey, f64>,
    names: BTreeSet<Box<str>>,
}

impl DistanceAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pair: &PairwiseDistance) {
        self.names.insert(pair.reference.clone());
        self.names.insert(pair.query.clone());
        if !pair.is_self_pair() {
            self.index
                .insert(PairKey::new(&pair.reference, &pair.query), pair.distance);
        }
    }

    pub fn extend<'a>(&mut self, pairs: impl IntoIterator<Item = &'a PairwiseDistance>) {
        for pair in pairs {
            self.insert(pair);
        }
    }

    /// Recorded distance for the unordered pair, if any. Self pairs are
    /// never recorded.
    pub fn distance(&self, a: &str, b: &str) -> Option<f64> {
        self.index.get(&PairKey::new(a, b)).copied()
    }

    pub fn num_names(&self) -> usize {
        self.names.len()
    }

    pub fn num_pairs(&self) -> usize {
        self.index.len()
    }

    /// Every name seen in either column, strictly increasing.
    pub fn sorted_names(&self) -> Vec<Box<str>> {
        self.names.iter().cloned().collect()
    }

    /// Off-diagonal unordered pairs with no recorded distance.
    pub fn num_unmeasured(&self) -> usize {
        let n = self.names.len();
        n * n.saturating_sub(1) / 2 - self.index.len()
    }

    pub fn build_matrix(&self, missing: MissingPolicy) -> MashResult<DistanceMatrix> {
        let names = self.sorted_names();

        match missing {
            MissingPolicy::Error => {
                if let Some((a, b)) = self.first_unmeasured(&names) {
                    return Err(MashError::UnmeasuredPair {
                        a: a.to_string(),
                        b: b.to_string(),
                    });
                }
            }
            MissingPolicy::Zero => {
                let unmeasured = self.num_unmeasured();
                if unmeasured > 0 {
                    warn!("{unmeasured} genome pairs have no distance; using 0");
                }
            }
        }

        let indices: Vec<usize> = (0..names.len()).collect();
        let rows: Vec<Vec<f64>> = par_map!(&indices, |&i| self.build_row(&names, i));
        let data = rows.into_iter().flatten().collect();
        Ok(DistanceMatrix::new(names, data))
    }

    /// First off-diagonal cell in row-major order with no recorded distance.
    /// Scanning the upper triangle suffices: a missing `(j, i)` below the
    /// diagonal was already seen as `(i, j)` in an earlier row.
    fn first_unmeasured<'a>(&self, names: &'a [Box<str>]) -> Option<(&'a str, &'a str)> {
        names.iter().enumerate().find_map(|(i, a)| {
            names[i + 1..]
                .iter()
                .find(|b| self.distance(a, b).is_none())
                .map(|b| (&**a, &**b))
        })
    }

    fn build_row(&self, names: &[Box<str>], i: usize) -> Vec<f64> {
        let a = &names[i];
        names
            .iter()
            .enumerate()
            .map(|(j, b)| {
                if i == j {
                    0.0
                } else {
                    self.distance(a, b).unwrap_or(0.0)
                }
            })
            .collect()
    }
}

/// Outcome of loading a directory of distance files.
#[derive(Clone, Debug)]
pub struct AssembleReport {
    pub assembler: DistanceAssembler,
    pub files: Vec<PathBuf>,
    pub records: usize,
    pub skipped: Vec<SkippedRecord>,
    /// Policy from the options the directory was loaded with.
    pub missing: MissingPolicy,
}

impl AssembleReport {
    /// Matrix under the policy given to [`load_dir`].
    pub fn matrix(&self) -> MashResult<DistanceMatrix> {
        self.assembler.build_matrix(self.missing)
    }

    pub fn build_matrix(&self, missing: MissingPolicy) -> MashResult<DistanceMatrix> {
        self.assembler.build_matrix(missing)
    }
}

/// Read every file in `dir` and fold the records in file-name order.
///
/// Files may be parsed in parallel, but records are always applied in
/// sorted order, so a pair found in several files takes its distance from
/// the file that sorts last.
pub fn load_dir(dir: impl AsRef<Path>, opts: &AssembleOptions) -> MashResult<AssembleReport> {
    let dir = dir.as_ref();
    let files = list_distance_files(dir)?;
    let on_error = opts.on_error;

    // Collected per file so the error reported is the first in file order.
    let reports: Vec<MashResult<_>> =
        par_map!(&files, |path: &PathBuf| read_mash_file(path, on_error));

    let mut assembler = DistanceAssembler::new();
    let mut records = 0usize;
    let mut skipped = Vec::new();
    for report in reports {
        let report = report?;
        records += report.data.len();
        assembler.extend(&report.data);
        skipped.extend(report.skipped);
    }

    info!(
        "read {records} distances for {} genomes from {} files in {}",
        assembler.num_names(),
        files.len(),
        dir.display()
    );
    if !skipped.is_empty() {
        warn!("skipped {} malformed lines", skipped.len());
    }

    Ok(AssembleReport {
        assembler,
        files,
        records,
        skipped,
        missing: opts.missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pair(a: &str, b: &str, d: f64) -> PairwiseDistance {
        PairwiseDistance::new(a, b, d)
    }

    fn write_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    #[test]
    fn two_file_example() {
        let dir = write_dir(&[
            ("a.tsv", "G1\tG2\t0.001\t0\t900/1000\n"),
            ("b.tsv", "G2\tG3\t0.002\t0\t800/1000\n"),
        ]);
        let report = load_dir(dir.path(), &AssembleOptions::default()).unwrap();
        let dm = report.build_matrix(MissingPolicy::Zero).unwrap();

        let labels: Vec<&str> = dm.labels().iter().map(|l| &**l).collect();
        assert_eq!(labels, vec!["G1", "G2", "G3"]);
        assert_eq!(
            dm.to_rows(),
            vec![
                vec![0.0, 0.001, 0.0],
                vec![0.001, 0.0, 0.002],
                vec![0.0, 0.002, 0.0],
            ]
        );
        assert_eq!(report.records, 2);
        assert_eq!(report.files.len(), 2);
    }

    #[test]
    fn unmeasured_pair_reads_as_zero_like_diagonal() {
        let mut asm = DistanceAssembler::new();
        asm.extend(&[pair("G1", "G2", 0.1), pair("G2", "G4", 0.2)]);
        let dm = asm.build_matrix(MissingPolicy::Zero).unwrap();

        let g1 = dm.index_of("G1").unwrap();
        let g4 = dm.index_of("G4").unwrap();
        // Missing measurement and self-distance look the same.
        assert_eq!(dm.get(g1, g4), 0.0);
        assert_eq!(dm.get(g1, g4), dm.get(g1, g1));
        assert_eq!(asm.num_unmeasured(), 1);
    }

    #[test]
    fn unmeasured_pair_can_be_fatal() {
        let mut asm = DistanceAssembler::new();
        asm.extend(&[pair("G1", "G2", 0.1), pair("G2", "G4", 0.2)]);
        let err = asm.build_matrix(MissingPolicy::Error).unwrap_err();
        match err {
            MashError::UnmeasuredPair { a, b } => {
                assert_eq!(a, "G1");
                assert_eq!(b, "G4");
            }
            other => panic!("expected unmeasured pair error, got {other:?}"),
        }
    }

    #[test]
    fn complete_input_passes_error_policy() {
        let mut asm = DistanceAssembler::new();
        asm.extend(&[pair("a", "b", 1.0), pair("c", "a", 2.0), pair("b", "c", 3.0)]);
        let dm = asm.build_matrix(MissingPolicy::Error).unwrap();
        assert_eq!(dm.between("a", "c"), Some(2.0));
        assert_eq!(asm.num_unmeasured(), 0);
    }

    #[test]
    fn orientation_does_not_matter() {
        let mut asm = DistanceAssembler::new();
        asm.insert(&pair("zeta", "alpha", 0.3));
        assert_eq!(asm.distance("alpha", "zeta"), Some(0.3));
        assert_eq!(asm.distance("zeta", "alpha"), Some(0.3));
        assert_eq!(asm.num_pairs(), 1);
    }

    #[test]
    fn last_write_wins_across_orientations() {
        let mut asm = DistanceAssembler::new();
        asm.insert(&pair("a", "b", 0.1));
        asm.insert(&pair("b", "a", 0.4));
        assert_eq!(asm.distance("a", "b"), Some(0.4));
        assert_eq!(asm.num_pairs(), 1);
    }

    #[test]
    fn self_pairs_stay_off_the_diagonal() {
        let mut asm = DistanceAssembler::new();
        asm.extend(&[pair("a", "a", 0.7), pair("a", "b", 0.2)]);
        assert_eq!(asm.distance("a", "a"), None);
        let dm = asm.build_matrix(MissingPolicy::Error).unwrap();
        assert_eq!(dm.get(0, 0), 0.0);
        assert_eq!(dm.get(1, 1), 0.0);
    }

    #[test]
    fn self_pair_alone_registers_name() {
        let mut asm = DistanceAssembler::new();
        asm.insert(&pair("solo", "solo", 0.0));
        assert_eq!(asm.sorted_names(), vec![Box::<str>::from("solo")]);
        let dm = asm.build_matrix(MissingPolicy::Error).unwrap();
        assert_eq!(dm.data(), &[0.0]);
    }

    #[test]
    fn later_file_wins_for_duplicate_pair() {
        let dir = write_dir(&[
            ("b.tsv", "x\ty\t0.9\t0\t1/1000\n"),
            ("a.tsv", "y\tx\t0.1\t0\t999/1000\n"),
        ]);
        let report = load_dir(dir.path(), &AssembleOptions::default()).unwrap();
        assert_eq!(report.assembler.distance("x", "y"), Some(0.9));
    }

    #[test]
    fn empty_dir_gives_empty_matrix() {
        let dir = write_dir(&[]);
        let report = load_dir(dir.path(), &AssembleOptions::default()).unwrap();
        let dm = report.build_matrix(MissingPolicy::Zero).unwrap();
        assert!(dm.is_empty());
        assert!(report.files.is_empty());
    }

    #[test]
    fn malformed_line_aborts_by_default() {
        let dir = write_dir(&[("a.tsv", "a\tb\t0.1\nbad line\n")]);
        let err = load_dir(dir.path(), &AssembleOptions::default()).unwrap_err();
        assert!(matches!(err, MashError::MissingField { line: 2, .. }));
    }

    #[test]
    fn malformed_line_skipped_on_request() {
        let dir = write_dir(&[("a.tsv", "a\tb\t0.1\nc\td\toops\n")]);
        let opts = AssembleOptions {
            on_error: OnError::Skip,
            ..AssembleOptions::default()
        };
        let report = load_dir(dir.path(), &opts).unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.assembler.num_names(), 2);
        assert!(report.skipped[0].path.ends_with("a.tsv"));
    }

    #[test]
    fn report_keeps_missing_policy() {
        let dir = write_dir(&[("a.tsv", "G1\tG2\t0.1\nG2\tG4\t0.2\n")]);
        let lenient = load_dir(dir.path(), &AssembleOptions::default()).unwrap();
        assert_eq!(lenient.matrix().unwrap().n(), 3);

        let strict = AssembleOptions {
            missing: MissingPolicy::Error,
            ..AssembleOptions::default()
        };
        let report = load_dir(dir.path(), &strict).unwrap();
        assert_eq!(report.missing, MissingPolicy::Error);
        assert!(matches!(
            report.matrix(),
            Err(MashError::UnmeasuredPair { .. })
        ));
    }

    #[test]
    fn loading_twice_is_identical() {
        let dir = write_dir(&[
            ("1.tsv", "c\ta\t0.25\t0\t1/1\nb\ta\t0.5\t0\t1/1\n"),
            ("2.tsv", "b\tc\t0.125\t0\t1/1\n"),
        ]);
        let opts = AssembleOptions::default();
        let first = load_dir(dir.path(), &opts)
            .unwrap()
            .build_matrix(MissingPolicy::Zero)
            .unwrap();
        let second = load_dir(dir.path(), &opts)
            .unwrap()
            .build_matrix(MissingPolicy::Zero)
            .unwrap();
        assert_eq!(first.labels(), second.labels());
        let bits = |dm: &DistanceMatrix| dm.data().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn name() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_.]{1,8}"
    }

    fn records() -> impl Strategy<Value = Vec<(String, String, f64)>> {
        prop::collection::vec((name(), name(), 0.0f64..1.0), 0..40)
    }

    proptest! {
        #[test]
        fn matrix_invariants(recs in records()) {
            let mut asm = DistanceAssembler::new();
            for (a, b, d) in &recs {
                asm.insert(&PairwiseDistance::new(a, b, *d));
            }
            let dm = asm.build_matrix(MissingPolicy::Zero).unwrap();
            let labels = dm.labels();

            // Names strictly increasing and exactly the names seen.
            prop_assert!(labels.windows(2).all(|w| w[0] < w[1]));
            let mut seen: Vec<&str> = recs
                .iter()
                .flat_map(|(a, b, _)| [a.as_str(), b.as_str()])
                .collect();
            seen.sort_unstable();
            seen.dedup();
            let got: Vec<&str> = labels.iter().map(|l| &**l).collect();
            prop_assert_eq!(got, seen);

            for i in 0..dm.n() {
                prop_assert_eq!(dm.get(i, i), 0.0);
            }
            prop_assert!(dm.is_symmetric());

            // The last record for each unordered pair lands at (i, j) and (j, i).
            let mut last: HashMap<PairKey, f64> = HashMap::new();
            for (a, b, d) in &recs {
                if a != b {
                    last.insert(PairKey::new(a, b), *d);
                }
            }
            for (key, d) in &last {
                let i = dm.index_of(&key.0).unwrap();
                let j = dm.index_of(&key.1).unwrap();
                prop_assert_eq!(dm.get(i, j), *d);
                prop_assert_eq!(dm.get(j, i), *d);
            }
        }
    }
}
