//! Reader for Mash `dist` output.
//!
//! Each line is tab-separated:
//!
//! ```text
//! <reference>\t<query>\t<distance>\t<p-value>\t<shared-hashes>
//! ```
//!
//! Only the first three fields are read. Anything after the distance is
//! ignored, including a missing p-value or hash count.

use crate::error::{MashError, MashResult};
use crate::io::{OnError, ReadReport, SkippedRecord};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq)]
pub struct PairwiseDistance {
    pub reference: Box<str>,
    pub query: Box<str>,
    pub distance: f64,
}

impl PairwiseDistance {
    pub fn new(reference: &str, query: &str, distance: f64) -> Self {
        Self {
            reference: reference.into(),
            query: query.into(),
            distance,
        }
    }

    pub fn is_self_pair(&self) -> bool {
        self.reference == self.query
    }
}

/// Regular files directly inside `dir`, sorted by name.
///
/// The order matters: when a pair occurs in more than one file, the file
/// that sorts last supplies its distance.
pub fn list_distance_files(dir: impl AsRef<Path>) -> MashResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let dir_err = |source: io::Error| MashError::DirRead {
        path: dir.display().to_string(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(dir_err)? {
        let path = entry.map_err(dir_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    debug!("found {} distance files in {}", files.len(), dir.display());
    Ok(files)
}

pub fn read_mash_file(
    path: impl AsRef<Path>,
    on_error: OnError,
) -> MashResult<ReadReport<Vec<PairwiseDistance>>> {
    let path_ref = path.as_ref();
    let path_str = path_ref.display().to_string();
    let file = File::open(path_ref).map_err(|source| MashError::FileRead {
        path: path_str.clone(),
        source,
    })?;
    let report = parse_mash_reader(file, &path_str, on_error)?;
    debug!(
        "{path_str}: {} distances, {} skipped",
        report.data.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Parse Mash distance lines from any reader. `source` names the input in
/// errors and skip reports.
///
/// A blank line between records is malformed like any other short line.
pub fn parse_mash_reader<R: io::Read>(
    reader: R,
    source: &str,
    on_error: OnError,
) -> MashResult<ReadReport<Vec<PairwiseDistance>>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut data = Vec::new();
    let mut skipped = Vec::new();
    let mut prev_line = 0u64;

    for result in reader.records() {
        let record = result.map_err(|e| MashError::TsvParse {
            path: source.to_string(),
            source: e,
        })?;
        let line = record.position().map_or(0, |p| p.line());

        // csv drops empty lines silently; a gap in line numbers is one.
        for blank in (prev_line + 1)..line {
            let err = MashError::MissingField {
                path: source.to_string(),
                line: blank,
                field: "query",
                found: 0,
            };
            reject(err, source, blank, on_error, &mut skipped)?;
        }
        prev_line = prev_line.max(line);

        match parse_record(&record, source, line) {
            Ok(pair) => data.push(pair),
            Err(err) => reject(err, source, line, on_error, &mut skipped)?,
        }
    }

    Ok(ReadReport { data, skipped })
}

fn reject(
    err: MashError,
    source: &str,
    line: u64,
    on_error: OnError,
    skipped: &mut Vec<SkippedRecord>,
) -> MashResult<()> {
    match on_error {
        OnError::Raise => Err(err),
        OnError::Skip => {
            warn!("skipping malformed line: {err}");
            skipped.push(SkippedRecord {
                path: source.into(),
                line,
                message: err.to_string().into_boxed_str(),
            });
            Ok(())
        }
    }
}

fn parse_record(record: &StringRecord, path: &str, line: u64) -> MashResult<PairwiseDistance> {
    let field = move |idx: usize, name: &'static str| {
        record.get(idx).ok_or_else(|| MashError::MissingField {
            path: path.to_string(),
            line,
            field: name,
            found: record.len(),
        })
    };

    let reference = field(0, "reference")?;
    let query = field(1, "query")?;
    let raw = field(2, "distance")?;
    let distance = raw
        .trim()
        .parse::<f64>()
        .map_err(|source| MashError::InvalidDistance {
            path: path.to_string(),
            line,
            value: raw.to_string(),
            source,
        })?;

    Ok(PairwiseDistance::new(reference, query, distance))
}
