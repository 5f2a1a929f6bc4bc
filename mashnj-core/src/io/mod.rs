pub mod mash;
pub mod matrix;

pub use mash::{list_distance_files, parse_mash_reader, read_mash_file, PairwiseDistance};
pub use matrix::{write_matrix_tsv, write_matrix_tsv_path};

/// What to do with a malformed line in a distance file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnError {
    #[default]
    Raise,
    Skip,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedRecord {
    pub path: Box<str>,
    pub line: u64,
    pub message: Box<str>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReadReport<T> {
    pub data: T,
    pub skipped: Vec<SkippedRecord>,
}
