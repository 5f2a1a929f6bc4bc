use crate::error::{MashError, MashResult};
use crate::phylo::DistanceMatrix;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a labelled square matrix as TSV: a header row with an empty
/// leading cell and the labels, then one row per label.
pub fn write_matrix_tsv<W: Write>(mut out: W, dm: &DistanceMatrix) -> MashResult<()> {
    for label in dm.labels() {
        write!(out, "\t{label}")?;
    }
    writeln!(out)?;

    for (label, row) in dm.labels().iter().zip(dm.rows()) {
        write!(out, "{label}")?;
        for val in row {
            write!(out, "\t{val}")?;
        }
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}

pub fn write_matrix_tsv_path(path: impl AsRef<Path>, dm: &DistanceMatrix) -> MashResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| MashError::FileWrite {
        path: path.display().to_string(),
        source,
    })?;
    write_matrix_tsv(BufWriter::new(file), dm)
}
