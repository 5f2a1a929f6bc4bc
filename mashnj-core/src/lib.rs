//! Assemble Mash pairwise distances into a labelled matrix and build
//! distance-based trees from it.
//!
//! - `io`: listing and parsing Mash `dist` output, matrix TSV output.
//! - `assemble`: symmetric pair index, sorted name set, dense matrix.
//! - `phylo`: distance matrix, neighbor joining / UPGMA, Newick and ASCII output.

#[macro_use]
mod par;

pub mod assemble;
pub mod error;
pub mod io;
pub mod phylo;

pub use assemble::{load_dir, AssembleOptions, AssembleReport, DistanceAssembler, MissingPolicy};
pub use error::{MashError, MashResult};
