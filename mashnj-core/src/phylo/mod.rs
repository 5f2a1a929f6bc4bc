pub mod ascii;
pub mod distance;
pub mod newick;
pub mod tree;

pub use ascii::{to_ascii, to_ascii_with, AsciiOptions};
pub use distance::DistanceMatrix;
pub use newick::{to_newick, to_newick_with_precision, DEFAULT_PRECISION};
pub use tree::{build_tree, neighbor_joining, upgma, PhyloNode, PhyloTree, TreeMethod};
