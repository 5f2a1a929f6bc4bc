use crate::error::{MashError, MashResult};
use log::debug;

use super::distance::DistanceMatrix;

/// Distance-based tree construction method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeMethod {
    #[default]
    NeighborJoining,
    Upgma,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhyloNode {
    pub label: Option<Box<str>>,
    pub branch_length: Option<f64>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl PhyloNode {
    fn leaf(label: &str) -> Self {
        Self {
            label: Some(label.into()),
            branch_length: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-allocated tree. Leaves come first, in distance-matrix order,
/// followed by internal nodes in the order they were joined.
#[derive(Debug, Clone)]
pub struct PhyloTree {
    nodes: Vec<PhyloNode>,
    root: Option<usize>,
}

impl PhyloTree {
    fn with_leaves(labels: &[Box<str>]) -> Self {
        let mut nodes = Vec::with_capacity(2 * labels.len());
        nodes.extend(labels.iter().map(|l| PhyloNode::leaf(l)));
        Self { nodes, root: None }
    }

    /// Append an internal node over `children`, setting their branch lengths.
    fn join(&mut self, children: [(usize, f64); 2]) -> usize {
        let u = self.nodes.len();
        for (child, length) in children {
            self.nodes[child].parent = Some(u);
            self.nodes[child].branch_length = Some(length);
        }
        self.nodes.push(PhyloNode {
            label: None,
            branch_length: None,
            parent: None,
            children: children.iter().map(|&(c, _)| c).collect(),
        });
        u
    }

    /// `None` for unrooted (neighbor-joining) trees.
    pub fn root(&self) -> Option<usize> {
        self.root
    }

    /// Node that output starts from: the root, or for unrooted trees the
    /// last node joined.
    pub fn top(&self) -> usize {
        self.root
            .unwrap_or_else(|| self.nodes.len().saturating_sub(1))
    }

    pub fn node(&self, idx: usize) -> &PhyloNode {
        &self.nodes[idx]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub fn leaves(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_leaf())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn leaf_labels(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.label.as_deref().unwrap_or("").to_string())
            .collect()
    }

    pub fn nodes(&self) -> &[PhyloNode] {
        &self.nodes
    }

    /// Sum of branch lengths from `idx` up to the top node.
    pub fn depth(&self, mut idx: usize) -> f64 {
        let mut total = 0.0;
        while let Some(parent) = self.nodes[idx].parent {
            total += self.nodes[idx].branch_length.unwrap_or(0.0);
            idx = parent;
        }
        total
    }
}

/// Square scratch buffer sized for every node the tree can ever hold
/// (`2n - 1`), seeded with the input distances.
struct Workspace {
    cap: usize,
    d: Vec<f64>,
}

impl Workspace {
    fn new(dist: &DistanceMatrix) -> Self {
        let n = dist.n();
        let cap = 2 * n - 1;
        let mut d = vec![0.0f64; cap * cap];
        for i in 0..n {
            d[i * cap..i * cap + n].copy_from_slice(dist.row(i));
        }
        Self { cap, d }
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> f64 {
        self.d[i * self.cap + j]
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, val: f64) {
        self.d[i * self.cap + j] = val;
        self.d[j * self.cap + i] = val;
    }
}

/// First pair in scan order with the lowest score.
fn best_pair(active: &[usize], score: impl Fn(usize, usize) -> f64) -> (usize, usize) {
    let mut best = f64::INFINITY;
    let mut pair = (active[0], active[1]);
    for (ai, &i) in active.iter().enumerate() {
        for &j in &active[(ai + 1)..] {
            let s = score(i, j);
            if s < best {
                best = s;
                pair = (i, j);
            }
        }
    }
    pair
}

pub fn build_tree(dist: &DistanceMatrix, method: TreeMethod) -> MashResult<PhyloTree> {
    match method {
        TreeMethod::NeighborJoining => neighbor_joining(dist),
        TreeMethod::Upgma => upgma(dist),
    }
}

/// Saitou–Nei neighbor joining. Negative branch lengths are clamped to zero.
///
/// Joining stops at two clusters, which are then hung off an artificial top
/// node at the midpoint of the edge between them. The top node is therefore
/// bifurcating rather than the usual unrooted trifurcation, and
/// [`PhyloTree::root`] stays `None`.
pub fn neighbor_joining(dist: &DistanceMatrix) -> MashResult<PhyloTree> {
    let n = dist.n();
    if n < 2 {
        return Err(MashError::TooFewTaxa { n });
    }

    let mut tree = PhyloTree::with_leaves(dist.labels());
    let mut d = Workspace::new(dist);
    let mut active: Vec<usize> = (0..n).collect();
    let mut row_sum = vec![0.0f64; d.cap];

    while active.len() > 2 {
        let r = active.len() as f64;
        for &i in &active {
            row_sum[i] = active.iter().map(|&j| d.get(i, j)).sum();
        }

        let (i, j) = best_pair(&active, |i, j| {
            (r - 2.0) * d.get(i, j) - row_sum[i] - row_sum[j]
        });

        let dij = d.get(i, j);
        let li = dij / 2.0 + (row_sum[i] - row_sum[j]) / (2.0 * (r - 2.0));
        let lj = dij - li;
        let u = tree.join([(i, li.max(0.0)), (j, lj.max(0.0))]);

        for &k in &active {
            if k == i || k == j {
                continue;
            }
            let duk = (d.get(i, k) + d.get(j, k) - dij) / 2.0;
            d.set(u, k, duk);
        }

        active.retain(|&x| x != i && x != j);
        active.push(u);
    }

    let (a, b) = (active[0], active[1]);
    let half = (d.get(a, b) / 2.0).max(0.0);
    tree.join([(a, half), (b, half)]);

    debug!(
        "neighbor joining: {n} taxa, {} nodes",
        tree.num_nodes()
    );
    Ok(tree)
}

/// Average-linkage clustering. The result is rooted and ultrametric when
/// the input is.
pub fn upgma(dist: &DistanceMatrix) -> MashResult<PhyloTree> {
    let n = dist.n();
    if n < 2 {
        return Err(MashError::TooFewTaxa { n });
    }

    let mut tree = PhyloTree::with_leaves(dist.labels());
    let mut d = Workspace::new(dist);
    let mut active: Vec<usize> = (0..n).collect();
    let mut cluster_size = vec![1usize; d.cap];
    let mut heights = vec![0.0f64; d.cap];

    while active.len() > 1 {
        let (i, j) = best_pair(&active, |i, j| d.get(i, j));
        let h = d.get(i, j) / 2.0;
        let u = tree.join([(i, h - heights[i]), (j, h - heights[j])]);
        heights[u] = h;

        let si = cluster_size[i] as f64;
        let sj = cluster_size[j] as f64;
        cluster_size[u] = cluster_size[i] + cluster_size[j];

        for &k in &active {
            if k == i || k == j {
                continue;
            }
            let duk = (d.get(i, k) * si + d.get(j, k) * sj) / (si + sj);
            d.set(u, k, duk);
        }

        active.retain(|&x| x != i && x != j);
        active.push(u);
    }

    tree.root = Some(active[0]);
    debug!("upgma: {n} taxa, {} nodes", tree.num_nodes());
    Ok(tree)
}
