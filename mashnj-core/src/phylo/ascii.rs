//! Plain-text tree drawing.
//!
//! ```text
//!           /-A
//! ---------|
//!          |          /-B
//!           \--------|
//!                     \-C
//! ```
//!
//! Topology only: every level is indented by the same width regardless of
//! branch length. Branch lengths are in the Newick output.

use super::tree::PhyloTree;

const INDENT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsciiOptions {
    /// Drop the blank spacer line between sibling subtrees.
    pub compact: bool,
}

pub fn to_ascii(tree: &PhyloTree) -> String {
    to_ascii_with(tree, AsciiOptions::default())
}

pub fn to_ascii_with(tree: &PhyloTree, opts: AsciiOptions) -> String {
    if tree.num_nodes() == 0 {
        return String::new();
    }
    let (lines, _) = render(tree, tree.top(), '-', opts);
    lines.join("\n")
}

/// Lines for the subtree at `idx` and the row its stem attaches to.
fn render(tree: &PhyloTree, idx: usize, connector: char, opts: AsciiOptions) -> (Vec<String>, usize) {
    let node = tree.node(idx);
    let name = node.label.as_deref().unwrap_or("");

    if node.is_leaf() {
        return (vec![format!("{connector}-{name}")], 0);
    }

    let last = node.children.len() - 1;
    let mut lines: Vec<String> = Vec::new();
    let mut mids = Vec::with_capacity(node.children.len());

    for (k, &child) in node.children.iter().enumerate() {
        let c = match k {
            0 => '/',
            k if k == last => '\\',
            _ => '-',
        };
        let (child_lines, child_mid) = render(tree, child, c, opts);
        mids.push(lines.len() + child_mid);
        lines.extend(child_lines);
        if !opts.compact {
            lines.push(String::new());
        }
    }
    if !opts.compact {
        lines.pop();
    }

    let lo = mids[0];
    let hi = mids[mids.len() - 1];
    let mid = (lo + hi) / 2;

    for (row, line) in lines.iter_mut().enumerate() {
        let bar = if row > lo && row < hi { '|' } else { ' ' };
        let prefix = if row == mid {
            let mut stem = String::with_capacity(INDENT);
            stem.push(connector);
            stem.push_str(&"-".repeat(INDENT - 2));
            stem.push(bar);
            stem
        } else {
            let mut pad = " ".repeat(INDENT - 1);
            pad.push(bar);
            pad
        };
        line.insert_str(0, &prefix);
    }

    if !name.is_empty() {
        let stem = &lines[mid];
        let mut labelled: String = stem.chars().take(1).collect();
        labelled.push_str(name);
        labelled.extend(stem.chars().skip(name.chars().count() + 1));
        lines[mid] = labelled;
    }

    (lines, mid)
}
