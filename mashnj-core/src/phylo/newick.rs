use std::fmt::Write;

use super::tree::PhyloTree;

/// Digits after the decimal point used by [`to_newick`]. Mash distances
/// between close genomes sit around 1e-3, so fewer digits lose the tree.
pub const DEFAULT_PRECISION: usize = 8;

pub fn to_newick(tree: &PhyloTree) -> String {
    to_newick_with_precision(tree, DEFAULT_PRECISION)
}

pub fn to_newick_with_precision(tree: &PhyloTree, precision: usize) -> String {
    let mut s = String::new();
    if tree.num_nodes() > 0 {
        write_subtree(tree, tree.top(), precision, &mut s);
    }
    s.push(';');
    s
}

fn needs_quoting(label: &str) -> bool {
    label.chars().any(|ch| {
        ch.is_whitespace() || matches!(ch, ':' | ',' | '(' | ')' | ';' | '[' | ']' | '\'')
    })
}

fn write_label(out: &mut String, label: &str) {
    if label.is_empty() {
        return;
    }
    if !needs_quoting(label) {
        out.push_str(label);
        return;
    }
    out.push('\'');
    out.push_str(&label.replace('\'', "''"));
    out.push('\'');
}

fn write_subtree(tree: &PhyloTree, idx: usize, precision: usize, out: &mut String) {
    let node = tree.node(idx);

    if !node.is_leaf() {
        out.push('(');
        for (i, &child) in node.children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_subtree(tree, child, precision, out);
            if let Some(bl) = tree.node(child).branch_length {
                // writing to a String cannot fail
                let _ = write!(out, ":{bl:.precision$}");
            }
        }
        out.push(')');
    }

    if let Some(label) = &node.label {
        write_label(out, label);
    }
}
