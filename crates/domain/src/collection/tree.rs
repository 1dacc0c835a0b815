//! Display tree projected from the flat item map.

use serde::Serialize;

use super::item::Item;

/// A node of the display tree. Requests never have children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    /// The item at this position.
    #[serde(flatten)]
    pub item: Item,
    /// Sorted children, empty for requests.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including the node itself.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Self::size).sum::<usize>()
    }
}

/// Collects ids in pre-order (node, then its children in order).
#[must_use]
pub fn flatten_ids(nodes: &[TreeNode]) -> Vec<String> {
    fn walk(nodes: &[TreeNode], out: &mut Vec<String>) {
        for node in nodes {
            out.push(node.item.id().to_string());
            walk(&node.children, out);
        }
    }

    let mut out = Vec::new();
    walk(nodes, &mut out);
    out
}
