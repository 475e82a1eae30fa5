//! Pivot engine.
//!
//! Builds an arbitrary-depth grouping tree over the table rows and injects
//! a fixed-width, per-depth aggregate sort key into every contained row.
//! Sorting the flat row set by the outermost key first, all descending,
//! reproduces "groups ordered by descending aggregate at every nesting
//! level" as a plain lexicographic multi-column sort, so the table
//! collaborator needs no group-aware comparator.

use crate::api::{Dimension, TableRow};

/// Maximum supported pivot nesting depth.
pub const MAX_PIVOT_DEPTH: usize = 6;

/// Digits in an encoded sort key. Wide enough to exceed any representable
/// SOC-loss sum after scaling.
pub const SORT_KEY_WIDTH: usize = 12;

/// Sums are scaled by this factor and rounded before padding, so string
/// order stays equal to numeric order for fractional sums.
const SORT_KEY_SCALE: f64 = 1000.0;

/// Encode an aggregate sum as a fixed-width, zero-padded decimal string.
pub fn encode_sort_key(sum: f64) -> String {
    let scaled = (sum * SORT_KEY_SCALE).round().max(0.0) as u64;
    format!("{:0width$}", scaled, width = SORT_KEY_WIDTH)
}

/// Sentinel key for depth slots without a group.
pub fn zero_sort_key() -> String {
    encode_sort_key(0.0)
}

/// Multi-key sort spec for the table collaborator: sort-key slots from the
/// outermost level inward, each descending. Outer keys dominate, so each
/// level's groups stay contiguous and descend by aggregate, with ties
/// ordered by the next-inner level.
pub fn sort_spec(depth: usize) -> Vec<usize> {
    (0..depth).collect()
}

/// Index of a node within its [`PivotTree`] arena.
pub type NodeId = usize;

/// One node of the grouping hierarchy.
#[derive(Debug, Clone)]
pub struct PivotNode {
    /// Dimension value this group represents.
    pub key: String,
    /// Σ soc_lost over all rows in this node's subtree.
    pub sum: f64,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Rows held directly (deepest level only); interior nodes reach rows
    /// through their children.
    direct_rows: Vec<usize>,
}

/// Arena-backed grouping tree with uniform node access at every depth.
#[derive(Debug, Clone, Default)]
pub struct PivotTree {
    nodes: Vec<PivotNode>,
    roots: Vec<NodeId>,
}

impl PivotTree {
    /// Build the grouping tree and inject aggregate sort keys.
    ///
    /// Partitions the row set on each dimension in order (clamped to
    /// [`MAX_PIVOT_DEPTH`]); an empty dimension list yields a single
    /// ungrouped leaf holding every row. Each row's `group_sort_keys` is
    /// re-sized to the dimension count and filled from its ancestor chain;
    /// a full rebuild happens on every call, nothing is patched.
    pub fn build(rows: &mut [TableRow], dimensions: &[Dimension]) -> Self {
        let dims: Vec<Dimension> = dimensions.iter().copied().take(MAX_PIVOT_DEPTH).collect();

        for row in rows.iter_mut() {
            row.group_sort_keys = vec![zero_sort_key(); dims.len()];
        }

        let mut tree = PivotTree::default();
        let all: Vec<usize> = (0..rows.len()).collect();

        if dims.is_empty() {
            let sum = all.iter().map(|&i| rows[i].soc_lost).sum();
            let id = tree.push(PivotNode {
                key: "all".to_string(),
                sum,
                parent: None,
                children: Vec::new(),
                direct_rows: all,
            });
            tree.roots.push(id);
            return tree;
        }

        tree.roots = tree.partition(rows, &all, &dims, 0, None);

        // Key propagation: every node writes its encoded sum into the slot
        // for its depth, on every row anywhere in its subtree.
        for id in 0..tree.nodes.len() {
            let depth = tree.depth(id);
            let encoded = encode_sort_key(tree.nodes[id].sum);
            for row_idx in tree.rows(id) {
                rows[row_idx].group_sort_keys[depth - 1] = encoded.clone();
            }
        }

        tree
    }

    fn partition(
        &mut self,
        rows: &[TableRow],
        indices: &[usize],
        dims: &[Dimension],
        level: usize,
        parent: Option<NodeId>,
    ) -> Vec<NodeId> {
        // Group by value, preserving first-appearance order.
        let mut order: Vec<String> = Vec::new();
        let mut groups: std::collections::HashMap<String, Vec<usize>> =
            std::collections::HashMap::new();
        for &i in indices {
            let value = rows[i].dimension_value(dims[level]);
            groups
                .entry(value.clone())
                .or_insert_with(|| {
                    order.push(value);
                    Vec::new()
                })
                .push(i);
        }

        let mut ids = Vec::with_capacity(order.len());
        for value in order {
            let members = groups.remove(&value).unwrap_or_default();
            let sum = members.iter().map(|&i| rows[i].soc_lost).sum();
            let id = self.push(PivotNode {
                key: value,
                sum,
                parent,
                children: Vec::new(),
                direct_rows: Vec::new(),
            });
            if level + 1 == dims.len() {
                self.nodes[id].direct_rows = members;
            } else {
                let children = self.partition(rows, &members, dims, level + 1, Some(id));
                self.nodes[id].children = children;
            }
            ids.push(id);
        }
        ids
    }

    fn push(&mut self, node: PivotNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Top-level group nodes.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &PivotNode {
        &self.nodes[id]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Every row index in this node's subtree, uniform at any depth.
    pub fn rows(&self, id: NodeId) -> Vec<usize> {
        let node = &self.nodes[id];
        let mut collected = node.direct_rows.clone();
        for &child in &node.children {
            collected.extend(self.rows(child));
        }
        collected
    }

    /// Depth of a node: 1 + ancestor count, computed by walking the parent
    /// chain. This assigns the key slot; it is not the subtree height.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 1;
        let mut parent = self.nodes[id].parent;
        while let Some(p) = parent {
            depth += 1;
            parent = self.nodes[p].parent;
        }
        depth
    }

    /// Height of the subtree below a node, measured downward; 1 for a
    /// terminal group. Used only for hiding expand toggles on terminal
    /// leaves, never for key-slot assignment.
    pub fn subtree_depth(&self, id: NodeId) -> usize {
        let node = &self.nodes[id];
        1 + node
            .children
            .iter()
            .map(|&child| self.subtree_depth(child))
            .max()
            .unwrap_or(0)
    }

    /// Whether this group is a terminal (deepest-level) leaf.
    pub fn is_terminal(&self, id: NodeId) -> bool {
        self.nodes[id].children.is_empty()
    }

    /// Look up a node by its chain of group key values from the root.
    pub fn find(&self, path: &[String]) -> Option<NodeId> {
        let (first, rest) = path.split_first()?;
        let mut current = *self
            .roots
            .iter()
            .find(|&&id| self.nodes[id].key == *first)?;
        for key in rest {
            current = *self.nodes[current]
                .children
                .iter()
                .find(|&&id| self.nodes[id].key == *key)?;
        }
        Some(current)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids, in construction order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        0..self.nodes.len()
    }
}
