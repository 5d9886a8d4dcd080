//! Parameter-tree data model shared by the resolver and the worksheet engine.

////////////////////////////////////////////////////////////////////////////////
// #region GroupingAndNodes

/// Arena handle for one parameter node.
pub type NodeId = usize;

/// Repetition/layout strategy carried by a parameter definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumGrouping {
    /// Variable-length rows; children are columns, grandchildren are cells.
    Table,
    /// Fixed set of related fields.
    Cluster,
    /// Transparent pass-through layer, not an addressable level.
    Column,
    /// No populate strategy.
    #[default]
    Other,
}

/// One extracted parameter node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecParamNode {
    /// Definition name; not unique across the tree.
    pub name: String,
    /// Populate strategy (meaningful only with children).
    pub grouping: EnumGrouping,
    /// Leaf value text.
    pub value: Option<String>,
    /// Position among same-name siblings.
    pub index: Option<i64>,
    /// Physical row position; takes precedence over `index`.
    pub row_index: Option<i64>,
    /// Ordered child node handles.
    pub children: Vec<NodeId>,
}

impl SpecParamNode {
    /// Build a grouped node without value/position.
    pub fn group(name: impl Into<String>, grouping: EnumGrouping) -> Self {
        Self {
            name: name.into(),
            grouping,
            value: None,
            index: None,
            row_index: None,
            children: Vec::new(),
        }
    }

    /// Build a plain leaf node.
    pub fn leaf(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grouping: EnumGrouping::Other,
            value: Some(value.into()),
            index: None,
            row_index: None,
            children: Vec::new(),
        }
    }

    /// Build a leaf node keyed by physical row position.
    pub fn leaf_at(name: impl Into<String>, value: impl Into<String>, row_index: i64) -> Self {
        let mut node = Self::leaf(name, value);
        node.row_index = Some(row_index);
        node
    }

    /// Set the sibling index (builder style).
    pub fn with_index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TreeArena

/// Arena-backed parameter tree addressed by [`NodeId`].
#[derive(Debug, Clone, Default)]
pub struct ParamTree {
    l_nodes: Vec<SpecParamNode>,
    l_roots: Vec<NodeId>,
}

impl ParamTree {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.l_nodes.len()
    }

    /// True when no node has been added.
    pub fn is_empty(&self) -> bool {
        self.l_nodes.is_empty()
    }

    /// Top-level node handles in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.l_roots
    }

    /// Add a top-level node.
    pub fn add_root(&mut self, node: SpecParamNode) -> NodeId {
        let id_node = self.push(node);
        self.l_roots.push(id_node);
        id_node
    }

    /// Add a child node under `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: SpecParamNode) -> NodeId {
        let id_node = self.push(node);
        self.l_nodes[parent].children.push(id_node);
        id_node
    }

    /// Immutable node access.
    pub fn node(&self, id: NodeId) -> &SpecParamNode {
        &self.l_nodes[id]
    }

    /// Ordered child handles of `id`.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.l_nodes[id].children
    }

    /// Effective sibling position: `row_index` wins over `index`.
    pub fn position(&self, id: NodeId) -> Option<i64> {
        let node = self.node(id);
        node.row_index.or(node.index)
    }

    /// Leaf value text, empty when absent.
    pub fn value_text(&self, id: NodeId) -> &str {
        self.node(id).value.as_deref().unwrap_or("")
    }

    fn push(&mut self, node: SpecParamNode) -> NodeId {
        let id_node = self.l_nodes.len();
        self.l_nodes.push(node);
        id_node
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Routes

/// Depth-keyed index constraint used to pick the correct same-named sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRoute {
    /// Definition name this entry constrains.
    pub def_name: String,
    /// Nesting depth the constraint applies at.
    pub depth: i64,
    /// Required sibling position; `None` leaves the depth unconstrained.
    pub index: Option<i64>,
}

/// Find the route entry pinned to `depth`, if any.
pub fn find_route_at_depth(routes: &[SpecRoute], depth: i64) -> Option<&SpecRoute> {
    routes.iter().find(|r| r.depth == depth)
}

/// Return a new route list with the entry for `def_name` added or re-pinned.
///
/// Route lists are copied on extension so sibling branches never observe each
/// other's constraints.
pub fn upsert_route(
    routes: &[SpecRoute],
    def_name: &str,
    depth: i64,
    index: Option<i64>,
) -> Vec<SpecRoute> {
    let mut l_routes = routes.to_vec();
    match l_routes.iter_mut().find(|r| r.def_name == def_name) {
        Some(route) => route.index = index,
        None => l_routes.push(SpecRoute {
            def_name: def_name.to_string(),
            depth,
            index,
        }),
    }
    l_routes
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_prefers_row_index_over_index() {
        let mut tree = ParamTree::new();
        let id_root = tree.add_root(SpecParamNode::group("Root", EnumGrouping::Other));
        let id_both = tree.add_child(
            id_root,
            SpecParamNode {
                row_index: Some(3),
                ..SpecParamNode::leaf("Cell", "x").with_index(7)
            },
        );
        let id_index_only = tree.add_child(id_root, SpecParamNode::leaf("Cell", "y").with_index(5));
        let id_neither = tree.add_child(id_root, SpecParamNode::leaf("Cell", "z"));

        assert_eq!(tree.position(id_both), Some(3));
        assert_eq!(tree.position(id_index_only), Some(5));
        assert_eq!(tree.position(id_neither), None);
    }

    #[test]
    fn upsert_route_repins_existing_definition_and_keeps_copies_apart() {
        let l_routes = upsert_route(&[], "Item", 1, Some(0));
        let l_repinned = upsert_route(&l_routes, "Item", 1, Some(4));
        let l_extended = upsert_route(&l_repinned, "Cell", 2, None);

        assert_eq!(l_routes[0].index, Some(0));
        assert_eq!(l_repinned.len(), 1);
        assert_eq!(l_repinned[0].index, Some(4));
        assert_eq!(l_extended.len(), 2);
        assert_eq!(find_route_at_depth(&l_extended, 2).unwrap().def_name, "Cell");
        assert!(find_route_at_depth(&l_extended, 9).is_none());
    }
}
