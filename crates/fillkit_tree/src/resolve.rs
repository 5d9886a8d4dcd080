//! Path resolution against the parameter tree.
//!
//! Lookups are total: a path that matches nothing yields `None` (or an empty
//! replacement string), never an error. Route lists take precedence over the
//! bare sibling index whenever a route entry is pinned at the current depth.

use crate::path::{first_alternative, parse_path_expression};
use crate::spec::{EnumGrouping, NodeId, ParamTree, SpecRoute, find_route_at_depth};

////////////////////////////////////////////////////////////////////////////////
// #region SingleLookup

/// Find one node named `def_name` at or under `data`.
///
/// `can_be_self` gates whether `data` itself and its direct children may
/// match; the depth-first fallback re-permits it one level down, so chains
/// like `a:a` can step from a node into a same-named descendant. At the
/// sentinel depth `-1` a direct-child hit is re-descended to prefer the
/// deepest same-named node.
pub fn resolve_parameter(
    tree: &ParamTree,
    def_name: &str,
    data: NodeId,
    index: Option<i64>,
    depth: i64,
    can_be_self: bool,
    routes: &[SpecRoute],
) -> Option<NodeId> {
    if def_name.is_empty() {
        return None;
    }
    let route = if routes.is_empty() {
        None
    } else {
        find_route_at_depth(routes, depth)
    };
    let if_name_match = tree.node(data).name == def_name;

    // Self match, constrained by the route pinned at this depth when present,
    // by the bare index otherwise.
    if can_be_self && if_name_match {
        let if_position_ok = match route {
            Some(route) => route.index.is_none() || tree.position(data) == route.index,
            None => index.is_none() || tree.position(data) == index,
        };
        if if_position_ok {
            return Some(data);
        }
    }

    let l_children = tree.children(data);
    if l_children.is_empty() {
        return None;
    }

    // Breadth pass over direct children. With routes in play only a pinned
    // depth may match here; without routes the pass is gated like self.
    let found = if !routes.is_empty() {
        route.and_then(|route| {
            l_children.iter().copied().find(|&child| {
                tree.node(child).name == def_name
                    && (route.index.is_none() || tree.position(child) == route.index)
            })
        })
    } else if can_be_self {
        l_children.iter().copied().find(|&child| {
            tree.node(child).name == def_name
                && (index.is_none() || tree.position(child) == index)
        })
    } else {
        None
    };

    if let Some(id_found) = found {
        if depth == -1 {
            if let Some(id_deeper) =
                resolve_parameter(tree, def_name, id_found, index, depth, false, routes)
            {
                return Some(id_deeper);
            }
        }
        return Some(id_found);
    }

    // Depth-first fallback with the same frozen depth/index/route context.
    l_children
        .iter()
        .copied()
        .find_map(|child| resolve_parameter(tree, def_name, child, index, depth, true, routes))
}

/// Collect every node named `def_name` at or under `data`, document order.
pub fn collect_parameters(tree: &ParamTree, def_name: &str, data: NodeId) -> Vec<NodeId> {
    let mut l_found = Vec::new();
    collect_into(tree, def_name, data, &mut l_found);
    l_found
}

fn collect_into(tree: &ParamTree, def_name: &str, data: NodeId, l_found: &mut Vec<NodeId>) {
    if tree.node(data).name == def_name {
        l_found.push(data);
    }
    for &child in tree.children(data) {
        collect_into(tree, def_name, child, l_found);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RouteLookup

/// Walk a `:`-chain and return the node the final segment lands on.
///
/// Intermediate hops are unconstrained lookups; the final segment honors
/// `index` and, when `check_column_children` is set, steps through a
/// Column-grouped hit into the matching cell below it.
pub fn resolve_route(
    tree: &ParamTree,
    route: &str,
    data: NodeId,
    index: Option<i64>,
    check_column_children: bool,
    can_next_be_self: bool,
    routes: &[SpecRoute],
) -> Option<NodeId> {
    if route.is_empty() {
        return None;
    }
    if let Some((key, rest)) = route.split_once(':') {
        let id_next = resolve_parameter(tree, key, data, None, -1, true, routes)?;
        let if_next_self = rest.split(':').next() != Some(key);
        return resolve_route(
            tree,
            rest,
            id_next,
            index,
            check_column_children,
            if_next_self,
            routes,
        );
    }

    let id_found = resolve_parameter(tree, route, data, index, -1, can_next_be_self, routes)?;
    if check_column_children && tree.node(id_found).grouping == EnumGrouping::Column {
        let l_children = tree.children(id_found).to_vec();
        let mut found = Some(id_found);
        for child in l_children {
            found = resolve_parameter(tree, route, child, index, -1, true, routes);
            if found.is_some() {
                break;
            }
        }
        return found;
    }
    Some(id_found)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Replacement

/// Resolve a full placeholder body to its replacement text.
///
/// The body is parsed into a [`crate::path::SpecPathExpression`] first;
/// alternatives that resolve to a non-empty value are joined with `|`, and
/// anything unresolved contributes nothing. `index` applies only through the
/// Column pass-through on the final segment.
pub fn replacement_text(
    tree: &ParamTree,
    placeholder: &str,
    data: NodeId,
    index: Option<i64>,
    routes: &[SpecRoute],
) -> String {
    let expression = parse_path_expression(placeholder);
    let mut c_out = String::new();
    for l_segments in &expression.alternatives {
        let c_part = resolve_alternative(tree, l_segments, data, index, -1, true, routes);
        append_alternative(&mut c_out, &c_part);
    }
    c_out
}

fn resolve_alternative(
    tree: &ParamTree,
    l_segments: &[String],
    data: NodeId,
    index: Option<i64>,
    depth: i64,
    can_next_be_self: bool,
    routes: &[SpecRoute],
) -> String {
    let Some((c_key, l_rest)) = l_segments.split_first() else {
        return String::new();
    };

    if !l_rest.is_empty() {
        // Chain hop; self-match eligibility for the NEXT hop is revoked when
        // the chain repeats the same name back to back.
        let Some(id_next) =
            resolve_parameter(tree, c_key, data, None, depth + 1, can_next_be_self, routes)
        else {
            return String::new();
        };
        let if_next_self = l_rest.first().map(String::as_str) != Some(c_key.as_str());
        return resolve_alternative(tree, l_rest, id_next, index, depth + 1, if_next_self, routes);
    }

    let Some(mut id_found) = resolve_parameter(tree, c_key, data, None, depth + 1, true, routes)
    else {
        return String::new();
    };
    if tree.node(id_found).grouping == EnumGrouping::Column {
        let l_children = tree.children(id_found).to_vec();
        let mut found = None;
        for child in l_children {
            found = resolve_parameter(tree, c_key, child, index, depth + 1, true, routes);
            if found.is_some() {
                break;
            }
        }
        let Some(id_cell) = found else {
            return String::new();
        };
        id_found = id_cell;
    }
    tree.value_text(id_found).to_string()
}

fn append_alternative(c_out: &mut String, c_part: &str) {
    if c_part.is_empty() {
        return;
    }
    if !c_out.is_empty() {
        c_out.push('|');
    }
    c_out.push_str(c_part);
}

/// Resolve the head alternative of a route for section binding.
pub fn resolve_route_head(
    tree: &ParamTree,
    route: &str,
    data: NodeId,
    index: Option<i64>,
    routes: &[SpecRoute],
) -> Option<NodeId> {
    resolve_route(tree, first_alternative(route), data, index, true, true, routes)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{SpecParamNode, upsert_route};

    fn invoice_tree() -> (ParamTree, NodeId) {
        // Doc
        // ├── Item (pos 0) ── Cell = "A"
        // ├── Item (pos 1) ── Cell = "B"
        // └── Total = "99"
        let mut tree = ParamTree::new();
        let id_doc = tree.add_root(SpecParamNode::group("Doc", EnumGrouping::Cluster));
        let id_item0 = tree.add_child(
            id_doc,
            SpecParamNode::group("Item", EnumGrouping::Cluster).with_index(0),
        );
        tree.add_child(id_item0, SpecParamNode::leaf("Cell", "A"));
        let id_item1 = tree.add_child(
            id_doc,
            SpecParamNode::group("Item", EnumGrouping::Cluster).with_index(1),
        );
        tree.add_child(id_item1, SpecParamNode::leaf("Cell", "B"));
        tree.add_child(id_doc, SpecParamNode::leaf("Total", "99"));
        (tree, id_doc)
    }

    #[test]
    fn route_pin_beats_document_order() {
        let (tree, id_doc) = invoice_tree();
        let l_routes = upsert_route(&[], "Item", 0, Some(1));

        assert_eq!(replacement_text(&tree, "Item:Cell", id_doc, None, &[]), "A");
        assert_eq!(
            replacement_text(&tree, "Item:Cell", id_doc, None, &l_routes),
            "B"
        );
    }

    #[test]
    fn repeated_segment_steps_into_same_named_child() {
        // Item (bind node)
        // ├── Item ── Name = "inner"
        // └── Name = "outer"
        let mut tree = ParamTree::new();
        let id_bind = tree.add_root(SpecParamNode::group("Item", EnumGrouping::Cluster));
        let id_inner = tree.add_child(id_bind, SpecParamNode::group("Item", EnumGrouping::Cluster));
        tree.add_child(id_inner, SpecParamNode::leaf("Name", "inner"));
        tree.add_child(id_bind, SpecParamNode::leaf("Name", "outer"));

        assert_eq!(
            replacement_text(&tree, "Item:Name", id_bind, None, &[]),
            "outer"
        );
        assert_eq!(
            replacement_text(&tree, "Item:Item:Name", id_bind, None, &[]),
            "inner"
        );
    }

    #[test]
    fn alternation_joins_hits_and_skips_misses() {
        let (tree, id_doc) = invoice_tree();

        assert_eq!(
            replacement_text(&tree, "Missing|Total", id_doc, None, &[]),
            "99"
        );
        assert_eq!(
            replacement_text(&tree, "Total|Item:Cell", id_doc, None, &[]),
            "99|A"
        );
        assert_eq!(replacement_text(&tree, "Missing", id_doc, None, &[]), "");
    }

    #[test]
    fn segment_whitespace_is_trimmed_before_lookup() {
        let (tree, id_doc) = invoice_tree();

        assert_eq!(
            replacement_text(&tree, " Item : Cell ", id_doc, None, &[]),
            "A"
        );
        assert_eq!(
            replacement_text(&tree, "Missing | Total", id_doc, None, &[]),
            "99"
        );
    }

    #[test]
    fn column_pass_through_selects_cell_by_index() {
        // Items (Table) ── Value (Column) ── Value@0 = "10", Value@1 = "20"
        let mut tree = ParamTree::new();
        let id_items = tree.add_root(SpecParamNode::group("Items", EnumGrouping::Table));
        let id_column = tree.add_child(id_items, SpecParamNode::group("Value", EnumGrouping::Column));
        tree.add_child(id_column, SpecParamNode::leaf_at("Value", "10", 0));
        tree.add_child(id_column, SpecParamNode::leaf_at("Value", "20", 1));

        assert_eq!(
            replacement_text(&tree, "Items:Value", id_items, Some(0), &[]),
            "10"
        );
        assert_eq!(
            replacement_text(&tree, "Items:Value", id_items, Some(1), &[]),
            "20"
        );
        assert_eq!(
            replacement_text(&tree, "Items:Value", id_items, Some(7), &[]),
            ""
        );

        let id_cell = resolve_route(&tree, "Items:Value", id_items, Some(1), true, true, &[]);
        assert_eq!(id_cell.map(|id| tree.value_text(id)), Some("20"));
    }

    #[test]
    fn unconstrained_lookup_prefers_deepest_same_named_node() {
        // Root ── X ── X = "deep"
        let mut tree = ParamTree::new();
        let id_root = tree.add_root(SpecParamNode::group("Root", EnumGrouping::Other));
        let id_outer = tree.add_child(id_root, SpecParamNode::group("X", EnumGrouping::Cluster));
        tree.add_child(id_outer, SpecParamNode::leaf("X", "deep"));

        let id_found = resolve_parameter(&tree, "X", id_root, None, -1, true, &[]).unwrap();
        assert_eq!(tree.value_text(id_found), "deep");
    }

    #[test]
    fn collects_every_match_in_document_order() {
        let (tree, id_doc) = invoice_tree();
        let l_items = collect_parameters(&tree, "Item", id_doc);
        assert_eq!(l_items.len(), 2);
        assert!(collect_parameters(&tree, "Nope", id_doc).is_empty());
        assert_eq!(collect_parameters(&tree, "Doc", id_doc), vec![id_doc]);
    }
}
