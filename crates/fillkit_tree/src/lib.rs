//! # fillkit_tree
//!
//! Parameter-tree kernel for the fillkit template engine.
//!
//! Extraction results arrive as a tree of named parameters (tables, clusters,
//! columns, leaves). This crate owns that model and the path language used to
//! address it from worksheet templates:
//!
//! - [`spec`] — arena tree ([`ParamTree`], [`SpecParamNode`]), grouping kinds,
//!   and depth-keyed route constraints ([`SpecRoute`]).
//! - [`path`] — the placeholder grammar: `:` descent, `|` alternation, `&`
//!   parallel routes in section names.
//! - [`resolve`] — lookup and replacement-text resolution. Total functions;
//!   an unmatched path resolves to nothing rather than an error.
//!
//! The crate is dependency-free and knows nothing about worksheets; the
//! `fillkit_xlsx` crate layers the template engine on top.

pub mod path;
pub mod resolve;
pub mod spec;

pub use path::{
    SpecPathExpression, first_alternative, is_compound_name, parse_path_expression,
    split_compound_routes, strip_section_prefix,
};
pub use resolve::{
    collect_parameters, replacement_text, resolve_parameter, resolve_route, resolve_route_head,
};
pub use spec::{
    EnumGrouping, NodeId, ParamTree, SpecParamNode, SpecRoute, find_route_at_depth, upsert_route,
};
