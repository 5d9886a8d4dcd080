//! Path-expression grammar for placeholders and section names.
//!
//! A path expression is a `|`-separated list of alternatives; each alternative
//! is a `:`-separated chain of definition names descending parent to child.
//! Section names may additionally carry `&`-separated parallel routes.

////////////////////////////////////////////////////////////////////////////////
// #region Parsing

/// Parsed form of one placeholder body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPathExpression {
    /// Alternatives in source order; each is a non-empty segment chain.
    pub alternatives: Vec<Vec<String>>,
}

/// Parse a placeholder body into alternatives and segment chains.
///
/// Empty alternatives and empty segments are dropped; surrounding whitespace
/// is trimmed per piece.
pub fn parse_path_expression(text: &str) -> SpecPathExpression {
    let alternatives = text
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|alternative| {
            alternative
                .split(':')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|segments: &Vec<String>| !segments.is_empty())
        .collect();
    SpecPathExpression { alternatives }
}

/// True when a section name is a compound path rather than a bare definition
/// name.
pub fn is_compound_name(name: &str) -> bool {
    name.contains(':') || name.contains('&') || name.contains('|')
}

/// Split a compound section name into its `&`-separated parallel routes.
pub fn split_compound_routes(name: &str) -> Vec<String> {
    name.split('&')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// First `|` alternative of a route, used when a route drives a section bind.
pub fn first_alternative(route: &str) -> &str {
    route.split('|').next().unwrap_or("").trim()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SectionNameRewriting

/// Rewrite a nested section's compound name relative to its parent.
///
/// Every segment equal to `parent_name` is dropped from each route, so the
/// remainder can be resolved against the parent's node instead of the tree
/// top. `"Items:Tax"` under parent `"Items"` becomes `"Tax"`.
pub fn strip_section_prefix(name: &str, parent_name: &str) -> String {
    let l_routes: Vec<String> = split_compound_routes(name)
        .iter()
        .map(|route| {
            route
                .split(':')
                .map(str::trim)
                .filter(|segment| !segment.is_empty() && *segment != parent_name)
                .collect::<Vec<_>>()
                .join(":")
        })
        .filter(|route| !route.is_empty())
        .collect();
    l_routes.join("&")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
