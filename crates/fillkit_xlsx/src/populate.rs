//! Section population: the expansion-and-fill pass over the scanned stack.

use fillkit_tree::{
    EnumGrouping, NodeId, ParamTree, SpecRoute, collect_parameters, is_compound_name,
    parse_path_expression, replacement_text, resolve_route_head, split_compound_routes,
    strip_section_prefix, upsert_route,
};
use umya_spreadsheet::Worksheet;

use crate::clone::{stamp_section_snapshot, try_add_merge};
use crate::scan::find_section;
use crate::spec::{EnumMarkerKind, ReportRender, SpecSection};
use crate::style::{EnumBorderSide, apply_section_cell_style, set_frame_border};
use crate::util::{
    extract_placeholder, parse_marker, replace_placeholder_tokens, shift_row,
    trim_trailing_empty_rows,
};

/// Read-only context threaded through one populate pass.
pub struct RenderPass<'a> {
    /// Parameter tree the placeholders resolve against.
    pub tree: &'a ParamTree,
    /// Scanned section stack, in marker order.
    pub sections: &'a [SpecSection],
}

////////////////////////////////////////////////////////////////////////////////
// #region TopLevelDriver

/// Fill one master item into the template block based at `n_start_row`.
///
/// Top-level sections are processed bottom-up (stack pop order); nested
/// sections are reached through their parent's sweep. Start-marker rows are
/// blanked after their section is filled, trailing blank rows are trimmed,
/// and the base row for the next master item is returned.
pub fn process_sections(
    sheet: &mut Worksheet,
    pass: &RenderPass<'_>,
    data: NodeId,
    n_start_row: u32,
    report: &mut ReportRender,
) -> u32 {
    let mut n_row_expansion: i64 = 0;
    let mut previous: Option<&SpecSection> = None;

    for section in pass.sections.iter().rev() {
        if !section.is_sealed() {
            continue;
        }
        if section.parent_name.is_some() {
            previous = Some(section);
            continue;
        }
        let (_n_cur_start, _n_cur_end, n_expansion) = process_section(
            sheet,
            pass,
            data,
            n_start_row,
            n_row_expansion,
            section,
            previous,
            report,
        );
        n_row_expansion = n_expansion;

        // The start-marker row sits one above the content block.
        let n_row_marker = shift_row(section.start_row, n_start_row as i64 - 2);
        blank_row_span(sheet, n_row_marker, section.start_col, section.end_col);
        previous = Some(section);
    }

    trim_trailing_empty_rows(sheet, report);
    sheet.get_highest_row() + 1
}

/// Offset one section into the live sheet and populate it.
///
/// The offset of the start/end rows depends on where the previously
/// processed section sat relative to this one: sections below the current
/// one were already populated (no expansion applies), sections above or
/// containing it shift by the accumulated expansion.
fn process_section(
    sheet: &mut Worksheet,
    pass: &RenderPass<'_>,
    data: NodeId,
    n_start_row: u32,
    n_row_expansion: i64,
    section: &SpecSection,
    previous: Option<&SpecSection>,
    report: &mut ReportRender,
) -> (u32, u32, i64) {
    let n_base = n_start_row as i64 - 1;
    let if_fresh = match previous {
        None => true,
        Some(prev) => prev.end_row < section.end_row && prev.start_row > section.start_row,
    };

    let (n_start, n_end) = if if_fresh {
        (
            shift_row(section.start_row, n_base),
            shift_row(section.end_row, n_base + n_row_expansion),
        )
    } else if previous.is_some_and(|prev| prev.start_row > section.end_row) {
        (
            shift_row(section.start_row, n_base),
            shift_row(section.end_row, n_base),
        )
    } else {
        (
            shift_row(section.start_row, n_base + n_row_expansion),
            shift_row(section.end_row, n_base),
        )
    };
    populate_section(sheet, pass, section, data, n_start, n_end, report)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SectionBinding

/// Bind a section to data nodes and populate each binding.
fn populate_section(
    sheet: &mut Worksheet,
    pass: &RenderPass<'_>,
    section: &SpecSection,
    data: NodeId,
    n_start: u32,
    n_end: u32,
    report: &mut ReportRender,
) -> (u32, u32, i64) {
    if is_compound_name(&section.name) {
        let l_paths = split_compound_routes(&section.name);
        let Some((c_first, l_rest)) = l_paths.split_first() else {
            return (n_start, n_end, 0);
        };
        return populate_section_route(
            sheet,
            pass,
            section,
            data,
            n_start,
            n_end,
            c_first,
            None,
            Vec::new(),
            None,
            false,
            l_rest,
            report,
        );
    }

    let mut l_matches = collect_parameters(pass.tree, &section.name, data);
    if l_matches.is_empty() {
        l_matches.push(data);
    }
    let mut n_total_expansion: i64 = 0;
    let (mut n_start, mut n_end) = (n_start, n_end);
    for id_node in l_matches {
        let (n_s, n_e, n_expansion) = populate_section_data(
            sheet, pass, section, id_node, n_start, n_end, None, false, &[], report,
        );
        n_start = n_s;
        n_end = n_e;
        n_total_expansion += n_expansion;
    }
    (n_start, n_end, n_total_expansion)
}

/// Populate a route-addressed section once per distinct row index.
///
/// The head route resolves to a subtree whose grandchildren enumerate the
/// repetition indices; each index pins the route list one depth deeper
/// (copies, never shared) and either recurses into the next parallel route
/// or populates the leaf with that single index.
#[allow(clippy::too_many_arguments)]
fn populate_section_route(
    sheet: &mut Worksheet,
    pass: &RenderPass<'_>,
    section: &SpecSection,
    data: NodeId,
    n_start: u32,
    n_end: u32,
    c_route: &str,
    id_parent: Option<NodeId>,
    l_routes: Vec<SpecRoute>,
    index: Option<i64>,
    if_expand: bool,
    l_rest: &[String],
    report: &mut ReportRender,
) -> (u32, u32, i64) {
    let Some(id_subtree) = resolve_route_head(pass.tree, c_route, data, index, &l_routes) else {
        return (n_start, n_end, 0);
    };

    let l_indexes = grandchild_positions(pass.tree, id_subtree);
    let Some(&n_index_max) = l_indexes.iter().max() else {
        return (n_start, n_end, 0);
    };

    let (mut n_start, mut n_end) = (n_start, n_end);
    let mut n_total_expansion: i64 = 0;
    let mut l_routes = l_routes;
    let expression = parse_path_expression(c_route);

    for i in 0..=n_index_max {
        for l_segments in &expression.alternatives {
            let Some(c_last) = l_segments.last() else {
                continue;
            };
            l_routes = upsert_route(&l_routes, c_last, l_segments.len() as i64 - 1, index);
        }

        let (n_s, n_e, n_expansion) = match l_rest.split_first() {
            None => populate_section_data(
                sheet,
                pass,
                section,
                id_parent.unwrap_or(data),
                n_start,
                n_end,
                Some(vec![i]),
                if_expand || i < n_index_max,
                &l_routes,
                report,
            ),
            Some((c_next, l_remaining)) => populate_section_route(
                sheet,
                pass,
                section,
                data,
                n_start,
                n_end,
                c_next,
                Some(id_parent.unwrap_or(id_subtree)),
                l_routes.clone(),
                Some(i),
                if_expand || i < n_index_max,
                l_remaining,
                report,
            ),
        };
        n_start = n_s;
        n_end = n_e;
        n_total_expansion += n_expansion;
    }
    (n_start, n_end, n_total_expansion)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowSweep

/// Fill one section instance for one bound node.
#[allow(clippy::too_many_arguments)]
fn populate_section_data(
    sheet: &mut Worksheet,
    pass: &RenderPass<'_>,
    section: &SpecSection,
    id_node: NodeId,
    n_start: u32,
    n_end: u32,
    row_indexes: Option<Vec<i64>>,
    if_expand: bool,
    l_routes: &[SpecRoute],
    report: &mut ReportRender,
) -> (u32, u32, i64) {
    let n_original_start = n_start;
    let n_original_end = n_end;
    let n_section_height = n_end as i64 - n_start as i64 + 1;
    let (mut n_start, mut n_end) = (n_start, n_end);

    match pass.tree.node(id_node).grouping {
        EnumGrouping::Table => {
            let l_indexes =
                row_indexes.unwrap_or_else(|| grandchild_positions(pass.tree, id_node));
            let (Some(&n_min), Some(&n_max)) = (l_indexes.iter().min(), l_indexes.iter().max())
            else {
                return (n_start, n_end, 0);
            };

            for i in n_min..=n_max {
                let mut n_sweep_expansion: i64 = 0;
                let mut n_row = n_start;
                while n_row <= n_end {
                    for n_col in section.start_col..=section.end_col {
                        frame_side_borders(sheet, section, n_col, n_row);
                        let c_text = sheet.get_value((n_col, n_row));
                        let Some(c_placeholder) = extract_placeholder(&c_text) else {
                            continue;
                        };

                        if let Some(token) = parse_marker(&c_text) {
                            if token.kind == EnumMarkerKind::Start {
                                if let Some(inner) = inner_section(pass, section, &token.name) {
                                    let (n_row_next, n_growth) = populate_inner_table_section(
                                        sheet, pass, section, inner, id_node, n_row, i, l_routes,
                                        report,
                                    );
                                    n_end = shift_row(n_end, n_growth);
                                    n_sweep_expansion += n_growth;
                                    n_row = n_row_next;
                                    continue;
                                }
                            }
                            // Stale marker housing; blank it.
                            sheet.get_cell_mut((n_col, n_row)).set_value("");
                            continue;
                        }

                        let c_replacement =
                            replacement_text(pass.tree, c_placeholder, id_node, Some(i), l_routes);
                        write_cell_result(sheet, n_col, n_row, &c_text, &c_replacement, report);
                    }
                    n_row += 1;
                }

                n_start = shift_row(n_start, n_section_height + n_sweep_expansion);
                n_end = shift_row(n_end, n_section_height);

                if i + 1 <= n_max || if_expand {
                    insert_section_copy(sheet, section, n_start, report);
                }
            }
        }

        EnumGrouping::Cluster => {
            let mut n_row_expansion: i64 = 0;
            let mut n_row = n_start;
            while n_row <= n_end {
                for n_col in section.start_col..=section.end_col {
                    frame_side_borders(sheet, section, n_col, n_row);
                    let c_text = sheet.get_value((n_col, n_row));
                    let Some(c_placeholder) = extract_placeholder(&c_text) else {
                        continue;
                    };

                    if let Some(token) = parse_marker(&c_text) {
                        if token.kind == EnumMarkerKind::Start {
                            if let Some(inner) = inner_section(pass, section, &token.name) {
                                let n_inner_height = inner.height();
                                let n_inner_end = n_row + n_inner_height;
                                let n_base_inner =
                                    shift_row(n_start, 1 - section.start_row as i64);
                                let (_n_s, _n_e, n_expansion) = process_section(
                                    sheet,
                                    pass,
                                    id_node,
                                    n_base_inner,
                                    n_row_expansion,
                                    inner,
                                    Some(section),
                                    report,
                                );
                                n_row_expansion = n_expansion;
                                let (n_row_next, n_growth) = close_inner_block(
                                    sheet, section, inner, n_row, n_inner_end,
                                );
                                n_end = shift_row(n_end, n_growth);
                                n_row = n_row_next;
                                continue;
                            }
                        }
                        sheet.get_cell_mut((n_col, n_row)).set_value("");
                        continue;
                    }

                    let c_replacement =
                        replacement_text(pass.tree, c_placeholder, id_node, None, &[]);
                    write_cell_result(sheet, n_col, n_row, &c_text, &c_replacement, report);
                }
                n_row += 1;
            }
        }

        // Column/Other nodes carry no populate strategy of their own.
        _ => {}
    }

    if section.parent_name.is_some() {
        return (n_start, n_end, n_start as i64 - n_original_start as i64);
    }

    // Frame the finished top-level block.
    for n_col in section.start_col..=section.end_col {
        set_frame_border(sheet, n_col, n_original_start, EnumBorderSide::Top);
        set_frame_border(sheet, n_col, n_end, EnumBorderSide::Bottom);
    }
    let n_expansion = (n_end as i64 - n_start as i64) - (n_original_end as i64 - n_original_start as i64);
    (n_start, n_end, n_expansion)
}

/// Recurse into a nested section found while sweeping a table row.
///
/// The marker cell sits at `n_row_marker`; the inner content occupies the
/// rows directly below it. Returns the row the sweep resumes at (the inner
/// end-marker row, blanked) and the net row growth the recursion caused.
#[allow(clippy::too_many_arguments)]
fn populate_inner_table_section(
    sheet: &mut Worksheet,
    pass: &RenderPass<'_>,
    section: &SpecSection,
    inner: &SpecSection,
    id_node: NodeId,
    n_row_marker: u32,
    n_index: i64,
    l_routes: &[SpecRoute],
    report: &mut ReportRender,
) -> (u32, i64) {
    let n_inner_height = inner.height();
    if n_inner_height == 0 {
        blank_row_span(sheet, n_row_marker, section.start_col, section.end_col);
        return (n_row_marker + 1, 0);
    }
    let n_inner_start = n_row_marker + 1;
    let n_inner_end = n_row_marker + n_inner_height;

    let c_inner_route = strip_section_prefix(&inner.name, &pass.tree.node(id_node).name);
    let l_paths = split_compound_routes(&c_inner_route);
    if let Some((c_first, l_rest)) = l_paths.split_first() {
        populate_section_route(
            sheet,
            pass,
            inner,
            id_node,
            n_inner_start,
            n_inner_end,
            c_first,
            None,
            l_routes.to_vec(),
            Some(n_index),
            false,
            l_rest,
            report,
        );
    }
    close_inner_block(sheet, section, inner, n_row_marker, n_inner_end)
}

/// Blank the marker rows around a populated inner block and measure its
/// growth by locating the live end marker.
fn close_inner_block(
    sheet: &mut Worksheet,
    section: &SpecSection,
    inner: &SpecSection,
    n_row_marker: u32,
    n_inner_end: u32,
) -> (u32, i64) {
    let n_row_limit = sheet.get_highest_row();
    let n_marker_end = find_end_marker_row(
        sheet,
        &inner.name,
        n_row_marker + 1,
        section.start_col,
        section.end_col,
        n_row_limit,
    )
    .unwrap_or(n_inner_end + 1);

    blank_row_span(sheet, n_row_marker, section.start_col, section.end_col);
    blank_row_span(sheet, n_marker_end, section.start_col, section.end_col);

    let n_growth = n_marker_end as i64 - (n_inner_end as i64 + 1);
    (n_marker_end, n_growth)
}

/// Insert and restamp one fresh copy of the section's template rows.
fn insert_section_copy(
    sheet: &mut Worksheet,
    section: &SpecSection,
    n_row_target: u32,
    report: &mut ReportRender,
) {
    let n_height = section.height();
    sheet.insert_new_row(&n_row_target, &n_height);
    report.cnt_rows_inserted += n_height as u64;
    stamp_section_snapshot(sheet, section, n_row_target);

    let n_row_offset = n_row_target as i64 - section.start_row as i64;
    for merge in &section.merges {
        try_add_merge(sheet, &merge.shifted_rows(n_row_offset), report);
    }
    for j in section.start_row..=section.end_row {
        for n_col in section.start_col..=section.end_col {
            apply_section_cell_style(
                sheet,
                n_col,
                shift_row(j, n_row_offset),
                section.style_at(j, n_col),
                j == section.start_row,
                j == section.end_row,
            );
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Helpers

/// Distinct, sorted positions among a node's grandchildren.
fn grandchild_positions(tree: &ParamTree, id_node: NodeId) -> Vec<i64> {
    let mut l_positions: Vec<i64> = Vec::new();
    for &id_child in tree.children(id_node) {
        for &id_cell in tree.children(id_child) {
            if let Some(n_pos) = tree.position(id_cell) {
                if !l_positions.contains(&n_pos) {
                    l_positions.push(n_pos);
                }
            }
        }
    }
    l_positions.sort_unstable();
    l_positions
}

/// Nested section reachable from the current sweep, if the marker names one.
fn inner_section<'a>(
    pass: &RenderPass<'a>,
    section: &SpecSection,
    c_name: &str,
) -> Option<&'a SpecSection> {
    let inner = find_section(pass.sections, c_name)?;
    if inner.name != section.name && inner.parent_name.as_deref() == Some(section.name.as_str()) {
        Some(inner)
    } else {
        None
    }
}

fn find_end_marker_row(
    sheet: &Worksheet,
    c_name: &str,
    n_row_from: u32,
    n_col_lo: u32,
    n_col_hi: u32,
    n_row_limit: u32,
) -> Option<u32> {
    for n_row in n_row_from..=n_row_limit {
        for n_col in n_col_lo..=n_col_hi {
            if let Some(token) = parse_marker(&sheet.get_value((n_col, n_row))) {
                if token.kind == EnumMarkerKind::End && token.name == c_name {
                    return Some(n_row);
                }
            }
        }
    }
    None
}

fn frame_side_borders(sheet: &mut Worksheet, section: &SpecSection, n_col: u32, n_row: u32) {
    if n_col == section.start_col {
        set_frame_border(sheet, n_col, n_row, EnumBorderSide::Left);
    }
    if n_col == section.end_col {
        set_frame_border(sheet, n_col, n_row, EnumBorderSide::Right);
    }
}

fn blank_row_span(sheet: &mut Worksheet, n_row: u32, n_col_lo: u32, n_col_hi: u32) {
    for n_col in n_col_lo..=n_col_hi {
        sheet.get_cell_mut((n_col, n_row)).set_value("");
    }
}

fn write_cell_result(
    sheet: &mut Worksheet,
    n_col: u32,
    n_row: u32,
    c_text: &str,
    c_replacement: &str,
    report: &mut ReportRender,
) {
    if c_replacement.is_empty() {
        sheet.get_cell_mut((n_col, n_row)).set_value("");
        report.cnt_cells_cleared += 1;
    } else {
        sheet
            .get_cell_mut((n_col, n_row))
            .set_value(replace_placeholder_tokens(c_text, c_replacement));
        report.cnt_cells_written += 1;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
