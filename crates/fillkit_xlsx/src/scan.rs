//! Template scanning: locate marker pairs and snapshot section content.

use umya_spreadsheet::Worksheet;

use crate::spec::{EnumMarkerKind, EnumRenderEvent, ReportRender, SpecSection};
use crate::style::{EnumBorderSide, has_edge_border};
use crate::util::{parse_marker, parse_merge_range};

////////////////////////////////////////////////////////////////////////////////
// #region Scanning

/// Scan the worksheet top-down, left-to-right for `{name start}` /
/// `{name end}` marker pairs.
///
/// Returns sections in marker order. A start marker opens a section whose
/// content begins on the next row; the matching end marker seals it one row
/// above itself and snapshots the content cells, styles and merges. At most
/// one marker is consumed per row. Orphan end markers and sections left open
/// are recorded as events and otherwise ignored.
pub fn scan_template(sheet: &Worksheet, report: &mut ReportRender) -> Vec<SpecSection> {
    let mut l_stack: Vec<SpecSection> = Vec::new();
    let n_row_max = sheet.get_highest_row();
    let n_col_max = sheet.get_highest_column();

    for n_row in 1..=n_row_max {
        for n_col in 1..=n_col_max {
            let c_text = sheet.get_value((n_col, n_row));
            let Some(token) = parse_marker(&c_text) else {
                continue;
            };
            match token.kind {
                EnumMarkerKind::Start => {
                    let c_parent = l_stack
                        .iter()
                        .rev()
                        .find(|s| !s.is_sealed())
                        .map(|s| s.name.clone());
                    l_stack.push(SpecSection {
                        name: token.name,
                        parent_name: c_parent,
                        start_row: n_row + 1,
                        end_row: 0,
                        start_col: find_marker_start_col(sheet, n_row, n_col_max),
                        end_col: find_marker_end_col(sheet, n_row, n_col_max),
                        ..Default::default()
                    });
                }
                EnumMarkerKind::End => {
                    match l_stack.iter().rposition(|s| s.name == token.name) {
                        Some(n_pos) => {
                            seal_section(sheet, &mut l_stack[n_pos], n_row);
                            report.cnt_sections += 1;
                        }
                        None => report.add_event(EnumRenderEvent::OrphanEndMarker {
                            name: token.name,
                            row: n_row,
                        }),
                    }
                }
            }
            // One marker per row; the rest of the row is marker housing.
            break;
        }
    }

    for section in l_stack.iter().filter(|s| !s.is_sealed()) {
        report.add_event(EnumRenderEvent::UnterminatedSection {
            name: section.name.clone(),
        });
    }
    l_stack
}

/// Most recently scanned section carrying `name`.
pub fn find_section<'a>(sections: &'a [SpecSection], name: &str) -> Option<&'a SpecSection> {
    sections.iter().rev().find(|s| s.name == name)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Sealing

fn seal_section(sheet: &Worksheet, section: &mut SpecSection, n_row_marker: u32) {
    section.end_row = n_row_marker.saturating_sub(1);
    if section.end_row < section.start_row {
        // Start marker directly followed by end: zero content rows.
        return;
    }

    for n_row in section.start_row..=section.end_row {
        let mut l_texts = Vec::new();
        let mut l_styles = Vec::new();
        for n_col in section.start_col..=section.end_col {
            l_texts.push(sheet.get_value((n_col, n_row)));
            l_styles.push(sheet.get_cell((n_col, n_row)).map(|c| c.get_style().clone()));
        }
        section.cells.push(l_texts);
        section.styles.push(l_styles);
    }

    for range in sheet.get_merge_cells() {
        let Some(merge) = parse_merge_range(&range.get_range()) else {
            continue;
        };
        let if_inside = merge.start_row >= section.start_row + 1
            && merge.end_row <= section.end_row.saturating_sub(1)
            && merge.start_col >= section.start_col
            && merge.end_col <= section.end_col;
        if if_inside {
            section.merges.push(merge);
        }
    }
}

fn find_marker_start_col(sheet: &Worksheet, n_row: u32, n_col_max: u32) -> u32 {
    (1..=n_col_max)
        .find(|&n_col| has_edge_border(sheet, n_col, n_row, EnumBorderSide::Left))
        .unwrap_or(1)
}

fn find_marker_end_col(sheet: &Worksheet, n_row: u32, n_col_max: u32) -> u32 {
    (1..=n_col_max)
        .rev()
        .find(|&n_col| has_edge_border(sheet, n_col, n_row, EnumBorderSide::Right))
        .unwrap_or(n_col_max.max(1))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
