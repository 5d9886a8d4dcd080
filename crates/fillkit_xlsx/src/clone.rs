//! Section cloning: stamp the captured template blocks at a row offset.

use umya_spreadsheet::Worksheet;

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::spec::{EnumRenderEvent, ReportRender, SpecMergeRange, SpecSection};
use crate::style::apply_section_cell_style;
use crate::util::parse_merge_range;

////////////////////////////////////////////////////////////////////////////////
// #region Cloning

/// Materialize a fresh copy of every top-level section at `n_at_row`.
///
/// Template row `r` lands on `r + n_at_row`. Sections contained inside
/// another section are skipped; their rows are already part of the parent's
/// snapshot. Afterwards every captured merge (nested sections included) is
/// re-projected by the same offset.
pub fn clone_sections(
    sheet: &mut Worksheet,
    sections: &[SpecSection],
    n_at_row: u32,
    report: &mut ReportRender,
) {
    // Top-down so a stamped block is never shifted by a later insert above it.
    for (n_idx, section) in sections.iter().enumerate() {
        if !section.is_sealed() || section.height() == 0 {
            continue;
        }
        let if_nested = sections
            .iter()
            .enumerate()
            .any(|(n_other, other)| {
                n_other != n_idx && other.is_sealed() && other.contains_rows(section)
            });
        if !if_nested {
            duplicate_section(sheet, section, n_at_row, report);
        }
    }

    for section in sections.iter() {
        for merge in &section.merges {
            try_add_merge(sheet, &merge.shifted_rows(n_at_row as i64), report);
        }
    }
}

fn duplicate_section(
    sheet: &mut Worksheet,
    section: &SpecSection,
    n_at_row: u32,
    report: &mut ReportRender,
) {
    let n_start = n_at_row + section.start_row;
    let n_height = section.height();

    sheet.insert_new_row(&n_start, &n_height);
    report.cnt_rows_inserted += n_height as u64;
    stamp_section_snapshot(sheet, section, n_start);

    for n_off in 0..n_height {
        let n_row_src = section.start_row + n_off;
        for n_col in section.start_col..=section.end_col {
            apply_section_cell_style(
                sheet,
                n_col,
                n_start + n_off,
                section.style_at(n_row_src, n_col),
                n_off == 0,
                n_off + 1 == n_height,
            );
        }
    }
}

/// Write a section's captured cell texts starting at `n_row_target`.
pub(crate) fn stamp_section_snapshot(sheet: &mut Worksheet, section: &SpecSection, n_row_target: u32) {
    for (n_row_off, l_row) in section.cells.iter().enumerate() {
        for (n_col_off, c_text) in l_row.iter().enumerate() {
            let n_col = section.start_col + n_col_off as u32;
            sheet
                .get_cell_mut((n_col, n_row_target + n_row_off as u32))
                .set_value(c_text.as_str());
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Merging

/// Re-apply one merge rectangle, skipping it when it would be out of range or
/// collide with an existing merge on the live sheet.
pub(crate) fn try_add_merge(sheet: &mut Worksheet, merge: &SpecMergeRange, report: &mut ReportRender) {
    let if_valid = merge.start_row >= 1
        && merge.start_col >= 1
        && merge.end_row >= merge.start_row
        && merge.end_col >= merge.start_col
        && merge.end_row <= N_NROWS_EXCEL_MAX
        && merge.end_col <= N_NCOLS_EXCEL_MAX;
    let if_collides = sheet
        .get_merge_cells()
        .iter()
        .filter_map(|range| parse_merge_range(&range.get_range()))
        .any(|existing| existing.overlaps(merge));

    if !if_valid || if_collides {
        report.cnt_merges_skipped += 1;
        report.add_event(EnumRenderEvent::MergeSkipped {
            range: merge.to_range(),
        });
        return;
    }
    sheet.add_merge_cells(merge.to_range());
    report.cnt_merges_applied += 1;
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan_template;

    fn block_template() -> umya_spreadsheet::Spreadsheet {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        sheet.get_cell_mut((1, 1)).set_value("{Block start}");
        sheet.get_cell_mut((1, 2)).set_value("A {x}");
        sheet.get_cell_mut((1, 3)).set_value("B");
        sheet.get_cell_mut((1, 4)).set_value("{Block end}");
        book
    }

    #[test]
    fn back_to_back_clones_are_structurally_identical() {
        let mut book = block_template();
        let mut report = ReportRender::default();
        let l_sections = scan_template(book.get_sheet(&0).unwrap(), &mut report);
        assert_eq!(l_sections[0].height(), 2);

        let sheet = book.get_sheet_mut(&0).unwrap();
        clone_sections(sheet, &l_sections, 5, &mut report);
        clone_sections(sheet, &l_sections, 7, &mut report);

        // Template rows 2..3 land at 7..8 and again at 9..10.
        assert_eq!(sheet.get_value((1, 7)), "A {x}");
        assert_eq!(sheet.get_value((1, 8)), "B");
        assert_eq!(sheet.get_value((1, 9)), "A {x}");
        assert_eq!(sheet.get_value((1, 10)), "B");
        assert_eq!(report.cnt_rows_inserted, 4);
    }

    #[test]
    fn two_sections_keep_their_template_offsets() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        sheet.get_cell_mut((1, 1)).set_value("{Top start}");
        sheet.get_cell_mut((1, 2)).set_value("top");
        sheet.get_cell_mut((1, 3)).set_value("{Top end}");
        sheet.get_cell_mut((1, 4)).set_value("{Low start}");
        sheet.get_cell_mut((1, 5)).set_value("low");
        sheet.get_cell_mut((1, 6)).set_value("{Low end}");

        let mut report = ReportRender::default();
        let l_sections = scan_template(book.get_sheet(&0).unwrap(), &mut report);

        let sheet = book.get_sheet_mut(&0).unwrap();
        clone_sections(sheet, &l_sections, 6, &mut report);

        // Template rows 2 and 5 land at 8 and 11.
        assert_eq!(sheet.get_value((1, 8)), "top");
        assert_eq!(sheet.get_value((1, 11)), "low");
    }

    #[test]
    fn nested_sections_are_not_duplicated_separately() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        sheet.get_cell_mut((1, 1)).set_value("{Outer start}");
        sheet.get_cell_mut((1, 2)).set_value("head");
        sheet.get_cell_mut((1, 3)).set_value("{Inner start}");
        sheet.get_cell_mut((1, 4)).set_value("row");
        sheet.get_cell_mut((1, 5)).set_value("{Inner end}");
        sheet.get_cell_mut((1, 6)).set_value("{Outer end}");

        let mut report = ReportRender::default();
        let l_sections = scan_template(book.get_sheet(&0).unwrap(), &mut report);
        let n_outer_height = l_sections[0].height() as u64;

        let sheet = book.get_sheet_mut(&0).unwrap();
        clone_sections(sheet, &l_sections, 10, &mut report);
        assert_eq!(report.cnt_rows_inserted, n_outer_height);
        assert_eq!(sheet.get_value((1, 12)), "head");
        assert_eq!(sheet.get_value((1, 14)), "row");
    }

    #[test]
    fn colliding_or_out_of_range_merges_are_skipped_with_events() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        sheet.add_merge_cells("B2:C2");

        let mut report = ReportRender::default();
        let merge_collides = SpecMergeRange {
            start_col: 3,
            start_row: 2,
            end_col: 4,
            end_row: 2,
        };
        try_add_merge(sheet, &merge_collides, &mut report);
        assert_eq!(report.cnt_merges_skipped, 1);
        assert!(matches!(
            report.events[0],
            EnumRenderEvent::MergeSkipped { .. }
        ));

        let merge_ok = SpecMergeRange {
            start_col: 2,
            start_row: 5,
            end_col: 3,
            end_row: 5,
        };
        try_add_merge(sheet, &merge_ok, &mut report);
        assert_eq!(report.cnt_merges_applied, 1);
        assert_eq!(sheet.get_merge_cells().len(), 2);
    }
}
