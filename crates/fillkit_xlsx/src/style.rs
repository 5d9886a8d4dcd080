//! Style restamping and section border management.

use umya_spreadsheet::{Border, Style, Worksheet};

use crate::conf::{C_BORDER_FRAME, TUP_BORDER_SECTION_EDGE};

/// Border side selector for frame stamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumBorderSide {
    Left,
    Right,
    Top,
    Bottom,
}

////////////////////////////////////////////////////////////////////////////////
// #region BorderAccess

pub(crate) fn border_style_of(sheet: &Worksheet, n_col: u32, n_row: u32, side: EnumBorderSide) -> String {
    let Some(cell) = sheet.get_cell((n_col, n_row)) else {
        return Border::BORDER_NONE.to_string();
    };
    let Some(borders) = cell.get_style().get_borders() else {
        return Border::BORDER_NONE.to_string();
    };
    let border = match side {
        EnumBorderSide::Left => borders.get_left(),
        EnumBorderSide::Right => borders.get_right(),
        EnumBorderSide::Top => borders.get_top(),
        EnumBorderSide::Bottom => borders.get_bottom(),
    };
    border.get_border_style().to_string()
}

/// True when the cell carries a section-edge border on the given side.
pub fn has_edge_border(sheet: &Worksheet, n_col: u32, n_row: u32, side: EnumBorderSide) -> bool {
    let c_style = border_style_of(sheet, n_col, n_row, side);
    TUP_BORDER_SECTION_EDGE.contains(&c_style.as_str())
}

/// Stamp the section frame border style on one side of a cell.
pub fn set_frame_border(sheet: &mut Worksheet, n_col: u32, n_row: u32, side: EnumBorderSide) {
    let borders = sheet.get_style_mut((n_col, n_row)).get_borders_mut();
    let border = match side {
        EnumBorderSide::Left => borders.get_left_mut(),
        EnumBorderSide::Right => borders.get_right_mut(),
        EnumBorderSide::Top => borders.get_top_mut(),
        EnumBorderSide::Bottom => borders.get_bottom_mut(),
    };
    border.set_border_style(C_BORDER_FRAME);
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Restamping

/// Copy a snapshot style onto a cell, keeping the destination's horizontal
/// frame intact at section edges.
///
/// On the first row of a stamped block the destination keeps its own top
/// border; on the last row it keeps its own bottom border. Everything else
/// (fill, font, format, alignment, side borders) comes from the snapshot.
pub fn apply_section_cell_style(
    sheet: &mut Worksheet,
    n_col: u32,
    n_row: u32,
    snapshot: Option<&Style>,
    if_first_row: bool,
    if_last_row: bool,
) {
    let Some(snapshot) = snapshot else {
        return;
    };
    let mut style_new = snapshot.clone();
    if if_first_row {
        let c_top = border_style_of(sheet, n_col, n_row, EnumBorderSide::Top);
        style_new
            .get_borders_mut()
            .get_top_mut()
            .set_border_style(c_top);
    }
    if if_last_row {
        let c_bottom = border_style_of(sheet, n_col, n_row, EnumBorderSide::Bottom);
        style_new
            .get_borders_mut()
            .get_bottom_mut()
            .set_border_style(c_bottom);
    }
    sheet.get_cell_mut((n_col, n_row)).set_style(style_new);
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_detection_accepts_medium_and_thick_only() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        sheet
            .get_style_mut((2, 5))
            .get_borders_mut()
            .get_left_mut()
            .set_border_style(Border::BORDER_MEDIUM);
        sheet
            .get_style_mut((3, 5))
            .get_borders_mut()
            .get_left_mut()
            .set_border_style(Border::BORDER_THIN);

        assert!(has_edge_border(sheet, 2, 5, EnumBorderSide::Left));
        assert!(!has_edge_border(sheet, 3, 5, EnumBorderSide::Left));
        assert!(!has_edge_border(sheet, 9, 5, EnumBorderSide::Left));
    }

    #[test]
    fn restamp_suppresses_snapshot_borders_at_block_edges() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();

        let mut style_snapshot = Style::default();
        style_snapshot
            .get_borders_mut()
            .get_top_mut()
            .set_border_style(Border::BORDER_MEDIUM);
        style_snapshot
            .get_borders_mut()
            .get_bottom_mut()
            .set_border_style(Border::BORDER_MEDIUM);

        apply_section_cell_style(sheet, 1, 1, Some(&style_snapshot), true, false);
        assert_eq!(
            border_style_of(sheet, 1, 1, EnumBorderSide::Top),
            Border::BORDER_NONE
        );
        assert_eq!(
            border_style_of(sheet, 1, 1, EnumBorderSide::Bottom),
            Border::BORDER_MEDIUM
        );

        apply_section_cell_style(sheet, 1, 2, Some(&style_snapshot), false, true);
        assert_eq!(
            border_style_of(sheet, 1, 2, EnumBorderSide::Top),
            Border::BORDER_MEDIUM
        );
        assert_eq!(
            border_style_of(sheet, 1, 2, EnumBorderSide::Bottom),
            Border::BORDER_NONE
        );
    }
}
