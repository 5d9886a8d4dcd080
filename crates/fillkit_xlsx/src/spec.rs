//! Engine models: sections, marker tokens, options, reports and errors.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use umya_spreadsheet::Style;
use umya_spreadsheet::helper::coordinate::coordinate_from_index;

use crate::conf::{C_MASTER_DEF_DEFAULT, C_SHEET_TEMPLATE_DEFAULT};

////////////////////////////////////////////////////////////////////////////////
// #region Markers

/// Marker keyword kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumMarkerKind {
    /// `{name start}`.
    Start,
    /// `{name end}`.
    End,
}

/// One recognized section marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMarkerToken {
    /// Section name between the brace and the keyword.
    pub name: String,
    /// Opening or closing.
    pub kind: EnumMarkerKind,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Sections

/// Merged-cell rectangle in 1-based column/row coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecMergeRange {
    pub start_col: u32,
    pub start_row: u32,
    pub end_col: u32,
    pub end_row: u32,
}

impl SpecMergeRange {
    /// A1-style range text.
    pub fn to_range(&self) -> String {
        format!(
            "{}:{}",
            coordinate_from_index(&self.start_col, &self.start_row),
            coordinate_from_index(&self.end_col, &self.end_row)
        )
    }

    /// Same rectangle moved down by `delta_rows`.
    pub fn shifted_rows(&self, delta_rows: i64) -> SpecMergeRange {
        let shift = |row: u32| -> u32 { (row as i64 + delta_rows).max(0) as u32 };
        SpecMergeRange {
            start_col: self.start_col,
            start_row: shift(self.start_row),
            end_col: self.end_col,
            end_row: shift(self.end_row),
        }
    }

    /// True when the two rectangles share at least one cell.
    pub fn overlaps(&self, other: &SpecMergeRange) -> bool {
        self.start_col <= other.end_col
            && other.start_col <= self.end_col
            && self.start_row <= other.end_row
            && other.start_row <= self.end_row
    }
}

/// One scanned template section with its content snapshot.
///
/// `start_row`/`end_row` are the first and last content rows; the marker rows
/// sit directly above and below. `end_row == 0` marks a still-open section
/// during scanning.
#[derive(Debug, Clone, Default)]
pub struct SpecSection {
    /// Marker name, possibly a compound path.
    pub name: String,
    /// Name of the innermost section still open when this one started.
    pub parent_name: Option<String>,
    /// First content row.
    pub start_row: u32,
    /// Last content row; 0 until the end marker seals the section.
    pub end_row: u32,
    /// Leftmost column of the section.
    pub start_col: u32,
    /// Rightmost column of the section.
    pub end_col: u32,
    /// Row-major text snapshot of the content rows, taken at seal time.
    pub cells: Vec<Vec<String>>,
    /// Row-major style snapshot matching `cells`.
    pub styles: Vec<Vec<Option<Style>>>,
    /// Merged ranges strictly inside the content rows.
    pub merges: Vec<SpecMergeRange>,
}

impl SpecSection {
    /// True once the end marker has been seen.
    pub fn is_sealed(&self) -> bool {
        self.end_row != 0
    }

    /// Content height in rows; 0 for open or inverted sections.
    pub fn height(&self) -> u32 {
        if self.is_sealed() && self.end_row >= self.start_row {
            self.end_row - self.start_row + 1
        } else {
            0
        }
    }

    /// True when `other`'s content rows lie within this section's rows.
    pub fn contains_rows(&self, other: &SpecSection) -> bool {
        other.start_row >= self.start_row && other.end_row <= self.end_row
    }

    /// Snapshot text at template coordinates, if captured.
    pub fn cell_text(&self, row: u32, col: u32) -> Option<&str> {
        let n_row = row.checked_sub(self.start_row)? as usize;
        let n_col = col.checked_sub(self.start_col)? as usize;
        self.cells.get(n_row)?.get(n_col).map(String::as_str)
    }

    /// Snapshot style at template coordinates, if captured.
    pub fn style_at(&self, row: u32, col: u32) -> Option<&Style> {
        let n_row = row.checked_sub(self.start_row)? as usize;
        let n_col = col.checked_sub(self.start_col)? as usize;
        self.styles.get(n_row)?.get(n_col)?.as_ref()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Per-invocation render configuration.
#[derive(Debug, Clone)]
pub struct SpecRenderOptions {
    /// Worksheet holding the template markup.
    pub sheet_name: String,
    /// Definition name of the master collection whose children drive the
    /// per-item populate loop.
    pub master_def_name: String,
}

impl Default for SpecRenderOptions {
    fn default() -> Self {
        Self {
            sheet_name: C_SHEET_TEMPLATE_DEFAULT.to_string(),
            master_def_name: C_MASTER_DEF_DEFAULT.to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportAndEvents

/// Non-fatal outcome recorded while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumRenderEvent {
    /// A snapshot merge could not be re-applied at its shifted position.
    MergeSkipped { range: String },
    /// An end marker matched no open section and was ignored.
    OrphanEndMarker { name: String, row: u32 },
    /// A section was still open when the scan finished.
    UnterminatedSection { name: String },
    /// The output workbook could not be written.
    SaveFailed { path: PathBuf, exception: String },
}

impl fmt::Display for EnumRenderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumRenderEvent::MergeSkipped { range } => {
                write!(f, "merge skipped at {range}")
            }
            EnumRenderEvent::OrphanEndMarker { name, row } => {
                write!(f, "orphan end marker '{name}' at row {row}")
            }
            EnumRenderEvent::UnterminatedSection { name } => {
                write!(f, "section '{name}' never closed")
            }
            EnumRenderEvent::SaveFailed { path, exception } => {
                write!(f, "save failed for {}: {exception}", path.display())
            }
        }
    }
}

/// Aggregate counters and diagnostics for one render run.
#[derive(Debug, Default, Clone)]
pub struct ReportRender {
    /// Sections sealed during the scan.
    pub cnt_sections: u64,
    /// Cells that received a resolved value.
    pub cnt_cells_written: u64,
    /// Placeholder cells cleared because nothing resolved.
    pub cnt_cells_cleared: u64,
    /// Rows inserted by table expansion and cloning.
    pub cnt_rows_inserted: u64,
    /// Trailing blank rows removed.
    pub cnt_rows_removed: u64,
    /// Merged ranges re-applied onto expanded/cloned rows.
    pub cnt_merges_applied: u64,
    /// Merged ranges skipped as out of bounds or overlapping.
    pub cnt_merges_skipped: u64,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
    /// Structured non-fatal outcomes.
    pub events: Vec<EnumRenderEvent>,
}

impl ReportRender {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Record a structured event and its warning line.
    pub fn add_event(&mut self, event: EnumRenderEvent) {
        self.warnings.push(event.to_string());
        self.events.push(event);
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_sections".to_string(), self.cnt_sections);
        dict_counts.insert("cnt_cells_written".to_string(), self.cnt_cells_written);
        dict_counts.insert("cnt_cells_cleared".to_string(), self.cnt_cells_cleared);
        dict_counts.insert("cnt_rows_inserted".to_string(), self.cnt_rows_inserted);
        dict_counts.insert("cnt_rows_removed".to_string(), self.cnt_rows_removed);
        dict_counts.insert("cnt_merges_applied".to_string(), self.cnt_merges_applied);
        dict_counts.insert("cnt_merges_skipped".to_string(), self.cnt_merges_skipped);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} sections={} written={} cleared={} inserted={} removed={} merges={} merges_skipped={} warnings={}",
            dict_counts["cnt_sections"],
            dict_counts["cnt_cells_written"],
            dict_counts["cnt_cells_cleared"],
            dict_counts["cnt_rows_inserted"],
            dict_counts["cnt_rows_removed"],
            dict_counts["cnt_merges_applied"],
            dict_counts["cnt_merges_skipped"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportRender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[RENDER]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Fatal render failure.
#[derive(Debug)]
pub enum RenderError {
    /// The template workbook could not be opened.
    TemplateReadFailed { path: PathBuf, exception: String },
    /// The configured worksheet does not exist in the template.
    TemplateSheetMissing { sheet_name: String },
    /// No top-level parameter carries the master definition name.
    MasterParameterMissing { def_name: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TemplateReadFailed { path, exception } => {
                write!(f, "cannot read template {}: {exception}", path.display())
            }
            RenderError::TemplateSheetMissing { sheet_name } => {
                write!(f, "template worksheet '{sheet_name}' not found")
            }
            RenderError::MasterParameterMissing { def_name } => {
                write!(f, "master parameter '{def_name}' not found in data")
            }
        }
    }
}

impl std::error::Error for RenderError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_range_text_shift_and_overlap() {
        let merge = SpecMergeRange {
            start_col: 1,
            start_row: 2,
            end_col: 3,
            end_row: 4,
        };
        assert_eq!(merge.to_range(), "A2:C4");
        assert_eq!(merge.shifted_rows(10).to_range(), "A12:C14");
        assert!(merge.overlaps(&merge.shifted_rows(2)));
        assert!(!merge.overlaps(&merge.shifted_rows(5)));
    }

    #[test]
    fn section_snapshot_lookup_uses_template_coordinates() {
        let section = SpecSection {
            name: "Items".to_string(),
            start_row: 5,
            end_row: 6,
            start_col: 2,
            end_col: 3,
            cells: vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string(), "d".to_string()],
            ],
            ..Default::default()
        };
        assert_eq!(section.height(), 2);
        assert_eq!(section.cell_text(5, 2), Some("a"));
        assert_eq!(section.cell_text(6, 3), Some("d"));
        assert_eq!(section.cell_text(4, 2), None);
        assert!(section.is_sealed());
    }

    #[test]
    fn report_format_lists_all_counters() {
        let mut report = ReportRender::default();
        report.cnt_sections = 2;
        report.add_event(EnumRenderEvent::OrphanEndMarker {
            name: "Items".to_string(),
            row: 9,
        });
        assert_eq!(
            report.to_string(),
            "[RENDER] sections=2 written=0 cleared=0 inserted=0 removed=0 merges=0 merges_skipped=0 warnings=1"
        );
        assert_eq!(report.events.len(), 1);
    }
}
