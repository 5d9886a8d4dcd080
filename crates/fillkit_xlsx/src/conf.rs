//! Template-engine constants and default option factories.

use umya_spreadsheet::Border;

use crate::spec::SpecRenderOptions;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: u32 = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: u32 = 16_384;

/// Marker keyword opening a section.
pub const C_MARKER_START: &str = "start";
/// Marker keyword closing a section.
pub const C_MARKER_END: &str = "end";
/// Characters allowed in a marker name besides ASCII letters.
pub const TUP_MARKER_NAME_EXTRA: [char; 4] = [':', '|', '&', '.'];

/// Border styles that count as a section edge on a marker row.
pub const TUP_BORDER_SECTION_EDGE: [&str; 2] = [Border::BORDER_MEDIUM, Border::BORDER_THICK];
/// Border style stamped on section frames.
pub const C_BORDER_FRAME: &str = Border::BORDER_MEDIUM;

/// Default worksheet the engine renders into.
pub const C_SHEET_TEMPLATE_DEFAULT: &str = "Template";
/// Default definition name of the master collection.
pub const C_MASTER_DEF_DEFAULT: &str = "Document";

/// Build default render options.
pub fn derive_default_render_options() -> SpecRenderOptions {
    SpecRenderOptions::default()
}
