//! Render engine: scan, per-item populate, cloning and the final fill pass.

use std::path::Path;

use fillkit_tree::{NodeId, ParamTree, replacement_text};
use umya_spreadsheet::Worksheet;

use crate::clone::clone_sections;
use crate::populate::{RenderPass, process_sections};
use crate::scan::scan_template;
use crate::spec::{EnumRenderEvent, RenderError, ReportRender, SpecRenderOptions};
use crate::util::{
    extract_placeholder, parse_marker, replace_placeholder_tokens, trim_trailing_empty_rows,
};

/// Template render engine.
///
/// One engine carries the options for a render run; the same engine can be
/// reused across workbooks.
#[derive(Debug, Clone)]
pub struct RenderEngine {
    /// Render configuration.
    pub options: SpecRenderOptions,
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new(crate::conf::derive_default_render_options())
    }
}

impl RenderEngine {
    pub fn new(options: SpecRenderOptions) -> Self {
        Self { options }
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region Rendering

    /// Render the parameter tree into an already-loaded worksheet.
    ///
    /// The master parameter's children drive the per-item loop: each item is
    /// populated into its own copy of the template block, with a fresh clone
    /// stamped below the output before the next item starts. A final sweep
    /// fills placeholders outside any section and blanks leftover markers.
    pub fn render_worksheet(
        &self,
        sheet: &mut Worksheet,
        tree: &ParamTree,
    ) -> Result<ReportRender, RenderError> {
        let mut report = ReportRender::default();
        let l_sections = scan_template(sheet, &mut report);

        let id_master = tree
            .roots()
            .iter()
            .copied()
            .find(|&id| tree.node(id).name == self.options.master_def_name)
            .ok_or_else(|| RenderError::MasterParameterMissing {
                def_name: self.options.master_def_name.clone(),
            })?;
        let l_items = tree.children(id_master).to_vec();

        let pass = RenderPass {
            tree,
            sections: &l_sections,
        };
        let mut n_current_row: u32 = 1;
        for (n_idx, &id_item) in l_items.iter().enumerate() {
            n_current_row = process_sections(sheet, &pass, id_item, n_current_row, &mut report);
            if n_idx + 1 < l_items.len() {
                // The next item maps template row r onto r + current - 1, so
                // the clone goes down by one less than the next base row.
                clone_sections(sheet, &l_sections, n_current_row.saturating_sub(1), &mut report);
            }
        }

        populate_non_section_data(sheet, tree, id_master, &mut report);
        trim_trailing_empty_rows(sheet, &mut report);
        Ok(report)
    }

    /// Read a template workbook, render it and write the output file.
    ///
    /// A failing save is downgraded to a report event so callers still see
    /// the counters of the completed render.
    pub fn generate_file(
        &self,
        path_template: &Path,
        path_output: &Path,
        tree: &ParamTree,
    ) -> Result<ReportRender, RenderError> {
        let mut book = umya_spreadsheet::reader::xlsx::read(path_template).map_err(|e| {
            RenderError::TemplateReadFailed {
                path: path_template.to_path_buf(),
                exception: format!("{e:?}"),
            }
        })?;
        let sheet = book
            .get_sheet_by_name_mut(&self.options.sheet_name)
            .ok_or_else(|| RenderError::TemplateSheetMissing {
                sheet_name: self.options.sheet_name.clone(),
            })?;

        let mut report = self.render_worksheet(sheet, tree)?;

        if let Err(e) = umya_spreadsheet::writer::xlsx::write(&book, path_output) {
            report.add_event(EnumRenderEvent::SaveFailed {
                path: path_output.to_path_buf(),
                exception: format!("{e:?}"),
            });
        }
        Ok(report)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
}

/// Fill placeholders that live outside every section.
///
/// Markers left behind by the populate passes are blanked; any other
/// placeholder is resolved against each non-master root, first hit wins, and
/// cleared when nothing matches.
fn populate_non_section_data(
    sheet: &mut Worksheet,
    tree: &ParamTree,
    id_master: NodeId,
    report: &mut ReportRender,
) {
    let n_row_max = sheet.get_highest_row();
    let n_col_max = sheet.get_highest_column();

    for n_row in 1..=n_row_max {
        for n_col in 1..=n_col_max {
            let c_text = sheet.get_value((n_col, n_row));
            let Some(c_placeholder) = extract_placeholder(&c_text) else {
                continue;
            };
            if parse_marker(&c_text).is_some() {
                sheet.get_cell_mut((n_col, n_row)).set_value("");
                continue;
            }

            let mut c_replacement = String::new();
            for &id_root in tree.roots() {
                if id_root == id_master {
                    continue;
                }
                c_replacement = replacement_text(tree, c_placeholder, id_root, None, &[]);
                if !c_replacement.is_empty() {
                    break;
                }
            }
            if c_replacement.is_empty() {
                sheet.get_cell_mut((n_col, n_row)).set_value("");
                report.cnt_cells_cleared += 1;
            } else {
                sheet
                    .get_cell_mut((n_col, n_row))
                    .set_value(replace_placeholder_tokens(&c_text, &c_replacement));
                report.cnt_cells_written += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fillkit_tree::{EnumGrouping, SpecParamNode};
    use umya_spreadsheet::Spreadsheet;

    fn invoice_template() -> Spreadsheet {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        let l_rows = [
            "{Header start}",
            "Name: {name}",
            "{Header end}",
            "{Items start}",
            "{Items:Value}",
            "{Items end}",
        ];
        for (n_idx, c_text) in l_rows.iter().enumerate() {
            sheet.get_cell_mut((1, n_idx as u32 + 1)).set_value(*c_text);
        }
        book
    }

    fn add_invoice_item(tree: &mut ParamTree, id_master: NodeId, c_name: &str, l_values: &[&str]) {
        let id_item = tree.add_child(id_master, SpecParamNode::group("Doc", EnumGrouping::Cluster));
        let id_header =
            tree.add_child(id_item, SpecParamNode::group("Header", EnumGrouping::Cluster));
        tree.add_child(id_header, SpecParamNode::leaf("name", c_name));
        let id_items = tree.add_child(id_item, SpecParamNode::group("Items", EnumGrouping::Table));
        let id_column =
            tree.add_child(id_items, SpecParamNode::group("Value", EnumGrouping::Column));
        for (n_idx, c_value) in l_values.iter().enumerate() {
            tree.add_child(
                id_column,
                SpecParamNode::leaf_at("Value", *c_value, n_idx as i64),
            );
        }
    }

    fn engine_for(sheet_name: &str) -> RenderEngine {
        RenderEngine::new(SpecRenderOptions {
            sheet_name: sheet_name.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn single_invoice_renders_header_and_expanded_table() {
        let mut book = invoice_template();
        let mut tree = ParamTree::new();
        let id_master = tree.add_root(SpecParamNode::group("Document", EnumGrouping::Other));
        add_invoice_item(&mut tree, id_master, "Invoice #1", &["10", "20", "30"]);

        let engine = RenderEngine::default();
        let sheet = book.get_sheet_mut(&0).unwrap();
        let report = engine.render_worksheet(sheet, &tree).unwrap();

        assert_eq!(sheet.get_value((1, 2)), "Name: Invoice #1");
        assert_eq!(sheet.get_value((1, 5)), "10");
        assert_eq!(sheet.get_value((1, 6)), "20");
        assert_eq!(sheet.get_value((1, 7)), "30");
        // Marker rows are gone.
        assert_eq!(sheet.get_value((1, 1)), "");
        assert_eq!(sheet.get_value((1, 3)), "");
        assert_eq!(sheet.get_value((1, 4)), "");
        assert_eq!(sheet.get_highest_row(), 7);

        assert_eq!(report.cnt_sections, 2);
        assert_eq!(report.cnt_rows_inserted, 2);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn second_item_renders_into_a_cloned_block() {
        let mut book = invoice_template();
        let mut tree = ParamTree::new();
        let id_master = tree.add_root(SpecParamNode::group("Document", EnumGrouping::Other));
        add_invoice_item(&mut tree, id_master, "Invoice #1", &["10", "20", "30"]);
        add_invoice_item(&mut tree, id_master, "Invoice #2", &["5"]);

        let engine = RenderEngine::default();
        let sheet = book.get_sheet_mut(&0).unwrap();
        engine.render_worksheet(sheet, &tree).unwrap();

        // First block as in the single-item case.
        assert_eq!(sheet.get_value((1, 2)), "Name: Invoice #1");
        assert_eq!(sheet.get_value((1, 7)), "30");
        // Second block: template rows 2 and 5 mapped onto base row 9.
        assert_eq!(sheet.get_value((1, 10)), "Name: Invoice #2");
        assert_eq!(sheet.get_value((1, 13)), "5");
    }

    #[test]
    fn placeholders_outside_sections_resolve_against_other_roots() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        sheet.get_cell_mut((1, 1)).set_value("Issued by {Company}");
        sheet.get_cell_mut((1, 2)).set_value("{Unknown}");

        let mut tree = ParamTree::new();
        tree.add_root(SpecParamNode::group("Document", EnumGrouping::Other));
        tree.add_root(SpecParamNode::leaf("Company", "Acme GmbH"));

        let engine = RenderEngine::default();
        let sheet = book.get_sheet_mut(&0).unwrap();
        let report = engine.render_worksheet(sheet, &tree).unwrap();

        assert_eq!(sheet.get_value((1, 1)), "Issued by Acme GmbH");
        assert_eq!(sheet.get_value((1, 2)), "");
        assert_eq!(report.cnt_cells_written, 1);
        assert_eq!(report.cnt_cells_cleared, 1);
    }

    #[test]
    fn missing_master_parameter_is_a_fatal_error() {
        let mut book = invoice_template();
        let mut tree = ParamTree::new();
        tree.add_root(SpecParamNode::group("SomethingElse", EnumGrouping::Other));

        let engine = RenderEngine::default();
        let sheet = book.get_sheet_mut(&0).unwrap();
        let error = engine.render_worksheet(sheet, &tree).unwrap_err();
        assert!(matches!(
            error,
            RenderError::MasterParameterMissing { ref def_name } if def_name == "Document"
        ));
    }

    #[test]
    fn generate_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path_template = dir.path().join("template.xlsx");
        let path_output = dir.path().join("out.xlsx");

        let book = invoice_template();
        umya_spreadsheet::writer::xlsx::write(&book, &path_template).unwrap();

        let mut tree = ParamTree::new();
        let id_master = tree.add_root(SpecParamNode::group("Document", EnumGrouping::Other));
        add_invoice_item(&mut tree, id_master, "Invoice #1", &["10"]);

        let engine = engine_for("Sheet1");
        let report = engine.generate_file(&path_template, &path_output, &tree).unwrap();
        assert!(report.events.is_empty());
        assert!(path_output.exists());

        let book_out = umya_spreadsheet::reader::xlsx::read(&path_output).unwrap();
        let sheet_out = book_out.get_sheet(&0).unwrap();
        assert_eq!(sheet_out.get_value((1, 2)), "Name: Invoice #1");
        assert_eq!(sheet_out.get_value((1, 5)), "10");
    }

    #[test]
    fn generate_file_reports_missing_sheet_and_unreadable_template() {
        let dir = tempfile::tempdir().unwrap();
        let path_template = dir.path().join("template.xlsx");
        let path_output = dir.path().join("out.xlsx");
        umya_spreadsheet::writer::xlsx::write(&invoice_template(), &path_template).unwrap();

        let tree = ParamTree::new();
        let engine = engine_for("Nope");
        let error = engine
            .generate_file(&path_template, &path_output, &tree)
            .unwrap_err();
        assert!(matches!(error, RenderError::TemplateSheetMissing { .. }));

        let error = engine
            .generate_file(&dir.path().join("absent.xlsx"), &path_output, &tree)
            .unwrap_err();
        assert!(matches!(error, RenderError::TemplateReadFailed { .. }));
    }
}
