//! Batch orchestration over an external parameter source.
//!
//! The engine itself never talks to a backend; callers implement
//! [`ParameterSource`] and [`Notifier`] and hand them to [`run_batch`], which
//! walks the pending documents strictly one at a time.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fillkit_tree::ParamTree;

use crate::engine::RenderEngine;
use crate::spec::ReportRender;

////////////////////////////////////////////////////////////////////////////////
// #region Collaborators

/// Processing status of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumDocumentStatus {
    /// Extraction finished, export pending.
    InterimProcessed,
    /// Export finished.
    Processed,
    /// Export failed.
    Error,
}

impl fmt::Display for EnumDocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_name = match self {
            EnumDocumentStatus::InterimProcessed => "InterimProcessed",
            EnumDocumentStatus::Processed => "Processed",
            EnumDocumentStatus::Error => "Error",
        };
        write!(f, "{c_name}")
    }
}

/// Reference to one document held by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDocumentRef {
    pub id: i64,
    /// Containing master document, when the source groups documents.
    pub master_id: Option<i64>,
    pub filename: String,
    pub file_type: String,
}

/// Failure reported by a source or notifier backend.
#[derive(Debug)]
pub struct SourceError {
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SourceError {}

/// Backend that owns the documents and their extracted parameters.
pub trait ParameterSource {
    /// Documents of the service currently carrying `status`.
    fn fetch_documents(
        &mut self,
        project_id: i64,
        service_id: i64,
        status: EnumDocumentStatus,
    ) -> Result<Vec<SpecDocumentRef>, SourceError>;

    /// Extracted parameter tree of one document.
    fn fetch_parameter_tree(
        &mut self,
        project_id: i64,
        service_id: i64,
        document_id: i64,
    ) -> Result<ParamTree, SourceError>;

    /// Move a document to a new status.
    fn set_status(
        &mut self,
        document_id: i64,
        status: EnumDocumentStatus,
    ) -> Result<(), SourceError>;
}

/// Outbound channel for finished exports.
pub trait Notifier {
    fn send_report(
        &mut self,
        subject: &str,
        body: &str,
        attachment_path: &Path,
    ) -> Result<(), SourceError>;
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BatchRun

/// One batch invocation's configuration.
#[derive(Debug, Clone)]
pub struct SpecBatchOptions {
    pub project_id: i64,
    pub service_id: i64,
    /// Template workbook every document is rendered from.
    pub template_path: PathBuf,
    /// Directory the rendered workbooks are written into.
    pub output_dir: PathBuf,
}

/// Counters and diagnostics for one batch run.
#[derive(Debug, Default, Clone)]
pub struct ReportBatch {
    /// Documents the source returned.
    pub cnt_found: u64,
    /// Documents rendered and saved.
    pub cnt_rendered: u64,
    /// Documents skipped after a failure.
    pub cnt_failed: u64,
    /// Non-fatal warnings, in occurrence order.
    pub warnings: Vec<String>,
}

impl ReportBatch {
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_found".to_string(), self.cnt_found);
        dict_counts.insert("cnt_rendered".to_string(), self.cnt_rendered);
        dict_counts.insert("cnt_failed".to_string(), self.cnt_failed);
        dict_counts.insert("cnt_warnings".to_string(), self.warnings.len() as u64);
        dict_counts
    }

    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} found={} rendered={} failed={} warnings={}",
            dict_counts["cnt_found"],
            dict_counts["cnt_rendered"],
            dict_counts["cnt_failed"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[BATCH]"))
    }
}

/// Render every pending document of one service.
///
/// Documents are processed strictly in sequence. A failure anywhere in one
/// document's pipeline marks that document as errored and moves on; it never
/// aborts the batch.
pub fn run_batch(
    source: &mut dyn ParameterSource,
    notifier: &mut dyn Notifier,
    engine: &RenderEngine,
    options: &SpecBatchOptions,
) -> ReportBatch {
    let mut report = ReportBatch::default();

    let l_documents = match source.fetch_documents(
        options.project_id,
        options.service_id,
        EnumDocumentStatus::InterimProcessed,
    ) {
        Ok(l_documents) => l_documents,
        Err(e) => {
            report.add_warning(format!("document fetch failed: {e}"));
            return report;
        }
    };
    report.cnt_found = l_documents.len() as u64;

    for document in &l_documents {
        match process_document(source, engine, options, document) {
            Ok((path_output, report_render)) => {
                report.cnt_rendered += 1;
                for c_warning in &report_render.warnings {
                    report.add_warning(format!("document {}: {c_warning}", document.id));
                }
                if let Err(e) = source.set_status(document.id, EnumDocumentStatus::Processed) {
                    report.add_warning(format!("status update failed for {}: {e}", document.id));
                }
                let c_subject = format!("Export finished: {}", document.filename);
                if let Err(e) =
                    notifier.send_report(&c_subject, &report_render.to_string(), &path_output)
                {
                    report.add_warning(format!("notification failed for {}: {e}", document.id));
                }
            }
            Err(c_message) => {
                report.cnt_failed += 1;
                report.add_warning(format!("document {} failed: {c_message}", document.id));
                if let Err(e) = source.set_status(document.id, EnumDocumentStatus::Error) {
                    report.add_warning(format!("status update failed for {}: {e}", document.id));
                }
            }
        }
    }
    report
}

fn process_document(
    source: &mut dyn ParameterSource,
    engine: &RenderEngine,
    options: &SpecBatchOptions,
    document: &SpecDocumentRef,
) -> Result<(PathBuf, ReportRender), String> {
    let tree = source
        .fetch_parameter_tree(options.project_id, options.service_id, document.id)
        .map_err(|e| e.to_string())?;

    let path_output = options
        .output_dir
        .join(output_filename(&document.filename, document.id));
    let report_render = engine
        .generate_file(&options.template_path, &path_output, &tree)
        .map_err(|e| e.to_string())?;
    Ok((path_output, report_render))
}

/// Output name derived from the source filename. The document id keeps names
/// unique within a batch; the timestamp keeps reruns apart.
fn output_filename(c_source_name: &str, n_document_id: i64) -> String {
    let c_stem = Path::new(c_source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("export");
    let n_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{c_stem}_{n_document_id}_{n_epoch}.xlsx")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
