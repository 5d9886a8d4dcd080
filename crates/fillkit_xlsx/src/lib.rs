//! # fillkit_xlsx
//!
//! Marker-driven spreadsheet template engine.
//!
//! A template worksheet declares repeatable blocks with `{name start}` /
//! `{name end}` marker rows and `{path}` placeholders in between. Rendering
//! binds those blocks to a [`fillkit_tree::ParamTree`] and produces a filled
//! workbook:
//!
//! - [`scan`] — find marker pairs, seal sections, snapshot content, styles
//!   and merges.
//! - [`populate`] — the expansion-and-fill pass: table sections repeat per
//!   row index, cluster sections fill once, nested sections recurse.
//! - [`clone`] — restamp the whole template block below the output between
//!   master items.
//! - [`engine`] — [`engine::RenderEngine`]: the per-item loop, the final
//!   non-section sweep and workbook file I/O.
//! - [`source`] — collaborator traits for batch runs against an external
//!   document backend, plus [`source::run_batch`].
//! - [`spec`], [`conf`], [`util`], [`style`] — models, constants, cell-text
//!   lexing and style restamping.
//!
//! Worksheet access goes through `umya-spreadsheet`; all row and column
//! coordinates are 1-based, matching that crate.

pub mod clone;
pub mod conf;
pub mod engine;
pub mod populate;
pub mod scan;
pub mod source;
pub mod spec;
pub mod style;
pub mod util;

pub use clone::clone_sections;
pub use conf::derive_default_render_options;
pub use engine::RenderEngine;
pub use populate::{RenderPass, process_sections};
pub use scan::{find_section, scan_template};
pub use source::{
    EnumDocumentStatus, Notifier, ParameterSource, ReportBatch, SourceError, SpecBatchOptions,
    SpecDocumentRef, run_batch,
};
pub use spec::{
    EnumMarkerKind, EnumRenderEvent, RenderError, ReportRender, SpecMarkerToken, SpecMergeRange,
    SpecRenderOptions, SpecSection,
};
pub use style::{EnumBorderSide, apply_section_cell_style, has_edge_border, set_frame_border};
pub use util::{extract_placeholder, parse_marker, replace_placeholder_tokens};
