//! Cell-text lexing and small worksheet helpers.

use umya_spreadsheet::Worksheet;
use umya_spreadsheet::helper::coordinate::index_from_coordinate;

use crate::conf::{C_MARKER_END, C_MARKER_START, TUP_MARKER_NAME_EXTRA};
use crate::spec::{EnumMarkerKind, ReportRender, SpecMarkerToken, SpecMergeRange};

////////////////////////////////////////////////////////////////////////////////
// #region Lexing

fn is_marker_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || TUP_MARKER_NAME_EXTRA.contains(&c)
}

/// Recognize a section marker anywhere in a cell's text.
///
/// A marker is `{name start}` or `{name end}` where the name is built from
/// ASCII letters and the path characters `:` `|` `&` `.`; anything else
/// between braces is an ordinary placeholder.
pub fn parse_marker(text: &str) -> Option<SpecMarkerToken> {
    for (n_open, _) in text.match_indices('{') {
        let rest = &text[n_open + 1..];
        let Some(n_close) = rest.find('}') else {
            return None;
        };
        if let Some(token) = parse_marker_body(&rest[..n_close]) {
            return Some(token);
        }
    }
    None
}

fn parse_marker_body(body: &str) -> Option<SpecMarkerToken> {
    let (c_name, c_keyword) = body.rsplit_once(char::is_whitespace)?;
    let kind = if c_keyword == C_MARKER_START {
        EnumMarkerKind::Start
    } else if c_keyword == C_MARKER_END {
        EnumMarkerKind::End
    } else {
        return None;
    };
    if c_name.is_empty() || !c_name.chars().all(is_marker_name_char) {
        return None;
    }
    Some(SpecMarkerToken {
        name: c_name.to_string(),
        kind,
    })
}

/// First `{...}` token body in a cell's text, if any.
pub fn extract_placeholder(text: &str) -> Option<&str> {
    let n_open = text.find('{')?;
    let rest = &text[n_open + 1..];
    let n_close = rest.find('}')?;
    let c_body = &rest[..n_close];
    if c_body.is_empty() { None } else { Some(c_body) }
}

/// Replace every `{...}` token in `text` with `replacement`.
pub fn replace_placeholder_tokens(text: &str, replacement: &str) -> String {
    let mut c_out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(n_open) = rest.find('{') {
        let Some(n_close_rel) = rest[n_open + 1..].find('}') else {
            break;
        };
        let n_close = n_open + 1 + n_close_rel;
        if n_close == n_open + 1 {
            // Empty braces are literal text.
            c_out.push_str(&rest[..=n_close]);
        } else {
            c_out.push_str(&rest[..n_open]);
            c_out.push_str(replacement);
        }
        rest = &rest[n_close + 1..];
    }
    c_out.push_str(rest);
    c_out
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowsAndRanges

/// Move a 1-based row by a signed delta, clamped to the sheet top.
pub fn shift_row(n_row: u32, n_delta: i64) -> u32 {
    (n_row as i64 + n_delta).max(1) as u32
}

/// True when every cell text in the row is blank after trimming.
pub fn is_row_empty(sheet: &Worksheet, n_row: u32) -> bool {
    let n_col_max = sheet.get_highest_column();
    (1..=n_col_max).all(|n_col| sheet.get_value((n_col, n_row)).trim().is_empty())
}

/// Remove blank rows from the bottom of the sheet upward.
pub fn trim_trailing_empty_rows(sheet: &mut Worksheet, report: &mut ReportRender) {
    let mut n_row = sheet.get_highest_row();
    while n_row >= 1 && is_row_empty(sheet, n_row) {
        sheet.remove_row(&n_row, &1);
        report.cnt_rows_removed += 1;
        n_row -= 1;
    }
}

/// Parse an A1-style range ("B2:C4", or a single cell) into coordinates.
pub fn parse_merge_range(range: &str) -> Option<SpecMergeRange> {
    let (c_from, c_to) = match range.split_once(':') {
        Some((c_from, c_to)) => (c_from, c_to),
        None => (range, range),
    };
    let (Some(start_col), Some(start_row), ..) = index_from_coordinate(c_from) else {
        return None;
    };
    let (Some(end_col), Some(end_row), ..) = index_from_coordinate(c_to) else {
        return None;
    };
    Some(SpecMergeRange {
        start_col,
        start_row,
        end_col,
        end_row,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
