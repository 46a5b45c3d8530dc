//! Label scanning: pull the byte offsets and record counts the binary
//! decoder needs out of a PDS-style `KEY = VALUE` label.
//!
//! The scan is a single forward pass that stops at the `SP_SPECTRUM_QA`
//! object declaration (or the label `END`); nothing past that point carries
//! an offset we use. Lines are tokenised once, then every field is looked up
//! independently so the result is built in one piece or not at all.

use crate::data::model::FieldOffsets;
use crate::error::{Error, Result};

/// Object whose declaration ends the useful part of the label.
pub const QA_OBJECT: &str = "SP_SPECTRUM_QA";

/// Column declarations put `START_BYTE` this many lines below `NAME`.
const COLUMN_START_BYTE_DISTANCE: usize = 3;

// ---------------------------------------------------------------------------
// Statement tokenising
// ---------------------------------------------------------------------------

/// Split `KEY = VALUE` into trimmed halves. Lines without `=` yield `None`.
fn split_statement(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    Some((key.trim(), value.trim()))
}

/// `true` once the scan has reached the point where no more offsets exist.
pub fn is_label_end(line: &str) -> bool {
    if line.trim() == "END" {
        return true;
    }
    matches!(split_statement(line), Some(("OBJECT", QA_OBJECT)))
}

fn unquote(value: &str) -> &str {
    value.trim_matches('"')
}

/// Leading integer of a value, ignoring a trailing unit such as `<BYTES>`.
fn leading_token(value: &str) -> &str {
    value
        .split(|c: char| c.is_whitespace() || c == '<')
        .next()
        .unwrap_or("")
}

fn parse_positive(field: &'static str, value: &str) -> Result<u64> {
    let token = leading_token(value);
    let parsed: u64 = token.parse().map_err(|_| Error::MalformedLabel {
        field,
        reason: format!("'{value}' is not an integer"),
    })?;
    if parsed == 0 {
        return Err(Error::MalformedLabel {
            field,
            reason: "must be positive".into(),
        });
    }
    Ok(parsed)
}

fn missing(field: &'static str, what: String) -> Error {
    Error::MalformedLabel {
        field,
        reason: format!("{what} not found"),
    }
}

// ---------------------------------------------------------------------------
// Tokenised label
// ---------------------------------------------------------------------------

/// Label lines up to the scan terminator, one optional statement per line.
///
/// Line positions are preserved so "N lines below" lookups see comments and
/// blank lines exactly as the product lays them out.
struct Statements<'a> {
    lines: Vec<Option<(&'a str, &'a str)>>,
}

impl<'a> Statements<'a> {
    fn new(lines: &'a [String]) -> Self {
        Self {
            lines: lines.iter().map(|l| split_statement(l)).collect(),
        }
    }

    /// Position of the last statement matching `pred`; later declarations win.
    fn rfind(&self, pred: impl Fn(&str, &str) -> bool) -> Option<usize> {
        self.lines
            .iter()
            .rposition(|stmt| stmt.is_some_and(|(k, v)| pred(k, v)))
    }

    fn value_at(&self, index: usize) -> Option<&'a str> {
        self.lines.get(index).copied().flatten().map(|(_, v)| v)
    }

    /// `^POINTER = 1234 <BYTES>`
    fn pointer(&self, key: &str, field: &'static str) -> Result<u64> {
        let index = self
            .rfind(|k, _| k == key)
            .ok_or_else(|| missing(field, format!("pointer {key}")))?;
        parse_positive(field, self.value_at(index).unwrap_or(""))
    }

    /// `KEY = 42`
    fn keyword(&self, key: &str, field: &'static str) -> Result<u64> {
        let index = self
            .rfind(|k, _| k == key)
            .ok_or_else(|| missing(field, format!("keyword {key}")))?;
        parse_positive(field, self.value_at(index).unwrap_or(""))
    }

    /// Value on the line right after `OBJECT = <name>`.
    fn object_rows(&self, object: &str, field: &'static str) -> Result<u64> {
        let index = self
            .rfind(|k, v| k == "OBJECT" && v == object)
            .ok_or_else(|| missing(field, format!("object {object}")))?;
        let value = self
            .value_at(index + 1)
            .ok_or_else(|| missing(field, format!("row count after object {object}")))?;
        parse_positive(field, value)
    }

    /// Start byte of the column declared by `NAME = "<name>"`.
    fn column_start(&self, name: &str, field: &'static str) -> Result<u64> {
        let index = self
            .rfind(|k, v| k == "NAME" && unquote(v) == name)
            .ok_or_else(|| missing(field, format!("column {name}")))?;
        let value = self
            .value_at(index + COLUMN_START_BYTE_DISTANCE)
            .ok_or_else(|| missing(field, format!("start byte of column {name}")))?;
        parse_positive(field, value)
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Scan label lines and extract every offset the binary decoder needs.
///
/// Consumes lines only up to the `SP_SPECTRUM_QA` declaration. Any missing
/// or non-positive field is a [`Error::MalformedLabel`].
pub fn scan_label<I, S>(lines: I) -> Result<FieldOffsets>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<String> = lines
        .into_iter()
        .map(|l| l.as_ref().trim_end_matches(['\r', '\n']).to_string())
        .take_while(|l| !is_label_end(l))
        .collect();
    let label = Statements::new(&lines);

    let offsets = FieldOffsets {
        wavelength_start: label.pointer("^SP_SPECTRUM_WAV", "wavelength_start")?,
        radiance_start: label.pointer("^SP_SPECTRUM_RAD", "radiance_start")?,
        reflectance_start: label.pointer("^SP_SPECTRUM_REF", "reflectance_start")?,
        radiance_rows: label.object_rows("SP_SPECTRUM_RAD", "radiance_rows")? as usize,
        reflectance_rows: label.object_rows("SP_SPECTRUM_REF", "reflectance_rows")? as usize,
        ancillary_start: label.pointer("^ANCILLARY_AND_SUPPLEMENT_DATA", "ancillary_start")?,
        row_bytes: label.keyword("ROW_BYTES", "row_bytes")?,
        emission_offset: label.column_start("EMISSION_ANGLE", "emission_offset")?,
        incidence_offset: label.column_start("INCIDENCE_ANGLE", "incidence_offset")?,
        phase_offset: label.column_start("PHASE_ANGLE", "phase_offset")?,
        observation_count: label.keyword("NORMAL_SP_POINT_NUM", "observation_count")? as usize,
    };
    log::debug!("label offsets: {offsets:?}");
    Ok(offsets)
}
