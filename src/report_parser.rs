use std::ops::Range;
use std::path::Path;

use nalgebra::{vector, Vector3};
use tracing::debug;

use crate::{
    datatypes::{ListingReport, PostlistReport},
    error::MicroFeError,
};

const SLICE_COUNT_LINE: usize = 32;
const ELEMENT_TOTAL_LINE: usize = 60;
const NODE_TOTAL_LINE: usize = 61;

/// Reaction force rows carry the top slice index here
const RF_SLICE: Range<usize> = 12..15;
/// Numeric node id
const RF_NODE_ID: Range<usize> = 98..101;
const RF_X: Range<usize> = 60..75;
const RF_Y: Range<usize> = 77..91;
const RF_Z: Range<usize> = 92..107;

/// Element type marker of energy density rows
const SED_TYPE: Range<usize> = 5..6;
const SED_ELEMENT_ID: Range<usize> = 28..31;
const SED_VALUE: Range<usize> = 23..38;

/// Splits a report into lines without their `\n` or `\r\n` endings
///
/// Reports are read as raw bytes so every byte is one column, whatever the
/// encoding of header text.
fn split_lines(contents: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = contents
        .split(|b| *b == b'\n')
        .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
        .collect();
    if contents.ends_with(b"\n") {
        lines.pop();
    }
    lines
}

/// Slices a line by column offsets, clamping past-the-end ranges
fn column(line: &[u8], range: Range<usize>) -> &[u8] {
    let end = range.end.min(line.len());
    let start = range.start.min(end);
    &line[start..end]
}

/// Like [`column`] but only when the whole range lies inside the line
///
/// A row that stops inside an id range would still carry its line break
/// there, so it never matches.
fn field(line: &[u8], range: Range<usize>) -> Option<&[u8]> {
    line.get(range)
}

fn is_digits(text: Option<&[u8]>) -> bool {
    match text {
        Some(t) => !t.is_empty() && t.iter().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

fn parse_number<T: std::str::FromStr>(text: &[u8]) -> Option<T> {
    std::str::from_utf8(text).ok()?.trim().parse().ok()
}

fn parse_float(line: &[u8], range: Range<usize>, line_no: usize) -> Result<f64, MicroFeError> {
    let text = column(line, range.clone());
    match parse_number(text) {
        Some(v) => Ok(v),
        None => Err(MicroFeError::ReportLayout(format!(
            "Line {line_no}: expected a number in columns {}..{}, found '{}'",
            range.start,
            range.end,
            String::from_utf8_lossy(text)
        ))),
    }
}

fn header_integer<T: std::str::FromStr>(
    lines: &[&[u8]],
    index: usize,
    width: usize,
    what: &str,
) -> Result<T, MicroFeError> {
    let line = match lines.get(index) {
        Some(l) => *l,
        None => {
            return Err(MicroFeError::ReportLayout(format!(
                "Listing ends after {} lines, {what} expected on line {}",
                lines.len(),
                index + 1
            )))
        }
    };
    let text = &line[line.len().saturating_sub(width)..];
    match parse_number(text) {
        Some(v) => Ok(v),
        None => Err(MicroFeError::ReportLayout(format!(
            "Line {}: expected {what}, found '{}'",
            index + 1,
            String::from_utf8_lossy(text)
        ))),
    }
}

/// Parses the contents of a LISTING report
///
/// # Arguments
/// * `contents` - The raw report bytes
///
/// # Returns
/// The model totals and every reaction force row of the loaded surface
pub fn parse_listing(contents: &[u8]) -> Result<ListingReport, MicroFeError> {
    let lines = split_lines(contents);

    let slice_count: u32 = header_integer(&lines, SLICE_COUNT_LINE, 3, "slice count")?;
    let element_total: u64 = header_integer(&lines, ELEMENT_TOTAL_LINE, 9, "element total")?;
    let node_total: u64 = header_integer(&lines, NODE_TOTAL_LINE, 9, "node total")?;

    let slice_marker = slice_count.to_string();
    let mut reaction_forces: Vec<Vector3<f64>> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if field(line, RF_SLICE) != Some(slice_marker.as_bytes())
            || !is_digits(field(line, RF_NODE_ID))
        {
            continue;
        }
        reaction_forces.push(vector![
            parse_float(line, RF_X, i + 1)?,
            parse_float(line, RF_Y, i + 1)?,
            parse_float(line, RF_Z, i + 1)?
        ]);
    }

    debug!(
        slice_count,
        element_total,
        node_total,
        reaction_rows = reaction_forces.len(),
        "parsed listing"
    );

    Ok(ListingReport {
        slice_count,
        element_total,
        node_total,
        reaction_forces,
    })
}

/// Parses the contents of a POSTLIST report into per-element strain energy
/// densities
pub fn parse_postlist(contents: &[u8]) -> Result<PostlistReport, MicroFeError> {
    let mut energy_densities: Vec<f64> = Vec::new();

    for (i, line) in split_lines(contents).iter().enumerate() {
        if field(line, SED_TYPE) != Some(b"2".as_slice())
            || !is_digits(field(line, SED_ELEMENT_ID))
        {
            continue;
        }
        energy_densities.push(parse_float(line, SED_VALUE, i + 1)?);
    }

    debug!(elements = energy_densities.len(), "parsed postlist");

    Ok(PostlistReport { energy_densities })
}

pub fn load_listing(path: &Path) -> Result<ListingReport, MicroFeError> {
    let contents = std::fs::read(path).map_err(|err| MicroFeError::io(path, err))?;
    parse_listing(&contents).map_err(|err| match err {
        MicroFeError::ReportLayout(msg) => {
            MicroFeError::ReportLayout(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

pub fn load_postlist(path: &Path) -> Result<PostlistReport, MicroFeError> {
    let contents = std::fs::read(path).map_err(|err| MicroFeError::io(path, err))?;
    parse_postlist(&contents).map_err(|err| match err {
        MicroFeError::ReportLayout(msg) => {
            MicroFeError::ReportLayout(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}
