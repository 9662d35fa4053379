//! CSV import/export of entries.
//!
//! Exports are UTF-16LE with a `FF FE` byte-order mark so spreadsheet tools
//! open them with the right encoding. Imports sniff the encoding and accept
//! UTF-16LE (BOM required) or UTF-8 (BOM optional).
//!
//! Quoting follows the usual convention: a field containing a comma, a quote,
//! or a line break is wrapped in quotes and its inner quotes are doubled.
//! The decoder scans the whole document rather than splitting on lines, so
//! quoted line breaks survive a round trip.
//!
//! Row errors are all-or-nothing: a non-numeric `proficiencyLevel`, a blank
//! required field or a quote left open at the end rejects the whole document. Rows with fewer than four
//! fields are the one exception; they are logged and dropped.

use std::mem;

use crate::error::DrillError;
use crate::model::{Entry, ProficiencyLevel};

/// Column order of every export, and the header every import must match.
pub const COLUMNS: [&str; 6] = [
    "originalWord",
    "translation",
    "language",
    "proficiencyLevel",
    "exampleUsage",
    "explanation",
];

const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const MIN_FIELDS: usize = 4;

/// Decoded entries plus the lines that were dropped for being too short.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub entries: Vec<Entry>,
    pub skipped_lines: Vec<usize>,
}

/// Encode entries as a BOM-prefixed UTF-16LE CSV document.
pub fn encode(entries: &[Entry]) -> Vec<u8> {
    let text = encode_text(entries);
    let mut bytes = Vec::with_capacity(UTF16LE_BOM.len() + text.len() * 2);
    bytes.extend_from_slice(&UTF16LE_BOM);
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

/// The CSV text before it is turned into bytes.
pub fn encode_text(entries: &[Entry]) -> String {
    let mut out = COLUMNS.join(",");
    out.push('\n');
    for entry in entries {
        let level = entry.proficiency_level.to_string();
        let row = [
            escape_field(&entry.original_word),
            escape_field(&entry.translation),
            escape_field(&entry.language),
            escape_field(&level),
            escape_field(&entry.example_usage),
            escape_field(&entry.explanation),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Quote a field if it contains a delimiter, a quote, or a line break.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Decode a CSV document into unsaved entries.
pub fn decode(bytes: &[u8]) -> Result<Vec<Entry>, DrillError> {
    decode_with_report(bytes).map(|decoded| decoded.entries)
}

/// Like [`decode`], but also reports which short rows were dropped.
pub fn decode_with_report(bytes: &[u8]) -> Result<Decoded, DrillError> {
    let text = decode_text(bytes)?;
    if text.is_empty() {
        return Err(DrillError::format(0, "document is empty"));
    }

    // The header is compared verbatim, before any quote processing.
    let (first_line, body) = text.split_once('\n').unwrap_or((text.as_str(), ""));
    let expected = COLUMNS.join(",");
    if first_line.strip_suffix('\r').unwrap_or(first_line) != expected {
        return Err(DrillError::format(
            1,
            format!("expected header '{expected}'"),
        ));
    }
    let records = split_records(body, 2)?;

    let mut decoded = Decoded::default();
    for record in records {
        if record.is_blank() {
            continue;
        }
        if record.fields.len() < MIN_FIELDS {
            tracing::warn!(
                line = record.line,
                fields = record.fields.len(),
                "dropping CSV row with too few fields"
            );
            decoded.skipped_lines.push(record.line);
            continue;
        }
        decoded.entries.push(record.into_entry()?);
    }

    tracing::debug!(
        entries = decoded.entries.len(),
        skipped = decoded.skipped_lines.len(),
        "decoded CSV document"
    );
    Ok(decoded)
}

fn decode_text(bytes: &[u8]) -> Result<String, DrillError> {
    if let Some(body) = bytes.strip_prefix(UTF16LE_BOM.as_slice()) {
        if body.len() % 2 != 0 {
            return Err(DrillError::format(0, "truncated UTF-16LE data"));
        }
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units)
            .map_err(|e| DrillError::format(0, format!("invalid UTF-16LE: {e}")));
    }

    let body = bytes.strip_prefix(UTF8_BOM.as_slice()).unwrap_or(bytes);
    std::str::from_utf8(body)
        .map(str::to_string)
        .map_err(|e| DrillError::format(0, format!("invalid UTF-8: {e}")))
}

#[derive(Debug)]
struct Record {
    /// 1-based line on which the record starts.
    line: usize,
    fields: Vec<String>,
}

impl Record {
    fn is_blank(&self) -> bool {
        self.fields.len() == 1 && self.fields[0].trim().is_empty()
    }

    fn into_entry(self) -> Result<Entry, DrillError> {
        let line = self.line;
        let mut fields = self.fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();

        let original_word = next();
        let translation = next();
        let language = next();
        let level_token = next();
        let example_usage = next();
        let explanation = next();

        for (name, value) in [
            ("originalWord", &original_word),
            ("translation", &translation),
            ("language", &language),
        ] {
            if value.trim().is_empty() {
                return Err(DrillError::format(line, format!("{name} is empty")));
            }
        }

        let level: i64 = level_token.trim().parse().map_err(|_| {
            DrillError::format(
                line,
                format!("proficiencyLevel '{level_token}' is not a number"),
            )
        })?;

        Ok(Entry {
            id: None,
            original_word,
            translation,
            language,
            proficiency_level: ProficiencyLevel::new(level),
            example_usage,
            explanation,
        })
    }
}

/// Split CSV text into records, honouring quotes across line breaks.
///
/// `first_line` is the physical line number `text` starts on.
fn split_records(text: &str, first_line: usize) -> Result<Vec<Record>, DrillError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = first_line;
    let mut record_line = first_line;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(mem::take(&mut field)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                fields.push(mem::take(&mut field));
                records.push(Record {
                    line: record_line,
                    fields: mem::take(&mut fields),
                });
                line += 1;
                record_line = line;
            }
            '\n' => {
                field.push('\n');
                line += 1;
            }
            other => field.push(other),
        }
    }

    if in_quotes {
        return Err(DrillError::format(record_line, "unterminated quoted field"));
    }

    // Last record without a trailing newline.
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(Record {
            line: record_line,
            fields,
        });
    }

    Ok(records)
}
