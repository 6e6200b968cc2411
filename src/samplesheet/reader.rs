//! Splits bracket-sectioned, comma separated text into named sections of rows.

use std::path::Path;

use crate::core::{Result, SnakeErrorKind};

/// Characters trimmed from both ends of a `[Section]` line.
const HEADER_TRIM: &[char] = &['[', ']', ',', ';'];

/// A row of the sheet, together with the (1-based) line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub line: usize,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub header: String,
    pub rows: Vec<Row>,
}

/// Read `text` into its sections, in the order they first appear.
///
/// `path` is only used for error reporting.
pub fn read_sections(text: &str, path: &Path) -> Result<Vec<Section>> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<usize> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let line_number = index + 1;

        if line.starts_with('[') {
            let header = line.trim_matches(HEADER_TRIM).to_string();
            let position = match sections.iter().position(|s| s.header == header) {
                Some(position) => {
                    // A repeated header starts over
                    sections[position].rows.clear();
                    position
                }
                None => {
                    sections.push(Section {
                        header,
                        rows: Vec::new(),
                    });
                    sections.len() - 1
                }
            };
            current = Some(position);
        } else if line.is_empty() {
            continue;
        } else {
            let position = current.ok_or_else(|| SnakeErrorKind::RowOutsideSection {
                path: path.to_path_buf(),
                line: line_number,
            })?;

            let fields: Vec<String> = line
                .split(',')
                .filter(|field| !field.is_empty())
                .map(str::to_string)
                .collect();

            if !fields.is_empty() {
                sections[position].rows.push(Row {
                    line: line_number,
                    fields,
                });
            }
        }
    }

    Ok(sections)
}
