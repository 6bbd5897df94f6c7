// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HEADER section reader

use crate::tokenizer::parse_value;
use ifc_bridge_model::{AttributeValue, FileHeader, ParseError, Result};

/// Split a section body into `;` terminated records, ignoring `;` in strings
fn records(section: &str) -> Vec<&str> {
    let bytes = section.as_bytes();
    let mut out = Vec::new();
    let mut in_string = false;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' if in_string && bytes.get(i + 1) == Some(&b'\'') => i += 1,
            b'\'' => in_string = !in_string,
            b';' if !in_string => {
                let record = section[start..i].trim();
                if !record.is_empty() {
                    out.push(record);
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    out
}

fn strings(value: &AttributeValue) -> Vec<String> {
    match value {
        AttributeValue::List(items) => items.iter().flat_map(strings).collect(),
        other => other.as_string().map(str::to_string).into_iter().collect(),
    }
}

/// Read schema and file name information from the HEADER section
pub fn parse_header(content: &str) -> Result<FileHeader> {
    let start = content
        .find("HEADER;")
        .ok_or_else(|| ParseError::InvalidHeader("missing HEADER section".into()))?;
    let body = &content[start + "HEADER;".len()..];
    let end = body
        .find("ENDSEC;")
        .ok_or_else(|| ParseError::InvalidHeader("unterminated HEADER section".into()))?;

    let mut header = FileHeader::default();
    for record in records(&body[..end]) {
        let value = parse_value(record).map_err(ParseError::InvalidHeader)?;
        let AttributeValue::TypedValue(name, args) = value else {
            continue;
        };
        match name.as_str() {
            "FILE_SCHEMA" => {
                header.schema_version = args.first().map(strings).unwrap_or_default().join(",");
            }
            "FILE_NAME" => {
                header.file_name = args.first().and_then(|v| v.as_string()).map(str::to_string);
                header.timestamp = args.get(1).and_then(|v| v.as_string()).map(str::to_string);
                header.originating_system =
                    args.get(5).and_then(|v| v.as_string()).map(str::to_string);
            }
            "FILE_DESCRIPTION" => {
                header.description = args.first().map(strings).unwrap_or_default();
            }
            _ => {}
        }
    }

    if header.schema_version.is_empty() {
        return Err(ParseError::InvalidHeader("missing FILE_SCHEMA".into()));
    }
    Ok(header)
}
