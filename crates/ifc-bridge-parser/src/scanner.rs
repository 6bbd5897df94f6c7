// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fast entity scanner using memchr
//!
//! Finds record boundaries in the DATA section without tokenizing attributes.

use memchr::{memchr, memchr2};
use rustc_hash::FxHashMap;

/// Entity index mapping ID to byte offsets
pub type EntityIndex = FxHashMap<u32, (usize, usize)>;

/// One record boundary found by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedEntity<'a> {
    /// STEP id
    pub id: u32,
    /// Type name exactly as written
    pub type_name: &'a str,
    /// Byte offset of the leading `#`
    pub start: usize,
    /// Byte offset just past the terminating `;`
    pub end: usize,
}

/// Iterator over the records of a DATA section
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a scanner positioned after the `DATA;` marker
    pub fn new(content: &'a str) -> Self {
        let pos = content.find("DATA;").map(|p| p + 5).unwrap_or(0);
        Self { content, pos }
    }

    fn skip_inline_space(&mut self) {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() && matches!(bytes[self.pos], b' ' | b'\t') {
            self.pos += 1;
        }
    }

    /// Advance past the terminating `;`, honouring quoted strings
    fn find_record_end(&mut self) -> Option<usize> {
        let bytes = self.content.as_bytes();
        let mut in_string = false;

        while self.pos < bytes.len() {
            if in_string {
                let offset = memchr(b'\'', &bytes[self.pos..])?;
                self.pos += offset;
                if bytes.get(self.pos + 1) == Some(&b'\'') {
                    self.pos += 2;
                    continue;
                }
                in_string = false;
                self.pos += 1;
                continue;
            }

            let offset = memchr2(b'\'', b';', &bytes[self.pos..])?;
            self.pos += offset;
            if bytes[self.pos] == b';' {
                self.pos += 1;
                return Some(self.pos);
            }
            in_string = true;
            self.pos += 1;
        }
        None
    }
}

impl<'a> Iterator for EntityScanner<'a> {
    type Item = ScannedEntity<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.content.as_bytes();

        while self.pos < bytes.len() {
            let hash_pos = memchr(b'#', &bytes[self.pos..])?;
            self.pos += hash_pos;

            // A definition starts a statement; a reference sits inside one
            let mut back = self.pos;
            while back > 0 && matches!(bytes[back - 1], b' ' | b'\t') {
                back -= 1;
            }
            let at_statement_start =
                back == 0 || matches!(bytes[back - 1], b'\n' | b'\r' | b';' | b'/');
            if !at_statement_start {
                self.pos += 1;
                continue;
            }

            let start = self.pos;
            self.pos += 1;
            let id_start = self.pos;
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
            let Ok(id) = self.content[id_start..self.pos].parse::<u32>() else {
                continue;
            };

            self.skip_inline_space();
            if bytes.get(self.pos) != Some(&b'=') {
                continue;
            }
            self.pos += 1;
            self.skip_inline_space();

            let type_start = self.pos;
            while self.pos < bytes.len()
                && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }
            if self.pos == type_start {
                continue;
            }
            let type_name = &self.content[type_start..self.pos];

            let end = self.find_record_end()?;
            return Some(ScannedEntity {
                id,
                type_name,
                start,
                end,
            });
        }

        None
    }
}

/// Index every record by id
///
/// Returns the byte ranges together with the type name of each record so
/// a type index can be built without decoding attributes.
pub fn build_index(content: &str) -> (EntityIndex, Vec<(u32, &str)>) {
    let mut index = EntityIndex::default();
    let mut types = Vec::new();
    for scanned in EntityScanner::new(content) {
        index.insert(scanned.id, (scanned.start, scanned.end));
        types.push((scanned.id, scanned.type_name));
    }
    (index, types)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('2O2Fr$t4X7Zf8NOew3FLOH',#2,'Project;One',$,$,$,$,(#20),#7);
#2=IFCOWNERHISTORY(#3,#6,$,.ADDED.,$,$,$,0);
  #10 = IFCCARTESIANPOINT((0.,0.,0.));
#11=IFCDIRECTION((0.,0.,1.));
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_scanner_finds_all_records() {
        let found: Vec<_> = EntityScanner::new(TEST_IFC).collect();
        assert_eq!(found.len(), 4);
        assert_eq!(found[0].id, 1);
        assert_eq!(found[0].type_name, "IFCPROJECT");
        assert_eq!(found[2].id, 10);
        assert_eq!(found[2].type_name, "IFCCARTESIANPOINT");
    }

    #[test]
    fn test_semicolon_inside_string_does_not_end_record() {
        let first = EntityScanner::new(TEST_IFC).next().unwrap();
        let text = &TEST_IFC[first.start..first.end];
        assert!(text.ends_with("#7);"));
        assert!(text.contains("Project;One"));
    }

    #[test]
    fn test_build_index() {
        let (index, types) = build_index(TEST_IFC);
        assert_eq!(index.len(), 4);
        assert!(index.contains_key(&11));
        assert!(types.iter().any(|(id, ty)| *id == 2 && *ty == "IFCOWNERHISTORY"));
    }
}
