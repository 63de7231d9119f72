//! Reader for the bibliography files shipped inside source archives.
//!
//! BibTeX is forgiving in the wild, so the reader is too: it scans for
//! `@type{key, tag = value, ...}` blocks, keeps tag values with their
//! brace/quote delimiters removed, and skips anything it cannot make
//! sense of rather than failing the whole file. `@comment`, `@preamble`
//! and `@string` blocks are ignored.

use std::collections::HashMap;
use std::path::Path;
use std::{fs, io};

/// Errors surfaced by the bibliography reader.
#[derive(Debug, thiserror::Error)]
pub enum BibError {
    /// A required tag is absent or empty.
    #[error("bibliography entry is missing its {0} field")]
    MissingField(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// One bibliography entry: its type, citation key and tag map. Tag
/// names are lowercased; values keep their inner text only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibEntry {
    /// Entry type, e.g. `article` or `inproceedings`, lowercased.
    pub kind: String,
    /// Citation key.
    pub key: String,
    pub tags: HashMap<String, String>,
}

impl BibEntry {
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }
}

/// Read and parse a bibliography file.
pub fn read_bib_file(path: &Path) -> Result<Vec<BibEntry>, BibError> {
    let text = fs::read_to_string(path)?;
    Ok(parse_bib(&text))
}

/// Extract the author and title of an entry, with the archive's
/// curly-brace grouping stripped.
pub fn query_entry(entry: &BibEntry) -> Result<(String, String), BibError> {
    let author = entry.tag("author").unwrap_or_default();
    if author.is_empty() {
        return Err(BibError::MissingField("author"));
    }
    let title = entry.tag("title").unwrap_or_default();
    if title.is_empty() {
        return Err(BibError::MissingField("title"));
    }
    Ok((strip_braces(author), strip_braces(title)))
}

fn strip_braces(s: &str) -> String {
    s.replace(['{', '}'], "")
}

/// Parse bibliography text into its entries, in file order.
#[must_use]
pub fn parse_bib(text: &str) -> Vec<BibEntry> {
    let mut entries = Vec::new();
    let mut scanner = Scanner::new(text);

    while scanner.seek(b'@') {
        let kind = scanner.take_while(|c| c.is_ascii_alphabetic()).to_lowercase();
        if kind.is_empty() || !scanner.consume(b'{') {
            // Stray `@` or an entry form we do not read; resynchronise
            // at the next marker.
            continue;
        }
        if matches!(kind.as_str(), "comment" | "preamble" | "string") {
            scanner.skip_balanced();
            continue;
        }

        let key = scanner.take_while(|c| c != b',' && c != b'}').trim().to_string();
        let mut entry = BibEntry { kind, key, tags: HashMap::new() };

        loop {
            scanner.skip_whitespace_and(b',');
            if scanner.consume(b'}') || scanner.at_end() {
                break;
            }
            let name = scanner.take_while(|c| c != b'=' && c != b'}').trim().to_lowercase();
            if !scanner.consume(b'=') {
                // Dangling token before the closing brace.
                continue;
            }
            let value = scanner.take_value();
            if !name.is_empty() {
                entry.tags.insert(name, value);
            }
        }
        entries.push(entry);
    }
    entries
}

/// Byte-oriented cursor over the bibliography text.
struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { bytes: text.as_bytes(), pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Advance past the next occurrence of `target`. Returns false at
    /// end of input.
    fn seek(&mut self, target: u8) -> bool {
        while let Some(&c) = self.bytes.get(self.pos) {
            self.pos += 1;
            if c == target {
                return true;
            }
        }
        false
    }

    fn consume(&mut self, expected: u8) -> bool {
        self.skip_whitespace();
        if self.bytes.get(self.pos) == Some(&expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn skip_whitespace_and(&mut self, extra: u8) {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_whitespace() || *c == extra)
        {
            self.pos += 1;
        }
    }

    /// Take bytes while `keep` holds, without consuming the terminator.
    fn take_while(&mut self, keep: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|c| keep(*c)) {
            self.pos += 1;
        }
        // The input is valid UTF-8 and the predicates split on ASCII.
        std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or_default()
    }

    /// Skip a `{...}` body with nested braces; the opening brace has
    /// already been consumed.
    fn skip_balanced(&mut self) {
        let mut depth = 1usize;
        while let Some(&c) = self.bytes.get(self.pos) {
            self.pos += 1;
            match c {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Read one tag value: `{balanced}`, `"quoted"` or a bare word.
    /// Delimiters are dropped, inner braces kept.
    fn take_value(&mut self) -> String {
        self.skip_whitespace();
        match self.bytes.get(self.pos) {
            Some(&b'{') => {
                self.pos += 1;
                let start = self.pos;
                let mut depth = 1usize;
                while let Some(&c) = self.bytes.get(self.pos) {
                    match c {
                        b'{' => depth += 1,
                        b'}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    self.pos += 1;
                }
                let value = &self.bytes[start..self.pos.min(self.bytes.len())];
                self.pos += 1; // past the closing brace
                String::from_utf8_lossy(value).trim().to_string()
            }
            Some(&b'"') => {
                self.pos += 1;
                let start = self.pos;
                while self.bytes.get(self.pos).is_some_and(|c| *c != b'"') {
                    self.pos += 1;
                }
                let value = &self.bytes[start..self.pos.min(self.bytes.len())];
                self.pos += 1; // past the closing quote
                String::from_utf8_lossy(value).trim().to_string()
            }
            _ => self
                .take_while(|c| c != b',' && c != b'}' && c != b'\n')
                .trim()
                .to_string(),
        }
    }
}
