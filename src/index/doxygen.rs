//! Codec for the Doxygen search-index shard format
//!
//! A shard is a JS literal of nested arrays:
//!
//! ```text
//! var searchData=
//! [
//!   ['open',['open',['../class_file.html#a52c7',1,'File::open()']]],
//!   ['operator_3c_3c',['operator&lt;&lt;',['../classostream.html#a5266',1,'ostream']]]
//! ];
//! ```
//!
//! Each record is `[key, [name, occurrence...]]` with occurrences of the
//! form `[url, flag, label]`. Strings carry HTML entities, decoded on parse
//! and re-encoded by [`emit`]. Structurally broken records are reported as
//! defects and skipped; only an unreadable literal is a hard error.

use thiserror::Error;
use tracing::debug;

use super::{Defect, Entry, Occurrence};

/// Syntax error in a shard file. Fatal for the whole file, unlike a
/// per-record [`Defect`].
#[derive(Debug, Error)]
#[error("{message} at byte {offset}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

/// Parse result: structurally sound entries plus defects for the records
/// that had to be skipped.
#[derive(Debug)]
pub struct ParsedTable {
    pub entries: Vec<Entry>,
    pub defects: Vec<Defect>,
}

#[derive(Debug)]
enum Value {
    Str(String),
    Num(i64),
    Arr(Vec<Value>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Num(_) => "number",
            Value::Arr(_) => "array",
        }
    }
}

/// Parse one shard. Accepts the `var searchData=` header, a bare array
/// literal, and an optional trailing semicolon.
pub fn parse(input: &str) -> Result<ParsedTable, ParseError> {
    let start = input.find('[').ok_or_else(|| ParseError {
        offset: 0,
        message: "no table literal found".to_string(),
    })?;

    let mut scanner = Scanner {
        src: input,
        bytes: input.as_bytes(),
        pos: start,
    };

    let root = scanner.parse_array()?;
    scanner.skip_ws();
    if scanner.peek() == Some(b';') {
        scanner.pos += 1;
        scanner.skip_ws();
    }
    if scanner.pos != scanner.bytes.len() {
        return Err(scanner.error("trailing characters after table"));
    }

    let table = table_from_values(root);
    debug!(
        "parsed {} entries ({} defects)",
        table.entries.len(),
        table.defects.len()
    );
    Ok(table)
}

/// Render entries back out in the generator's shard format. Entities are
/// re-encoded, so `parse(emit(x))` reproduces `x`.
pub fn emit(entries: &[Entry]) -> String {
    let mut out = String::from("var searchData=\n[\n");
    for (i, entry) in entries.iter().enumerate() {
        out.push_str("  ['");
        out.push_str(&encode_entities(&entry.key));
        out.push_str("',['");
        out.push_str(&encode_entities(&entry.name));
        out.push('\'');
        for occ in &entry.occurrences {
            out.push_str(",['../");
            out.push_str(&encode_entities(&occ.page));
            out.push('#');
            out.push_str(&encode_entities(&occ.anchor));
            out.push_str("',1,'");
            out.push_str(&encode_entities(&occ.label));
            out.push_str("']");
        }
        out.push_str("]]");
        if i + 1 < entries.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("];\n");
    out
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Scanner<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some(b'[') => Ok(Value::Arr(self.parse_array()?)),
            Some(b'\'') => Ok(Value::Str(self.parse_string()?)),
            Some(b'-') | Some(b'0'..=b'9') => Ok(Value::Num(self.parse_number()?)),
            _ => Err(self.error("expected array, string, or number")),
        }
    }

    // Caller guarantees the scanner sits on '['.
    fn parse_array(&mut self) -> Result<Vec<Value>, ParseError> {
        self.pos += 1;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                }
                Some(b']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        self.pos += 1; // opening quote
        let mut raw = String::new();
        let mut segment = self.pos;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\'' => {
                    raw.push_str(&self.src[segment..self.pos]);
                    self.pos += 1;
                    return Ok(decode_entities(&raw));
                }
                b'\\' => {
                    raw.push_str(&self.src[segment..self.pos]);
                    self.pos += 1;
                    match self.src[self.pos..].chars().next() {
                        Some(c) => {
                            raw.push(c);
                            self.pos += c.len_utf8();
                            segment = self.pos;
                        }
                        None => break,
                    }
                }
                _ => self.pos += 1,
            }
        }
        Err(self.error("unterminated string"))
    }

    fn parse_number(&mut self) -> Result<i64, ParseError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.src[start..self.pos].parse().map_err(|_| ParseError {
            offset: start,
            message: "invalid number".to_string(),
        })
    }
}

fn table_from_values(root: Vec<Value>) -> ParsedTable {
    let mut entries = Vec::with_capacity(root.len());
    let mut defects = Vec::new();

    for (i, record) in root.into_iter().enumerate() {
        let fallback_key = format!("<record {i}>");
        let Value::Arr(fields) = record else {
            defects.push(Defect {
                key: fallback_key,
                message: "record is not an array".to_string(),
            });
            continue;
        };

        let mut fields = fields.into_iter();
        let key = match fields.next() {
            Some(Value::Str(k)) => k,
            other => {
                defects.push(Defect {
                    key: fallback_key,
                    message: format!(
                        "expected string key, found {}",
                        other.map_or("nothing", |v| v.type_name())
                    ),
                });
                continue;
            }
        };

        let payload = match fields.next() {
            Some(Value::Arr(p)) => p,
            other => {
                defects.push(Defect {
                    key,
                    message: format!(
                        "expected payload array, found {}",
                        other.map_or("nothing", |v| v.type_name())
                    ),
                });
                continue;
            }
        };

        let mut payload = payload.into_iter();
        let name = match payload.next() {
            Some(Value::Str(n)) => n,
            other => {
                defects.push(Defect {
                    key,
                    message: format!(
                        "expected display name, found {}",
                        other.map_or("nothing", |v| v.type_name())
                    ),
                });
                continue;
            }
        };

        let mut occurrences = Vec::new();
        for item in payload {
            match occurrence_from_value(item) {
                Ok(occ) => occurrences.push(occ),
                Err(message) => defects.push(Defect {
                    key: key.clone(),
                    message,
                }),
            }
        }

        entries.push(Entry {
            key,
            name,
            occurrences,
        });
    }

    ParsedTable { entries, defects }
}

fn occurrence_from_value(value: Value) -> Result<Occurrence, String> {
    let items = match value {
        Value::Arr(items) => items,
        other => {
            return Err(format!("occurrence is a {}, not an array", other.type_name()));
        }
    };

    let mut items = items.into_iter();
    let url = match items.next() {
        Some(Value::Str(u)) => u,
        _ => return Err("occurrence has no target url".to_string()),
    };
    // the middle field is a generator flag; its value is not used
    let _flag = items.next();
    let label = match items.next() {
        Some(Value::Str(l)) => l,
        _ => return Err("occurrence has no label".to_string()),
    };

    let (page, anchor) =
        split_anchor(&url).ok_or_else(|| format!("malformed anchor reference '{url}'"))?;

    Ok(Occurrence {
        label,
        page,
        anchor,
    })
}

/// Split `../page.html#anchorid` into page and anchor, stripping the
/// relative prefix the generator emits.
fn split_anchor(url: &str) -> Option<(String, String)> {
    let mut trimmed = url;
    while let Some(rest) = trimmed.strip_prefix("../") {
        trimmed = rest;
    }
    let (page, anchor) = trimmed.split_once('#')?;
    if page.is_empty() || anchor.is_empty() {
        return None;
    }
    Some((page.to_string(), anchor.to_string()))
}

fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match rest.find(';') {
            // longest entity we care about is &#xNNNN;
            Some(end) if end <= 9 => {
                let body = &rest[1..end];
                let decoded = match body {
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "amp" => Some('&'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => body.strip_prefix('#').and_then(|num| {
                        let code = if let Some(hex) =
                            num.strip_prefix('x').or_else(|| num.strip_prefix('X'))
                        {
                            u32::from_str_radix(hex, 16).ok()
                        } else {
                            num.parse().ok()
                        };
                        code.and_then(char::from_u32)
                    }),
                };
                match decoded {
                    Some(c) => {
                        out.push(c);
                        rest = &rest[end + 1..];
                    }
                    None => {
                        out.push('&');
                        rest = &rest[1..];
                    }
                }
            }
            _ => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn encode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\u{a0}' => out.push_str("&#160;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"var searchData=
[
  ['oct',['oct',['../ios_8h.html#ae661b435df22f8e8e643817f4f915123',1,'ios.h']]],
  ['open',['open',['../class_sd_base_file.html#a52c7074d47cf3798184d1fbaa7d2711a',1,'SdBaseFile::open(SdBaseFile *dirFile, uint16_t index, uint8_t oflag)'],['../classfstream.html#af61417d70e1106ce7f88965d684134d4',1,'fstream::open()']]],
  ['operator_3c_3c',['operator&lt;&lt;',['../classostream.html#a5266766c50e3a75df240fd170d8b0aa9',1,'ostream::operator&lt;&lt;(ostream &amp;(*pf)(ostream &amp;str))']]]
];
";

    #[test]
    fn parses_reference_sample() {
        let table = parse(SAMPLE).unwrap();
        assert!(table.defects.is_empty());
        assert_eq!(table.entries.len(), 3);

        let open = &table.entries[1];
        assert_eq!(open.key, "open");
        assert_eq!(open.occurrences.len(), 2);
        assert_eq!(open.occurrences[0].page, "class_sd_base_file.html");
        assert_eq!(
            open.occurrences[0].anchor,
            "a52c7074d47cf3798184d1fbaa7d2711a"
        );
        assert_eq!(open.occurrences[1].label, "fstream::open()");
    }

    #[test]
    fn decodes_entities_in_labels() {
        let table = parse(SAMPLE).unwrap();
        let shl = &table.entries[2];
        assert_eq!(shl.key, "operator_3c_3c");
        assert_eq!(shl.name, "operator<<");
        assert_eq!(
            shl.occurrences[0].label,
            "ostream::operator<<(ostream &(*pf)(ostream &str))"
        );
    }

    #[test]
    fn decode_handles_numeric_and_unknown_entities() {
        assert_eq!(decode_entities("iostream.h:&#160;x"), "iostream.h:\u{a0}x");
        assert_eq!(decode_entities("&#39;quoted&#39;"), "'quoted'");
        assert_eq!(decode_entities("&#x41;"), "A");
        // unknown entity and bare ampersand pass through
        assert_eq!(decode_entities("a &bogus; b"), "a &bogus; b");
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
    }

    #[test]
    fn malformed_records_become_defects() {
        let input = "var searchData=
[
  ['good',['good',['../page.html#a1',1,'good()']]],
  ['noanchor',['noanchor',['../page.html',1,'noanchor()']]],
  [42,['bad']],
  ['empty',['empty']]
];
";
        let table = parse(input).unwrap();

        let keys: Vec<_> = table.entries.iter().map(|e| e.key.as_str()).collect();
        // 'noanchor' and 'empty' survive structurally but with no usable
        // occurrences; the index loader drops them later
        assert_eq!(keys, ["good", "noanchor", "empty"]);
        assert!(table.entries[1].occurrences.is_empty());
        assert!(table.entries[2].occurrences.is_empty());
        assert_eq!(table.defects.len(), 2);
    }

    #[test]
    fn unreadable_literal_is_a_hard_error() {
        assert!(parse("no table here").is_err());
        assert!(parse("var searchData=\n[ ['broken',").is_err());
        assert!(parse("[ 'unterminated ]").is_err());
        assert!(parse("[] trailing").is_err());
    }

    #[test]
    fn emit_round_trips_through_parse() {
        let table = parse(SAMPLE).unwrap();
        let rendered = emit(&table.entries);
        let reparsed = parse(&rendered).unwrap();
        assert_eq!(reparsed.entries, table.entries);
        assert!(reparsed.defects.is_empty());
    }

    #[test]
    fn escaped_quotes_in_strings() {
        let table = parse(r"[['k',['it\'s',['../p.html#a1',1,'l']]]]").unwrap();
        assert_eq!(table.entries[0].name, "it's");
    }
}
