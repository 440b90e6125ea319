//! Version field rewriting by byte splicing.
//!
//! The parser only locates the version-bearing elements. The rewritten
//! document is the original byte sequence with the text of those elements
//! replaced, so the declaration, whitespace, attribute quoting, comments and
//! every unrelated element come out exactly as they went in.

use crate::metadata::error::{PatchError, Result, XmlFault};
use memchr::{memchr, memmem};
use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use std::fs;
use std::ops::Range;
use std::path::Path;

const CDATA_OPEN: &[u8] = b"<![CDATA[";
const CDATA_CLOSE: &[u8] = b"]]>";

/// A replacement of `range` in the source document.
#[derive(Debug)]
struct Splice {
    range: Range<usize>,
    replacement: String,
}

/// Set the text of every element named in `field_names` to `new_value`.
///
/// Elements are matched by local name anywhere in the tree, so a prefixed
/// `<mw:release>` matches `release`. The document is rewritten only when at
/// least one element's text actually changes; the return value says whether
/// that happened.
///
/// Matching by name rather than by fixed location tolerates the fields moving
/// between releases of the producing application, at the cost of also
/// rewriting a same-named element in an unrelated subtree.
pub fn patch_version_fields<P: AsRef<Path>>(doc_path: P, field_names: &[&str], new_value: &str) -> Result<bool> {
    let doc_path = doc_path.as_ref();
    let original = fs::read(doc_path).map_err(|source| PatchError::IoFailure {
        path: doc_path.to_path_buf(),
        source,
    })?;

    let patched = patch_document(&original, field_names, new_value).map_err(|source| PatchError::MalformedXml {
        path: doc_path.to_path_buf(),
        source,
    })?;

    match patched {
        Some(bytes) => {
            fs::write(doc_path, bytes).map_err(|source| PatchError::IoFailure {
                path: doc_path.to_path_buf(),
                source,
            })?;
            Ok(true)
        },
        None => Ok(false),
    }
}

/// Apply the field rewrite to a document held in memory.
///
/// Returns `Ok(None)` when every matching element already holds `new_value`.
pub fn patch_document(xml: &[u8], field_names: &[&str], new_value: &str) -> std::result::Result<Option<Vec<u8>>, XmlFault> {
    let text = std::str::from_utf8(xml).map_err(|e| XmlFault::new(e.valid_up_to(), "document is not valid UTF-8"))?;
    // The parser skips a byte order mark without counting it in its positions.
    let body = text.strip_prefix('\u{feff}').unwrap_or(text);
    let bom_len = text.len() - body.len();
    let splices = find_splices(body, field_names, new_value).map_err(|mut fault| {
        fault.position = fault.position.saturating_add(bom_len as u64);
        fault
    })?;
    if splices.is_empty() {
        return Ok(None);
    }

    let extra: usize = splices.iter().map(|s| s.replacement.len()).sum();
    let mut out = Vec::with_capacity(xml.len() + extra);
    let mut cursor = 0;
    for splice in &splices {
        out.extend_from_slice(&xml[cursor..bom_len + splice.range.start]);
        out.extend_from_slice(splice.replacement.as_bytes());
        cursor = bom_len + splice.range.end;
    }
    out.extend_from_slice(&xml[cursor..]);

    Ok(Some(out))
}

/// Walk the document and collect the text spans that need replacing.
fn find_splices(text: &str, field_names: &[&str], new_value: &str) -> std::result::Result<Vec<Splice>, XmlFault> {
    let bytes = text.as_bytes();
    let is_field = |local: &[u8]| field_names.iter().any(|f| f.as_bytes() == local);
    let escaped = escape(new_value);

    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut splices = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| XmlFault::new(reader.error_position(), e.to_string()))?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                if depth == 0 && saw_root {
                    return Err(XmlFault::new(end, "more than one root element"));
                }
                depth += 1;
                saw_root = true;

                if is_field(e.local_name().as_ref()) {
                    let span = end..leading_text_end(bytes, end)?;
                    let current = decode_text(&text[span.clone()], span.start)?;
                    if current != new_value {
                        splices.push(Splice {
                            range: span,
                            replacement: escaped.to_string(),
                        });
                    }
                }
            },
            Event::Empty(e) => {
                if depth == 0 && saw_root {
                    return Err(XmlFault::new(end, "more than one root element"));
                }
                saw_root = true;

                if is_field(e.local_name().as_ref()) && !new_value.is_empty() {
                    if end < 2 || &bytes[end - 2..end] != b"/>" {
                        return Err(XmlFault::new(end, "unexpected end of empty element"));
                    }
                    let qname = std::str::from_utf8(e.name().as_ref())
                        .map_err(|_| XmlFault::new(end, "element name is not valid UTF-8"))?
                        .to_string();
                    splices.push(Splice {
                        range: end - 2..end,
                        replacement: format!(">{}</{}>", escaped, qname),
                    });
                }
            },
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| XmlFault::new(end, "closing tag without an open element"))?;
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if depth != 0 {
        return Err(XmlFault::new(bytes.len(), "unclosed element at end of document"));
    }
    if !saw_root {
        return Err(XmlFault::new(bytes.len(), "document has no root element"));
    }

    Ok(splices)
}

/// End of the character data that directly follows a start tag.
///
/// The span runs to the first markup that is not a CDATA section, i.e. the
/// first child element, comment, processing instruction or the closing tag.
fn leading_text_end(bytes: &[u8], start: usize) -> std::result::Result<usize, XmlFault> {
    let mut pos = start;
    loop {
        let open = memchr(b'<', &bytes[pos..])
            .map(|i| pos + i)
            .ok_or_else(|| XmlFault::new(bytes.len(), "unterminated element"))?;

        if !bytes[open..].starts_with(CDATA_OPEN) {
            return Ok(open);
        }
        let body = open + CDATA_OPEN.len();
        let close = memmem::find(&bytes[body..], CDATA_CLOSE)
            .ok_or_else(|| XmlFault::new(open, "unterminated CDATA section"))?;
        pos = body + close + CDATA_CLOSE.len();
    }
}

/// Decode raw character data, resolving entities and unwrapping CDATA.
fn decode_text(raw: &str, offset: usize) -> std::result::Result<String, XmlFault> {
    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find("<![CDATA[") {
        let (before, after) = rest.split_at(open);
        decoded.push_str(&unescape(before).map_err(|e| XmlFault::new(offset, e.to_string()))?);

        let body = &after[CDATA_OPEN.len()..];
        let close = body
            .find("]]>")
            .ok_or_else(|| XmlFault::new(offset, "unterminated CDATA section"))?;
        decoded.push_str(&body[..close]);
        rest = &body[close + CDATA_CLOSE.len()..];
    }
    decoded.push_str(&unescape(rest).map_err(|e| XmlFault::new(offset, e.to_string()))?);

    Ok(decoded)
}
