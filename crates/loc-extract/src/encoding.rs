//! Input encoding detection and decoding
//!
//! The encoding is taken from the byte order mark when there is one,
//! then from the UTF-16 byte pattern of a leading `<`, then from the
//! `encoding` pseudo-attribute of the XML declaration. Without any of
//! those the input is UTF-8.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

use crate::error::{Error, Result};

/// Longest XML declaration searched for an encoding label.
const DECLARATION_LIMIT: usize = 1024;

/// Detect the document encoding and decode it to a UTF-8 string.
pub fn decode_document(bytes: &[u8]) -> Result<String> {
    let (encoding, bom_len) = match Encoding::for_bom(bytes) {
        Some(found) => found,
        None => (sniff(bytes)?, 0),
    };
    tracing::debug!(encoding = encoding.name(), "decoding input");

    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .map(Cow::into_owned)
        .ok_or_else(|| Error::ParseError(format!("input is not valid {}", encoding.name())))
}

fn sniff(bytes: &[u8]) -> Result<&'static Encoding> {
    match bytes {
        [0x00, b'<', ..] => return Ok(UTF_16BE),
        [b'<', 0x00, ..] => return Ok(UTF_16LE),
        _ => {}
    }

    let Some(label) = declared_encoding(bytes) else {
        return Ok(UTF_8);
    };
    let encoding = Encoding::for_label(label)
        .ok_or_else(|| {
            Error::ParseError(format!(
                "unsupported encoding: {}",
                String::from_utf8_lossy(label)
            ))
        })?;
    // A UTF-16 label on ASCII-compatible bytes without a BOM cannot be
    // right; the bytes themselves are the better witness.
    if encoding == UTF_16LE || encoding == UTF_16BE {
        Ok(UTF_8)
    } else {
        Ok(encoding)
    }
}

/// The raw `encoding="..."` label of a leading XML declaration.
fn declared_encoding(bytes: &[u8]) -> Option<&[u8]> {
    if !bytes.starts_with(b"<?xml") || !bytes.get(5).is_some_and(u8::is_ascii_whitespace) {
        return None;
    }
    let head = &bytes[..bytes.len().min(DECLARATION_LIMIT)];
    let end = find(head, b"?>")?;
    let decl = &head[..end];

    let key = find(decl, b"encoding")?;
    let mut pos = key + b"encoding".len();
    while decl.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    if decl.get(pos) != Some(&b'=') {
        return None;
    }
    pos += 1;
    while decl.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    let quote = *decl.get(pos).filter(|b| matches!(b, b'"' | b'\''))?;
    let start = pos + 1;
    let len = decl[start..].iter().position(|&b| b == quote)?;
    Some(&decl[start..start + len])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_without_declaration() {
        assert_eq!(decode_document(b"<r>caf\xc3\xa9</r>").unwrap(), "<r>café</r>");
    }

    #[test]
    fn utf8_bom_is_removed() {
        assert_eq!(decode_document(b"\xef\xbb\xbf<r/>").unwrap(), "<r/>");
    }

    #[test]
    fn declared_latin1() {
        let input = b"<?xml version=\"1.0\" encoding='ISO-8859-1'?><r>caf\xe9</r>";
        let decoded = decode_document(input).unwrap();
        assert!(decoded.ends_with("<r>café</r>"));
    }

    #[test]
    fn utf16_le_with_bom() {
        let input = [0xFF, 0xFE, b'<', 0x00, b'r', 0x00, b'/', 0x00, b'>', 0x00];
        assert_eq!(decode_document(&input).unwrap(), "<r/>");
    }

    #[test]
    fn utf16_be_without_bom() {
        let input = [0x00, b'<', 0x00, b'r', 0x00, b'/', 0x00, b'>'];
        assert_eq!(decode_document(&input).unwrap(), "<r/>");
    }

    #[test]
    fn label_lookup() {
        assert_eq!(
            declared_encoding(b"<?xml version=\"1.0\" encoding = \"UTF-8\" ?><r/>"),
            Some(&b"UTF-8"[..])
        );
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><r/>"), None);
        assert_eq!(declared_encoding(b"<?xml-stylesheet href=\"a\"?><r/>"), None);
    }

    #[test]
    fn unknown_label_is_parse_error() {
        let input = b"<?xml version=\"1.0\" encoding=\"x-nope\"?><r/>";
        assert!(matches!(decode_document(input), Err(Error::ParseError(_))));
    }

    #[test]
    fn invalid_utf8_is_parse_error() {
        assert!(matches!(
            decode_document(b"<loc>\xff</loc>"),
            Err(Error::ParseError(_))
        ));
    }
}
