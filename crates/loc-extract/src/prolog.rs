//! Document normalization ahead of xot
//!
//! xot rejects a few well-formed inputs: any DOCTYPE declaration, XML
//! declarations other than version 1.0 in UTF-8, and element or attribute
//! names whose prefix has no namespace declaration. [`normalize`] rewrites
//! a decoded document so that xot accepts it while the element structure
//! and text stay the same:
//!
//! - the XML declaration is dropped (the text is already decoded);
//! - the DOCTYPE is dropped, and general entities declared in its internal
//!   subset are expanded in content and attribute values;
//! - every prefix used but not declared on the document element gets a
//!   placeholder declaration there.
//!
//! Anything this pass cannot make sense of is left as it is, so xot still
//! reports malformed input.

use std::collections::{BTreeSet, HashMap, HashSet};

/// Namespace URI bound to prefixes that the document never declares.
pub const UNDECLARED_PREFIX_NS: &str = "urn:x-undeclared-prefix:";

/// Nesting limit for entity references inside entity values
const MAX_ENTITY_DEPTH: usize = 8;

/// Total entity substitutions allowed for one document
const MAX_EXPANSIONS: usize = 100_000;

/// Rewrite `xml` into a form xot parses.
pub fn normalize(xml: &str) -> String {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let rest = skip_xml_declaration(xml);

    let mut normalizer = Normalizer::default();
    let body = match find_doctype(rest) {
        Some(doctype) => {
            if let Some(subset) = doctype.internal_subset {
                normalizer.entities = entity_declarations(subset);
            }
            tracing::debug!(entities = normalizer.entities.len(), "dropping DOCTYPE");
            normalizer.out.push_str(&rest[..doctype.start]);
            &rest[doctype.end..]
        }
        None => rest,
    };
    normalizer.lex(body);
    normalizer.finish()
}

fn skip_xml_declaration(xml: &str) -> &str {
    let bytes = xml.as_bytes();
    if !bytes.starts_with(b"<?xml") || !bytes.get(5).is_some_and(u8::is_ascii_whitespace) {
        return xml;
    }
    match xml.find("?>") {
        Some(end) => &xml[end + 2..],
        None => xml,
    }
}

struct Doctype<'a> {
    start: usize,
    end: usize,
    internal_subset: Option<&'a str>,
}

/// Locate a DOCTYPE among the prolog's whitespace, comments and
/// processing instructions.
fn find_doctype(xml: &str) -> Option<Doctype<'_>> {
    let bytes = xml.as_bytes();
    let mut pos = 0;
    loop {
        while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
            pos += 1;
        }
        let rest = &bytes[pos..];
        if rest.starts_with(b"<!--") {
            pos = find_from(bytes, pos + 4, b"-->")? + 3;
        } else if rest.starts_with(b"<?") {
            pos = find_from(bytes, pos + 2, b"?>")? + 2;
        } else if rest.starts_with(b"<!DOCTYPE") {
            break;
        } else {
            return None;
        }
    }

    let start = pos;
    let mut pos = start + b"<!DOCTYPE".len();
    let mut internal_subset = None;
    while let Some(&b) = bytes.get(pos) {
        match b {
            b'"' | b'\'' => pos = closing_quote(bytes, pos)? + 1,
            b'[' => {
                let end = internal_subset_end(bytes, pos + 1)?;
                internal_subset = Some(&xml[pos + 1..end]);
                pos = end + 1;
            }
            b'>' => {
                return Some(Doctype {
                    start,
                    end: pos + 1,
                    internal_subset,
                })
            }
            _ => pos += 1,
        }
    }
    None
}

fn internal_subset_end(bytes: &[u8], mut pos: usize) -> Option<usize> {
    while let Some(&b) = bytes.get(pos) {
        if bytes[pos..].starts_with(b"<!--") {
            pos = find_from(bytes, pos + 4, b"-->")? + 3;
            continue;
        }
        match b {
            b'"' | b'\'' => pos = closing_quote(bytes, pos)? + 1,
            b']' => return Some(pos),
            _ => pos += 1,
        }
    }
    None
}

/// Internal general entities of a DOCTYPE internal subset.
///
/// Parameter entities and external entities are skipped. The first
/// declaration of a name wins.
fn entity_declarations(subset: &str) -> HashMap<String, String> {
    let bytes = subset.as_bytes();
    let mut entities = HashMap::new();
    let mut pos = 0;
    while let Some(&b) = bytes.get(pos) {
        let rest = &bytes[pos..];
        if rest.starts_with(b"<!--") {
            match find_from(bytes, pos + 4, b"-->") {
                Some(end) => pos = end + 3,
                None => break,
            }
        } else if rest.starts_with(b"<!ENTITY") {
            pos += b"<!ENTITY".len();
            if let Some((name, value, end)) = entity_declaration(subset, pos) {
                entities.entry(name.to_string()).or_insert_with(|| value.to_string());
                pos = end;
            }
        } else if b == b'"' || b == b'\'' {
            match closing_quote(bytes, pos) {
                Some(end) => pos = end + 1,
                None => break,
            }
        } else {
            pos += 1;
        }
    }
    entities
}

/// Parse `name "value"` after `<!ENTITY`; `None` for anything else.
fn entity_declaration(subset: &str, mut pos: usize) -> Option<(&str, &str, usize)> {
    let bytes = subset.as_bytes();
    let skip_ws = |mut pos: usize| {
        while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
            pos += 1;
        }
        pos
    };

    pos = skip_ws(pos);
    if bytes.get(pos) == Some(&b'%') {
        return None;
    }
    let name_start = pos;
    while bytes
        .get(pos)
        .is_some_and(|b| !b.is_ascii_whitespace() && !matches!(b, b'"' | b'\'' | b'>'))
    {
        pos += 1;
    }
    if pos == name_start {
        return None;
    }
    let name = &subset[name_start..pos];

    pos = skip_ws(pos);
    if !matches!(bytes.get(pos), Some(b'"' | b'\'')) {
        return None;
    }
    let close = closing_quote(bytes, pos)?;
    Some((name, &subset[pos + 1..close], close + 1))
}

fn closing_quote(bytes: &[u8], pos: usize) -> Option<usize> {
    let quote = bytes[pos];
    bytes[pos + 1..]
        .iter()
        .position(|&b| b == quote)
        .map(|offset| pos + 1 + offset)
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn is_ws(b: u8) -> bool {
    b.is_ascii_whitespace()
}

#[derive(Default)]
struct Normalizer {
    out: String,
    entities: HashMap<String, String>,
    expansions: usize,
    used_prefixes: BTreeSet<String>,
    root_prefixes: HashSet<String>,
    /// Offset in `out` just after the document element's name
    root_name_end: Option<usize>,
}

impl Normalizer {
    fn lex(&mut self, body: &str) {
        let bytes = body.as_bytes();
        let mut pos = 0;
        while pos < bytes.len() {
            if bytes[pos] != b'<' {
                let end = find_from(bytes, pos, b"<").unwrap_or(bytes.len());
                self.expand_into(&body[pos..end], false, 0);
                pos = end;
                continue;
            }

            let rest = &bytes[pos..];
            let verbatim_end = if rest.starts_with(b"<!--") {
                find_from(bytes, pos + 4, b"-->").map(|end| end + 3)
            } else if rest.starts_with(b"<![CDATA[") {
                find_from(bytes, pos + 9, b"]]>").map(|end| end + 3)
            } else if rest.starts_with(b"<?") {
                find_from(bytes, pos + 2, b"?>").map(|end| end + 2)
            } else if rest.starts_with(b"</") {
                find_from(bytes, pos + 2, b">").map(|end| end + 1)
            } else if rest.starts_with(b"<!") {
                Some(pos + 2)
            } else {
                let mark = self.out.len();
                match self.start_tag(body, pos) {
                    Some(end) => {
                        pos = end;
                        continue;
                    }
                    None => {
                        self.out.truncate(mark);
                        None
                    }
                }
            };

            match verbatim_end {
                Some(end) => {
                    self.out.push_str(&body[pos..end]);
                    pos = end;
                }
                None => {
                    self.out.push_str(&body[pos..]);
                    break;
                }
            }
        }
    }

    /// Copy one start tag, noting prefixes and expanding entities in
    /// attribute values. Returns the offset after the tag.
    fn start_tag(&mut self, body: &str, pos: usize) -> Option<usize> {
        let bytes = body.as_bytes();
        let name_start = pos + 1;
        let mut i = name_start;
        while bytes
            .get(i)
            .is_some_and(|&b| !is_ws(b) && b != b'/' && b != b'>')
        {
            i += 1;
        }
        if i == name_start {
            return None;
        }
        self.note_prefix(&body[name_start..i]);
        self.out.push_str(&body[pos..i]);

        let is_root = self.root_name_end.is_none();
        if is_root {
            self.root_name_end = Some(self.out.len());
        }

        loop {
            let ws_start = i;
            while bytes.get(i).copied().is_some_and(is_ws) {
                i += 1;
            }
            self.out.push_str(&body[ws_start..i]);

            match bytes.get(i).copied()? {
                b'>' => {
                    self.out.push('>');
                    return Some(i + 1);
                }
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    self.out.push_str("/>");
                    return Some(i + 2);
                }
                b'/' => return None,
                _ => {}
            }

            let attr_start = i;
            while bytes
                .get(i)
                .is_some_and(|&b| !is_ws(b) && !matches!(b, b'=' | b'>' | b'/'))
            {
                i += 1;
            }
            if i == attr_start {
                return None;
            }
            let attr = &body[attr_start..i];

            while bytes.get(i).copied().is_some_and(is_ws) {
                i += 1;
            }
            if bytes.get(i) != Some(&b'=') {
                return None;
            }
            i += 1;
            while bytes.get(i).copied().is_some_and(is_ws) {
                i += 1;
            }
            if !matches!(bytes.get(i), Some(b'"' | b'\'')) {
                return None;
            }
            let close = closing_quote(bytes, i)?;
            self.out.push_str(&body[attr_start..=i]);
            self.expand_into(&body[i + 1..close], true, 0);
            self.out.push_str(&body[close..=close]);
            i = close + 1;

            match attr.strip_prefix("xmlns:") {
                Some(prefix) => {
                    if is_root {
                        self.root_prefixes.insert(prefix.to_string());
                    }
                }
                None if attr == "xmlns" => {}
                None => self.note_prefix(attr),
            }
        }
    }

    fn note_prefix(&mut self, name: &str) {
        if let Some((prefix, _)) = name.split_once(':') {
            if !prefix.is_empty() && prefix != "xml" && prefix != "xmlns" {
                self.used_prefixes.insert(prefix.to_string());
            }
        }
    }

    /// Copy `text`, replacing references to internal-subset entities.
    /// Predefined entities, character references and unknown names are
    /// left for xot.
    fn expand_into(&mut self, text: &str, in_attribute: bool, depth: usize) {
        if self.entities.is_empty() {
            self.out.push_str(text);
            return;
        }

        let mut rest = text;
        while let Some(amp) = rest.find('&') {
            self.push_text(&rest[..amp], in_attribute && depth > 0);
            let after = &rest[amp + 1..];
            let Some(semi) = after.find(';') else {
                self.push_text(&rest[amp..], in_attribute && depth > 0);
                return;
            };
            let name = &after[..semi];
            let value = self.entities.get(name).cloned();
            match value {
                Some(value) if depth < MAX_ENTITY_DEPTH && self.expansions < MAX_EXPANSIONS => {
                    self.expansions += 1;
                    self.expand_into(&value, in_attribute, depth + 1);
                }
                _ => self.push_text(&rest[amp..amp + semi + 2], in_attribute && depth > 0),
            }
            rest = &after[semi + 1..];
        }
        self.push_text(rest, in_attribute && depth > 0);
    }

    /// Entity replacement text lands inside a quoted attribute value, so
    /// its quotes and `<` are escaped there.
    fn push_text(&mut self, text: &str, escape: bool) {
        if !escape {
            self.out.push_str(text);
            return;
        }
        for c in text.chars() {
            match c {
                '"' => self.out.push_str("&quot;"),
                '\'' => self.out.push_str("&apos;"),
                '<' => self.out.push_str("&lt;"),
                _ => self.out.push(c),
            }
        }
    }

    fn finish(mut self) -> String {
        let missing: Vec<&String> = self
            .used_prefixes
            .iter()
            .filter(|prefix| !self.root_prefixes.contains(*prefix))
            .collect();
        if let (Some(at), false) = (self.root_name_end, missing.is_empty()) {
            tracing::debug!(prefixes = ?missing, "declaring undeclared prefixes");
            let declarations: String = missing
                .iter()
                .map(|prefix| format!(" xmlns:{0}=\"{1}{0}\"", prefix, UNDECLARED_PREFIX_NS))
                .collect();
            self.out.insert_str(at, &declarations);
        }
        self.out
    }
}
