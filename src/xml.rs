use crate::statics;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use std::borrow::Cow;

/// Failures that abort a sheet load. Malformed leaf values never end up here;
/// they are replaced by defaults where they are read.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("unexpected end of input inside <{0}>")]
    UnexpectedEof(String),
    #[error("expected <{expected}> but found <{found}>")]
    UnexpectedRoot { expected: String, found: String },
    #[error("no root element found")]
    Empty,
    #[error("<{0}> is not a row element")]
    NotARow(String),
}

/// A start tag with its attributes already decoded.
#[derive(Debug, Clone)]
pub struct Tag {
    pub name: String,
    attrs: Vec<(String, String)>,
    /// `<tag/>` form; there is nothing to read or skip after it.
    pub empty: bool,
}

impl Tag {
    fn from_start(start: &BytesStart<'_>, empty: bool) -> Self {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            // A broken attribute is malformed leaf data; drop it and keep reading.
            let Ok(attr) = attr else {
                log::trace!("skipping malformed attribute on <{name}>");
                continue;
            };
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = unescape_lossy(&raw).into_owned();
            attrs.push((key, value));
        }
        Self { name, attrs, empty }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attr_i32(&self, key: &str) -> Option<i32> {
        self.attr(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attr(key).map(parse_bool)
    }
}

/// Resolves entity and character references. A reference that cannot be resolved
/// is dropped on its own; the rest of the text is still unescaped.
fn unescape_lossy(raw: &str) -> Cow<'_, str> {
    if let Ok(text) = quick_xml::escape::unescape(raw) {
        return text;
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        let Some(end) = rest.find(';') else {
            break;
        };
        let reference = &rest[..=end];
        match quick_xml::escape::unescape(reference) {
            Ok(text) => out.push_str(&text),
            Err(err) => log::trace!("dropping reference {reference}: {err}"),
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}

pub fn standardize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", statics::NL_LF).replace('\r', statics::NL_LF))
    } else {
        Cow::Borrowed(text)
    }
}

/// Accepts the spellings older sheets used; anything else is `false`.
pub fn parse_bool(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "1" | "y"
    )
}

/// Reads an integer, falling back to `default` when the text is not a number
/// and clamping into `min..=max`.
pub fn parse_i32(text: &str, default: i32, min: i32, max: i32) -> i32 {
    text.trim()
        .parse::<i64>()
        .map(|v| v.clamp(min as i64, max as i64) as i32)
        .unwrap_or(default)
}

/// Reads a finite float, falling back to `default` otherwise.
pub fn parse_f64(text: &str, default: f64) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => default,
    }
}

/// Pull-style reader over a whole sheet held in memory.
///
/// Every `Tag` handed out by [`XmlReader::next_child`] that is not `empty`
/// must be consumed with [`XmlReader::read_text`], [`XmlReader::skip`] or by
/// walking its children until `next_child` returns `None`.
pub struct XmlReader<'a> {
    inner: Reader<&'a [u8]>,
}

impl<'a> XmlReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            inner: Reader::from_reader(bytes),
        }
    }

    /// Returns the first element of the input, skipping the prolog.
    pub fn root(&mut self) -> Result<Tag, CodecError> {
        loop {
            match self.inner.read_event()? {
                Event::Start(e) => return Ok(Tag::from_start(&e, false)),
                Event::Empty(e) => return Ok(Tag::from_start(&e, true)),
                Event::Eof => return Err(CodecError::Empty),
                _ => {}
            }
        }
    }

    /// Next child element of the element currently open, or `None` once its
    /// close tag has been consumed.
    pub fn next_child(&mut self, parent: &str) -> Result<Option<Tag>, CodecError> {
        loop {
            match self.inner.read_event()? {
                Event::Start(e) => return Ok(Some(Tag::from_start(&e, false))),
                Event::Empty(e) => return Ok(Some(Tag::from_start(&e, true))),
                Event::End(_) => return Ok(None),
                Event::Eof => return Err(CodecError::UnexpectedEof(parent.to_string())),
                _ => {}
            }
        }
    }

    /// Text content of `tag`, consuming through its close tag.
    pub fn read_text(&mut self, tag: &Tag) -> Result<String, CodecError> {
        if tag.empty {
            return Ok(String::new());
        }
        let raw = self.inner.read_text(QName(tag.name.as_bytes()))?;
        // Literal line breaks are normalized the way XML parsers do; escaped ones survive.
        let raw = standardize_line_endings(&raw);
        Ok(unescape_lossy(&raw).into_owned())
    }

    /// Integer content of `tag`, defaulted and clamped when malformed.
    pub fn read_i32(
        &mut self,
        tag: &Tag,
        default: i32,
        min: i32,
        max: i32,
    ) -> Result<i32, CodecError> {
        Ok(parse_i32(&self.read_text(tag)?, default, min, max))
    }

    /// Discards `tag` and everything inside it.
    pub fn skip(&mut self, tag: &Tag) -> Result<(), CodecError> {
        if !tag.empty {
            self.inner.read_to_end(QName(tag.name.as_bytes()))?;
        }
        Ok(())
    }
}

/// Deterministic, indenting XML writer.
/// - tab indentation
/// - attributes in the order given
/// - caller-selected newline (so CRLF sheets stay CRLF)
pub struct XmlWriter {
    out: String,
    depth: usize,
    newline: &'static str,
}

impl XmlWriter {
    pub fn new(newline: &'static str) -> Self {
        Self {
            out: String::new(),
            depth: 0,
            newline,
        }
    }

    pub fn with_declaration(newline: &'static str) -> Self {
        let mut writer = Self::new(newline);
        writer.out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>");
        writer.out.push_str(newline);
        writer
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push('\t');
        }
    }

    fn open(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.indent();
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            write_escaped(&mut self.out, value, true, statics::NL_LF);
            self.out.push('"');
        }
    }

    /// `<name attrs>` followed by a newline; children are indented one level.
    pub fn start_tag(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.open(name, attrs);
        self.out.push('>');
        self.out.push_str(self.newline);
        self.depth += 1;
    }

    pub fn end_tag(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
        self.out.push_str(self.newline);
    }

    /// `<name attrs/>`.
    pub fn empty_tag(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.open(name, attrs);
        self.out.push_str("/>");
        self.out.push_str(self.newline);
    }

    /// `<name attrs>text</name>` on a single line (embedded newlines use the writer's newline).
    pub fn text_tag(&mut self, name: &str, attrs: &[(&str, String)], text: &str) {
        self.open(name, attrs);
        self.out.push('>');
        let newline = self.newline;
        write_escaped(&mut self.out, text, false, newline);
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
        self.out.push_str(self.newline);
    }

    pub fn simple_tag(&mut self, name: &str, text: &str) {
        self.text_tag(name, &[], text);
    }

    pub fn simple_tag_not_empty(&mut self, name: &str, text: &str) {
        if !text.is_empty() {
            self.simple_tag(name, text);
        }
    }

    pub fn simple_tag_i32(&mut self, name: &str, value: i32) {
        self.simple_tag(name, &value.to_string());
    }

    pub fn simple_tag_not_zero(&mut self, name: &str, value: i32) {
        if value != 0 {
            self.simple_tag_i32(name, value);
        }
    }

    pub fn simple_tag_f64(&mut self, name: &str, value: f64) {
        self.simple_tag(name, &format_f64(value));
    }

    /// `<name/>` when `value` is true, nothing otherwise.
    pub fn flag_tag(&mut self, name: &str, value: bool) {
        if value {
            self.empty_tag(name, &[]);
        }
    }
}

/// Shortest round-trippable representation; integral values drop the ".0".
pub fn format_f64(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let mut buf = ryu::Buffer::new();
    buf.format(value).to_string()
}

/// Whether XML 1.0 can carry `ch` at all, even as a character reference.
fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn write_escaped(out: &mut String, s: &str, in_attribute: bool, newline: &str) {
    let mut segment = String::with_capacity(s.len());
    for ch in s.chars().filter(|ch| is_xml_char(*ch)) {
        let special = match ch {
            '\n' if in_attribute => "&#10;",
            '\n' => newline,
            '\r' => "&#13;",
            '\t' if in_attribute => "&#9;",
            _ => {
                segment.push(ch);
                continue;
            }
        };
        flush_escaped(out, &mut segment, in_attribute);
        out.push_str(special);
    }
    flush_escaped(out, &mut segment, in_attribute);
}

fn flush_escaped(out: &mut String, segment: &mut String, in_attribute: bool) {
    if segment.is_empty() {
        return;
    }
    if in_attribute {
        out.push_str(&quick_xml::escape::escape(segment.as_str()));
    } else {
        out.push_str(&quick_xml::escape::partial_escape(segment.as_str()));
    }
    segment.clear();
}

#[cfg(test)]
mod tests {
    use super::{CodecError, XmlReader, XmlWriter, format_f64, parse_i32};
    use crate::statics;

    #[test]
    fn writer_escapes_markup_and_quotes() {
        let mut w = XmlWriter::new(statics::NL_LF);
        w.text_tag("a", &[("k", "x\"<y>".to_string())], "1 & 2 < 3");
        assert_eq!(
            w.finish(),
            "<a k=\"x&quot;&lt;y&gt;\">1 &amp; 2 &lt; 3</a>\n"
        );
    }

    #[test]
    fn characters_xml_cannot_carry_are_dropped() -> Result<(), CodecError> {
        let mut w = XmlWriter::new(statics::NL_LF);
        w.text_tag("a", &[("k", "q\u{1}\"".to_string())], "a & b\u{0}c\u{FFFF}");
        let written = w.finish();
        assert_eq!(written, "<a k=\"q&quot;\">a &amp; bc</a>\n");

        let mut r = XmlReader::new(written.as_bytes());
        let a = r.root()?;
        assert_eq!(a.attr("k"), Some("q\""));
        assert_eq!(r.read_text(&a)?, "a & bc");
        Ok(())
    }

    #[test]
    fn bad_reference_does_not_keep_the_raw_text() -> Result<(), CodecError> {
        let mut r = XmlReader::new(b"<a>x &amp; y&#0;z &lt;</a>");
        let a = r.root()?;
        assert_eq!(r.read_text(&a)?, "x & yz <");
        Ok(())
    }

    #[test]
    fn writer_uses_requested_newline_inside_text() {
        let mut w = XmlWriter::new(statics::NL_CRLF);
        w.simple_tag("t", "one\ntwo");
        assert_eq!(w.finish(), "<t>one\r\ntwo</t>\r\n");
    }

    #[test]
    fn reader_walks_children_and_skips_unknown() {
        let xml = b"<root><keep>a &amp; b</keep><unknown><deep>x</deep></unknown><flag/></root>";
        let mut r = XmlReader::new(xml);
        let root = r.root().unwrap();
        assert_eq!(root.name, "root");

        let keep = r.next_child("root").unwrap().unwrap();
        assert_eq!(r.read_text(&keep).unwrap(), "a & b");

        let unknown = r.next_child("root").unwrap().unwrap();
        r.skip(&unknown).unwrap();

        let flag = r.next_child("root").unwrap().unwrap();
        assert!(flag.empty);
        assert!(r.next_child("root").unwrap().is_none());
    }

    #[test]
    fn reader_reports_truncated_input() {
        let mut r = XmlReader::new(b"<root><a>1</a>");
        r.root().unwrap();
        let a = r.next_child("root").unwrap().unwrap();
        r.read_text(&a).unwrap();
        assert!(r.next_child("root").is_err());
    }

    #[test]
    fn numbers_default_and_clamp() {
        assert_eq!(parse_i32("12", 0, 0, 100), 12);
        assert_eq!(parse_i32("banana", 7, 0, 100), 7);
        assert_eq!(parse_i32("900", 0, 0, 100), 100);
        assert_eq!(format_f64(3.0), "3");
        assert_eq!(format_f64(0.5), "0.5");
    }
}
