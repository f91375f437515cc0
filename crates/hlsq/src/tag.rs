//! Manifest lines and the `#TAG:attr,attr` directive parser.

use std::fmt;

use crate::attribute::{Attribute, parse_attribute};

/// One physical manifest line, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// Anything that is not a directive: segment URIs, blank separators.
    Raw(String),
    Tag(Tag),
}

/// A `#`-prefixed directive together with the raw lines that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    /// Directive name including the leading `#`, e.g. `#EXT-X-STREAM-INF`.
    ///
    /// Empty only for the preamble the scanner builds from raw lines found
    /// before the first directive.
    pub name: String,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    /// Raw lines between this directive and the next one.
    pub trailing: Vec<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            trailing: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_trailing<I, S>(mut self, trailing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trailing = trailing.into_iter().map(Into::into).collect();
        self
    }

    /// Raw lines that appeared before any directive.
    pub fn preamble(trailing: Vec<String>) -> Self {
        Self {
            name: String::new(),
            attributes: Vec::new(),
            trailing,
        }
    }

    /// A preamble has no directive line of its own, only trailing lines.
    pub fn is_preamble(&self) -> bool {
        self.name.is_empty()
    }

    /// First attribute whose key matches `key`, ignoring ASCII case.
    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.key.eq_ignore_ascii_case(key))
    }
}

/// Renders the directive line only; trailing lines are not included.
impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, attr) in self.attributes.iter().enumerate() {
            f.write_str(if i == 0 { ":" } else { "," })?;
            write!(f, "{attr}")?;
        }
        Ok(())
    }
}

/// Classifies one line of manifest text.
pub fn parse_line(text: &str) -> Line {
    if text.starts_with('#') {
        Line::Tag(parse_tag(text))
    } else {
        Line::Raw(text.to_owned())
    }
}

/// Parses a directive line into its name and attributes.
///
/// The name runs up to the first `:`; without one the tag has no attributes.
/// The remainder is read as `KEY=VALUE` fragments separated by `,`. A value
/// that opens with `"` is read up to the closing quote first, so commas inside
/// quoted strings do not split attributes. A delimiter directly preceded by a
/// backslash is not treated as a delimiter; the backslash itself is kept.
pub fn parse_tag(line: &str) -> Tag {
    let Some((name, rest)) = line.split_once(':') else {
        return Tag::new(line);
    };

    let mut tag = Tag::new(name);
    let mut cursor = Cursor { rest };
    loop {
        let key = cursor.take_until('=');
        if key.is_empty() {
            break;
        }

        let mut value = String::new();
        if cursor.peek() == Some('"') {
            cursor.bump();
            value.push('"');
            value.push_str(cursor.take_until('"'));
            value.push('"');
        }
        value.push_str(cursor.take_until(','));

        tag.attributes.push(parse_attribute(key, &value));
    }
    tag
}

/// Forward-only view over the attribute list of a directive.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.rest = &self.rest[c.len_utf8()..];
        }
    }

    /// Consumes up to and including the next unescaped `delim`, returning the
    /// text before it. Consumes everything when no delimiter is left.
    fn take_until(&mut self, delim: char) -> &'a str {
        let rest = self.rest;
        let mut escaped = false;
        for (idx, c) in rest.char_indices() {
            if c == delim && !escaped {
                self.rest = &rest[idx + c.len_utf8()..];
                return &rest[..idx];
            }
            escaped = c == '\\';
        }
        self.rest = "";
        rest
    }
}
