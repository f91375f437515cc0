//! Typed attribute values and the heuristics that infer them.
//!
//! An attribute list such as `BANDWIDTH=2000000,CODECS="avc1,mp4a"` is split
//! into `KEY=VALUE` fragments by the tag parser; this module turns each
//! fragment into an [`Attribute`] whose value type is guessed from its text.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static INT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid int pattern"));
static FLOAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+$").expect("valid float pattern"));
// `0`, `0.5` are numbers; `007`, `00.5` are not.
static LEADING_ZERO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[0-9]").expect("valid leading zero pattern"));

/// Value of a single attribute.
///
/// `Display` produces the canonical rendering used when a tag is written back
/// out. Floats are always rendered with three decimals, so the source text of
/// a float does not survive a round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Bare token, e.g. `AUDIO` or `960x540`.
    Enum(String),
    /// Double quoted string, stored without the surrounding quotes.
    QuotedString(String),
    /// `YES` / `NO`
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl AttrValue {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Enum(_) => "enum",
            AttrValue::QuotedString(_) => "quoted string",
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
        }
    }

    /// Numeric view of the value, available for `Int` and `Float`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Textual view of the value, available for `QuotedString`, `Enum` and `Bool`.
    ///
    /// Quoted strings are returned without quotes, booleans as `YES`/`NO`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::QuotedString(s) | AttrValue::Enum(s) => Some(s),
            AttrValue::Bool(b) => Some(yes_no(*b)),
            AttrValue::Int(_) | AttrValue::Float(_) => None,
        }
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "YES" } else { "NO" }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Enum(s) => f.write_str(s),
            AttrValue::QuotedString(s) => write!(f, "\"{s}\""),
            AttrValue::Bool(b) => f.write_str(yes_no(*b)),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(v) => write!(f, "{v:.3}"),
        }
    }
}

/// One key of a tag's attribute list, with an optional typed value.
///
/// `value` is `None` for bare tokens: `#EXT-X-VERSION:6` carries a single
/// attribute with key `6` and no value.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub value: Option<AttrValue>,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: AttrValue) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
        }
    }

    pub fn bare(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)?;
        if let Some(value) = &self.value {
            write!(f, "={value}")?;
        }
        Ok(())
    }
}

/// Builds an [`Attribute`] from a key and the raw text that followed its `=`.
///
/// The first matching rule decides the type:
/// 1. empty text: no value
/// 2. ASCII digits only: `Int`
/// 3. digits, a dot, digits: `Float`
/// 4. `YES` / `NO` in any case: `Bool`
/// 5. wrapped in double quotes: `QuotedString`, one layer of quotes removed
/// 6. anything else: `Enum`
///
/// Negative numbers, leading zeros and exponents are deliberately left as `Enum`.
/// Escaped quotes inside a quoted string are kept as-is.
pub fn parse_attribute(key: impl Into<String>, raw: &str) -> Attribute {
    let key = key.into();
    let value = if raw.is_empty() {
        None
    } else {
        Some(infer_value(raw))
    };
    Attribute { key, value }
}

fn infer_value(raw: &str) -> AttrValue {
    let numeric = !LEADING_ZERO.is_match(raw);
    if numeric && INT_PATTERN.is_match(raw) {
        // Too many digits for an i64: keep the text instead of inventing a number.
        return raw
            .parse()
            .map(AttrValue::Int)
            .unwrap_or_else(|_| AttrValue::Enum(raw.to_owned()));
    }
    if numeric
        && FLOAT_PATTERN.is_match(raw)
        && let Ok(f) = raw.parse()
    {
        return AttrValue::Float(f);
    }
    if raw.eq_ignore_ascii_case("YES") {
        return AttrValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("NO") {
        return AttrValue::Bool(false);
    }
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return AttrValue::QuotedString(raw[1..raw.len() - 1].to_owned());
    }
    AttrValue::Enum(raw.to_owned())
}
