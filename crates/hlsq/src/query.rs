//! Single-predicate attribute queries: `NAME OP VALUE`.
//!
//! The comparison value is typed with the same heuristics as manifest
//! attributes, and that type decides which operators are legal:
//!
//! | value type                   | operators                 |
//! |------------------------------|---------------------------|
//! | `Int`, `Float`               | `> >= < <= = !=`          |
//! | `Bool`, `Enum`, `QuotedString` | `= != ~ !~ rlike`       |
//!
//! Numeric queries compare any `Int`/`Float` attribute. Text queries compare
//! any `QuotedString`/`Enum`/`Bool` attribute; `=`, `!=`, `~` and `!~` ignore
//! case, `rlike` does not. An attribute of the wrong kind simply does not match.

use std::fmt;

use regex::Regex;
use tracing::debug;

use crate::attribute::{AttrValue, Attribute, parse_attribute};
use crate::error::{QueryError, Result};
use crate::tag::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOp {
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `~`, substring
    Contains,
    /// `!~`
    NotContains,
    /// `rlike`, regular expression
    Rlike,
}

impl QueryOp {
    pub fn parse(s: &str) -> Option<Self> {
        let op = match s {
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "<" => Self::Lt,
            "<=" => Self::Le,
            "=" => Self::Eq,
            "!=" => Self::Ne,
            "~" => Self::Contains,
            "!~" => Self::NotContains,
            "rlike" => Self::Rlike,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Contains => "~",
            Self::NotContains => "!~",
            Self::Rlike => "rlike",
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Gt | Self::Ge | Self::Lt | Self::Le | Self::Eq | Self::Ne
        )
    }

    fn is_textual(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Contains | Self::NotContains | Self::Rlike
        )
    }
}

impl fmt::Display for QueryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a candidate value is compared against, prepared at compile time.
#[derive(Debug, Clone)]
enum Target {
    Number(f64),
    /// Lowercased comparison text.
    Text(String),
    Pattern(Regex),
}

/// A compiled query. Stateless; evaluate it against as many attributes as needed.
#[derive(Debug, Clone)]
pub struct Query {
    key: String,
    op: QueryOp,
    value: AttrValue,
    target: Target,
}

/// Shorthand for [`Query::compile`].
pub fn compile_query(expr: &str) -> Result<Query> {
    Query::compile(expr)
}

impl Query {
    /// Compiles `NAME OP VALUE`, three whitespace separated tokens.
    pub fn compile(expr: &str) -> Result<Self> {
        let tokens: Vec<&str> = expr.split_whitespace().collect();
        let [key, op_text, raw] = tokens.as_slice() else {
            return Err(QueryError::malformed(expr));
        };

        let Some(value) = parse_attribute(*key, raw).value else {
            return Err(QueryError::malformed(expr));
        };
        let op = QueryOp::parse(op_text)
            .ok_or_else(|| QueryError::unsupported_operator(*op_text, value.kind()))?;

        let target = match &value {
            AttrValue::Int(_) | AttrValue::Float(_) => {
                if !op.is_numeric() {
                    return Err(QueryError::unsupported_operator(*op_text, value.kind()));
                }
                Target::Number(value.as_number().unwrap_or_default())
            }
            AttrValue::Bool(_) | AttrValue::Enum(_) | AttrValue::QuotedString(_) => {
                if !op.is_textual() {
                    return Err(QueryError::unsupported_operator(*op_text, value.kind()));
                }
                let text = value.as_text().unwrap_or_default();
                if op == QueryOp::Rlike {
                    let pattern = Regex::new(text).map_err(|source| QueryError::InvalidPattern {
                        pattern: text.to_owned(),
                        source,
                    })?;
                    Target::Pattern(pattern)
                } else {
                    Target::Text(text.to_lowercase())
                }
            }
        };

        debug!(key = %key, op = %op, value = %value, "Compiled query");
        Ok(Self {
            key: (*key).to_owned(),
            op,
            value,
            target,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn op(&self) -> QueryOp {
        self.op
    }

    pub fn value(&self) -> &AttrValue {
        &self.value
    }

    /// Whether `attr` satisfies the predicate.
    ///
    /// False when the key differs (ignoring case), when the attribute has no
    /// value, or when its value is of a kind the operator cannot compare.
    pub fn matches(&self, attr: &Attribute) -> bool {
        if !attr.key.eq_ignore_ascii_case(&self.key) {
            return false;
        }
        let Some(value) = &attr.value else {
            return false;
        };

        match &self.target {
            Target::Number(target) => value
                .as_number()
                .is_some_and(|candidate| self.compare_numbers(candidate, *target)),
            Target::Text(target) => value
                .as_text()
                .is_some_and(|candidate| self.compare_text(&candidate.to_lowercase(), target)),
            Target::Pattern(pattern) => value.as_text().is_some_and(|c| pattern.is_match(c)),
        }
    }

    /// Whether any attribute of `tag` satisfies the predicate.
    pub fn matches_tag(&self, tag: &Tag) -> bool {
        tag.attributes.iter().any(|a| self.matches(a))
    }

    fn compare_numbers(&self, candidate: f64, target: f64) -> bool {
        match self.op {
            QueryOp::Gt => candidate > target,
            QueryOp::Ge => candidate >= target,
            QueryOp::Lt => candidate < target,
            QueryOp::Le => candidate <= target,
            QueryOp::Eq => candidate == target,
            QueryOp::Ne => candidate != target,
            _ => false,
        }
    }

    fn compare_text(&self, candidate: &str, target: &str) -> bool {
        match self.op {
            QueryOp::Eq => candidate == target,
            QueryOp::Ne => candidate != target,
            QueryOp::Contains => candidate.contains(target),
            QueryOp::NotContains => !candidate.contains(target),
            _ => false,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.op, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::parse_tag;

    fn attr(key: &str, raw: &str) -> Attribute {
        parse_attribute(key, raw)
    }

    fn query(expr: &str) -> Query {
        Query::compile(expr).expect("query should compile")
    }

    #[test]
    fn wrong_token_count_is_malformed() {
        for expr in ["BANDWIDTH", "BANDWIDTH >", "", "A = 1 2"] {
            assert!(
                matches!(Query::compile(expr), Err(QueryError::Malformed { .. })),
                "{expr:?}"
            );
        }
    }

    #[test]
    fn any_whitespace_separates_tokens() {
        let q = query("  BANDWIDTH \t>   5 ");
        assert_eq!(q.key(), "BANDWIDTH");
        assert_eq!(q.op(), QueryOp::Gt);
        assert_eq!(q.value(), &AttrValue::Int(5));
    }

    #[test]
    fn string_operator_on_number_is_unsupported() {
        let err = Query::compile("BANDWIDTH ~ 5").expect_err("numeric target");
        assert!(matches!(
            err,
            QueryError::UnsupportedOperator { ref op, kind: "int" } if op == "~"
        ));
        assert!(matches!(
            Query::compile("FRAME-RATE rlike 2.5"),
            Err(QueryError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn numeric_operator_on_text_is_unsupported() {
        assert!(matches!(
            Query::compile("TYPE > AUDIO"),
            Err(QueryError::UnsupportedOperator { kind: "enum", .. })
        ));
        assert!(matches!(
            Query::compile("DEFAULT <= YES"),
            Err(QueryError::UnsupportedOperator { kind: "bool", .. })
        ));
        assert!(matches!(
            Query::compile(r#"NAME > "x""#),
            Err(QueryError::UnsupportedOperator { kind: "quoted string", .. })
        ));
    }

    #[test]
    fn unknown_operator_is_unsupported() {
        assert!(matches!(
            Query::compile("BANDWIDTH => 5"),
            Err(QueryError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn invalid_pattern_fails_compilation() {
        assert!(matches!(
            Query::compile("NAME rlike ("),
            Err(QueryError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn bandwidth_threshold() {
        let tag = parse_tag("#EXT-X-STREAM-INF:BANDWIDTH=2000000");
        assert!(query("BANDWIDTH > 1000000").matches_tag(&tag));
        assert!(!query("BANDWIDTH > 3000000").matches_tag(&tag));
    }

    #[test]
    fn numeric_operators() {
        let a = attr("BANDWIDTH", "100");
        assert!(query("BANDWIDTH >= 100").matches(&a));
        assert!(!query("BANDWIDTH > 100").matches(&a));
        assert!(query("BANDWIDTH < 101").matches(&a));
        assert!(query("BANDWIDTH <= 100").matches(&a));
        assert!(query("BANDWIDTH = 100").matches(&a));
        assert!(query("BANDWIDTH != 99").matches(&a));
    }

    #[test]
    fn numbers_compare_across_int_and_float() {
        assert!(query("FRAME-RATE > 30").matches(&attr("FRAME-RATE", "59.940")));
        assert!(query("BANDWIDTH = 100.0").matches(&attr("BANDWIDTH", "100")));
    }

    #[test]
    fn key_is_matched_ignoring_case() {
        assert!(query("bandwidth > 1").matches(&attr("BANDWIDTH", "2")));
        assert!(!query("AVERAGE-BANDWIDTH > 1").matches(&attr("BANDWIDTH", "2")));
    }

    #[test]
    fn kind_mismatch_does_not_match() {
        // numeric query against text values
        assert!(!query("RESOLUTION > 1").matches(&attr("RESOLUTION", "960x540")));
        assert!(!query("BANDWIDTH != 1").matches(&attr("BANDWIDTH", "\"2\"")));
        // text query against numeric values, even for negated operators
        assert!(!query("BANDWIDTH != abc").matches(&attr("BANDWIDTH", "2")));
        assert!(!query("BANDWIDTH !~ abc").matches(&attr("BANDWIDTH", "2")));
    }

    #[test]
    fn bare_attribute_never_matches() {
        assert!(!query("6 = x").matches(&Attribute::bare("6")));
        assert!(!query("6 != x").matches(&Attribute::bare("6")));
    }

    #[test]
    fn text_equality_ignores_case() {
        let a = attr("TYPE", "AUDIO");
        assert!(query("TYPE = audio").matches(&a));
        assert!(!query("TYPE != Audio").matches(&a));
        assert!(query("TYPE != VIDEO").matches(&a));
    }

    #[test]
    fn quoted_target_matches_unquoted_text() {
        let lang = attr("LANGUAGE", "\"en-US\"");
        assert!(query(r#"LANGUAGE = "EN-us""#).matches(&lang));
        assert!(query("LANGUAGE = en-US").matches(&lang));
        assert!(query("CHANNELS = \"2\"").matches(&attr("CHANNELS", "\"2\"")));
    }

    #[test]
    fn bool_target_compares_yes_no_text() {
        let on = attr("AUTOSELECT", "YES");
        assert!(query("AUTOSELECT = yes").matches(&on));
        assert!(query("AUTOSELECT = YES").matches(&on));
        assert!(!query("AUTOSELECT = no").matches(&on));
        assert!(query("AUTOSELECT != No").matches(&on));
        // an enum attribute spelled YES is compared as text too
        assert!(query("AUTOSELECT = YES").matches(&attr("AUTOSELECT", "\"yes\"")));
    }

    #[test]
    fn substring_operators() {
        let codecs = attr("CODECS", "\"avc1.640020,mp4a.40.2\"");
        assert!(query("CODECS ~ MP4A").matches(&codecs));
        assert!(!query("CODECS !~ mp4a").matches(&codecs));
        assert!(query("CODECS !~ hvc1").matches(&codecs));
    }

    #[test]
    fn rlike_is_case_sensitive() {
        let codecs = attr("CODECS", "\"avc1.640020,mp4a.40.2\"");
        assert!(query(r"CODECS rlike ^avc1\.64").matches(&codecs));
        assert!(!query("CODECS rlike ^AVC1").matches(&codecs));
        assert!(query("DEFAULT rlike ^Y").matches(&attr("DEFAULT", "yes")));
    }

    #[test]
    fn tag_matches_if_any_attribute_matches() {
        let tag = parse_tag(
            r#"#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID="a1",LANGUAGE="en-US",AUTOSELECT=YES"#,
        );
        assert!(query("LANGUAGE ~ en").matches_tag(&tag));
        assert!(!query("LANGUAGE ~ fr").matches_tag(&tag));
        assert!(!query("BANDWIDTH > 0").matches_tag(&parse_tag("#EXTM3U")));
    }

    #[test]
    fn display_uses_canonical_value() {
        assert_eq!(query("FRAME-RATE >= 29.97").to_string(), "FRAME-RATE >= 29.970");
        assert_eq!(query("LANGUAGE = \"en\"").to_string(), "LANGUAGE = \"en\"");
    }
}
