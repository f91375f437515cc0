use std::io::{BufRead, Write};

use clap::ValueEnum;
use colored::{Color, Colorize as _};
use hlsq_core::{Chomp, Query, QueryFilter, Scanner, Serializer, Tag, Transform};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Terminal colors accepted by `--color-tag` / `--color-attr` and the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorName {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    LightGray,
    DarkGray,
    LightRed,
    LightGreen,
    LightYellow,
    LightBlue,
    LightMagenta,
    LightCyan,
    White,
}

impl From<ColorName> for Color {
    fn from(name: ColorName) -> Self {
        match name {
            ColorName::Black => Color::Black,
            ColorName::Red => Color::Red,
            ColorName::Green => Color::Green,
            ColorName::Yellow => Color::Yellow,
            ColorName::Blue => Color::Blue,
            ColorName::Magenta => Color::Magenta,
            ColorName::Cyan => Color::Cyan,
            // 37 and 90/97 in ANSI terms
            ColorName::LightGray => Color::White,
            ColorName::DarkGray => Color::BrightBlack,
            ColorName::LightRed => Color::BrightRed,
            ColorName::LightGreen => Color::BrightGreen,
            ColorName::LightYellow => Color::BrightYellow,
            ColorName::LightBlue => Color::BrightBlue,
            ColorName::LightMagenta => Color::BrightMagenta,
            ColorName::LightCyan => Color::BrightCyan,
            ColorName::White => Color::BrightWhite,
        }
    }
}

/// Wraps tag names and attribute keys in terminal color codes.
#[derive(Debug, Clone, Copy)]
pub struct Colorize {
    tag: Color,
    attr: Color,
}

impl Colorize {
    pub fn new(tag: impl Into<Color>, attr: impl Into<Color>) -> Self {
        Self {
            tag: tag.into(),
            attr: attr.into(),
        }
    }
}

impl Transform for Colorize {
    fn apply(&self, mut tag: Tag) -> Option<Tag> {
        if tag.is_preamble() {
            return Some(tag);
        }
        tag.name = tag.name.color(self.tag).to_string();
        for attr in &mut tag.attributes {
            attr.key = attr.key.color(self.attr).to_string();
        }
        Some(tag)
    }
}

/// Compiles `query` and builds the transform chain used for every tag
/// written to stdout. A bad query fails here, before any input is touched.
///
/// The query runs first: it matches on attribute keys, which coloring rewrites.
pub fn build_serializer(
    query: Option<&str>,
    chomp: bool,
    colors: Option<Colorize>,
) -> Result<Serializer> {
    let mut serializer = Serializer::new();
    if let Some(expr) = query {
        let query = Query::compile(expr)?;
        debug!(query = %query, "Filtering tags");
        serializer.push(QueryFilter::new(query));
    }
    if chomp {
        serializer.push(Chomp);
    }
    if let Some(colors) = colors {
        serializer.push(colors);
    }
    Ok(serializer)
}

/// Scans a whole manifest and writes every tag through `serializer`.
///
/// Returns the number of tags written.
pub fn print_manifest<R, W>(reader: R, serializer: &Serializer, out: &mut W) -> Result<usize>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut written = 0;
    for tag in Scanner::new(reader) {
        if serializer.write(out, tag?)? {
            written += 1;
        }
    }
    out.flush()?;
    debug!(tags = written, "Manifest written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use hlsq_core::{QueryError, parse_tag};
    use std::io::Cursor;

    const SAMPLE: &str = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=500000,RESOLUTION=640x360\nlow.m3u8\n\n#EXT-X-STREAM-INF:BANDWIDTH=3000000,RESOLUTION=1280x720\nhigh.m3u8\n";

    /// Same order as the binary: compile the query, then print.
    fn print_filtered(query: Option<&str>, chomp: bool, out: &mut Vec<u8>) -> Result<usize> {
        let serializer = build_serializer(query, chomp, None)?;
        print_manifest(Cursor::new(SAMPLE), &serializer, out)
    }

    fn print(serializer: &Serializer) -> String {
        let mut out = Vec::new();
        print_manifest(Cursor::new(SAMPLE), serializer, &mut out).expect("print");
        String::from_utf8(out).expect("utf-8")
    }

    #[test]
    fn plain_output_round_trips() {
        let serializer = build_serializer(None, false, None).expect("no query");
        assert_eq!(print(&serializer), SAMPLE);
    }

    #[test]
    fn query_and_chomp() {
        let mut out = Vec::new();
        let written = print_filtered(Some("BANDWIDTH >= 1000000"), true, &mut out).expect("print");
        assert_eq!(written, 1);
        let out = String::from_utf8(out).expect("utf-8");
        assert_eq!(
            out,
            "#EXT-X-STREAM-INF:BANDWIDTH=3000000,RESOLUTION=1280x720\nhigh.m3u8\n"
        );
    }

    #[test]
    fn query_still_matches_when_colored() {
        colored::control::set_override(true);
        let colors = Colorize::new(ColorName::LightBlue, ColorName::Cyan);
        let serializer =
            build_serializer(Some("RESOLUTION rlike ^1280x"), true, Some(colors)).expect("query");
        let out = print(&serializer);
        assert!(out.contains("\x1b["));
        assert!(out.contains("high.m3u8"));
        assert!(!out.contains("low.m3u8"));
    }

    #[test]
    fn bad_query_aborts_before_output() {
        for (expr, malformed) in [("BANDWIDTH ~ 5", false), ("BANDWIDTH", true)] {
            let mut out = Vec::new();
            let err = print_filtered(Some(expr), false, &mut out).expect_err("query must be rejected");
            match err {
                AppError::Query(QueryError::Malformed { .. }) => assert!(malformed),
                AppError::Query(QueryError::UnsupportedOperator { .. }) => assert!(!malformed),
                other => panic!("unexpected error: {other}"),
            }
            assert!(out.is_empty(), "nothing written for {expr}");
        }
    }

    #[test]
    fn colorize_wraps_name_and_keys_only() {
        colored::control::set_override(true);
        let tag = parse_tag(r#"#EXT-X-MEDIA:TYPE=AUDIO,NAME="English""#).with_trailing(["uri"]);
        let colored = Colorize::new(ColorName::Red, ColorName::Green)
            .apply(tag)
            .expect("colorize keeps tags");
        assert!(colored.name.starts_with("\x1b["));
        assert!(colored.name.contains("#EXT-X-MEDIA"));
        assert!(colored.attributes[0].key.contains("TYPE"));
        assert_eq!(colored.trailing, vec!["uri".to_string()]);
        assert_eq!(
            colored.attributes[1].value,
            Some(hlsq_core::AttrValue::QuotedString("English".into()))
        );
    }

    #[test]
    fn preamble_is_not_colored() {
        colored::control::set_override(true);
        let tag = Tag::preamble(vec!["stray".into()]);
        let out = Colorize::new(ColorName::Red, ColorName::Green)
            .apply(tag.clone())
            .expect("colorize keeps tags");
        assert_eq!(out, tag);
    }

    #[test]
    fn color_names_map_to_ansi_colors() {
        assert_eq!(Color::from(ColorName::LightBlue), Color::BrightBlue);
        assert_eq!(Color::from(ColorName::LightGray), Color::White);
        assert_eq!(Color::from(ColorName::White), Color::BrightWhite);
        assert_eq!(
            ColorName::from_str("light-magenta", true),
            Ok(ColorName::LightMagenta)
        );
    }
}
