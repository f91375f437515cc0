//! Pull-based scanner grouping manifest lines into tags.
//!
//! Raw lines belong to the directive *before* them, which is only known once
//! the next directive (or the end of input) shows up. The scanner therefore
//! runs one tag behind its input: `pending` collects raw lines while `current`
//! is what the caller sees.

use std::io::{self, BufRead, Lines};
use std::mem;

use tracing::{debug, trace};

use crate::tag::{Line, Tag, parse_line};

/// Turns a sequence of text lines into a sequence of [`Tag`]s.
///
/// Drive it with [`advance`](Scanner::advance) / [`tag`](Scanner::tag), or
/// use it as an iterator. A scanner cannot be restarted; build a new one over
/// a new line source instead.
pub struct Scanner<I> {
    lines: I,
    current: Tag,
    pending: Tag,
    /// The final `pending` tag has been promoted.
    drained: bool,
    /// Raw lines preceded the first directive and have not been handed out yet.
    preamble_ready: bool,
    /// Read error hit while priming, reported by the first `advance`.
    deferred: Option<io::Error>,
}

impl<R: BufRead> Scanner<Lines<R>> {
    pub fn new(reader: R) -> Self {
        Self::from_lines(reader.lines())
    }
}

impl<I> Scanner<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    pub fn from_lines(lines: I) -> Self {
        let mut scanner = Self {
            lines,
            current: Tag::preamble(Vec::new()),
            pending: Tag::preamble(Vec::new()),
            drained: false,
            preamble_ready: false,
            deferred: None,
        };
        // Prime: read up to the first directive so `pending` holds it.
        if let Err(e) = scanner.step() {
            scanner.deferred = Some(e);
        }
        if !scanner.current.trailing.is_empty() {
            debug!(
                lines = scanner.current.trailing.len(),
                "Raw lines before first directive"
            );
            scanner.preamble_ready = true;
        }
        scanner
    }

    /// Moves to the next tag. Returns `Ok(false)` once every tag was produced.
    pub fn advance(&mut self) -> io::Result<bool> {
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }
        if self.preamble_ready {
            self.preamble_ready = false;
            return Ok(true);
        }
        self.step()
    }

    /// The tag reached by the last successful [`advance`](Scanner::advance)
    /// or handed out by [`next`](Iterator::next).
    pub fn tag(&self) -> &Tag {
        &self.current
    }

    fn step(&mut self) -> io::Result<bool> {
        for line in self.lines.by_ref() {
            match parse_line(&line?) {
                Line::Raw(raw) => self.pending.trailing.push(raw),
                Line::Tag(tag) => {
                    self.current = mem::replace(&mut self.pending, tag);
                    trace!(tag = %self.current.name, "Scanned tag");
                    return Ok(true);
                }
            }
        }
        if !self.drained {
            self.drained = true;
            self.current = mem::replace(&mut self.pending, Tag::preamble(Vec::new()));
            trace!(tag = %self.current.name, "Scanned final tag");
            return Ok(true);
        }
        Ok(false)
    }
}

impl<I> Iterator for Scanner<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = io::Result<Tag>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(true) => Some(Ok(self.current.clone())),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttrValue, Attribute};
    use std::io::Cursor;

    fn scan(input: &str) -> Vec<Tag> {
        Scanner::new(Cursor::new(input))
            .collect::<io::Result<Vec<_>>>()
            .expect("in-memory input")
    }

    #[test]
    fn trailing_lines_follow_their_tag() {
        let tags = scan("#A\nline1\n#B\nline2\n");
        assert_eq!(
            tags,
            vec![
                Tag::new("#A").with_trailing(["line1"]),
                Tag::new("#B").with_trailing(["line2"]),
            ]
        );
    }

    #[test]
    fn master_playlist() {
        let sample = r#"#EXTM3U
#EXT-X-VERSION:6
#EXT-X-INDEPENDENT-SEGMENTS

#EXT-X-STREAM-INF:AVERAGE-BANDWIDTH=2190673,BANDWIDTH=2523597,CODECS="avc1.640020,mp4a.40.2",RESOLUTION=960x540,FRAME-RATE=60.000,CLOSED-CAPTIONS="cc",AUDIO="a1",SUBTITLES="sub1"
v5/prog_index.m3u8

"#;
        let tags = scan(sample);
        assert_eq!(
            tags,
            vec![
                Tag::new("#EXTM3U"),
                Tag::new("#EXT-X-VERSION").with_attributes(vec![Attribute::bare("6")]),
                Tag::new("#EXT-X-INDEPENDENT-SEGMENTS").with_trailing([""]),
                Tag::new("#EXT-X-STREAM-INF")
                    .with_attributes(vec![
                        Attribute::new("AVERAGE-BANDWIDTH", AttrValue::Int(2190673)),
                        Attribute::new("BANDWIDTH", AttrValue::Int(2523597)),
                        Attribute::new(
                            "CODECS",
                            AttrValue::QuotedString("avc1.640020,mp4a.40.2".into())
                        ),
                        Attribute::new("RESOLUTION", AttrValue::Enum("960x540".into())),
                        Attribute::new("FRAME-RATE", AttrValue::Float(60.0)),
                        Attribute::new("CLOSED-CAPTIONS", AttrValue::QuotedString("cc".into())),
                        Attribute::new("AUDIO", AttrValue::QuotedString("a1".into())),
                        Attribute::new("SUBTITLES", AttrValue::QuotedString("sub1".into())),
                    ])
                    .with_trailing(["v5/prog_index.m3u8", ""]),
            ]
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(scan("").is_empty());
    }

    #[test]
    fn single_tag_without_newline() {
        assert_eq!(scan("#EXTM3U"), vec![Tag::new("#EXTM3U")]);
    }

    #[test]
    fn raw_lines_before_first_tag_form_a_preamble() {
        let tags = scan("junk\n\n#EXTM3U\n");
        assert_eq!(tags.len(), 2);
        assert!(tags[0].is_preamble());
        assert_eq!(tags[0].trailing, vec!["junk".to_string(), String::new()]);
        assert_eq!(tags[1], Tag::new("#EXTM3U"));
    }

    #[test]
    fn input_without_tags_is_one_preamble() {
        let tags = scan("a\nb\n");
        assert_eq!(tags, vec![Tag::preamble(vec!["a".into(), "b".into()])]);
    }

    #[test]
    fn pull_api_matches_iterator() {
        let mut scanner = Scanner::new(Cursor::new("#A\nx\n#B\n"));
        let mut names = Vec::new();
        while scanner.advance().expect("in-memory input") {
            names.push(scanner.tag().name.clone());
        }
        assert_eq!(names, vec!["#A", "#B"]);
        // stays exhausted
        assert!(!scanner.advance().expect("in-memory input"));
    }

    #[test]
    fn tag_stays_readable_after_next() {
        let mut scanner = Scanner::new(Cursor::new("#A\nx\n#B\n"));
        let first = scanner.next().expect("one tag").expect("in-memory input");
        assert_eq!(scanner.tag(), &first);
        assert_eq!(scanner.tag().trailing, vec!["x".to_string()]);
    }

    #[test]
    fn every_line_is_attributed_once() {
        let input = "#EXTM3U\n#EXT-X-TARGETDURATION:6\n#EXTINF:6.0,\nseg1.ts\n#EXTINF:6.0,\nseg2.ts\n\n#EXT-X-ENDLIST\n";
        let tags = scan(input);
        let lines: usize = tags.iter().map(|t| 1 + t.trailing.len()).sum();
        assert_eq!(lines, input.lines().count());
    }

    #[test]
    fn read_error_is_reported() {
        let lines = vec![
            Ok("#A".to_string()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad utf-8")),
        ];
        let mut scanner = Scanner::from_lines(lines.into_iter());
        assert!(scanner.advance().is_err());
    }

    #[test]
    fn read_error_while_priming_is_deferred() {
        let lines = vec![Err(io::Error::new(io::ErrorKind::InvalidData, "bad utf-8"))];
        let mut scanner = Scanner::from_lines(lines.into_iter());
        let err = scanner.advance().expect_err("priming error surfaces");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
