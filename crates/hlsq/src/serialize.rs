//! Writing tags back out as manifest text.
//!
//! Before a tag is written it passes through an ordered list of
//! [`Transform`]s. Each one gets the tag by value and either hands back a
//! (possibly rebuilt) tag or `None`, which drops the tag together with its
//! trailing lines.

use std::io::{self, Write};

use crate::query::Query;
use crate::tag::Tag;

pub trait Transform {
    fn apply(&self, tag: Tag) -> Option<Tag>;
}

impl<F> Transform for F
where
    F: Fn(Tag) -> Option<Tag>,
{
    fn apply(&self, tag: Tag) -> Option<Tag> {
        self(tag)
    }
}

/// Drops trailing lines that contain only whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chomp;

impl Transform for Chomp {
    fn apply(&self, mut tag: Tag) -> Option<Tag> {
        tag.trailing.retain(|line| !line.trim().is_empty());
        Some(tag)
    }
}

/// Keeps only tags with at least one attribute matching the query.
#[derive(Debug, Clone)]
pub struct QueryFilter {
    query: Query,
}

impl QueryFilter {
    pub fn new(query: Query) -> Self {
        Self { query }
    }
}

impl Transform for QueryFilter {
    fn apply(&self, tag: Tag) -> Option<Tag> {
        self.query.matches_tag(&tag).then_some(tag)
    }
}

/// An ordered transform chain plus the text renderer.
#[derive(Default)]
pub struct Serializer {
    transforms: Vec<Box<dyn Transform>>,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transform; transforms run in insertion order.
    pub fn with(mut self, transform: impl Transform + 'static) -> Self {
        self.push(transform);
        self
    }

    pub fn push(&mut self, transform: impl Transform + 'static) {
        self.transforms.push(Box::new(transform));
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Runs the transform chain, stopping at the first suppression.
    pub fn apply(&self, tag: Tag) -> Option<Tag> {
        self.transforms
            .iter()
            .try_fold(tag, |tag, transform| transform.apply(tag))
    }

    /// Transforms and writes `tag`. Returns whether anything was written.
    pub fn write<W: Write + ?Sized>(&self, sink: &mut W, tag: Tag) -> io::Result<bool> {
        match self.apply(tag) {
            Some(tag) => {
                write_tag(sink, &tag)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Free-function form of [`Serializer::write`] for a borrowed transform list.
pub fn serialize<W: Write + ?Sized>(
    sink: &mut W,
    tag: Tag,
    transforms: &[&dyn Transform],
) -> io::Result<bool> {
    let Some(tag) = transforms
        .iter()
        .try_fold(tag, |tag, transform| transform.apply(tag))
    else {
        return Ok(false);
    };
    write_tag(sink, &tag)?;
    Ok(true)
}

/// Writes the directive line and each trailing line, newline terminated.
/// A preamble has no directive line.
pub fn write_tag<W: Write + ?Sized>(sink: &mut W, tag: &Tag) -> io::Result<()> {
    if !tag.is_preamble() {
        writeln!(sink, "{tag}")?;
    }
    for line in &tag.trailing {
        writeln!(sink, "{line}")?;
    }
    Ok(())
}

/// Renders a tag and its trailing lines without any transforms.
pub fn render(tag: &Tag) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_tag(&mut out, tag);
    String::from_utf8_lossy(&out).into_owned()
}
