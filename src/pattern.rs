use std::{cmp::Ordering, fmt, str::FromStr};

use crate::{error::PatternError, segment::Segment};

/// A parsed route pattern: an ordered list of [`Segment`]s.
///
/// # Pattern Format
/// One leading `/` is ignored and the rest is split on `/`. Both `""` and `"/"` describe the root
/// path, which has no segments. Each token becomes a segment:
///
/// | Token          | Segment                                    |
/// |----------------|--------------------------------------------|
/// | `users`        | literal                                    |
/// | `:id`, `{id}`  | capture                                    |
/// | `{file}.jpg`   | prefix capture (captures `file`)           |
/// | `v{ver}`, `v:ver` | suffix capture (captures `ver`)         |
/// | `*`            | wildcard                                   |
/// | `*.png`        | prefix wildcard                            |
/// | `img-*`        | suffix wildcard                            |
/// | `**`           | recursive wildcard (last segment only)     |
/// | (empty)        | null, e.g. after a trailing slash          |
///
/// # Examples
/// ```
/// use segment_router::{Pattern, Segment};
///
/// let pattern = Pattern::parse("/users/:id/").unwrap();
/// assert_eq!(pattern.segments().len(), 3);
/// assert_eq!(pattern.segments()[2], Segment::Null);
/// assert_eq!(pattern.to_string(), "/users/:id/");
///
/// assert!(Pattern::parse("/files/**/meta").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parses a route registration string.
    pub fn parse(path: &str) -> Result<Pattern, PatternError> {
        let segments = path_segments(path)
            .map(|(_, token)| Segment::parse(token))
            .collect::<Result<Vec<_>, _>>()?;

        Pattern::from_segments(segments, path)
    }

    /// The root pattern; matches only `/` and the empty path.
    pub fn root() -> Pattern {
        Pattern::default()
    }

    fn from_segments(segments: Vec<Segment>, source: &str) -> Result<Pattern, PatternError> {
        if let Some(pos) = segments
            .iter()
            .position(|seg| *seg == Segment::RecursiveWildcard)
        {
            if pos + 1 != segments.len() {
                return Err(PatternError::RecursiveWildcardNotTerminal {
                    pattern: source.to_owned(),
                });
            }
        }

        let mut names = segments.iter().filter_map(Segment::name).collect::<Vec<_>>();
        names.sort_unstable();
        if let Some(dup) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(PatternError::DuplicateName {
                name: dup[0].to_owned(),
                pattern: source.to_owned(),
            });
        }

        Ok(Pattern { segments })
    }

    /// Returns the segments of this pattern, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns `true` if this is the root pattern.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` if the pattern binds any named value.
    pub fn has_captures(&self) -> bool {
        self.names().next().is_some()
    }

    /// Iterates over capture names, left to right.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::name)
    }

    /// Returns a copy with all fixed literal text ASCII-lowercased.
    ///
    /// Used for case-insensitive routing; capture names are left untouched.
    pub fn lowercased(&self) -> Pattern {
        Pattern {
            segments: self.segments.iter().map(Segment::lowercased).collect(),
        }
    }

    /// Appends `other` to this pattern.
    ///
    /// Fails if this pattern ends in `**` or the combined pattern repeats a capture name.
    ///
    /// # Examples
    /// ```
    /// # use segment_router::Pattern;
    /// let api = Pattern::parse("/api/:version").unwrap();
    /// let joined = api.join(&Pattern::parse("/users/:id").unwrap()).unwrap();
    /// assert_eq!(joined.to_string(), "/api/:version/users/:id");
    /// ```
    pub fn join(&self, other: &Pattern) -> Result<Pattern, PatternError> {
        let segments = self
            .segments
            .iter()
            .chain(other.segments.iter())
            .cloned()
            .collect();

        let source = format!("{}{}", self, other);
        Pattern::from_segments(segments, &source)
    }

    /// Compares patterns by matching priority, segment by segment.
    ///
    /// `Ordering::Less` means `self` is tried before `other`. On a common prefix the shorter
    /// pattern comes first.
    pub fn cmp_priority(&self, other: &Pattern) -> Ordering {
        self.segments
            .iter()
            .map(Segment::priority)
            .cmp(other.segments.iter().map(Segment::priority))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }

        for seg in &self.segments {
            write!(f, "/{}", seg)?;
        }

        Ok(())
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::parse(s)
    }
}

impl TryFrom<&str> for Pattern {
    type Error = PatternError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Pattern::parse(s)
    }
}

/// Splits a path into `(byte offset, segment)` pairs.
///
/// One leading `/` is skipped; an empty remainder yields no segments.
pub(crate) fn path_segments(path: &str) -> PathSegments<'_> {
    let pos = usize::from(path.starts_with('/'));

    PathSegments {
        path,
        pos,
        done: pos >= path.len(),
    }
}

pub(crate) struct PathSegments<'p> {
    path: &'p str,
    pos: usize,
    done: bool,
}

impl<'p> Iterator for PathSegments<'p> {
    type Item = (usize, &'p str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let start = self.pos;
        let rest = &self.path[start..];

        match rest.find('/') {
            Some(idx) => {
                self.pos += idx + 1;
                Some((start, &rest[..idx]))
            }
            None => {
                self.done = true;
                Some((start, rest))
            }
        }
    }
}
