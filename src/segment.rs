use std::{cmp::Reverse, fmt};

use bytestring::ByteString;

use crate::error::PatternError;

/// Characters that may not appear in the fixed text around a capture or wildcard.
const RESERVED: &[char] = &['{', '}', '*', ':', '/'];

/// One matching rule of a [`Pattern`](crate::Pattern).
///
/// Variants are listed from most to least specific; see [`Segment::priority`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches exactly this text.
    Literal(ByteString),

    /// Matches a segment ending in `suffix`, capturing the part before it. Written `{name}suffix`.
    PrefixCapture { suffix: ByteString, name: ByteString },

    /// Matches a segment starting with `prefix`, capturing the part after it. Written
    /// `prefix{name}` or `prefix:name`.
    SuffixCapture { prefix: ByteString, name: ByteString },

    /// Matches a segment ending in `suffix`. Written `*suffix`.
    PrefixWildcard { suffix: ByteString },

    /// Matches a segment starting with `prefix`. Written `prefix*`.
    SuffixWildcard { prefix: ByteString },

    /// Matches any non-empty segment, capturing it. Written `:name` or `{name}`.
    Capture(ByteString),

    /// Matches any non-empty segment. Written `*`.
    Wildcard,

    /// Matches an empty segment, e.g. the one after a trailing slash.
    Null,

    /// Matches zero or more remaining segments. Written `**`; only valid as last segment.
    RecursiveWildcard,
}

/// Sort key derived from a segment; smaller keys are tried first.
///
/// Ordered by variant group, then by length of the fixed literal portion (longer first), then by a
/// fixed tie-break among the affix variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(u8, Reverse<usize>, u8);

/// Value bound by a successful segment match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Capture<'s, 'p> {
    None,
    Named(&'s ByteString, &'p str),
}

impl Segment {
    /// Parses a single `/`-free token of a route pattern.
    ///
    /// `**` is accepted here; its position is checked by [`Pattern::parse`](crate::Pattern::parse).
    pub fn parse(token: &str) -> Result<Segment, PatternError> {
        if token.is_empty() {
            return Ok(Segment::Null);
        }

        if token == "**" {
            return Ok(Segment::RecursiveWildcard);
        }

        if token.contains("**") {
            return Err(PatternError::invalid(token, "`**` must be a whole segment"));
        }

        if let Some(name) = token.strip_prefix(':') {
            return Ok(Segment::Capture(parse_name(token, name)?));
        }

        if let Some(open) = token.find('{') {
            let close = match token[open..].find('}') {
                Some(idx) => open + idx,
                None => return Err(PatternError::invalid(token, "unclosed `{`")),
            };

            let prefix = &token[..open];
            let name = parse_name(token, &token[open + 1..close])?;
            let suffix = &token[close + 1..];

            if prefix.contains(RESERVED) || suffix.contains(RESERVED) {
                return Err(PatternError::invalid(
                    token,
                    "only one capture or wildcard is allowed per segment",
                ));
            }

            return match (prefix.is_empty(), suffix.is_empty()) {
                (true, true) => Ok(Segment::Capture(name)),
                (true, false) => Ok(Segment::PrefixCapture {
                    suffix: suffix.into(),
                    name,
                }),
                (false, true) => Ok(Segment::SuffixCapture {
                    prefix: prefix.into(),
                    name,
                }),
                (false, false) => Err(PatternError::invalid(
                    token,
                    "capture may have a literal prefix or suffix, not both",
                )),
            };
        }

        if token.contains('}') {
            return Err(PatternError::invalid(token, "unmatched `}`"));
        }

        if let Some(star) = token.find('*') {
            let prefix = &token[..star];
            let suffix = &token[star + 1..];

            if prefix.contains(RESERVED) || suffix.contains(RESERVED) {
                return Err(PatternError::invalid(
                    token,
                    "only one capture or wildcard is allowed per segment",
                ));
            }

            return match (prefix.is_empty(), suffix.is_empty()) {
                (true, true) => Ok(Segment::Wildcard),
                (true, false) => Ok(Segment::PrefixWildcard {
                    suffix: suffix.into(),
                }),
                (false, true) => Ok(Segment::SuffixWildcard {
                    prefix: prefix.into(),
                }),
                (false, false) => Err(PatternError::invalid(
                    token,
                    "wildcard may have a literal prefix or suffix, not both",
                )),
            };
        }

        if let Some(colon) = token.find(':') {
            let prefix = &token[..colon];
            let name = parse_name(token, &token[colon + 1..])?;

            return Ok(Segment::SuffixCapture {
                prefix: prefix.into(),
                name,
            });
        }

        Ok(Segment::Literal(token.into()))
    }

    /// Returns the name this segment binds, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Segment::Capture(name)
            | Segment::PrefixCapture { name, .. }
            | Segment::SuffixCapture { name, .. } => Some(&**name),
            _ => None,
        }
    }

    /// Returns `true` for literal segments.
    pub fn is_literal(&self) -> bool {
        matches!(self, Segment::Literal(_))
    }

    /// Returns the matching priority of this segment.
    ///
    /// `literal` > affix variants (longer fixed text first) > `capture` > `wildcard` > `null` >
    /// `**`. Affix variants with equal fixed text length are ordered prefix capture, suffix
    /// capture, prefix wildcard, suffix wildcard.
    pub fn priority(&self) -> Priority {
        match self {
            Segment::Literal(text) => Priority(0, Reverse(text.len()), 0),
            Segment::PrefixCapture { suffix, .. } => Priority(1, Reverse(suffix.len()), 0),
            Segment::SuffixCapture { prefix, .. } => Priority(1, Reverse(prefix.len()), 1),
            Segment::PrefixWildcard { suffix } => Priority(1, Reverse(suffix.len()), 2),
            Segment::SuffixWildcard { prefix } => Priority(1, Reverse(prefix.len()), 3),
            Segment::Capture(_) => Priority(2, Reverse(0), 0),
            Segment::Wildcard => Priority(3, Reverse(0), 0),
            Segment::Null => Priority(4, Reverse(0), 0),
            Segment::RecursiveWildcard => Priority(5, Reverse(0), 0),
        }
    }

    /// Returns a copy with all fixed literal text ASCII-lowercased.
    pub fn lowercased(&self) -> Segment {
        fn lower(text: &ByteString) -> ByteString {
            if text.bytes().any(|b| b.is_ascii_uppercase()) {
                text.to_ascii_lowercase().into()
            } else {
                text.clone()
            }
        }

        match self {
            Segment::Literal(text) => Segment::Literal(lower(text)),
            Segment::PrefixCapture { suffix, name } => Segment::PrefixCapture {
                suffix: lower(suffix),
                name: name.clone(),
            },
            Segment::SuffixCapture { prefix, name } => Segment::SuffixCapture {
                prefix: lower(prefix),
                name: name.clone(),
            },
            Segment::PrefixWildcard { suffix } => Segment::PrefixWildcard {
                suffix: lower(suffix),
            },
            Segment::SuffixWildcard { prefix } => Segment::SuffixWildcard {
                prefix: lower(prefix),
            },
            other => other.clone(),
        }
    }

    /// Tests one request path segment against this rule.
    ///
    /// `**` is never accepted here; the matcher handles it since it spans segments. With `fold`
    /// set, fixed literal text is compared ASCII case-insensitively (it is expected to already be
    /// lowercased). Captured values are slices of `seg`, in its original case.
    pub(crate) fn accepts<'s, 'p>(&'s self, seg: &'p str, fold: bool) -> Option<Capture<'s, 'p>> {
        match self {
            Segment::Literal(text) => eq(text, seg, fold).then_some(Capture::None),

            Segment::PrefixCapture { suffix, name } => {
                let split = seg.len().checked_sub(suffix.len()).filter(|&at| at > 0)?;
                let (head, tail) = split_at(seg, split)?;
                eq(suffix, tail, fold).then_some(Capture::Named(name, head))
            }

            Segment::SuffixCapture { prefix, name } => {
                let (head, tail) = split_at(seg, prefix.len())?;
                (!tail.is_empty() && eq(prefix, head, fold)).then_some(Capture::Named(name, tail))
            }

            Segment::PrefixWildcard { suffix } => {
                let split = seg.len().checked_sub(suffix.len()).filter(|&at| at > 0)?;
                let (_, tail) = split_at(seg, split)?;
                eq(suffix, tail, fold).then_some(Capture::None)
            }

            Segment::SuffixWildcard { prefix } => {
                let (head, tail) = split_at(seg, prefix.len())?;
                (!tail.is_empty() && eq(prefix, head, fold)).then_some(Capture::None)
            }

            Segment::Capture(name) => (!seg.is_empty()).then_some(Capture::Named(name, seg)),

            Segment::Wildcard => (!seg.is_empty()).then_some(Capture::None),

            Segment::Null => seg.is_empty().then_some(Capture::None),

            Segment::RecursiveWildcard => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::PrefixCapture { suffix, name } => write!(f, "{{{}}}{}", name, suffix),
            Segment::SuffixCapture { prefix, name } => write!(f, "{}{{{}}}", prefix, name),
            Segment::PrefixWildcard { suffix } => write!(f, "*{}", suffix),
            Segment::SuffixWildcard { prefix } => write!(f, "{}*", prefix),
            Segment::Capture(name) => write!(f, ":{}", name),
            Segment::Wildcard => f.write_str("*"),
            Segment::Null => Ok(()),
            Segment::RecursiveWildcard => f.write_str("**"),
        }
    }
}

fn parse_name(token: &str, name: &str) -> Result<ByteString, PatternError> {
    if name.is_empty() {
        return Err(PatternError::invalid(token, "capture name is empty"));
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(PatternError::invalid(
            token,
            "capture name may only contain ASCII letters, digits, `_` and `-`",
        ));
    }

    Ok(name.into())
}

#[inline]
fn eq(expected: &str, actual: &str, fold: bool) -> bool {
    if fold {
        expected.eq_ignore_ascii_case(actual)
    } else {
        expected == actual
    }
}

/// Like `str::split_at` but returns `None` off a char boundary.
#[inline]
fn split_at(seg: &str, mid: usize) -> Option<(&str, &str)> {
    if seg.is_char_boundary(mid) {
        Some(seg.split_at(mid))
    } else {
        None
    }
}
