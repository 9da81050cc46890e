//! Detection of routes that can never be matched.

use rand::{distr::Alphanumeric, Rng as _};
use tracing::{debug, warn};

use crate::{error::RouteConflict, pattern::Pattern, segment::Segment};

/// Number of path segments generated for a `**` segment.
const RECURSIVE_SAMPLE_LEN: usize = 20;

const TOKEN_LEN: usize = 16;

/// Checks that no pattern is fully shadowed by a higher priority one.
///
/// Patterns are ordered the way the matcher tries them. For each pattern a concrete path it
/// accepts is generated, using random tokens for its dynamic segments, and tested against every
/// pattern ordered before it. The first pattern found to accept that path is reported.
pub(crate) fn validate<'a>(
    patterns: impl Iterator<Item = &'a Pattern>,
) -> Result<(), RouteConflict> {
    let mut patterns = patterns.collect::<Vec<_>>();
    patterns.sort_by(|a, b| a.cmp_priority(b));

    for (idx, pattern) in patterns.iter().enumerate().skip(1) {
        let path = sample_path(pattern);

        if let Some(earlier) = patterns[..idx].iter().find(|earlier| accepts(earlier, &path)) {
            warn!(
                shadowed = %pattern,
                shadowed_by = %earlier,
                "route can never be matched"
            );

            return Err(RouteConflict {
                shadowed: pattern.to_string(),
                shadowed_by: earlier.to_string(),
            });
        }
    }

    debug!(routes = patterns.len(), "no shadowed routes");
    Ok(())
}

/// Builds one path, as segments, that `pattern` accepts.
fn sample_path(pattern: &Pattern) -> Vec<String> {
    let mut path = Vec::with_capacity(pattern.segments().len());

    for seg in pattern.segments() {
        match seg {
            Segment::Literal(text) => path.push(text.to_string()),
            Segment::PrefixCapture { suffix, .. } | Segment::PrefixWildcard { suffix } => {
                path.push(format!("{}{}", token(), suffix))
            }
            Segment::SuffixCapture { prefix, .. } | Segment::SuffixWildcard { prefix } => {
                path.push(format!("{}{}", prefix, token()))
            }
            Segment::Capture(_) | Segment::Wildcard => path.push(token()),
            Segment::Null => path.push(String::new()),
            Segment::RecursiveWildcard => {
                path.extend((0..RECURSIVE_SAMPLE_LEN).map(|_| token()))
            }
        }
    }

    path
}

/// Structural test: segment count and per-segment acceptance, without backtracking.
fn accepts(pattern: &Pattern, path: &[String]) -> bool {
    let segments = pattern.segments();

    let fixed = match segments.split_last() {
        Some((Segment::RecursiveWildcard, fixed)) => {
            if path.len() < fixed.len() {
                return false;
            }
            fixed
        }
        _ => {
            if path.len() != segments.len() {
                return false;
            }
            segments
        }
    };

    fixed
        .iter()
        .zip(path)
        .all(|(seg, part)| seg.accepts(part, false).is_some())
}

fn token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}
