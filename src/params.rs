use std::ops::Index;

use bytestring::ByteString;
use smallvec::SmallVec;

/// Path parameters captured by a route match.
///
/// Parameters are kept in the order their captures appear in the pattern, left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    segments: SmallVec<[(ByteString, ByteString); 4]>,
    catch_all: Option<ByteString>,
}

impl Params {
    /// Constructs an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: ByteString, value: &str) {
        self.segments.push((name, ByteString::from(value)));
    }

    pub(crate) fn set_catch_all(&mut self, value: &str) {
        self.catch_all = Some(ByteString::from(value));
    }

    /// Returns the value captured under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|(seg_name, _)| &**seg_name == name)
            .map(|(_, value)| &**value)
    }

    /// Returns the part of the path consumed by a `**` segment, without its leading slash.
    ///
    /// `Some("")` when the wildcard matched zero segments; `None` when the matched route has no
    /// recursive wildcard.
    pub fn catch_all(&self) -> Option<&str> {
        self.catch_all.as_deref()
    }

    /// Returns `true` if no named value was captured.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns number of named captures.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.segments
            .iter()
            .map(|(name, value)| (&**name, &**value))
    }
}

impl<'a> Index<&'a str> for Params {
    type Output = str;

    fn index(&self, name: &'a str) -> &str {
        self.get(name)
            .expect("Value for parameter is not available")
    }
}

impl Index<usize> for Params {
    type Output = str;

    fn index(&self, idx: usize) -> &str {
        &self.segments[idx].1
    }
}
