//! Priority-ordered lookup over a frozen [`Trie`].

use std::borrow::Cow;

use bytestring::ByteString;
use smallvec::SmallVec;

use crate::{
    params::Params,
    pattern::path_segments,
    segment::{Capture, Segment},
    trie::{Trie, TrieNode, ROOT},
};

/// A successful route lookup.
#[derive(Debug)]
pub struct Match<'a, V> {
    /// Value attached to the matched pattern.
    pub value: &'a V,

    /// Values captured along the matched path.
    pub params: Params,
}

/// Captures collected on the current search branch.
struct Scope<'t, 'p> {
    path: &'p str,
    fold: bool,
    captures: SmallVec<[(&'t ByteString, &'p str); 8]>,
    catch_all: Option<&'p str>,
}

impl<V> Trie<V> {
    /// Finds the value whose pattern matches `path`.
    ///
    /// At every node the literal child equal to the current segment is tried first, then the
    /// remaining children in priority order. If a child's subtree fails to match the rest of the
    /// path, the search backtracks and tries the next child; captures made on a failed branch are
    /// discarded.
    ///
    /// With `case_insensitive` set, literal text is compared ignoring ASCII case; the trie is
    /// expected to have been built from lowercased patterns.
    ///
    /// # Examples
    /// ```
    /// use segment_router::{Pattern, TrieBuilder};
    ///
    /// let mut trie = TrieBuilder::new();
    /// trie.add_entry(&Pattern::parse("/users/:id").unwrap(), |_| 1, |_| ());
    /// trie.add_entry(&Pattern::parse("/users/me").unwrap(), |_| 2, |_| ());
    /// let trie = trie.finish();
    ///
    /// let m = trie.find("/users/42", false).unwrap();
    /// assert_eq!(*m.value, 1);
    /// assert_eq!(m.params.get("id"), Some("42"));
    ///
    /// assert_eq!(*trie.find("/users/me", false).unwrap().value, 2);
    /// assert!(trie.find("/users", false).is_none());
    /// ```
    pub fn find(&self, path: &str, case_insensitive: bool) -> Option<Match<'_, V>> {
        let segments = path_segments(path).collect::<SmallVec<[(usize, &str); 16]>>();

        let mut scope = Scope {
            path,
            fold: case_insensitive,
            captures: SmallVec::new(),
            catch_all: None,
        };

        let node = self.descend(ROOT, &segments, &mut scope)?;
        let value = node.value.as_ref()?;

        let mut params = Params::new();
        for (name, captured) in scope.captures {
            params.push(name.clone(), captured);
        }
        if let Some(rest) = scope.catch_all {
            params.set_catch_all(rest);
        }

        Some(Match { value, params })
    }

    fn descend<'t, 'p>(
        &'t self,
        idx: usize,
        segments: &[(usize, &'p str)],
        scope: &mut Scope<'t, 'p>,
    ) -> Option<&'t TrieNode<V>> {
        let node = &self.nodes[idx];

        let (offset, seg, rest) = match segments.split_first() {
            Some((&(offset, seg), rest)) => (offset, seg, rest),
            None => {
                if node.value.is_some() {
                    return Some(node);
                }

                // `**` may also consume zero segments
                return node.dynamic.iter().find_map(|(child_seg, child)| {
                    let child = &self.nodes[*child];
                    match child_seg {
                        Segment::RecursiveWildcard if child.value.is_some() => {
                            scope.catch_all = Some("");
                            Some(child)
                        }
                        _ => None,
                    }
                });
            }
        };

        let key = if scope.fold && seg.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(seg.to_ascii_lowercase())
        } else {
            Cow::Borrowed(seg)
        };

        if let Some(&child) = node.literals.get(&*key) {
            if let Some(found) = self.descend(child, rest, scope) {
                return Some(found);
            }
        }

        for (child_seg, child) in &node.dynamic {
            if matches!(child_seg, Segment::RecursiveWildcard) {
                let child = &self.nodes[*child];
                if child.value.is_some() {
                    let path = scope.path;
                    scope.catch_all = Some(&path[offset..]);
                    return Some(child);
                }
                continue;
            }

            let mark = scope.captures.len();

            match child_seg.accepts(seg, scope.fold) {
                Some(Capture::Named(name, value)) => scope.captures.push((name, value)),
                Some(Capture::None) => {}
                None => continue,
            }

            if let Some(found) = self.descend(*child, rest, scope) {
                return Some(found);
            }

            scope.captures.truncate(mark);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use rand::{distr::Alphanumeric, Rng as _};

    use crate::{pattern::Pattern, trie::TrieBuilder};

    use super::*;

    fn trie(patterns: &[&'static str]) -> Trie<&'static str> {
        let mut trie = TrieBuilder::new();
        for &path in patterns {
            trie.add_entry(&Pattern::parse(path).unwrap(), |_| path, |_| ());
        }
        trie.finish()
    }

    fn lookup<'a>(trie: &'a Trie<&'static str>, path: &str) -> Option<&'a str> {
        trie.find(path, false).map(|m| *m.value)
    }

    #[test]
    fn static_and_root() {
        let t = trie(&["/", "/users", "/users/new", "/users/"]);

        assert_eq!(lookup(&t, "/"), Some("/"));
        assert_eq!(lookup(&t, ""), Some("/"));
        assert_eq!(lookup(&t, "/users"), Some("/users"));
        assert_eq!(lookup(&t, "/users/new"), Some("/users/new"));
        assert_eq!(lookup(&t, "/users/"), Some("/users/"));
        assert_eq!(lookup(&t, "/users/old"), None);
        assert_eq!(lookup(&t, "/user"), None);
    }

    #[test]
    fn capture_params() {
        let t = trie(&["/users/:id", "/users/:id/posts/{post}.json"]);

        let m = t.find("/users/42", false).unwrap();
        assert_eq!(*m.value, "/users/:id");
        assert_eq!(m.params.get("id"), Some("42"));
        assert_eq!(m.params.len(), 1);

        let m = t.find("/users/7/posts/hello.json", false).unwrap();
        assert_eq!(
            m.params.iter().collect::<Vec<_>>(),
            [("id", "7"), ("post", "hello")]
        );

        assert!(t.find("/users/", false).is_none());
        assert!(t.find("/users/7/posts/hello.xml", false).is_none());
    }

    #[test]
    fn literal_beats_capture_regardless_of_order() {
        let t = trie(&["/a/:x", "/a/b"]);
        assert_eq!(lookup(&t, "/a/b"), Some("/a/b"));
        assert_eq!(lookup(&t, "/a/c"), Some("/a/:x"));

        let t = trie(&["/a/b", "/a/:x"]);
        assert_eq!(lookup(&t, "/a/b"), Some("/a/b"));
    }

    #[test]
    fn capture_beats_wildcard() {
        for order in [["/user/*", "/user/:id"], ["/user/:id", "/user/*"]] {
            let t = trie(&order);
            assert_eq!(lookup(&t, "/user/42"), Some("/user/:id"));
        }
    }

    #[test]
    fn affix_beats_capture() {
        let t = trie(&["/img/:name", "/img/{name}.png", "/img/*.gif", "/img/thumb-*"]);

        let m = t.find("/img/cat.png", false).unwrap();
        assert_eq!(*m.value, "/img/{name}.png");
        assert_eq!(m.params.get("name"), Some("cat"));

        assert_eq!(lookup(&t, "/img/cat.gif"), Some("/img/*.gif"));
        assert_eq!(lookup(&t, "/img/thumb-1"), Some("/img/thumb-*"));
        assert_eq!(lookup(&t, "/img/cat.jpg"), Some("/img/:name"));
    }

    #[test]
    fn affix_tie_break_prefix_capture_first() {
        // both accept "ab.ab"; equal fixed text length
        let t = trie(&["/x/ab{rest}", "/x/{rest}ab"]);
        let m = t.find("/x/ab.ab", false).unwrap();
        assert_eq!(*m.value, "/x/{rest}ab");
        assert_eq!(m.params.get("rest"), Some("ab."));
    }

    #[test]
    fn backtracks_to_lower_priority_sibling() {
        let t = trie(&["/a/b/c", "/a/:x/d", "/a/*/e"]);

        // literal `b` is tried first but fails on `d`
        let m = t.find("/a/b/d", false).unwrap();
        assert_eq!(*m.value, "/a/:x/d");
        assert_eq!(m.params.get("x"), Some("b"));

        // both `b` and `:x` fail deeper; the capture made on the way is dropped
        let m = t.find("/a/b/e", false).unwrap();
        assert_eq!(*m.value, "/a/*/e");
        assert!(m.params.is_empty());
    }

    #[test]
    fn intermediate_nodes_are_not_matches() {
        let t = trie(&["/a/b/c"]);
        assert!(t.find("/a/b", false).is_none());
        assert!(t.find("/a", false).is_none());
    }

    #[test]
    fn recursive_wildcard() {
        let t = trie(&["/files/**", "/files/special", "/files/:id/meta"]);

        let m = t.find("/files/a/b/c", false).unwrap();
        assert_eq!(*m.value, "/files/**");
        assert_eq!(m.params.catch_all(), Some("a/b/c"));

        let m = t.find("/files", false).unwrap();
        assert_eq!(*m.value, "/files/**");
        assert_eq!(m.params.catch_all(), Some(""));

        assert_eq!(lookup(&t, "/files/special"), Some("/files/special"));
        assert_eq!(lookup(&t, "/files/9/meta"), Some("/files/:id/meta"));

        // `:id` subtree fails; falls back to `**` with no leaked capture
        let m = t.find("/files/9/other", false).unwrap();
        assert_eq!(*m.value, "/files/**");
        assert!(m.params.get("id").is_none());
        assert_eq!(m.params.catch_all(), Some("9/other"));
    }

    #[test]
    fn null_segment() {
        let t = trie(&["/dir/", "/dir/*"]);
        assert_eq!(lookup(&t, "/dir/"), Some("/dir/"));
        assert_eq!(lookup(&t, "/dir/x"), Some("/dir/*"));
        assert_eq!(lookup(&t, "/dir"), None);
    }

    #[test]
    fn case_insensitive() {
        let mut builder = TrieBuilder::new();
        for path in ["/User/:Name", "/Static/*.PNG"] {
            let pattern = Pattern::parse(path).unwrap().lowercased();
            builder.add_entry(&pattern, |_| path, |_| ());
        }
        let t = builder.finish();

        for path in ["/user/Bob", "/USER/Bob", "/uSeR/Bob"] {
            let m = t.find(path, true).unwrap();
            assert_eq!(*m.value, "/User/:Name");
            assert_eq!(m.params.get("Name"), Some("Bob"));
        }

        assert_eq!(*t.find("/static/a.png", true).unwrap().value, "/Static/*.PNG");
        assert!(t.find("/USER/Bob", false).is_none());
    }

    fn token() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect()
    }

    /// Path accepted by `pattern`, with the captures and `**` remainder it should produce.
    fn sample(pattern: &Pattern) -> (String, Vec<(String, String)>, Option<String>) {
        let mut parts = Vec::new();
        let mut captures = Vec::new();
        let mut rest = None;

        for seg in pattern.segments() {
            let value = token();

            match seg {
                Segment::Literal(text) => parts.push(text.to_string()),
                Segment::Capture(name) => {
                    parts.push(value.clone());
                    captures.push((name.to_string(), value));
                }
                Segment::PrefixCapture { suffix, name } => {
                    parts.push(format!("{}{}", value, suffix));
                    captures.push((name.to_string(), value));
                }
                Segment::SuffixCapture { prefix, name } => {
                    parts.push(format!("{}{}", prefix, value));
                    captures.push((name.to_string(), value));
                }
                Segment::PrefixWildcard { suffix } => parts.push(format!("{}{}", value, suffix)),
                Segment::SuffixWildcard { prefix } => parts.push(format!("{}{}", prefix, value)),
                Segment::Wildcard => parts.push(value),
                Segment::Null => parts.push(String::new()),
                Segment::RecursiveWildcard => {
                    let tail = (0..3).map(|_| token()).collect::<Vec<_>>().join("/");
                    parts.push(tail.clone());
                    rest = Some(tail);
                }
            }
        }

        (format!("/{}", parts.join("/")), captures, rest)
    }

    #[test]
    fn accepted_paths_match_their_own_pattern() {
        let patterns = [
            "/",
            "/lit",
            "/lit/:id",
            "/lit/:id/edit",
            "/img/{name}.png",
            "/img/*.gif",
            "/img/thumb-*",
            "/img/:name",
            "/v{ver}/x",
            "/c/*",
            "/d/",
            "/e/**",
            "/e/:id/{file}.json/:part",
            "/repos/:owner/:repo/git/refs/**",
        ];
        let t = trie(&patterns);

        for _ in 0..16 {
            for raw in patterns {
                let pattern = Pattern::parse(raw).unwrap();
                let (path, captures, rest) = sample(&pattern);

                let m = t
                    .find(&path, false)
                    .unwrap_or_else(|| panic!("{} did not match {}", path, raw));
                assert_eq!(*m.value, raw, "{}", path);

                assert_eq!(
                    m.params.iter().map(|(name, _)| name).collect::<Vec<_>>(),
                    pattern.names().collect::<Vec<_>>(),
                    "{}",
                    path
                );
                assert_eq!(
                    m.params
                        .iter()
                        .map(|(name, value)| (name.to_owned(), value.to_owned()))
                        .collect::<Vec<_>>(),
                    captures,
                    "{}",
                    path
                );
                assert_eq!(m.params.catch_all(), rest.as_deref(), "{}", path);
            }
        }
    }
}
