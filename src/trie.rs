use crate::{pattern::Pattern, segment::Segment};

pub(crate) type HashMap<K, V> = std::collections::HashMap<K, V, foldhash::fast::RandomState>;

pub(crate) const ROOT: usize = 0;

/// A node of the routing trie.
///
/// Literal children are keyed by their exact text. All other children are kept in a list sorted
/// by [`Segment::priority`], so the first acceptable child in list order is the most specific.
#[derive(Debug, Clone)]
pub struct TrieNode<V> {
    pub(crate) literals: HashMap<String, usize>,
    pub(crate) dynamic: Vec<(Segment, usize)>,
    pub(crate) value: Option<V>,
}

impl<V> TrieNode<V> {
    fn new() -> Self {
        TrieNode {
            literals: HashMap::default(),
            dynamic: Vec::new(),
            value: None,
        }
    }

    /// Returns the value attached to this node, if the node ends a registered pattern.
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Mutable variant of [`value`](Self::value).
    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.value.as_mut()
    }

    /// Returns `true` if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.literals.is_empty() && self.dynamic.is_empty()
    }
}

/// Builder for a [`Trie`].
///
/// Patterns sharing a structurally identical prefix share the nodes for that prefix. Nodes live in
/// a single arena and refer to their children by index.
#[derive(Debug, Clone)]
pub struct TrieBuilder<V> {
    nodes: Vec<TrieNode<V>>,
}

impl<V> Default for TrieBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TrieBuilder<V> {
    /// Constructs a builder holding only the root node.
    pub fn new() -> Self {
        TrieBuilder {
            nodes: vec![TrieNode::new()],
        }
    }

    /// Inserts `pattern`, creating nodes on demand.
    ///
    /// If the terminal node has no value yet, one is created with `make_value`. `configure` then
    /// receives the terminal node's value and its result is returned. Inserting an identical
    /// pattern again reaches the same value.
    ///
    /// # Examples
    /// ```
    /// use segment_router::{Pattern, TrieBuilder};
    ///
    /// let mut trie = TrieBuilder::<Vec<&str>>::new();
    /// let pattern = Pattern::parse("/users/:id").unwrap();
    ///
    /// trie.add_entry(&pattern, |_| Vec::new(), |v| v.push("GET"));
    /// trie.add_entry(&pattern, |_| Vec::new(), |v| v.push("PUT"));
    ///
    /// assert_eq!(trie.values().collect::<Vec<_>>(), [&vec!["GET", "PUT"]]);
    /// ```
    pub fn add_entry<F, C, R>(&mut self, pattern: &Pattern, make_value: F, configure: C) -> R
    where
        F: FnOnce(&Pattern) -> V,
        C: FnOnce(&mut V) -> R,
    {
        let mut idx = ROOT;

        for seg in pattern.segments() {
            idx = self.child(idx, seg);
        }

        let value = self.nodes[idx]
            .value
            .get_or_insert_with(|| make_value(pattern));

        configure(value)
    }

    fn child(&mut self, parent: usize, seg: &Segment) -> usize {
        if let Segment::Literal(text) = seg {
            if let Some(&idx) = self.nodes[parent].literals.get(&**text) {
                return idx;
            }

            let idx = self.push_node();
            self.nodes[parent].literals.insert(text.to_string(), idx);
            return idx;
        }

        if let Some(&(_, idx)) = self.nodes[parent]
            .dynamic
            .iter()
            .find(|(existing, _)| existing == seg)
        {
            return idx;
        }

        let idx = self.push_node();

        // keep rank order; equal ranks stay in insertion order
        let priority = seg.priority();
        let dynamic = &mut self.nodes[parent].dynamic;
        let pos = dynamic.partition_point(|(existing, _)| existing.priority() <= priority);
        dynamic.insert(pos, (seg.clone(), idx));

        idx
    }

    fn push_node(&mut self) -> usize {
        self.nodes.push(TrieNode::new());
        self.nodes.len() - 1
    }

    /// Iterates over all attached values, in no particular order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.nodes.iter().filter_map(TrieNode::value)
    }

    /// Collects all attached values in the order the matcher tries them.
    ///
    /// Nodes are visited depth-first: a node's own value, then its literal children, then its
    /// other children in list order. Dynamic siblings of equal rank keep registration order.
    pub fn values_in_match_order(&self) -> Vec<&V> {
        let mut values = Vec::new();
        let mut stack = vec![ROOT];

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            values.extend(node.value());

            let mut literals = node.literals.iter().collect::<Vec<_>>();
            literals.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

            // popped in reverse
            stack.extend(node.dynamic.iter().rev().map(|&(_, child)| child));
            stack.extend(literals.into_iter().rev().map(|(_, &child)| child));
        }

        values
    }

    /// Calls `f` on every node, including nodes without a value.
    pub fn for_each<F>(&mut self, f: F)
    where
        F: FnMut(&mut TrieNode<V>),
    {
        self.nodes.iter_mut().for_each(f);
    }

    /// Returns the number of nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Freezes the builder into a read-only trie.
    pub fn finish(self) -> Trie<V> {
        Trie { nodes: self.nodes }
    }
}

/// Read-only routing trie.
///
/// Lookups are implemented in the [matcher](crate::matcher) module.
#[derive(Debug, Clone)]
pub struct Trie<V> {
    pub(crate) nodes: Vec<TrieNode<V>>,
}

impl<V> Trie<V> {
    /// Iterates over all attached values, in no particular order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.nodes.iter().filter_map(TrieNode::value)
    }

    /// Returns the number of nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
