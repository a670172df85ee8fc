//! Token trie for hierarchical command paths.
//!
//! Each edge is one whole token (`"show"`, `"switch"`), keyed in lowercase so
//! lookups are case-insensitive. Children are kept in a `BTreeMap` so candidate
//! lists come out sorted.

use std::collections::BTreeMap;

/// Outcome of matching one input token against a node's children.
#[derive(Debug)]
pub enum Step<'a, V> {
    /// The token selected exactly one child.
    Descend(&'a TrieNode<V>),
    /// The token is a prefix of several children (display tokens, sorted).
    Ambiguous(Vec<&'a str>),
    /// No child matches the token.
    NoMatch,
}

/// A node of a [`TokenTrie`].
#[derive(Debug, Clone)]
pub struct TrieNode<V> {
    /// The token as first registered, for display.
    token: Box<str>,
    value: Option<V>,
    children: BTreeMap<Box<str>, TrieNode<V>>,
}

impl<V> TrieNode<V> {
    fn new(token: &str) -> Self {
        Self {
            token: token.into(),
            value: None,
            children: BTreeMap::new(),
        }
    }

    /// The token leading to this node (empty for the root).
    #[inline]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The value bound at this node, if any.
    #[inline]
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Whether this node has children.
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Display tokens of all children, sorted.
    pub fn child_tokens(&self) -> Vec<&str> {
        self.children.values().map(|c| c.token()).collect()
    }

    /// Display tokens of the children that `partial` is a prefix of.
    pub fn children_with_prefix(&self, partial: &str) -> Vec<&str> {
        let key = partial.to_lowercase();
        self.children
            .iter()
            .filter(|(k, _)| k.starts_with(key.as_str()))
            .map(|(_, c)| c.token())
            .collect()
    }

    /// Match one input token against the children.
    ///
    /// An exact token wins over prefix matches; otherwise a non-empty prefix
    /// of exactly one child selects that child.
    pub fn step(&self, input: &str) -> Step<'_, V> {
        if input.is_empty() {
            return Step::NoMatch;
        }

        let key = input.to_lowercase();
        if let Some(child) = self.children.get(key.as_str()) {
            return Step::Descend(child);
        }

        let mut matches = self
            .children
            .iter()
            .filter(|(k, _)| k.starts_with(key.as_str()))
            .map(|(_, c)| c);

        match (matches.next(), matches.next()) {
            (None, _) => Step::NoMatch,
            (Some(only), None) => Step::Descend(only),
            (Some(first), Some(second)) => {
                let mut tokens = vec![first.token(), second.token()];
                tokens.extend(matches.map(|c| c.token()));
                Step::Ambiguous(tokens)
            }
        }
    }
}

/// A trie keyed by token sequences.
///
/// # Examples
///
/// ```
/// use ctl_console::core::TokenTrie;
///
/// let mut trie = TokenTrie::new();
/// trie.insert(&["show", "switch"], 1);
/// trie.insert(&["show", "host"], 2);
///
/// assert_eq!(trie.get(&["SHOW", "host"]), Some(&2));
/// assert_eq!(trie.get(&["show"]), None);
/// assert_eq!(trie.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TokenTrie<V> {
    root: TrieNode<V>,
    len: usize,
}

impl<V> Default for TokenTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TokenTrie<V> {
    /// Create a new empty trie.
    pub fn new() -> Self {
        Self {
            root: TrieNode::new(""),
            len: 0,
        }
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> &TrieNode<V> {
        &self.root
    }

    /// Get the number of bound values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the trie is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bind a value at `path`.
    ///
    /// Returns the previous value if the path was already bound.
    pub fn insert(&mut self, path: &[&str], value: V) -> Option<V> {
        let mut node = &mut self.root;

        for token in path {
            node = node
                .children
                .entry(token.to_lowercase().into())
                .or_insert_with(|| TrieNode::new(token));
        }

        let old = node.value.replace(value);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    /// Get the value bound at exactly `path`.
    pub fn get(&self, path: &[&str]) -> Option<&V> {
        let mut node = &self.root;

        for token in path {
            node = node.children.get(token.to_lowercase().as_str())?;
        }

        node.value.as_ref()
    }

    /// Check if a value is bound at exactly `path`.
    pub fn contains(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }

    /// Unbind the value at `path`, pruning nodes left empty.
    pub fn remove(&mut self, path: &[&str]) -> Option<V> {
        let keys: Vec<String> = path.iter().map(|t| t.to_lowercase()).collect();
        let removed = Self::remove_at(&mut self.root, &keys)?;
        self.len -= 1;
        Some(removed)
    }

    fn remove_at(node: &mut TrieNode<V>, keys: &[String]) -> Option<V> {
        let Some((first, rest)) = keys.split_first() else {
            return node.value.take();
        };

        let child = node.children.get_mut(first.as_str())?;
        let removed = Self::remove_at(child, rest)?;

        if child.value.is_none() && child.children.is_empty() {
            node.children.remove(first.as_str());
        }
        Some(removed)
    }

    /// Iterate over all bound values with their display paths, sorted by path.
    pub fn iter(&self) -> impl Iterator<Item = (String, &V)> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack = vec![(String::new(), &self.root)];

        while let Some((path, node)) = stack.pop() {
            if let Some(value) = &node.value {
                out.push((path.clone(), value));
            }
            for child in node.children.values().rev() {
                let child_path = if path.is_empty() {
                    child.token().to_string()
                } else {
                    format!("{} {}", path, child.token())
                };
                stack.push((child_path, child));
            }
        }

        out.into_iter()
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.root = TrieNode::new("");
        self.len = 0;
    }
}
