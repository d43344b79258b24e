#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::unigrams::WordId;

/// Prefix index over all known words
///
/// Nodes live in a flat arena; node 0 is the root. Each node keeps its outgoing edges sorted by
/// byte so that lookups are a binary search over at most 26 entries.
#[cfg_attr(feature = "with-serde", derive(Deserialize, Serialize))]
pub(crate) struct Trie {
    nodes: Vec<Node>,
}

impl Trie {
    pub(crate) fn new<'a>(words: impl Iterator<Item = (WordId, &'a str)>) -> Self {
        let mut trie = Self {
            nodes: vec![Node::default()],
        };

        for (id, word) in words {
            trie.insert(word, id);
        }

        trie
    }

    fn insert(&mut self, word: &str, id: WordId) {
        let mut node = 0;
        for &byte in word.as_bytes() {
            node = match self.nodes[node].child(byte) {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    let edges = &mut self.nodes[node].edges;
                    let idx = edges.partition_point(|&(b, _)| b < byte);
                    edges.insert(idx, (byte, child as u32));
                    child
                }
            };
        }

        debug_assert!(self.nodes[node].word.is_none());
        self.nodes[node].word = Some(id);
    }

    /// Iterate over every known word that is a prefix of `text[start..]`
    ///
    /// Yields `(end, word)` pairs ordered by increasing length, considering at most `limit`
    /// bytes.
    pub(crate) fn prefixes<'a>(
        &'a self,
        text: &'a [u8],
        start: usize,
        limit: usize,
    ) -> Prefixes<'a> {
        Prefixes {
            nodes: &self.nodes,
            text,
            pos: start,
            end: text.len().min(start.saturating_add(limit)),
            node: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn get(&self, word: &str) -> Option<WordId> {
        let mut node = 0;
        for &byte in word.as_bytes() {
            node = self.nodes[node].child(byte)?;
        }
        self.nodes[node].word
    }
}

#[derive(Default)]
#[cfg_attr(feature = "with-serde", derive(Deserialize, Serialize))]
struct Node {
    edges: Vec<(u8, u32)>,
    word: Option<WordId>,
}

impl Node {
    fn child(&self, byte: u8) -> Option<usize> {
        self.edges
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()
            .map(|idx| self.edges[idx].1 as usize)
    }
}

pub(crate) struct Prefixes<'a> {
    nodes: &'a [Node],
    text: &'a [u8],
    pos: usize,
    end: usize,
    node: usize,
}

impl<'a> Iterator for Prefixes<'a> {
    type Item = (usize, WordId);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.end {
            self.node = self.nodes[self.node].child(self.text[self.pos])?;
            self.pos += 1;
            if let Some(word) = self.nodes[self.node].word {
                return Some((self.pos, word));
            }
        }

        None
    }
}
