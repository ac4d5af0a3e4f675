//! Prefix-code encoding and decoding.
//!
//! A prefix code maps symbols to non-empty codewords such that no codeword
//! is a prefix of another. Decoding walks a binary trie built from the code:
//! each bit selects a child, and reaching a leaf emits its symbol.

use std::collections::HashMap;
use std::hash::Hash;
use std::iter::FusedIterator;

use log::debug;

use crate::bitvec::BitVector;
use crate::error::{BitError, Result};

/// Index of the root node; as a child slot, it means "no child".
const ROOT: usize = 0;

#[derive(Debug, Clone)]
struct TrieNode<S> {
    child: [usize; 2],
    symbol: Option<S>,
}

impl<S> TrieNode<S> {
    fn new() -> Self {
        Self {
            child: [ROOT; 2],
            symbol: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.symbol.is_some()
    }
}

/// Binary decoding trie of a prefix code.
///
/// # Invariants
///
/// - Every leaf holds exactly one symbol
/// - Every internal node has at least one child
/// - No symbol sits on an internal node
#[derive(Debug, Clone)]
pub struct PrefixTrie<S> {
    nodes: Vec<TrieNode<S>>,
    leaves: usize,
}

impl<S: Clone> PrefixTrie<S> {
    /// Builds the trie of a code given as `(symbol, codeword)` pairs.
    pub fn build<'a, I>(code: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a S, &'a BitVector)>,
        S: 'a,
    {
        let mut trie = Self {
            nodes: vec![TrieNode::new()],
            leaves: 0,
        };
        for (symbol, word) in code {
            trie.insert(symbol, word)?;
        }
        if trie.leaves == 0 {
            return Err(BitError::EmptyCode);
        }
        debug!("prefix trie: {} nodes, {} leaves", trie.nodes.len(), trie.leaves);
        Ok(trie)
    }

    fn insert(&mut self, symbol: &S, word: &BitVector) -> Result<()> {
        if word.is_empty() {
            return Err(BitError::InvalidCodeword);
        }
        let mut node = ROOT;
        for bit in word.iter() {
            let k = bit as usize;
            let next = self.nodes[node].child[k];
            if next != ROOT {
                if self.nodes[next].is_leaf() {
                    // A shorter codeword is a prefix of this one.
                    return Err(BitError::AmbiguousCode);
                }
                node = next;
            } else {
                let id = self.nodes.len();
                self.nodes.push(TrieNode::new());
                self.nodes[node].child[k] = id;
                node = id;
            }
        }
        let leaf = &mut self.nodes[node];
        if leaf.is_leaf() || leaf.child != [ROOT; 2] {
            return Err(BitError::AmbiguousCode);
        }
        leaf.symbol = Some(symbol.clone());
        self.leaves += 1;
        Ok(())
    }
}

impl<S> PrefixTrie<S> {
    /// Total number of nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
    /// Number of leaves, that is, of codewords.
    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    /// Decodes one symbol of `data` starting at `*index`.
    ///
    /// Returns `None` at the end of the data.
    fn next_symbol(&self, data: &BitVector, index: &mut usize) -> Option<Result<&S>> {
        if *index >= data.len() {
            return None;
        }
        let mut node = ROOT;
        while *index < data.len() {
            let bit = data.get_bit(*index);
            let next = self.nodes[node].child[bit as usize];
            if next == ROOT {
                return Some(Err(BitError::CodeMismatch { position: *index }));
            }
            *index += 1;
            node = next;
            if let Some(symbol) = &self.nodes[node].symbol {
                return Some(Ok(symbol));
            }
        }
        Some(Err(BitError::TruncatedCode { position: *index }))
    }

    /// Decodes all of `data`.
    pub fn decode(&self, data: &BitVector) -> Result<Vec<S>>
    where
        S: Clone,
    {
        let mut index = 0;
        let mut res = Vec::new();
        while let Some(symbol) = self.next_symbol(data, &mut index) {
            res.push(symbol?.clone());
        }
        Ok(res)
    }

    /// Iterator over all `(symbol, codeword)` pairs, in bit-lexicographic order of codewords.
    pub fn codewords(&self) -> Codewords<'_, S> {
        Codewords {
            trie: self,
            stack: vec![(ROOT, Vec::new())],
        }
    }
}

/// Iterator over the codewords of a [`PrefixTrie`].
pub struct Codewords<'a, S> {
    trie: &'a PrefixTrie<S>,
    stack: Vec<(usize, Vec<bool>)>,
}

impl<'a, S> Iterator for Codewords<'a, S> {
    type Item = (&'a S, BitVector);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, prefix)) = self.stack.pop() {
            let n = &self.trie.nodes[node];
            if let Some(symbol) = &n.symbol {
                return Some((symbol, prefix.into_iter().collect()));
            }
            // Push `1` first so that `0` is visited first.
            for k in [1, 0] {
                if n.child[k] != ROOT {
                    let mut p = prefix.clone();
                    p.push(k == 1);
                    self.stack.push((n.child[k], p));
                }
            }
        }
        None
    }
}

/// Streaming decoder owning its trie.
///
/// Yields symbols until the data is exhausted; after an error, yields nothing more.
pub struct DecodeIter<'d, S> {
    trie: PrefixTrie<S>,
    data: &'d BitVector,
    index: usize,
    done: bool,
}

impl<S: Clone> Iterator for DecodeIter<'_, S> {
    type Item = Result<S>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.trie.next_symbol(self.data, &mut self.index) {
            Some(Ok(symbol)) => Some(Ok(symbol.clone())),
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl<S: Clone> FusedIterator for DecodeIter<'_, S> {}

fn check_code<S>(code: &HashMap<S, BitVector>) -> Result<()> {
    if code.is_empty() {
        return Err(BitError::EmptyCode);
    }
    if code.values().any(|w| w.is_empty()) {
        return Err(BitError::InvalidCodeword);
    }
    Ok(())
}

impl BitVector {
    /// Appends the codewords of `symbols`.
    ///
    /// Nothing is appended if any symbol is missing from the code.
    pub fn encode<'s, S, I>(&mut self, code: &HashMap<S, BitVector>, symbols: I) -> Result<()>
    where
        S: Eq + Hash + 's,
        I: IntoIterator<Item = &'s S>,
    {
        check_code(code)?;
        self.ensure_unlocked()?;
        let words = symbols
            .into_iter()
            .map(|s| code.get(s).ok_or(BitError::UnknownSymbol))
            .collect::<Result<Vec<&BitVector>>>()?;
        let total = words.iter().map(|w| w.len()).sum::<usize>();
        let mut at = self.nbits;
        self.resize_storage(at + total)?;
        for w in words {
            self.copy_bits_from(at, w, 0, w.len());
            at += w.len();
        }
        Ok(())
    }

    /// Decodes the whole vector with `code`.
    pub fn decode<S>(&self, code: &HashMap<S, BitVector>) -> Result<Vec<S>>
    where
        S: Clone,
    {
        check_code(code)?;
        PrefixTrie::build(code)?.decode(self)
    }

    /// Lazily decodes the vector with `code`.
    pub fn iter_decode<S>(&self, code: &HashMap<S, BitVector>) -> Result<DecodeIter<'_, S>>
    where
        S: Clone,
    {
        check_code(code)?;
        Ok(DecodeIter {
            trie: PrefixTrie::build(code)?,
            data: self,
            index: 0,
            done: false,
        })
    }
}
