//! Trie of disabled index-tuple signatures.
//!
//! A failure mask plus a tuple defines a *signature*: the values at the
//! masked positions, with the rest left blank. The trie stores signatures
//! compactly (shared prefixes, blank skip edges) and answers whether a
//! candidate tuple is subsumed by any recorded signature within a given
//! prefix.

use rustc_hash::FxHashMap;

/// Arena-allocated signature trie.
#[derive(Debug)]
pub struct IndexTrie {
    nodes: Vec<TrieNode>,
    ignore_fully_specified: bool,
}

#[derive(Debug, Default)]
struct TrieNode {
    children: FxHashMap<usize, usize>,
    blank: Option<usize>,
    terminal: bool,
}

impl IndexTrie {
    /// Empty trie. With `ignore_fully_specified` set, signatures whose mask
    /// constrains every position are dropped on insertion; callers that
    /// never revisit a tuple gain nothing from storing them.
    pub fn new(ignore_fully_specified: bool) -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            ignore_fully_specified,
        }
    }

    fn fresh_node(&mut self) -> usize {
        self.nodes.push(TrieNode::default());
        self.nodes.len() - 1
    }

    /// Record the signature of `values` under `mask`.
    ///
    /// Only masked positions constrain future lookups. An all-false mask
    /// subsumes every tuple.
    ///
    /// # Panics
    ///
    /// Panics if `mask` and `values` differ in length.
    pub fn add(&mut self, mask: &[bool], values: &[usize]) {
        assert_eq!(mask.len(), values.len(), "mask/tuple length mismatch");
        if self.ignore_fully_specified && !mask.is_empty() && mask.iter().all(|&m| m) {
            return;
        }
        let Some(last_masked) = mask.iter().rposition(|&m| m) else {
            // no constrained position: everything is subsumed
            self.close(0);
            return;
        };

        let mut node = 0;
        for pos in 0..=last_masked {
            if self.nodes[node].terminal {
                return; // already subsumed by a shorter signature
            }
            node = if mask[pos] {
                match self.nodes[node].children.get(&values[pos]) {
                    Some(&next) => next,
                    None => {
                        let next = self.fresh_node();
                        self.nodes[node].children.insert(values[pos], next);
                        next
                    }
                }
            } else {
                match self.nodes[node].blank {
                    Some(next) => next,
                    None => {
                        let next = self.fresh_node();
                        self.nodes[node].blank = Some(next);
                        next
                    }
                }
            };
        }
        self.close(node);
    }

    // Terminal nodes subsume their whole subtree.
    fn close(&mut self, node: usize) {
        let n = &mut self.nodes[node];
        n.terminal = true;
        n.children.clear();
        n.blank = None;
    }

    /// Whether some recorded signature has all of its constrained positions
    /// in `0..prefix_len` and agreeing with `values`.
    pub fn find(&self, values: &[usize], prefix_len: usize) -> bool {
        self.find_rec(0, values, 0, prefix_len)
    }

    fn find_rec(&self, node: usize, values: &[usize], pos: usize, prefix_len: usize) -> bool {
        let n = &self.nodes[node];
        if n.terminal {
            return true;
        }
        if pos >= prefix_len || pos >= values.len() {
            return false;
        }
        if let Some(blank) = n.blank {
            if self.find_rec(blank, values, pos + 1, prefix_len) {
                return true;
            }
        }
        if let Some(&next) = n.children.get(&values[pos]) {
            if self.find_rec(next, values, pos + 1, prefix_len) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_prefix_signature() {
        let mut trie = IndexTrie::new(true);
        trie.add(&[true, false], &[0, 0]);

        // any tuple starting with 0 is subsumed once the prefix covers it
        assert!(trie.find(&[0, 1], 2));
        assert!(trie.find(&[0, 5], 2));
        assert!(trie.find(&[0, 1], 1));
        // constrained position outside the prefix: no match
        assert!(!trie.find(&[0, 1], 0));
        assert!(!trie.find(&[1, 0], 2));
    }

    #[test]
    fn test_blank_positions_match_anything() {
        let mut trie = IndexTrie::new(false);
        trie.add(&[false, true, true], &[9, 2, 3]);

        assert!(trie.find(&[0, 2, 3], 3));
        assert!(trie.find(&[7, 2, 3], 3));
        assert!(!trie.find(&[7, 2, 4], 3));
        // signature reaches position 2, prefix too short
        assert!(!trie.find(&[7, 2, 3], 2));
    }

    #[test]
    fn test_empty_mask_subsumes_everything() {
        let mut trie = IndexTrie::new(true);
        assert!(!trie.find(&[4, 4], 2));
        trie.add(&[false, false], &[0, 0]);
        assert!(trie.find(&[4, 4], 2));
        assert!(trie.find(&[0, 0], 0));
    }

    #[test]
    fn test_fully_specified_is_ignored() {
        let mut trie = IndexTrie::new(true);
        trie.add(&[true, true], &[1, 2]);
        assert!(!trie.find(&[1, 2], 2));

        // without the filter the same signature matches exactly one tuple
        let mut keep = IndexTrie::new(false);
        keep.add(&[true, true], &[1, 2]);
        assert!(keep.find(&[1, 2], 2));
        assert!(!keep.find(&[1, 3], 2));
    }

    #[test]
    fn test_shorter_signature_subsumes_longer() {
        let mut trie = IndexTrie::new(true);
        trie.add(&[true, true, false], &[1, 2, 0]);
        trie.add(&[true, false, false], &[1, 0, 0]);
        // signature [1, *, *] subsumes [1, 2, *]
        assert!(trie.find(&[1, 9, 9], 1));
        assert!(trie.find(&[1, 2, 3], 3));
    }
}
