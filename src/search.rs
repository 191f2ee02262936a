use crate::trie::Trie;
use crate::TrieError;

impl Trie {
    /// Walks `path` byte-by-byte starting at slot `from` and returns the
    /// slot reached after the last byte.
    ///
    /// # Errors
    /// [`TrieError::NoPath`] when the walk falls off the trie.
    pub fn jump(&self, path: &[u8], mut from: i32) -> Result<i32, TrieError> {
        if from < 0 || from >= self.size {
            return Err(TrieError::NoPath);
        }
        for &b in path {
            // A slot holding a value has no outgoing transitions.
            if self.array[from as usize].value() >= 0 {
                return Err(TrieError::NoPath);
            }
            let to = self.array[from as usize].base() ^ i32::from(b);
            if self.array[to as usize].check() != from {
                return Err(TrieError::NoPath);
            }
            from = to;
        }
        Ok(from)
    }

    /// The value held at slot `id`: either directly (a childless terminal)
    /// or on the slot's 0-label child.
    ///
    /// # Errors
    /// [`TrieError::NoValue`] when the slot carries no live value.
    pub fn value(&self, id: i32) -> Result<i32, TrieError> {
        if id < 0 || id >= self.size {
            return Err(TrieError::NoValue);
        }
        let node = self.array[id as usize];
        if let Some(v) = node.terminal_value() {
            return Ok(v);
        }
        let base = node.base();
        if base >= 0 && self.array[base as usize].check() == id {
            if let Some(v) = self.array[base as usize].terminal_value() {
                return Ok(v);
            }
        }
        Err(TrieError::NoValue)
    }

    /// Reconstructs the key leading to slot `id` by walking parent pointers
    /// back to the root. The terminal 0-label edge, when present, is not
    /// part of the key.
    ///
    /// # Errors
    /// [`TrieError::NoPath`] when `id` does not denote an occupied slot.
    pub fn key(&self, id: i32) -> Result<Vec<u8>, TrieError> {
        if id < 0 || id >= self.size || self.array[id as usize].is_free() {
            return Err(TrieError::NoPath);
        }
        let mut key = Vec::new();
        let mut cur = id;
        while cur > 0 {
            let from = self.array[cur as usize].check();
            if from < 0 {
                return Err(TrieError::NoPath);
            }
            let label = cur ^ self.array[from as usize].base();
            debug_assert!((0..256).contains(&label), "edge label out of range");
            if label != 0 || cur != id {
                key.push(label as u8);
            }
            cur = from;
        }
        key.reverse();
        Ok(key)
    }

    /// All key prefixes of `input` below slot `from`, as a lazy iterator of
    /// slot ids in increasing prefix length (the zero-length prefix
    /// included).
    pub fn prefix_match<'a>(&'a self, input: &'a [u8], from: i32) -> PrefixMatch<'a> {
        PrefixMatch {
            trie: self,
            input,
            pos: 0,
            from,
            done: from < 0 || from >= self.size,
        }
    }

    /// All keys extending `prefix` below slot `from`, as a lazy iterator of
    /// slot ids. In ordered mode keys come out in lexicographic order.
    pub fn prefix_predict<'a>(&'a self, prefix: &'a [u8], from: i32) -> PrefixPredict<'a> {
        let cursor = match self.jump(prefix, from) {
            Ok(root) => self.leftmost_terminal(root).map(|id| (root, id)),
            Err(_) => None,
        };
        PrefixPredict { trie: self, cursor }
    }

    /// Deterministic enumeration of all live `(key, value)` pairs, in
    /// predict order from the root.
    pub fn iter(&self) -> Pairs<'_> {
        Pairs {
            trie: self,
            inner: self.prefix_predict(b"", 0),
        }
    }

    /// Descends to the first terminal of the subtree rooted at `from`:
    /// follows first-child labels to the leftmost node, then lands on its
    /// value slot. None when the subtree holds no value.
    fn leftmost_terminal(&self, mut from: i32) -> Option<i32> {
        let mut c = self.infos[from as usize].child;
        while c != 0 {
            from = self.array[from as usize].base() ^ i32::from(c);
            c = self.infos[from as usize].child;
        }

        let node = self.array[from as usize];
        if node.value() >= 0 {
            return Some(from);
        }
        let base = node.base();
        if base >= 0 && self.array[base as usize].check() == from {
            return Some(base);
        }
        None
    }

    /// The terminal following `id` in predict order within the subtree
    /// rooted at `root`: climbs to the first ancestor with an unvisited
    /// sibling, steps over, and descends leftmost again.
    fn next_terminal(&self, id: i32, root: i32) -> Option<i32> {
        let mut from = id;
        let mut c = self.infos[from as usize].sibling;
        while c == 0 && from != root && self.array[from as usize].check() >= 0 {
            from = self.array[from as usize].check();
            c = self.infos[from as usize].sibling;
        }
        if from == root {
            return None;
        }
        let parent = self.array[from as usize].check();
        if parent < 0 {
            return None;
        }
        let to = self.array[parent as usize].base() ^ i32::from(c);
        self.leftmost_terminal(to)
    }
}

/// Lazy iterator over the key prefixes of an input, yielding the slot id of
/// each prefix that is itself a stored key. See [`Trie::prefix_match`].
pub struct PrefixMatch<'a> {
    trie: &'a Trie,
    input: &'a [u8],
    pos: usize,
    from: i32,
    done: bool,
}

impl Iterator for PrefixMatch<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        while !self.done {
            let id = self.from;
            let hit = self.trie.value(id).is_ok();

            if self.pos < self.input.len() {
                match self.trie.jump(&self.input[self.pos..=self.pos], self.from) {
                    Ok(to) => {
                        self.from = to;
                        self.pos += 1;
                    }
                    Err(_) => self.done = true,
                }
            } else {
                self.done = true;
            }

            if hit {
                return Some(id);
            }
        }
        None
    }
}

/// Lazy iterator over all keys extending a prefix, yielding slot ids in
/// sibling-chain order. See [`Trie::prefix_predict`].
pub struct PrefixPredict<'a> {
    trie: &'a Trie,
    /// `(subtree_root, next_id)`; None once exhausted.
    cursor: Option<(i32, i32)>,
}

impl Iterator for PrefixPredict<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let (root, id) = self.cursor?;
        self.cursor = self.trie.next_terminal(id, root).map(|next| (root, next));
        Some(id)
    }
}

/// Lazy iterator over live `(key, value)` pairs. See [`Trie::iter`].
pub struct Pairs<'a> {
    trie: &'a Trie,
    inner: PrefixPredict<'a>,
}

impl Iterator for Pairs<'_> {
    type Item = (Vec<u8>, i32);

    fn next(&mut self) -> Option<(Vec<u8>, i32)> {
        let id = self.inner.next()?;
        let key = self.trie.key(id).ok()?;
        let value = self.trie.value(id).ok()?;
        Some((key, value))
    }
}
