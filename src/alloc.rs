use crate::block::Block;
use crate::node::{Node, NodeInfo, VALUE_LIMIT};
use crate::trace::{debug_log, trace_log};
use crate::trie::Trie;

/// The three block classes. Each has its own cyclic ring of blocks, linked
/// through `Block::prev`/`Block::next`, anchored at a head index on the trie
/// (0 = empty ring).
///
/// - `Full`: no free slots; never probed.
/// - `Closed`: free slots remain but the block is only good for single-slot
///   placement (one slot left, or its probe patience ran out).
/// - `Open`: still promising for multi-slot placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockClass {
    Full,
    Closed,
    Open,
}

impl Trie {
    fn head(&self, class: BlockClass) -> i32 {
        match class {
            BlockClass::Full => self.bhead_full,
            BlockClass::Closed => self.bhead_closed,
            BlockClass::Open => self.bhead_open,
        }
    }

    fn set_head(&mut self, class: BlockClass, bi: i32) {
        match class {
            BlockClass::Full => self.bhead_full = bi,
            BlockClass::Closed => self.bhead_closed = bi,
            BlockClass::Open => self.bhead_open = bi,
        }
    }

    /// Unlinks block `bi` from `class`'s ring. `last` marks the ring's only
    /// element, which empties the ring.
    fn pop_block(&mut self, bi: i32, class: BlockClass, last: bool) {
        if last {
            self.set_head(class, 0);
            return;
        }
        let b = self.blocks[bi as usize];
        self.blocks[b.prev as usize].next = b.next;
        self.blocks[b.next as usize].prev = b.prev;
        if bi == self.head(class) {
            self.set_head(class, b.next);
        }
    }

    /// Inserts block `bi` at the head of `class`'s ring. With `empty` set the
    /// block forms a one-element ring; otherwise it is spliced between the
    /// current head and the tail.
    fn push_block(&mut self, bi: i32, class: BlockClass, empty: bool) {
        if empty {
            self.set_head(class, bi);
            let b = &mut self.blocks[bi as usize];
            b.prev = bi;
            b.next = bi;
        } else {
            let head = self.head(class);
            let tail = self.blocks[head as usize].prev;
            self.blocks[bi as usize].prev = tail;
            self.blocks[bi as usize].next = head;
            self.blocks[head as usize].prev = bi;
            self.blocks[tail as usize].next = bi;
            self.set_head(class, bi);
        }
    }

    /// Moves block `bi` between class rings. Block 0 is never transferred.
    pub(crate) fn transfer_block(&mut self, bi: i32, from: BlockClass, to: BlockClass) {
        let last = bi == self.blocks[bi as usize].next;
        self.pop_block(bi, from, last);
        let empty = self.head(to) == 0 && self.blocks[bi as usize].num != 0;
        self.push_block(bi, to, empty);
    }

    /// Appends a fresh block of 256 free slots, doubling the backing arrays
    /// when the current capacity is exhausted. Returns the new block index.
    pub(crate) fn add_block(&mut self) -> i32 {
        if self.size == self.capacity {
            self.capacity *= 2;
            self.array.resize(self.capacity as usize, Node::default());
            self.infos.resize(self.capacity as usize, NodeInfo::default());
            self.blocks
                .resize((self.capacity >> 8) as usize, Block::new());
            debug_log!(capacity = self.capacity, "node array doubled");
        }

        let bi = self.size >> 8;
        self.blocks[bi as usize] = Block::new();
        self.blocks[bi as usize].ehead = self.size;

        // Fresh cyclic free ring spanning the whole block.
        let s = self.size;
        self.array[s as usize] = Node::free(s + 255, s + 1);
        for i in (s + 1)..(s + 255) {
            self.array[i as usize] = Node::free(i - 1, i + 1);
        }
        self.array[(s + 255) as usize] = Node::free(s + 254, s);

        let empty = self.bhead_open == 0;
        self.push_block(bi, BlockClass::Open, empty);
        self.size += 256;
        bi
    }

    /// Claims the slot for the transition `(from, label)` and marks it
    /// occupied. With `base >= 0` the slot is `base ^ label`, which the
    /// caller has already established to be free; otherwise any free slot is
    /// taken and `from`'s base is derived from it.
    pub(crate) fn pop_enode(&mut self, base: i32, from: i32, label: u8) -> i32 {
        let e = if base < 0 {
            self.find_place()
        } else {
            base ^ i32::from(label)
        };
        let bi = e >> 8;

        self.blocks[bi as usize].num -= 1;
        if self.blocks[bi as usize].num == 0 {
            if bi != 0 {
                self.transfer_block(bi, BlockClass::Closed, BlockClass::Full);
            }
        } else {
            // Unlink e from its block's free ring.
            let node = self.array[e as usize];
            self.array[node.free_prev() as usize].set_free_next(node.free_next());
            self.array[node.free_next() as usize].set_free_prev(node.free_prev());
            if e == self.blocks[bi as usize].ehead {
                self.blocks[bi as usize].ehead = node.free_next();
            }
            if bi != 0
                && self.blocks[bi as usize].num == 1
                && self.blocks[bi as usize].trial != self.max_trial
            {
                self.transfer_block(bi, BlockClass::Open, BlockClass::Closed);
            }
        }

        self.array[e as usize].set_value(VALUE_LIMIT);
        self.array[e as usize].set_parent(from);
        if base < 0 {
            self.array[from as usize].set_base(e ^ i32::from(label));
        }
        e
    }

    /// Returns slot `e` to its block's free ring and clears its node info.
    pub(crate) fn push_enode(&mut self, e: i32) {
        let bi = e >> 8;
        self.blocks[bi as usize].num += 1;
        let num = self.blocks[bi as usize].num;

        if num == 1 {
            self.blocks[bi as usize].ehead = e;
            self.array[e as usize] = Node::free(e, e);
            if bi != 0 {
                self.transfer_block(bi, BlockClass::Full, BlockClass::Closed);
            }
        } else {
            let prev = self.blocks[bi as usize].ehead;
            let next = self.array[prev as usize].free_next();
            self.array[e as usize] = Node::free(prev, next);
            self.array[prev as usize].set_free_next(e);
            self.array[next as usize].set_free_prev(e);

            if bi != 0 && (num == 2 || self.blocks[bi as usize].trial == self.max_trial) {
                self.transfer_block(bi, BlockClass::Closed, BlockClass::Open);
            }
            self.blocks[bi as usize].trial = 0;
        }

        // Freeing a slot loosens the block's reject bound back toward the
        // global floor for its occupancy.
        let floor = self.reject[num as usize];
        if self.blocks[bi as usize].reject < floor {
            self.blocks[bi as usize].reject = floor;
        }
        self.infos[e as usize] = NodeInfo::default();
    }

    /// Picks any free slot for a single-child placement, growing the array
    /// if every block is full.
    pub(crate) fn find_place(&mut self) -> i32 {
        if self.bhead_closed != 0 {
            return self.blocks[self.bhead_closed as usize].ehead;
        }
        if self.bhead_open != 0 {
            return self.blocks[self.bhead_open as usize].ehead;
        }
        self.add_block() << 8
    }

    /// Finds a free slot `e` such that `e ^ children[0] ^ c` is also free
    /// for every label `c` in the set. Scans the Open ring, charging failed
    /// probes against each block's patience and reject bound, and falls back
    /// to a fresh block.
    pub(crate) fn find_places(&mut self, children: &[u8]) -> i32 {
        let mut bi = self.bhead_open;
        if bi != 0 {
            let bz = self.blocks[bi as usize].prev;
            let nc = children.len() as i32;
            loop {
                let b = self.blocks[bi as usize];
                if b.num >= nc && nc < b.reject {
                    if let Some(e) = self.scan_block(bi, children) {
                        return e;
                    }
                    trace_log!(block = bi, children = nc, "placement probe failed");
                }

                self.blocks[bi as usize].reject = nc;
                let num = self.blocks[bi as usize].num as usize;
                if nc < self.reject[num] {
                    self.reject[num] = nc;
                }

                let next = self.blocks[bi as usize].next;
                self.blocks[bi as usize].trial += 1;
                if self.blocks[bi as usize].trial == self.max_trial {
                    self.transfer_block(bi, BlockClass::Open, BlockClass::Closed);
                }
                if bi == bz {
                    break;
                }
                bi = next;
            }
            debug_log!(children = children.len(), "open ring exhausted");
        }
        self.add_block() << 8
    }

    /// Walks one block's free ring looking for an anchor that fits the whole
    /// child set. On success the ring entry point is moved to the anchor.
    fn scan_block(&mut self, bi: i32, children: &[u8]) -> Option<i32> {
        let ehead = self.blocks[bi as usize].ehead;
        let mut e = ehead;
        loop {
            let base = e ^ i32::from(children[0]);
            if children
                .iter()
                .all(|&c| self.array[(base ^ i32::from(c)) as usize].is_free())
            {
                self.blocks[bi as usize].ehead = e;
                return Some(e);
            }
            e = self.array[e as usize].free_next();
            if e == ehead {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Trie;

    #[test]
    fn growth_past_one_block() {
        let mut trie = Trie::new();
        // 300 distinct two-byte keys force at least one added block.
        let mut n = 0;
        for a in 1u8..=30 {
            for b in 1u8..=10 {
                trie.insert(&[a, b], n).unwrap();
                n += 1;
            }
        }
        assert!(trie.num_nodes() > 256);
        let mut m = 0;
        for a in 1u8..=30 {
            for b in 1u8..=10 {
                assert_eq!(trie.get(&[a, b]), Some(m));
                m += 1;
            }
        }
        trie.check_invariants();
    }

    #[test]
    fn churn_keeps_free_rings_consistent() {
        let mut trie = Trie::new();
        let keys: Vec<Vec<u8>> = (0u16..500)
            .map(|i| {
                let hi = (i >> 8) as u8 + 1;
                let lo = (i & 0xff) as u8;
                vec![hi, lo, lo ^ 0x5a]
            })
            .collect();

        for (i, key) in keys.iter().enumerate() {
            trie.insert(key, i as i32).unwrap();
        }
        trie.check_invariants();

        for key in keys.iter().step_by(2) {
            trie.delete(key).unwrap();
        }
        trie.check_invariants();

        for (i, key) in keys.iter().enumerate().skip(1).step_by(2) {
            assert_eq!(trie.get(key), Some(i as i32));
        }
        for (i, key) in keys.iter().enumerate().step_by(2) {
            assert_eq!(trie.get(key), None);
            trie.insert(key, i as i32).unwrap();
        }
        trie.check_invariants();

        for (i, key) in keys.iter().enumerate() {
            assert_eq!(trie.get(key), Some(i as i32));
        }
    }
}
