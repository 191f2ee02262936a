use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::node::{Node, NodeInfo, VALUE_LIMIT};
use crate::TrieError;

/// A dynamic double-array trie mapping byte-string keys to `i32` values.
///
/// The trie packs its transitions into parallel `base`/`check` arrays: the
/// child of node `s` under byte `c` sits at `s.base ^ c`, confirmed by the
/// child's parent pointer. Free slots are threaded into per-block cyclic
/// rings through the same two fields, and a three-class block registry
/// (full / closed / open) keeps slot placement fast as the trie mutates.
///
/// Keys live implicitly in the transition structure; a key's value is held
/// on its terminal slot — either the node reached by the last byte when it
/// has no children, or a child reached over the reserved label 0.
///
/// Values are restricted to `0..i32::MAX`. Arbitrary payloads go through
/// [`TrieMap`](crate::TrieMap) instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trie {
    pub(crate) array: Vec<Node>,
    pub(crate) infos: Vec<NodeInfo>,
    pub(crate) blocks: Vec<Block>,
    /// Global per-occupancy reject bounds, indexed by a block's free count.
    pub(crate) reject: Vec<i32>,
    pub(crate) bhead_full: i32,
    pub(crate) bhead_closed: i32,
    pub(crate) bhead_open: i32,
    pub(crate) capacity: i32,
    pub(crate) size: i32,
    pub(crate) ordered: bool,
    pub(crate) max_trial: i32,
}

/// Configures a [`Trie`] before construction.
#[derive(Clone, Copy, Debug)]
pub struct TrieBuilder {
    ordered: bool,
    max_trial: i32,
}

impl TrieBuilder {
    /// Keeps each parent's children sorted by label (the default), making
    /// enumeration order lexicographic. When disabled, sibling order follows
    /// insertion and enumeration order is unspecified.
    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    /// How many failed multi-slot probes a block tolerates before it is
    /// retired from placement scans. Default 1.
    ///
    /// # Panics
    /// Panics if `max_trial` is not positive.
    pub fn max_trial(mut self, max_trial: i32) -> Self {
        assert!(max_trial > 0, "max_trial must be positive");
        self.max_trial = max_trial;
        self
    }

    /// Builds the configured trie.
    pub fn build(self) -> Trie {
        Trie::with_options(self.ordered, self.max_trial)
    }
}

impl Default for TrieBuilder {
    fn default() -> Self {
        TrieBuilder {
            ordered: true,
            max_trial: 1,
        }
    }
}

impl Trie {
    /// Creates an empty trie with default configuration (ordered siblings,
    /// `max_trial` 1).
    pub fn new() -> Self {
        Trie::with_options(true, 1)
    }

    /// Returns a builder for non-default configuration.
    pub fn builder() -> TrieBuilder {
        TrieBuilder::default()
    }

    fn with_options(ordered: bool, max_trial: i32) -> Self {
        let mut array = Vec::with_capacity(256);
        array.push(Node::root());
        // Slots 1..=255 form the bootstrap block's cyclic free ring.
        for i in 1..256 {
            let prev = if i == 1 { 255 } else { i - 1 };
            let next = if i == 255 { 1 } else { i + 1 };
            array.push(Node::free(prev, next));
        }

        let mut blocks = vec![Block::new()];
        blocks[0].ehead = 1;

        Trie {
            array,
            infos: vec![NodeInfo::default(); 256],
            blocks,
            reject: (0..=256).map(|i| i + 1).collect(),
            bhead_full: 0,
            bhead_closed: 0,
            bhead_open: 0,
            capacity: 256,
            size: 256,
            ordered,
            max_trial,
        }
    }

    /// Number of slots in the active region of the node array (a multiple
    /// of 256; includes free slots).
    pub fn num_nodes(&self) -> usize {
        self.size as usize
    }

    /// Number of allocated slots, grown geometrically ahead of `num_nodes`.
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Resolves or creates the child slot of `from` under `label`.
    ///
    /// Afterwards the returned slot is occupied with its parent pointer set
    /// to `from`, and `label` is linked into `from`'s sibling chain.
    pub(crate) fn follow(&mut self, from: i32, label: u8) -> i32 {
        let base = self.array[from as usize].base();
        let to = base ^ i32::from(label);

        if base < 0 || self.array[to as usize].check() < 0 {
            // No base yet, or the candidate slot is free: claim it. The
            // parent has a live chain only if its head checks back.
            let has_child = base >= 0 && {
                let head = i32::from(self.infos[from as usize].child);
                self.array[(base ^ head) as usize].check() == from
            };
            let to = self.pop_enode(base, from, label);
            self.push_sibling(from, to ^ i32::from(label), label, has_child);
            to
        } else if self.array[to as usize].check() != from {
            // Occupied by a child of another parent.
            self.resolve(from, base, label)
        } else {
            to
        }
    }

    /// Materializes the path for `key` below `from` and returns the slot
    /// that holds (or will hold) the key's terminal value.
    fn reach(&mut self, key: &[u8], mut from: i32) -> i32 {
        for &b in key {
            // A live value on an interior node is demoted onto its 0-label
            // child before the node grows a branch.
            if let Some(value) = self.array[from as usize].terminal_value() {
                let to = self.follow(from, 0);
                self.array[to as usize].set_value(value);
            }
            from = self.follow(from, b);
        }

        if self.array[from as usize].value() < 0 {
            self.follow(from, 0)
        } else {
            from
        }
    }

    /// Inserts `key` with `value`.
    ///
    /// # Errors
    /// [`TrieError::KeyExists`] if the key already holds a live value; the
    /// stored value is left untouched.
    pub fn insert(&mut self, key: &[u8], value: i32) -> Result<(), TrieError> {
        debug_assert!(
            (0..VALUE_LIMIT).contains(&value),
            "terminal values are restricted to 0..i32::MAX"
        );
        let to = self.reach(key, 0);
        if self.array[to as usize].value() != VALUE_LIMIT {
            return Err(TrieError::KeyExists);
        }
        self.array[to as usize].set_value(value);
        Ok(())
    }

    /// Sets `key` to `value`, creating the key if absent.
    pub fn update(&mut self, key: &[u8], value: i32) {
        debug_assert!(
            (0..VALUE_LIMIT).contains(&value),
            "terminal values are restricted to 0..i32::MAX"
        );
        let to = self.reach(key, 0);
        self.array[to as usize].set_value(value);
    }

    /// Removes `key`, contracting the freed branch bottom-up.
    ///
    /// # Errors
    /// [`TrieError::NoPath`] if the key is not present with a live value.
    pub fn delete(&mut self, key: &[u8]) -> Result<(), TrieError> {
        let mut to = self.jump(key, 0)?;

        if self.array[to as usize].value() < 0 {
            // Branching node: the value, if any, lives on the terminal child.
            let base = self.array[to as usize].base();
            if self.array[base as usize].check() != to {
                return Err(TrieError::NoPath);
            }
            to = base;
        }

        while to > 0 {
            let from = self.array[to as usize].check();
            let base = self.array[from as usize].base();
            let label = (to ^ base) as u8;

            if self.infos[to as usize].sibling != 0 || self.infos[from as usize].child != label {
                // Not the only child: unlink it and stop contracting.
                self.pop_sibling(from, base, label);
                self.push_enode(to);
                break;
            }
            self.push_enode(to);
            to = from;
        }
        Ok(())
    }

    /// Exact lookup: the value stored for `key`, if any.
    pub fn get(&self, key: &[u8]) -> Option<i32> {
        let id = self.jump(key, 0).ok()?;
        self.value(id).ok()
    }
}

impl Default for Trie {
    fn default() -> Self {
        Trie::new()
    }
}

#[cfg(test)]
impl Trie {
    /// Walks the packed state and asserts every structural invariant:
    /// free-ring consistency, block accounting, class-ring membership, and
    /// sibling-chain order.
    pub(crate) fn check_invariants(&self) {
        let size = self.size as usize;
        let nblocks = size >> 8;

        // Free slots lie on exactly one ring; ring length matches the
        // block's free count and links are mutually consistent.
        let mut on_ring = vec![false; size];
        for bi in 0..nblocks {
            let b = &self.blocks[bi];
            assert!((0..=256).contains(&b.num), "block {} num out of range", bi);
            if b.num == 0 {
                continue;
            }
            let mut e = b.ehead;
            for _ in 0..b.num {
                assert_eq!((e >> 8) as usize, bi, "free ring escaped its block");
                let node = &self.array[e as usize];
                assert!(node.is_free(), "slot {} on ring but not free", e);
                assert!(!on_ring[e as usize], "slot {} on a ring twice", e);
                on_ring[e as usize] = true;
                let next = node.free_next();
                assert_eq!(
                    self.array[next as usize].free_prev(),
                    e,
                    "free ring back-link broken at {}",
                    e
                );
                e = next;
            }
            assert_eq!(e, b.ehead, "free ring length does not match num");
        }

        for idx in 0..size {
            let node = &self.array[idx];
            if node.is_free() {
                assert!(on_ring[idx], "free slot {} not on its block ring", idx);
            } else if idx > 0 {
                let parent = node.check();
                assert!(
                    parent >= 0 && (parent as usize) < size,
                    "slot {} has bad parent {}",
                    idx,
                    parent
                );
                assert!(!self.array[parent as usize].is_free());
                let label = idx as i32 ^ self.array[parent as usize].base();
                assert!(
                    (0..256).contains(&label),
                    "slot {} unreachable from parent {}",
                    idx,
                    parent
                );
            }
        }

        // Sibling chains list occupied children, ascending when ordered.
        for idx in 0..size {
            let node = &self.array[idx];
            if node.is_free() || node.value() >= 0 {
                continue;
            }
            let base = node.base();
            let head = self.infos[idx].child;
            if self.array[(base ^ i32::from(head)) as usize].check() != idx as i32 {
                continue; // stale head after deletions; no live children
            }
            let mut c = head;
            let mut steps = 0;
            loop {
                let slot = (base ^ i32::from(c)) as usize;
                assert_eq!(
                    self.array[slot].check(),
                    idx as i32,
                    "chain of {} lists foreign slot {}",
                    idx,
                    slot
                );
                let next = self.infos[slot].sibling;
                if next == 0 {
                    break;
                }
                if self.ordered {
                    assert!(next > c, "chain of {} not ascending", idx);
                }
                steps += 1;
                assert!(steps <= 256, "sibling chain cycle at {}", idx);
                c = next;
            }
        }

        // Every block except 0 sits in exactly one class; blocks outside the
        // closed/open rings must be full.
        let mut class = vec![0u8; nblocks];
        for (head, mark) in [(self.bhead_closed, 1u8), (self.bhead_open, 2u8)] {
            if head == 0 {
                continue;
            }
            let mut bi = head;
            let mut steps = 0usize;
            loop {
                assert!(bi > 0 && (bi as usize) < nblocks, "ring lists bad block");
                assert_eq!(class[bi as usize], 0, "block {} in two rings", bi);
                class[bi as usize] = mark;
                steps += 1;
                assert!(steps <= nblocks, "class ring cycle misses its head");
                bi = self.blocks[bi as usize].next;
                if bi == head {
                    break;
                }
            }
        }
        for (bi, &mark) in class.iter().enumerate().skip(1) {
            if mark == 0 {
                assert_eq!(
                    self.blocks[bi].num, 0,
                    "block {} has free slots but is in no ring",
                    bi
                );
            } else {
                assert!(self.blocks[bi].num > 0, "empty block {} in a ring", bi);
            }
        }
    }
}
