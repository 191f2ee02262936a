use smallvec::SmallVec;

use crate::trie::Trie;

/// A collected child-label set. At most 257 entries (256 labels plus a
/// pending insertion), almost always far fewer.
pub(crate) type ChildSet = SmallVec<[u8; 32]>;

impl Trie {
    /// Splices `label` into `from`'s sibling chain. `base` is `from`'s child
    /// base, `has_child` tells whether the chain is non-empty. In ordered
    /// mode the chain stays ascending; otherwise new labels go to the front
    /// (behind a leading terminal label, which always keeps the head).
    pub(crate) fn push_sibling(&mut self, from: i32, base: i32, label: u8, has_child: bool) {
        let head = self.infos[from as usize].child;
        let keep_order = if self.ordered { label > head } else { head == 0 };

        if has_child && keep_order {
            let mut prev = (base ^ i32::from(head)) as usize;
            if self.ordered {
                loop {
                    let next = self.infos[prev].sibling;
                    if next == 0 || next >= label {
                        break;
                    }
                    prev = (base ^ i32::from(next)) as usize;
                }
            }
            self.infos[(base ^ i32::from(label)) as usize].sibling = self.infos[prev].sibling;
            self.infos[prev].sibling = label;
        } else {
            self.infos[(base ^ i32::from(label)) as usize].sibling = head;
            self.infos[from as usize].child = label;
        }
    }

    /// Unlinks `label` from `from`'s sibling chain. The label must be on the
    /// chain; anything else is a corrupted trie.
    pub(crate) fn pop_sibling(&mut self, from: i32, base: i32, label: u8) {
        let head = self.infos[from as usize].child;
        if head == label {
            self.infos[from as usize].child =
                self.infos[(base ^ i32::from(label)) as usize].sibling;
            return;
        }
        let mut prev = (base ^ i32::from(head)) as usize;
        loop {
            let next = self.infos[prev].sibling;
            debug_assert_ne!(next, 0, "label missing from sibling chain");
            if next == label {
                self.infos[prev].sibling =
                    self.infos[(base ^ i32::from(label)) as usize].sibling;
                return;
            }
            prev = (base ^ i32::from(next)) as usize;
        }
    }

    /// Decides which contender's sibling set moves on a conflict: walks both
    /// chains in lockstep from their heads and returns true when the
    /// incumbent's chain outlasts the new parent's — the new (smaller) chain
    /// should move.
    pub(crate) fn consult(&self, base_n: i32, base_p: i32, mut c_n: u8, mut c_p: u8) -> bool {
        loop {
            c_n = self.infos[(base_n ^ i32::from(c_n)) as usize].sibling;
            c_p = self.infos[(base_p ^ i32::from(c_p)) as usize].sibling;
            if c_n == 0 || c_p == 0 {
                return c_p != 0;
            }
        }
    }

    /// Collects the child labels of the chain headed by `c` under `base`, in
    /// chain order. With `insert` set, `label` is added at its position (the
    /// ordered position in ordered mode, otherwise right after a leading
    /// terminal label).
    pub(crate) fn collect_children(
        &self,
        base: i32,
        mut c: u8,
        label: u8,
        insert: bool,
    ) -> ChildSet {
        let mut children = ChildSet::new();
        if c == 0 {
            // Terminal-first convention: label 0 heads the chain.
            children.push(c);
            c = self.infos[(base ^ i32::from(c)) as usize].sibling;
        }
        if self.ordered {
            while c != 0 && c <= label {
                children.push(c);
                c = self.infos[(base ^ i32::from(c)) as usize].sibling;
            }
        }
        if insert {
            children.push(label);
        }
        while c != 0 {
            children.push(c);
            c = self.infos[(base ^ i32::from(c)) as usize].sibling;
        }
        children
    }

    /// The live child labels of node `from`, in chain order. Test support
    /// and enumeration helper.
    #[cfg(test)]
    pub(crate) fn children_of(&self, from: i32) -> Vec<u8> {
        let node = self.array[from as usize];
        if node.is_free() || node.value() >= 0 {
            return Vec::new();
        }
        let base = node.base();
        let head = self.infos[from as usize].child;
        if self.array[(base ^ i32::from(head)) as usize].check() != from {
            return Vec::new();
        }
        let mut labels = Vec::new();
        let mut c = head;
        loop {
            labels.push(c);
            let next = self.infos[(base ^ i32::from(c)) as usize].sibling;
            if next == 0 {
                break;
            }
            c = next;
        }
        labels
    }
}
