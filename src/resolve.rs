use crate::node::VALUE_LIMIT;
use crate::trace::debug_log;
use crate::trie::Trie;

impl Trie {
    /// Resolves a placement conflict: `base_n ^ label_n` is already occupied
    /// by a child of a different parent. The smaller of the two sibling sets
    /// is moved to a fresh base; returns the slot that ends up hosting the
    /// `(from_n, label_n)` transition.
    pub(crate) fn resolve(&mut self, from_n: i32, base_n: i32, label_n: u8) -> i32 {
        let to_p = base_n ^ i32::from(label_n);
        let from_p = self.array[to_p as usize].check();
        let base_p = self.array[from_p as usize].base();

        let move_new = self.consult(
            base_n,
            base_p,
            self.infos[from_n as usize].child,
            self.infos[from_p as usize].child,
        );

        // The mover's full child set; for the new parent it includes the
        // pending label at its ordered position.
        let children = if move_new {
            self.collect_children(base_n, self.infos[from_n as usize].child, label_n, true)
        } else {
            self.collect_children(base_p, self.infos[from_p as usize].child, 255, false)
        };
        debug_log!(
            mover_children = children.len(),
            move_new,
            "relocating sibling set"
        );

        let anchor = if children.len() == 1 {
            self.find_place()
        } else {
            self.find_places(&children)
        };
        let base = anchor ^ i32::from(children[0]);

        let (from, base_old) = if move_new {
            (from_n, base_n)
        } else {
            (from_p, base_p)
        };

        if move_new && children[0] == label_n {
            self.infos[from as usize].child = label_n;
        }
        self.array[from as usize].set_base(base);

        self.relocate(base, from, base_old, from_n, to_p, label_n, &children, move_new);

        if move_new {
            base ^ i32::from(label_n)
        } else {
            to_p
        }
    }

    /// Moves the chosen sibling set under its new `base`: each child is
    /// re-allocated in order, its packed value copied over, grandchildren
    /// re-parented in place, and the vacated slot reclaimed.
    #[allow(clippy::too_many_arguments)]
    fn relocate(
        &mut self,
        base: i32,
        from: i32,
        base_old: i32,
        mut from_n: i32,
        to_p: i32,
        label_n: u8,
        children: &[u8],
        move_new: bool,
    ) {
        for (i, &c) in children.iter().enumerate() {
            let to = self.pop_enode(base, from, c);
            let new_to = base_old ^ i32::from(c);

            self.infos[to as usize].sibling = if i == children.len() - 1 {
                0
            } else {
                children[i + 1]
            };

            if move_new && new_to == to_p {
                // The pending label has no source slot to move from.
                continue;
            }

            let value = self.array[new_to as usize].value();
            self.array[to as usize].set_value(value);

            if value < 0 && c != 0 {
                // Branching source: the grandchildren stay put, only their
                // parent pointers chase the move.
                let child_base = self.array[to as usize].base();
                let mut gc = self.infos[new_to as usize].child;
                self.infos[to as usize].child = gc;
                self.array[(child_base ^ i32::from(gc)) as usize].set_parent(to);
                gc = self.infos[(child_base ^ i32::from(gc)) as usize].sibling;
                while gc != 0 {
                    self.array[(child_base ^ i32::from(gc)) as usize].set_parent(to);
                    gc = self.infos[(child_base ^ i32::from(gc)) as usize].sibling;
                }
            }

            if !move_new && new_to == from_n {
                // The new parent itself just moved; follow it.
                from_n = to;
            }

            if !move_new && new_to == to_p {
                // The contested slot came free mid-move: hand it straight to
                // the new parent instead of returning it to the free ring.
                self.push_sibling(from_n, to_p ^ i32::from(label_n), label_n, true);
                self.infos[new_to as usize].child = 0;
                self.array[new_to as usize].set_value(VALUE_LIMIT);
                self.array[new_to as usize].set_parent(from_n);
            } else {
                self.push_enode(new_to);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Trie;

    #[test]
    fn single_letter_keys_then_long_key() {
        // 26 single-letter keys densely populate the root's child range,
        // then a long key forces repeated conflicts along its path.
        let mut trie = Trie::new();
        for (i, c) in (b'a'..=b'z').enumerate() {
            trie.insert(&[c], i as i32).unwrap();
        }
        trie.insert(b"abcdefghijklmn", 100).unwrap();
        trie.check_invariants();

        for (i, c) in (b'a'..=b'z').enumerate() {
            let id = trie.jump(&[c], 0).unwrap();
            assert_eq!(trie.value(id).unwrap(), i as i32);
        }
        let id = trie.jump(b"abcdefghijklmn", 0).unwrap();
        assert_eq!(trie.value(id).unwrap(), 100);
    }

    #[test]
    fn shared_prefix_fanout() {
        // Wide fanout under one parent forces sibling-set relocation when
        // the parent's base range fills up with other parents' children.
        let mut trie = Trie::new();
        let mut value = 0;
        for a in b'a'..=b'f' {
            for b in b'a'..=b'z' {
                trie.insert(&[a, b], value).unwrap();
                value += 1;
            }
        }
        trie.check_invariants();

        let mut expect = 0;
        for a in b'a'..=b'f' {
            for b in b'a'..=b'z' {
                assert_eq!(trie.get(&[a, b]), Some(expect));
                expect += 1;
            }
        }
    }

    #[test]
    fn interleaved_prefix_growth() {
        // Keys that extend each other interleaved with dense siblings, so
        // relocation repeatedly moves sets whose parents are themselves
        // mid-walk.
        let mut trie = Trie::new();
        let words = [
            &b"a"[..], b"ab", b"abc", b"abcd", b"b", b"ba", b"bab", b"c", b"ca", b"cab", b"abd",
            b"abe", b"abf", b"bb", b"bc", b"bd",
        ];
        for (i, w) in words.iter().enumerate() {
            trie.insert(w, i as i32).unwrap();
            trie.check_invariants();
        }
        for (i, w) in words.iter().enumerate() {
            assert_eq!(trie.get(w), Some(i as i32), "key {:?}", w);
        }
    }
}
