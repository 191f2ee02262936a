use serde::{Deserialize, Serialize};

/// Sentinel stored in an occupied slot that carries no terminal value.
///
/// Live terminal values are restricted to `0..VALUE_LIMIT`.
pub(crate) const VALUE_LIMIT: i32 = i32::MAX;

/// A slot of the packed double array.
///
/// Each slot is exactly 8 bytes and conflates three roles in its two signed
/// fields, discriminated by sign:
///
/// - occupied branching slot: `value` encodes the child base as `-(base + 1)`,
///   `check` is the parent index
/// - occupied terminal slot: `value` is the stored value (or [`VALUE_LIMIT`]),
///   `check` is the parent index
/// - free slot: `value` is `-prev` and `check` is `-next` of the cyclic
///   free ring inside the slot's block
///
/// All raw field access lives behind the accessors below; callers pick the
/// interpretation that matches the slot state they have already established.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Node {
    value: i32,
    check: i32,
}

impl Node {
    /// The root slot: parent 0 and an initial child base of 1, so the first
    /// transitions land inside the bootstrap block.
    #[inline]
    pub(crate) fn root() -> Self {
        Node { value: -2, check: 0 }
    }

    /// A free slot linked between `prev` and `next` on its block's ring.
    #[inline]
    pub(crate) fn free(prev: i32, next: i32) -> Self {
        Node {
            value: -prev,
            check: -next,
        }
    }

    /// True iff the slot is free (lies on its block's free ring).
    #[inline]
    pub(crate) fn is_free(&self) -> bool {
        self.check < 0
    }

    /// The raw packed value field: terminal value, [`VALUE_LIMIT`], or an
    /// encoded child base. Use [`Node::base`] or [`Node::terminal_value`]
    /// for an interpreted view.
    #[inline]
    pub(crate) fn value(&self) -> i32 {
        self.value
    }

    #[inline]
    pub(crate) fn set_value(&mut self, value: i32) {
        self.value = value;
    }

    /// The child base of a branching slot. Negative when the slot has no
    /// base yet (its value is non-negative); `-1 - VALUE_LIMIT` wraps to
    /// `i32::MIN`, which callers treat the same as any other "no base".
    #[inline]
    pub(crate) fn base(&self) -> i32 {
        -1 - self.value
    }

    #[inline]
    pub(crate) fn set_base(&mut self, base: i32) {
        self.value = -1 - base;
    }

    /// The stored terminal value, if one is live here.
    #[inline]
    pub(crate) fn terminal_value(&self) -> Option<i32> {
        if self.value >= 0 && self.value != VALUE_LIMIT {
            Some(self.value)
        } else {
            None
        }
    }

    /// The raw check field: the parent index when non-negative, a negated
    /// free-ring link when negative.
    #[inline]
    pub(crate) fn check(&self) -> i32 {
        self.check
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: i32) {
        self.check = parent;
    }

    /// Previous slot on the free ring. Only meaningful while free.
    #[inline]
    pub(crate) fn free_prev(&self) -> i32 {
        -self.value
    }

    /// Next slot on the free ring. Only meaningful while free.
    #[inline]
    pub(crate) fn free_next(&self) -> i32 {
        -self.check
    }

    #[inline]
    pub(crate) fn set_free_prev(&mut self, prev: i32) {
        self.value = -prev;
    }

    #[inline]
    pub(crate) fn set_free_next(&mut self, next: i32) {
        self.check = -next;
    }
}

/// Per-slot sibling linkage, maintained in parallel with the double array.
///
/// `child` is the label of the slot's first child (0 when childless — but
/// label 0 is also the legal terminal label, so "first child is the terminal"
/// and "no children" are disambiguated by probing `base ^ 0` in the array).
/// `sibling` is the label of the next child of the same parent, 0 at the end
/// of the chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct NodeInfo {
    pub(crate) sibling: u8,
    pub(crate) child: u8,
}
