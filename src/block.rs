use serde::{Deserialize, Serialize};

/// Bookkeeping for one 256-slot aligned region of the node array.
///
/// Blocks are the unit of free-space management: each keeps a cyclic free
/// ring of its unoccupied slots (linked through the slots' sign-encoded
/// fields) and lives on exactly one of the Full / Closed / Open rings,
/// linked through `prev`/`next`. Block 0 holds the root and never migrates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Block {
    /// Previous block on this block's class ring.
    pub(crate) prev: i32,
    /// Next block on this block's class ring.
    pub(crate) next: i32,
    /// Number of free slots in this block, 0..=256.
    pub(crate) num: i32,
    /// Placement heuristic: a child set of at least this size has been
    /// proven not to fit here. Starts past the maximum (257) and only
    /// tightens on failed probes.
    pub(crate) reject: i32,
    /// Consecutive failed multi-slot probes; at `max_trial` the block is
    /// retired from the Open ring.
    pub(crate) trial: i32,
    /// Entry point into the block's free ring. Valid iff `num > 0`.
    pub(crate) ehead: i32,
}

impl Block {
    pub(crate) fn new() -> Self {
        Block {
            prev: 0,
            next: 0,
            num: 256,
            reject: 257,
            trial: 0,
            ehead: 0,
        }
    }
}

impl Default for Block {
    fn default() -> Self {
        Block::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_is_fully_free() {
        let b = Block::new();
        assert_eq!(b.num, 256);
        assert_eq!(b.reject, 257);
        assert_eq!(b.trial, 0);
    }
}
