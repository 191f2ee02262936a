use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{Trie, TrieError};

/// A trie-backed map from byte-string keys to arbitrary payloads.
///
/// The trie itself only stores integers, so each entry is assigned an
/// integer *value key* pointing into a sidecar table that holds the real
/// payload. Value keys are recycled with a round-robin probe over the
/// trie's slot capacity, skipping keys still in use.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrieMap<V> {
    trie: Trie,
    vals: HashMap<i32, V>,
    vkey: i32,
}

impl<V> TrieMap<V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        TrieMap {
            trie: Trie::new(),
            vals: HashMap::new(),
            vkey: 1,
        }
    }

    /// Allocates the next unused value key.
    fn next_vkey(&mut self) -> i32 {
        let capacity = self.trie.capacity() as i32;
        let mut k = self.vkey;
        loop {
            k = (k + 1) % capacity;
            if !self.vals.contains_key(&k) {
                break;
            }
        }
        self.vkey = k;
        k
    }

    /// Sets `key` to `value`, replacing any existing payload.
    pub fn put(&mut self, key: &[u8], value: V) {
        if let Some(k) = self.vkey_of(key) {
            self.vals.insert(k, value);
            return;
        }
        let k = self.next_vkey();
        self.trie.update(key, k);
        self.vals.insert(k, value);
    }

    /// The payload stored for `key`, if any.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.vals.get(&self.vkey_of(key)?)
    }

    /// Removes `key` and returns its payload.
    ///
    /// # Errors
    /// [`TrieError::NoPath`] if the key is not present.
    pub fn remove(&mut self, key: &[u8]) -> Result<V, TrieError> {
        let k = self.vkey_of(key).ok_or(TrieError::NoPath)?;
        self.trie.delete(key)?;
        self.vals.remove(&k).ok_or(TrieError::NoPath)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.vals.len()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.vals.is_empty()
    }

    /// Enumerates `(key, payload)` pairs in the trie's predict order.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<u8>, &V)> {
        self.trie
            .iter()
            .filter_map(|(key, k)| self.vals.get(&k).map(|v| (key, v)))
    }

    fn vkey_of(&self, key: &[u8]) -> Option<i32> {
        self.trie.get(key)
    }
}

impl<V> Default for TrieMap<V> {
    fn default() -> Self {
        TrieMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_remove() {
        let mut map = TrieMap::new();
        map.put(b"alpha", "first".to_string());
        map.put(b"beta", "second".to_string());

        assert_eq!(map.get(b"alpha").map(String::as_str), Some("first"));
        assert_eq!(map.get(b"beta").map(String::as_str), Some("second"));
        assert_eq!(map.get(b"gamma"), None);
        assert_eq!(map.len(), 2);

        assert_eq!(map.remove(b"alpha").unwrap(), "first");
        assert_eq!(map.get(b"alpha"), None);
        assert_eq!(map.remove(b"alpha"), Err(TrieError::NoPath));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn put_replaces_payload_in_place() {
        let mut map = TrieMap::new();
        map.put(b"key", vec![1u8, 2]);
        map.put(b"key", vec![3u8]);
        assert_eq!(map.get(b"key").unwrap(), &[3u8]);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn value_keys_are_recycled() {
        // Three full churn rounds allocate more value keys than the slot
        // capacity, forcing the round-robin probe to wrap and skip live keys.
        let mut map = TrieMap::new();
        for i in 1..=100u8 {
            map.put(&[b'k', i], u32::from(i));
        }
        for round in 1..=2u32 {
            for i in 1..=100u8 {
                map.remove(&[b'k', i]).unwrap();
                map.put(&[b'k', i], u32::from(i) + round);
            }
            assert_eq!(map.len(), 100);
        }
        for i in 1..=100u8 {
            assert_eq!(map.get(&[b'k', i]), Some(&(u32::from(i) + 2)));
        }
    }

    #[test]
    fn iter_is_key_ordered() {
        let mut map = TrieMap::new();
        map.put(b"cherry", 3);
        map.put(b"apple", 1);
        map.put(b"banana", 2);

        let pairs: Vec<(Vec<u8>, i32)> = map.iter().map(|(k, &v)| (k, v)).collect();
        assert_eq!(
            pairs,
            vec![
                (b"apple".to_vec(), 1),
                (b"banana".to_vec(), 2),
                (b"cherry".to_vec(), 3),
            ]
        );
    }
}
