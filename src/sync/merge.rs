use std::collections::HashMap;
use std::hash::Hash;

/// Merge a freshly fetched batch into an existing keyed mapping.
///
/// Each incoming record overwrites at its key; when the same key appears
/// twice in one batch, the later record wins. Keys not touched by the batch
/// are preserved unchanged, and merging the same batch twice yields the same
/// mapping as merging it once. Neither input is mutated.
pub fn merge_by_key<K, V>(
    existing: &HashMap<K, V>,
    incoming: Vec<V>,
    key_of: impl Fn(&V) -> K,
) -> HashMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    let mut merged = existing.clone();
    for record in incoming {
        merged.insert(key_of(&record), record);
    }
    merged
}

/// Build a keyed mapping from scratch (the full-reload path).
pub fn index_by_key<K, V>(records: Vec<V>, key_of: impl Fn(&V) -> K) -> HashMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    merge_by_key(&HashMap::new(), records, key_of)
}

/// Remove a single record by key, preserving everything else.
pub fn remove_key<K, V>(existing: &HashMap<K, V>, key: &K) -> HashMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    let mut remaining = existing.clone();
    remaining.remove(key);
    remaining
}
