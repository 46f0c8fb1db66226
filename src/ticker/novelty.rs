use std::collections::{HashMap, HashSet};

use crate::domain::Entry;

/// Entries of `new` whose identity key does not occur in `old`.
///
/// Output follows the first appearance of each key in `new`. When a key
/// repeats within `new`, the last entry carrying it wins.
pub fn diff(new: &[Entry], old: &[Entry]) -> Vec<Entry> {
    let seen: HashSet<_> = old.iter().map(Entry::identity_key).collect();

    let mut order: Vec<&Entry> = Vec::with_capacity(new.len());
    let mut positions = HashMap::with_capacity(new.len());

    for entry in new {
        let key = entry.identity_key();
        if seen.contains(&key) {
            continue;
        }
        match positions.get(&key) {
            Some(&pos) => order[pos] = entry,
            None => {
                positions.insert(key, order.len());
                order.push(entry);
            }
        }
    }

    order.into_iter().cloned().collect()
}
