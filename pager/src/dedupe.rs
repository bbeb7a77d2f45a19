use std::collections::HashSet;

use crate::key::{IdKey, IdentityKey};

/// Removes later duplicates from `items`, keeping first-seen order.
///
/// - Without an identity key, or when the first item lacks the identity field
///   ([`IdKey::is_present`]), `items` is returned unchanged.
/// - Otherwise the rules of [`dedupe_by`] apply.
pub fn dedupe<T, K: IdentityKey>(items: Vec<T>, id_key: Option<&IdKey<T, K>>) -> Vec<T> {
    let Some(id_key) = id_key else {
        return items;
    };
    if items.first().is_some_and(|first| !id_key.is_present(first)) {
        return items;
    }
    dedupe_by(items, |item| id_key.get(item))
}

/// Removes later duplicates from `items` using `key` as the identity.
///
/// Items for which `key` returns `None` (an empty id) are dropped, and so is every item whose
/// identity was already seen.
pub fn dedupe_by<T, K: IdentityKey>(items: Vec<T>, mut key: impl FnMut(&T) -> Option<K>) -> Vec<T> {
    if items.is_empty() {
        return items;
    }

    let before = items.len();
    let mut seen = HashSet::with_capacity(before);
    let out: Vec<T> = items
        .into_iter()
        .filter(|item| key(item).is_some_and(|k| seen.insert(k)))
        .collect();
    ptrace!(before, after = out.len(), "dedupe_by");
    out
}
