use std::fmt;
use std::sync::Arc;

/// Bound for identity values produced by an [`IdKey`].
#[doc(hidden)]
pub trait IdentityKey: core::hash::Hash + Eq {}
impl<K: core::hash::Hash + Eq> IdentityKey for K {}

/// The accessor behind an [`IdKey`].
pub type IdKeyFn<T, K> = Arc<dyn Fn(&T) -> Option<K> + Send + Sync>;

/// Tells whether a record carries the identity field at all.
pub type IdPresenceFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Reads the identity of a record for deduplication.
///
/// Two questions are asked of a record:
/// - does it carry the identity field ([`IdKey::is_present`])? If the *first* record of a batch
///   does not, the whole batch passes through untouched.
/// - is the value usable ([`IdKey::get`])? `None` (an empty id) gets the record dropped when
///   deduplicating.
///
/// Keys over typed records built with [`IdKey::new`] or [`IdKey::string`] always count the field
/// as present.
pub struct IdKey<T, K = String> {
    get: IdKeyFn<T, K>,
    present: Option<IdPresenceFn<T>>,
}

impl<T, K> IdKey<T, K> {
    pub fn new(get: impl Fn(&T) -> Option<K> + Send + Sync + 'static) -> Self {
        Self {
            get: Arc::new(get),
            present: None,
        }
    }

    /// A key for records whose identity field may be missing altogether (dynamic records).
    pub fn with_presence(
        present: impl Fn(&T) -> bool + Send + Sync + 'static,
        get: impl Fn(&T) -> Option<K> + Send + Sync + 'static,
    ) -> Self {
        Self {
            get: Arc::new(get),
            present: Some(Arc::new(present)),
        }
    }

    pub fn get(&self, item: &T) -> Option<K> {
        (self.get)(item)
    }

    pub fn is_present(&self, item: &T) -> bool {
        self.present.as_ref().is_none_or(|present| present(item))
    }
}

impl<T> IdKey<T, String> {
    /// Identity taken from a string field; an empty string counts as "no identity".
    pub fn string(get: impl Fn(&T) -> &str + Send + Sync + 'static) -> Self {
        Self::new(move |item| {
            let id = get(item);
            (!id.is_empty()).then(|| id.to_owned())
        })
    }
}

impl<T, K> Clone for IdKey<T, K> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            present: self.present.clone(),
        }
    }
}

impl<T, K> fmt::Debug for IdKey<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdKey(..)")
    }
}
