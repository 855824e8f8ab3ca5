//! SessionStore port - セッション単位の key-value ストア（sessionStorage 相当）

/// Transient string store scoped to one session.
///
/// Synchronous on purpose: lookups happen on the fast path before any request is made.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);

    fn remove(&self, key: &str);

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
