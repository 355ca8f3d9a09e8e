//! Bucket: the chain of entries sharing one bucket index.

use core::borrow::Borrow;

#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    // Full hash of `key`, computed once on insert and reused on rehash.
    pub(crate) hash: u64,
}

/// Ordered, duplicate-key-free sequence of entries.
#[derive(Debug, Clone)]
pub(crate) struct Bucket<K, V> {
    entries: Vec<Entry<K, V>>,
}

impl<K, V> Default for Bucket<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K, V> Bucket<K, V> {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn position<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.entries.iter().position(|e| e.key.borrow() == q)
    }

    pub(crate) fn find<Q>(&self, q: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.entries.iter().find(|e| e.key.borrow() == q)
    }

    pub(crate) fn find_mut<Q>(&mut self, q: &Q) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.entries.iter_mut().find(|e| e.key.borrow() == q)
    }

    /// Appends without checking for an equal key; callers probe first.
    pub(crate) fn push(&mut self, entry: Entry<K, V>) {
        self.entries.push(entry);
    }

    /// Removes the entry for `q`, keeping the remaining entries in order.
    pub(crate) fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let idx = self.position(q)?;
        let e = self.entries.remove(idx);
        Some((e.key, e.value))
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn iter(&self) -> core::slice::Iter<'_, Entry<K, V>> {
        self.entries.iter()
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, Entry<K, V>> {
        self.entries.drain(..)
    }
}
