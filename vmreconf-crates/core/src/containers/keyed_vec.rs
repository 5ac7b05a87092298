use std::marker::PhantomData;
use std::ops::Index;
use std::ops::IndexMut;

/// A vector indexed by a typed key rather than by `usize`.
///
/// Domains, propagators, watch lists, and the node and VM tables of the scheduler are stored in a
/// [`KeyedVec`], so that a [`crate::variables::DomainId`] cannot be used to look up a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyedVec<Key, Value> {
    key: PhantomData<Key>,
    elements: Vec<Value>,
}

/// A key which maps onto an index of a [`KeyedVec`].
pub trait StorageKey: Clone {
    fn index(&self) -> usize;

    fn create_from_index(index: usize) -> Self;
}

impl<Key, Value> Default for KeyedVec<Key, Value> {
    fn default() -> Self {
        Self {
            key: PhantomData,
            elements: Vec::new(),
        }
    }
}

impl<Key: StorageKey, Value> KeyedVec<Key, Value> {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Appends the value; the returned key is the next free index.
    pub fn push(&mut self, value: Value) -> Key {
        self.elements.push(value);
        Key::create_from_index(self.elements.len() - 1)
    }

    pub fn get(&self, key: Key) -> Option<&Value> {
        self.elements.get(key.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &'_ Value> {
        self.elements.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> {
        (0..self.elements.len()).map(Key::create_from_index)
    }
}

impl<Key: StorageKey, Value: Clone> KeyedVec<Key, Value> {
    /// Grows the vector with `filler` until `key` is in range.
    pub(crate) fn accomodate(&mut self, key: Key, filler: Value) {
        if key.index() >= self.elements.len() {
            self.elements.resize(key.index() + 1, filler);
        }
    }
}

impl<Key: StorageKey, Value> Index<Key> for KeyedVec<Key, Value> {
    type Output = Value;

    fn index(&self, key: Key) -> &Value {
        &self.elements[key.index()]
    }
}

impl<Key: StorageKey, Value> IndexMut<Key> for KeyedVec<Key, Value> {
    fn index_mut(&mut self, key: Key) -> &mut Value {
        &mut self.elements[key.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::DomainId;

    #[test]
    fn keys_follow_insertion_order() {
        let mut bounds: KeyedVec<DomainId, i32> = KeyedVec::default();
        let first = bounds.push(4);
        let second = bounds.push(9);

        assert_eq!(first.id(), 0);
        assert_eq!(bounds[second], 9);
        assert_eq!(bounds.keys().collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(bounds.get(DomainId::create_from_index(2)), None);
    }

    #[test]
    fn accomodate_only_grows() {
        let mut watchers: KeyedVec<DomainId, u32> = KeyedVec::default();
        watchers.accomodate(DomainId::create_from_index(3), 7);
        watchers[DomainId::create_from_index(1)] = 2;
        watchers.accomodate(DomainId::create_from_index(1), 0);

        assert_eq!(watchers.len(), 4);
        assert_eq!(watchers.iter().copied().collect::<Vec<_>>(), vec![7, 2, 7, 7]);
    }
}
