//! Generational slots linked in insertion order.
use std::iter;

/// Key of an entry in a `SlotList`.
///
/// A key stops resolving once its entry is removed, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    index: usize,
    generation: u32,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Owned set with O(1) insertion and removal, iterated in insertion order.
#[derive(Debug)]
pub struct SlotList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}
impl<T> SlotList<T> {
    pub fn new() -> Self {
        SlotList {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, value: T) -> SlotKey {
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                    prev: None,
                    next: None,
                });
                self.slots.len() - 1
            }
        };
        let generation = {
            let slot = &mut self.slots[index];
            slot.value = Some(value);
            slot.prev = self.tail;
            slot.next = None;
            slot.generation
        };
        match self.tail {
            Some(t) => self.slots[t].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
        SlotKey { index, generation }
    }

    pub fn get(&self, key: SlotKey) -> Option<&T> {
        self.slots
            .get(key.index)
            .filter(|s| s.generation == key.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        if self.get(key).is_none() {
            return None;
        }
        let (prev, next, value) = {
            let slot = &mut self.slots[key.index];
            slot.generation = slot.generation.wrapping_add(1);
            (slot.prev.take(), slot.next.take(), slot.value.take())
        };
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.free.push(key.index);
        self.len -= 1;
        value
    }

    /// Removes and returns the oldest entry.
    pub fn pop_front(&mut self) -> Option<T> {
        let index = self.head?;
        let key = SlotKey {
            index,
            generation: self.slots[index].generation,
        };
        self.remove(key)
    }

    pub fn iter(&self) -> Iter<T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }
}
impl<T> Default for SlotList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An iterator over the entries of a `SlotList`, oldest first.
#[derive(Debug)]
pub struct Iter<'a, T: 'a> {
    list: &'a SlotList<T>,
    cursor: Option<usize>,
}
impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    fn next(&mut self) -> Option<Self::Item> {
        let slot = &self.list.slots[self.cursor?];
        self.cursor = slot.next;
        slot.value.as_ref()
    }
}
impl<'a, T> iter::FusedIterator for Iter<'a, T> {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_works() {
        let mut list = SlotList::new();
        let a = list.insert("a");
        let b = list.insert("b");
        let c = list.insert("c");
        assert_eq!(list.len(), 3);
        assert_eq!(list.iter().cloned().collect::<Vec<_>>(), ["a", "b", "c"]);

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(list.remove(b), None);
        assert_eq!(list.iter().cloned().collect::<Vec<_>>(), ["a", "c"]);

        // The freed slot is reused, but the old key stays dead.
        let d = list.insert("d");
        assert_eq!(list.get(b), None);
        assert_eq!(list.get(d), Some(&"d"));
        assert_eq!(list.iter().cloned().collect::<Vec<_>>(), ["a", "c", "d"]);

        assert_eq!(list.remove(a), Some("a"));
        assert_eq!(list.remove(d), Some("d"));
        assert_eq!(list.iter().cloned().collect::<Vec<_>>(), ["c"]);
        assert_eq!(list.get(c), Some(&"c"));
    }

    #[test]
    fn pop_front_drains_in_insertion_order() {
        let mut list = SlotList::new();
        for i in 0..5 {
            list.insert(i);
        }
        let mut drained = Vec::new();
        while let Some(v) = list.pop_front() {
            drained.push(v);
        }
        assert_eq!(drained, [0, 1, 2, 3, 4]);
        assert!(list.is_empty());
        assert_eq!(list.iter().count(), 0);

        let k = list.insert(10);
        assert_eq!(list.iter().cloned().collect::<Vec<_>>(), [10]);
        assert_eq!(list.remove(k), Some(10));
    }
}
