//! # Slot Arena
//!
//! Generational slot storage for tree nodes. Freed slots are recycled through a
//! free list; every reuse bumps the slot generation so old [`NodeId`]s go stale
//! instead of aliasing the new occupant.

use std::ops::{Index, IndexMut};

use crate::id::NodeId;

/// One arena slot.
#[derive(Debug, Clone)]
struct Slot<T> {
    /// Generation of the current (or last) occupant.
    generation: u32,
    /// The stored value, `None` when the slot is free.
    value: Option<T>,
}

/// A growable generational arena.
///
/// Insertion and removal are **O(1)**. Storage never shrinks, so a scene that
/// reaches a steady state stops allocating.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. The UI tree is driven from a single thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = Arena::new();
/// let a = arena.insert("a");
/// arena.remove(a);
/// let b = arena.insert("b");
/// assert!(arena.get(a).is_none()); // stale, same slot as `b`
/// ```
#[derive(Debug, Clone)]
pub struct Arena<T> {
    /// Slot storage.
    slots: Vec<Slot<T>>,
    /// Free list - indices of available slots.
    free_list: Vec<u32>,
    /// Number of occupied slots.
    len: usize,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Creates an arena with room for `capacity` values before reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::with_capacity(capacity / 4),
            len: 0,
        }
    }

    /// Returns the number of live values.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the arena holds no values.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores a value and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX - 1` slots are ever created.
    pub fn insert(&mut self, value: T) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.value = Some(value);
            return NodeId::new(index, slot.generation);
        }

        let index = u32::try_from(self.slots.len())
            .ok()
            .filter(|&i| i != u32::MAX)
            .expect("arena slot count exceeds u32 range");
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        NodeId::new(index, 0)
    }

    /// Removes a value, returning it if the id was live.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slot_mut(id)?;
        let value = slot.value.take()?;
        self.free_list.push(id.index());
        self.len -= 1;
        Some(value)
    }

    /// Returns true if `id` refers to a live value.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Gets a reference to a live value.
    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Gets a mutable reference to a live value.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slot_mut(id)?.value.as_mut()
    }

    /// Iterates over all live values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|v| (NodeId::new(index as u32, slot.generation), v))
        })
    }

    /// Iterates mutably over all live values in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|v| (NodeId::new(index as u32, generation), v))
        })
    }

    /// Removes every value. Slot generations are kept so old ids stay stale.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            slot.value = None;
            self.free_list.push(index as u32);
        }
        self.len = 0;
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot<T>> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        (slot.generation == id.generation()).then_some(slot)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        self.get(id).expect("stale or unknown NodeId")
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        self.get_mut(id).expect("stale or unknown NodeId")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_insert_remove() {
        let mut arena = Arena::new();

        let a = arena.insert(42);
        assert_eq!(arena[a], 42);
        assert_eq!(arena.len(), 1);

        assert_eq!(arena.remove(a), Some(42));
        assert!(arena.is_empty());
        assert_eq!(arena.remove(a), None);
    }

    #[test]
    fn test_arena_reuse_bumps_generation() {
        let mut arena = Arena::new();

        let a = arena.insert(1);
        arena.remove(a);
        let b = arena.insert(2);

        assert_eq!(a.index(), b.index()); // Same slot reused
        assert_ne!(a.generation(), b.generation());
        assert!(arena.get(a).is_none());
        assert_eq!(arena.get(b), Some(&2));
    }

    #[test]
    fn test_arena_clear_keeps_ids_stale() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let _ = arena.insert("b");

        arena.clear();
        assert!(arena.is_empty());

        let c = arena.insert("c");
        assert!(!arena.contains(a));
        assert!(arena.contains(c));
        assert_eq!(arena.iter().count(), 1);
    }
}
