//! Append-only storage keyed by typed IDs.
//!
//! Atoms, nets, molecules and tile types all live in an [`Arena`]. An entity's
//! ID is its position in the backing vector, so IDs handed out during netlist
//! construction stay valid for as long as the arena does.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A key that converts to and from a dense `u32` position.
///
/// Every ID produced by [`define_id!`](crate::define_id) implements this.
pub trait ArenaId: Copy {
    /// Builds the key for position `index`.
    fn from_raw(index: u32) -> Self;

    /// Returns the position this key names.
    fn as_raw(self) -> u32;
}

/// Dense table of `T` addressed by `I`.
///
/// Entries are never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arena<I: ArenaId, T> {
    slots: Vec<T>,
    #[serde(skip)]
    key: PhantomData<fn() -> I>,
}

fn key_at<I: ArenaId>(pos: usize) -> I {
    I::from_raw(pos as u32)
}

impl<I: ArenaId, T> Arena<I, T> {
    /// An arena with no entries.
    pub fn new() -> Self {
        Arena {
            slots: Vec::new(),
            key: PhantomData,
        }
    }

    /// The key the next [`alloc`](Self::alloc) will return.
    pub fn next_id(&self) -> I {
        key_at(self.slots.len())
    }

    /// Appends `item` and returns its key.
    pub fn alloc(&mut self, item: T) -> I {
        self.alloc_with(|_| item)
    }

    /// Appends the value `build` makes from the key it is about to receive.
    pub fn alloc_with(&mut self, build: impl FnOnce(I) -> T) -> I {
        let id = self.next_id();
        self.slots.push(build(id));
        id
    }

    /// Entry for `id`. Panics on a key from another arena.
    pub fn get(&self, id: I) -> &T {
        &self.slots[id.as_raw() as usize]
    }

    /// Entry for `id`, or `None` past the end.
    pub fn try_get(&self, id: I) -> Option<&T> {
        self.slots.get(id.as_raw() as usize)
    }

    /// Mutable entry for `id`. Panics on a key from another arena.
    pub fn get_mut(&mut self, id: I) -> &mut T {
        &mut self.slots[id.as_raw() as usize]
    }

    /// Whether `id` falls inside the allocated range.
    pub fn contains(&self, id: I) -> bool {
        self.try_get(id).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `(key, entry)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots.iter().enumerate().map(|(pos, v)| (key_at(pos), v))
    }

    /// `(key, entry)` pairs in key order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .map(|(pos, v)| (key_at(pos), v))
    }

    /// Every key in order.
    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        (0..self.slots.len()).map(key_at)
    }

    /// Every entry in key order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Arena::new()
    }
}

impl<I: ArenaId, T> FromIterator<T> for Arena<I, T> {
    fn from_iter<It: IntoIterator<Item = T>>(items: It) -> Self {
        Arena {
            slots: items.into_iter().collect(),
            key: PhantomData,
        }
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id)
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        self.get_mut(id)
    }
}
