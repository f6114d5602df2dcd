//! Generational handles for resources shared across the JNI boundary
//!
//! A [`Handle`] packs a slot index and the slot's generation into a
//! non-zero `u64`. Removing an entry bumps the generation, so a stale
//! handle is rejected instead of reaching whatever reused the slot.

use std::num::NonZeroU64;

/// Opaque token for an entry in a [`HandleTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(NonZeroU64);

impl Handle {
    fn new(index: u32, generation: u32) -> Self {
        let raw = (u64::from(generation) << 32) | (u64::from(index) + 1);
        // index + 1 keeps the low half non-zero
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// Rebuild a handle from its raw value; zero is never a handle
    pub fn from_raw(raw: u64) -> Option<Self> {
        let raw = NonZeroU64::new(raw)?;
        if raw.get() as u32 == 0 {
            return None;
        }
        Some(Self(raw))
    }

    /// Raw value to hand across the boundary
    pub fn to_raw(self) -> u64 {
        self.0.get()
    }

    fn index(self) -> usize {
        (self.0.get() as u32 - 1) as usize
    }

    fn generation(self) -> u32 {
        (self.0.get() >> 32) as u32
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena addressed by [`Handle`]
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleTable<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Store `value`, reusing a freed slot when one exists
    pub fn insert(&mut self, value: T) -> Handle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Handle::new(index, 0)
    }

    /// Look up a live entry; stale handles return `None`
    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Take the value out; the handle and any copies of it go stale
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index() as u32);
        self.len -= 1;
        Some(value)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
