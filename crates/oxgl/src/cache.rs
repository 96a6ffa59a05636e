//! Binding cache: records which object occupies each slot of one kind.
//!
//! The context is a global state machine and every bind call is a round trip,
//! so [`BindingCache::bind`] only issues the call when the recorded occupant
//! differs from the requested one. When an object is deleted,
//! [`BindingCache::invalidate`] resets every slot still naming it. The context
//! already dropped the binding along with the object, so no "bind 0" call is
//! made; the record is simply corrected.
//!
//! The cache is generic over the slot shape ([`SlotSet`]), one implementation
//! per [`SlotTopology`](crate::kind::SlotTopology) that has slots.

use std::fmt::Debug;
use std::hash::Hash;

use ahash::AHashMap;

use crate::error::{GlError, Result};
use crate::handle::Handle;
use crate::kind::FramebufferTarget;

/// Storage for the slots of one topology.
pub trait SlotSet {
    /// How a caller addresses one slot (or, for read/draw, a pair of slots).
    type Key: Copy + Debug;

    /// Reject keys that do not address a slot.
    fn check(&self, _key: Self::Key) -> Result<()> {
        Ok(())
    }

    /// Whether every slot addressed by `key` already records `id`.
    fn holds(&self, key: Self::Key, id: Handle) -> bool;

    /// Record `id` in every slot addressed by `key`.
    fn record(&mut self, key: Self::Key, id: Handle);

    /// Reset every slot recording `id`. Returns how many were reset.
    fn forget(&mut self, id: Handle) -> usize;

    fn bound(&self, key: Self::Key) -> Handle;
}

/// A single global bind point.
#[derive(Debug, Default)]
pub struct GlobalSlot(Handle);

impl SlotSet for GlobalSlot {
    type Key = ();

    fn holds(&self, _key: (), id: Handle) -> bool {
        self.0 == id
    }

    fn record(&mut self, _key: (), id: Handle) {
        self.0 = id;
    }

    fn forget(&mut self, id: Handle) -> usize {
        if self.0 == id {
            self.0 = Handle::NONE;
            1
        } else {
            0
        }
    }

    fn bound(&self, _key: ()) -> Handle {
        self.0
    }
}

/// Indexed units `0..capacity`, such as sampler units.
#[derive(Debug)]
pub struct UnitSlots {
    units: Vec<Handle>,
}

impl UnitSlots {
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            units: vec![Handle::NONE; capacity as usize],
        }
    }

    pub fn capacity(&self) -> u32 {
        self.units.len() as u32
    }
}

impl SlotSet for UnitSlots {
    type Key = u32;

    fn check(&self, unit: u32) -> Result<()> {
        if (unit as usize) < self.units.len() {
            Ok(())
        } else {
            Err(GlError::UnitOutOfRange {
                unit,
                capacity: self.capacity(),
            })
        }
    }

    fn holds(&self, unit: u32, id: Handle) -> bool {
        self.bound(unit) == id
    }

    fn record(&mut self, unit: u32, id: Handle) {
        if let Some(slot) = self.units.get_mut(unit as usize) {
            *slot = id;
        }
    }

    fn forget(&mut self, id: Handle) -> usize {
        let mut reset = 0;
        for slot in self.units.iter_mut().filter(|slot| **slot == id) {
            *slot = Handle::NONE;
            reset += 1;
        }
        reset
    }

    fn bound(&self, unit: u32) -> Handle {
        self.units.get(unit as usize).copied().unwrap_or_default()
    }
}

/// One slot per target enum, created on first use.
#[derive(Debug)]
pub struct TargetSlots<T> {
    targets: AHashMap<T, Handle>,
}

impl<T> Default for TargetSlots<T> {
    fn default() -> Self {
        Self {
            targets: AHashMap::new(),
        }
    }
}

impl<T: Copy + Debug + Eq + Hash> SlotSet for TargetSlots<T> {
    type Key = T;

    fn holds(&self, target: T, id: Handle) -> bool {
        self.bound(target) == id
    }

    fn record(&mut self, target: T, id: Handle) {
        self.targets.insert(target, id);
    }

    fn forget(&mut self, id: Handle) -> usize {
        let mut reset = 0;
        for slot in self.targets.values_mut().filter(|slot| **slot == id) {
            *slot = Handle::NONE;
            reset += 1;
        }
        reset
    }

    fn bound(&self, target: T) -> Handle {
        self.targets.get(&target).copied().unwrap_or_default()
    }
}

/// Framebuffer read and draw slots.
#[derive(Debug, Default)]
pub struct ReadDrawSlots {
    read: Handle,
    draw: Handle,
}

impl ReadDrawSlots {
    pub fn read(&self) -> Handle {
        self.read
    }

    pub fn draw(&self) -> Handle {
        self.draw
    }
}

impl SlotSet for ReadDrawSlots {
    type Key = FramebufferTarget;

    fn holds(&self, target: FramebufferTarget, id: Handle) -> bool {
        match target {
            // The combined call is skipped only when both already match.
            FramebufferTarget::Both => self.read == id && self.draw == id,
            FramebufferTarget::Read => self.read == id,
            FramebufferTarget::Draw => self.draw == id,
        }
    }

    fn record(&mut self, target: FramebufferTarget, id: Handle) {
        match target {
            FramebufferTarget::Both => {
                self.read = id;
                self.draw = id;
            }
            FramebufferTarget::Read => self.read = id,
            FramebufferTarget::Draw => self.draw = id,
        }
    }

    fn forget(&mut self, id: Handle) -> usize {
        let mut reset = 0;
        if self.read == id {
            self.read = Handle::NONE;
            reset += 1;
        }
        if self.draw == id {
            self.draw = Handle::NONE;
            reset += 1;
        }
        reset
    }

    /// For [`FramebufferTarget::Both`], the shared occupant, or none if the
    /// two slots differ.
    fn bound(&self, target: FramebufferTarget) -> Handle {
        match target {
            FramebufferTarget::Both if self.read == self.draw => self.read,
            FramebufferTarget::Both => Handle::NONE,
            FramebufferTarget::Read => self.read,
            FramebufferTarget::Draw => self.draw,
        }
    }
}

/// Per-kind binding state.
#[derive(Debug, Default)]
pub struct BindingCache<S> {
    slots: S,
}

impl<S: SlotSet> BindingCache<S> {
    pub fn new(slots: S) -> Self {
        Self { slots }
    }

    /// Make `id` the occupant of the slot(s) addressed by `key`.
    ///
    /// `issue` performs the context call; it runs only when the cache records
    /// a different occupant. Returns whether it ran.
    pub fn bind(&mut self, key: S::Key, id: Handle, issue: impl FnOnce()) -> Result<bool> {
        self.slots.check(key)?;
        if self.slots.holds(key, id) {
            return Ok(false);
        }
        issue();
        self.slots.record(key, id);
        Ok(true)
    }

    /// Reset every slot naming `id`, which is about to be deleted.
    pub fn invalidate(&mut self, id: Handle) -> usize {
        if id.is_none() {
            return 0;
        }
        self.slots.forget(id)
    }

    pub fn bound(&self, key: S::Key) -> Handle {
        self.slots.bound(key)
    }

    pub fn slots(&self) -> &S {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::BufferTarget;

    const A: Handle = Handle::from_raw(1);
    const B: Handle = Handle::from_raw(2);

    #[test]
    fn repeated_bind_issues_once() {
        let mut cache = BindingCache::<GlobalSlot>::default();
        let mut calls = 0;
        assert!(cache.bind((), A, || calls += 1).unwrap());
        assert!(!cache.bind((), A, || calls += 1).unwrap());
        assert_eq!(calls, 1);
        assert!(cache.bind((), B, || calls += 1).unwrap());
        assert_eq!(calls, 2);
        assert_eq!(cache.bound(()), B);
    }

    #[test]
    fn binding_sentinel_over_sentinel_is_elided() {
        let mut cache = BindingCache::<GlobalSlot>::default();
        let mut calls = 0;
        assert!(!cache.bind((), Handle::NONE, || calls += 1).unwrap());
        assert_eq!(calls, 0);
    }

    #[test]
    fn invalidate_only_touches_matching_slots() {
        let mut cache = BindingCache::<GlobalSlot>::default();
        cache.bind((), A, || {}).unwrap();
        assert_eq!(cache.invalidate(B), 0);
        assert_eq!(cache.bound(()), A);
        assert_eq!(cache.invalidate(A), 1);
        assert_eq!(cache.bound(()), Handle::NONE);
    }

    #[test]
    fn invalidating_sentinel_is_noop() {
        let mut cache = BindingCache::<GlobalSlot>::default();
        assert_eq!(cache.invalidate(Handle::NONE), 0);
    }

    #[test]
    fn unit_out_of_range_is_reported_without_issuing() {
        let mut cache = BindingCache::new(UnitSlots::with_capacity(4));
        let mut calls = 0;
        let err = cache.bind(4, A, || calls += 1).unwrap_err();
        assert!(matches!(
            err,
            GlError::UnitOutOfRange {
                unit: 4,
                capacity: 4
            }
        ));
        assert_eq!(calls, 0);
        assert_eq!(cache.bound(4), Handle::NONE);
    }

    #[test]
    fn units_are_independent() {
        let mut cache = BindingCache::new(UnitSlots::with_capacity(8));
        cache.bind(0, A, || {}).unwrap();
        cache.bind(3, A, || {}).unwrap();
        cache.bind(5, B, || {}).unwrap();
        assert_eq!(cache.invalidate(A), 2);
        assert_eq!(cache.bound(0), Handle::NONE);
        assert_eq!(cache.bound(3), Handle::NONE);
        assert_eq!(cache.bound(5), B);
    }

    #[test]
    fn targets_are_created_lazily_as_unbound() {
        let mut cache = BindingCache::<TargetSlots<BufferTarget>>::default();
        assert_eq!(cache.bound(BufferTarget::Uniform), Handle::NONE);
        cache.bind(BufferTarget::Array, A, || {}).unwrap();
        cache.bind(BufferTarget::Uniform, A, || {}).unwrap();
        assert_eq!(cache.bound(BufferTarget::Array), A);
        assert_eq!(cache.bound(BufferTarget::Uniform), A);
        assert_eq!(cache.invalidate(A), 2);
        assert_eq!(cache.bound(BufferTarget::Array), Handle::NONE);
        assert_eq!(cache.bound(BufferTarget::Uniform), Handle::NONE);
    }

    #[test]
    fn combined_framebuffer_bind_rewrites_both_slots() {
        let mut cache = BindingCache::<ReadDrawSlots>::default();
        let mut calls = 0;

        cache.bind(FramebufferTarget::Read, A, || calls += 1).unwrap();
        // Read already matches, draw does not: combined bind still issues.
        cache.bind(FramebufferTarget::Both, A, || calls += 1).unwrap();
        assert_eq!(calls, 2);
        assert_eq!(cache.slots().read(), A);
        assert_eq!(cache.slots().draw(), A);

        assert!(!cache.bind(FramebufferTarget::Both, A, || calls += 1).unwrap());
        assert_eq!(calls, 2);

        cache.bind(FramebufferTarget::Read, B, || calls += 1).unwrap();
        assert_eq!(cache.slots().read(), B);
        assert_eq!(cache.slots().draw(), A);
        assert_eq!(cache.bound(FramebufferTarget::Both), Handle::NONE);
    }

    #[test]
    fn framebuffer_invalidation_clears_each_slot() {
        let mut cache = BindingCache::<ReadDrawSlots>::default();
        cache.bind(FramebufferTarget::Both, A, || {}).unwrap();
        assert_eq!(cache.invalidate(A), 2);
        assert_eq!(cache.slots().read(), Handle::NONE);
        assert_eq!(cache.slots().draw(), Handle::NONE);
    }
}
