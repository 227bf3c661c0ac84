use serde::{Deserialize, Serialize};

/// A controlling entity (a player) taking part in interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef(pub u64);

/// Non-owning reference to a world object.
///
/// Handles are generational: once the object is despawned the handle never
/// resolves again, even if its slot is reused by a later spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectHandle {
    pub index: u32,
    pub generation: u32,
}

/// An interactable is keyed by the object that owns it.
pub type InteractableRef = ObjectHandle;

struct Slot {
    generation: u32,
    alive: bool,
}

/// Allocates object handles and answers whether an owner still exists.
#[derive(Default)]
pub struct ObjectTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl ObjectTable {
    pub fn spawn(&mut self) -> ObjectHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.alive = true;
            return ObjectHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            alive: true,
        });
        ObjectHandle {
            index,
            generation: 0,
        }
    }

    /// Returns false if the handle was already stale.
    pub fn despawn(&mut self, handle: ObjectHandle) -> bool {
        if !self.contains(handle) {
            return false;
        }
        self.slots[handle.index as usize].alive = false;
        self.free.push(handle.index);
        true
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|slot| slot.alive && slot.generation == handle.generation)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.alive).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
