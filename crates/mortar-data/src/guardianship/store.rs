// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Generational slot storage shared by guardians and dependants.

use mortar_core::ArenaId;

/// A dense list of slots with a free list for recycled indices.
///
/// Every slot keeps the identifier it was last issued under; an identifier
/// only resolves while its generation matches the slot's. Indices are `u32`,
/// so a store holds at most `u32::MAX + 1` slots.
#[derive(Debug, Clone)]
pub(crate) struct SlotStore<I, T> {
    slots: Vec<(I, Option<T>)>,
    /// Indices of vacant slots, reused before the list grows.
    freed: Vec<u32>,
    live: usize,
}

impl<I: ArenaId, T> SlotStore<I, T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            freed: Vec::new(),
            live: 0,
        }
    }

    /// Stores `value` in a recycled or new slot and returns its identifier.
    pub fn insert(&mut self, value: T) -> I {
        let id = if let Some(index) = self.freed.pop() {
            let (id_slot, value_slot) = &mut self.slots[index as usize];
            *id_slot = I::from_parts(index, id_slot.generation().wrapping_add(1));
            *value_slot = Some(value);
            *id_slot
        } else {
            let id = I::from_parts(slot_index(self.slots.len()), 0);
            self.slots.push((id, Some(value)));
            id
        };
        self.live += 1;
        id
    }

    pub fn get(&self, id: I) -> Option<&T> {
        self.slots
            .get(id.index() as usize)
            .and_then(|(slot_id, value)| {
                if *slot_id == id {
                    value.as_ref()
                } else {
                    None
                }
            })
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots
            .get_mut(id.index() as usize)
            .and_then(|(slot_id, value)| {
                if *slot_id == id {
                    value.as_mut()
                } else {
                    None
                }
            })
    }

    /// Empties the slot behind `id` and queues its index for reuse.
    pub fn remove(&mut self, id: I) -> Option<T> {
        let (slot_id, value) = self.slots.get_mut(id.index() as usize)?;
        if *slot_id != id {
            return None;
        }
        let removed = value.take()?;
        self.freed.push(id.index());
        self.live -= 1;
        Some(removed)
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Iterates over occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.slots
            .iter()
            .filter_map(|(id, value)| value.as_ref().map(|value| (*id, value)))
    }
}

/// Converts the next slot position into an index, refusing to alias ids once
/// the `u32` index space is exhausted.
fn slot_index(position: usize) -> u32 {
    u32::try_from(position).unwrap_or_else(|_| panic!("slot store exhausted at {position} slots"))
}
