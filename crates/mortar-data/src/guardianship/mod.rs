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

//! Guardian/dependant relationships without back-references.
//!
//! A guardian owns an ordered list of dependants and every dependant records
//! at most one guardian. Both sides only ever hold identifiers into the
//! [`Guardianship`] arena, so there is no reference cycle, and every change of
//! guardian goes through a validated operation.

mod store;

use mortar_core::{DependantId, GuardianId};
use store::SlotStore;
use thiserror::Error;

/// An error returned by [`Guardianship`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuardianshipError {
    /// The guardian was never created, was removed, or its slot was recycled.
    #[error("guardian {0:?} does not exist")]
    UnknownGuardian(GuardianId),
    /// The dependant was never created, was removed, or its slot was recycled.
    #[error("dependant {0:?} does not exist")]
    UnknownDependant(DependantId),
    /// The dependant already has a guardian and must be released or reparented first.
    #[error("dependant {dependant:?} is already guarded by {guardian:?}")]
    AlreadyGuarded {
        /// The dependant that was being adopted.
        dependant: DependantId,
        /// Its current guardian.
        guardian: GuardianId,
    },
    /// The dependant is not guarded by the guardian named in the request.
    #[error("dependant {dependant:?} is not guarded by {guardian:?}")]
    NotGuardedBy {
        /// The dependant that was being released.
        dependant: DependantId,
        /// The guardian named in the request.
        guardian: GuardianId,
    },
}

#[derive(Debug, Clone)]
struct GuardianEntry<G> {
    payload: G,
    dependants: Vec<DependantId>,
}

#[derive(Debug, Clone)]
struct DependantEntry<D> {
    payload: D,
    guardian: Option<GuardianId>,
}

/// Arena holding guardians of type `G` and dependants of type `D`.
///
/// Invariant: `d` is listed in `dependants_of(g)` if and only if
/// `guardian_of(d) == Some(g)`.
#[derive(Debug, Clone)]
pub struct Guardianship<G, D> {
    guardians: SlotStore<GuardianId, GuardianEntry<G>>,
    dependants: SlotStore<DependantId, DependantEntry<D>>,
}

impl<G, D> Default for Guardianship<G, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G, D> Guardianship<G, D> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            guardians: SlotStore::new(),
            dependants: SlotStore::new(),
        }
    }

    /// Adds a guardian with no dependants.
    pub fn add_guardian(&mut self, payload: G) -> GuardianId {
        let id = self.guardians.insert(GuardianEntry {
            payload,
            dependants: Vec::new(),
        });
        log::debug!("Guardian {id:?} created.");
        id
    }

    /// Adds an orphaned dependant.
    pub fn add_dependant(&mut self, payload: D) -> DependantId {
        let id = self.dependants.insert(DependantEntry {
            payload,
            guardian: None,
        });
        log::debug!("Dependant {id:?} created.");
        id
    }

    /// Places an orphaned dependant under `guardian`.
    ///
    /// Fails with [`GuardianshipError::AlreadyGuarded`] if the dependant has a
    /// guardian, even when it is `guardian` itself; use [`reparent`](Self::reparent)
    /// to move a dependant.
    pub fn adopt(
        &mut self,
        guardian: GuardianId,
        dependant: DependantId,
    ) -> Result<(), GuardianshipError> {
        let guardian_entry = self
            .guardians
            .get_mut(guardian)
            .ok_or(GuardianshipError::UnknownGuardian(guardian))?;
        let dependant_entry = self
            .dependants
            .get_mut(dependant)
            .ok_or(GuardianshipError::UnknownDependant(dependant))?;

        if let Some(current) = dependant_entry.guardian {
            return Err(GuardianshipError::AlreadyGuarded {
                dependant,
                guardian: current,
            });
        }

        dependant_entry.guardian = Some(guardian);
        guardian_entry.dependants.push(dependant);
        log::debug!("Guardian {guardian:?} adopted dependant {dependant:?}.");
        Ok(())
    }

    /// Detaches `dependant` from `guardian`, leaving it orphaned.
    pub fn release(
        &mut self,
        guardian: GuardianId,
        dependant: DependantId,
    ) -> Result<(), GuardianshipError> {
        let guardian_entry = self
            .guardians
            .get_mut(guardian)
            .ok_or(GuardianshipError::UnknownGuardian(guardian))?;
        let dependant_entry = self
            .dependants
            .get_mut(dependant)
            .ok_or(GuardianshipError::UnknownDependant(dependant))?;

        if dependant_entry.guardian != Some(guardian) {
            return Err(GuardianshipError::NotGuardedBy {
                dependant,
                guardian,
            });
        }

        dependant_entry.guardian = None;
        guardian_entry.dependants.retain(|id| *id != dependant);
        log::debug!("Guardian {guardian:?} released dependant {dependant:?}.");
        Ok(())
    }

    /// Moves `dependant` under `new_guardian`, orphaned or not.
    ///
    /// Returns the previous guardian. Reparenting to the current guardian is a
    /// no-op and keeps the dependant's position in the guardian's list.
    pub fn reparent(
        &mut self,
        dependant: DependantId,
        new_guardian: GuardianId,
    ) -> Result<Option<GuardianId>, GuardianshipError> {
        if self.guardians.get(new_guardian).is_none() {
            return Err(GuardianshipError::UnknownGuardian(new_guardian));
        }
        let dependant_entry = self
            .dependants
            .get_mut(dependant)
            .ok_or(GuardianshipError::UnknownDependant(dependant))?;

        let previous = dependant_entry.guardian;
        if previous == Some(new_guardian) {
            return Ok(previous);
        }
        dependant_entry.guardian = Some(new_guardian);

        if let Some(old) = previous.and_then(|id| self.guardians.get_mut(id)) {
            old.dependants.retain(|id| *id != dependant);
        }
        if let Some(new) = self.guardians.get_mut(new_guardian) {
            new.dependants.push(dependant);
        }

        log::debug!("Dependant {dependant:?} moved from {previous:?} to {new_guardian:?}.");
        Ok(previous)
    }

    /// Removes a guardian and returns its payload. Its dependants become orphans.
    pub fn remove_guardian(&mut self, guardian: GuardianId) -> Result<G, GuardianshipError> {
        let entry = self
            .guardians
            .remove(guardian)
            .ok_or(GuardianshipError::UnknownGuardian(guardian))?;

        if !entry.dependants.is_empty() {
            log::warn!(
                "Guardian {guardian:?} removed with {} dependant(s); they are now orphans.",
                entry.dependants.len()
            );
        }
        for id in &entry.dependants {
            if let Some(dependant) = self.dependants.get_mut(*id) {
                dependant.guardian = None;
            }
        }

        log::debug!("Guardian {guardian:?} removed.");
        Ok(entry.payload)
    }

    /// Removes a dependant, detaching it from its guardian, and returns its payload.
    pub fn remove_dependant(&mut self, dependant: DependantId) -> Result<D, GuardianshipError> {
        let entry = self
            .dependants
            .remove(dependant)
            .ok_or(GuardianshipError::UnknownDependant(dependant))?;

        if let Some(guardian) = entry.guardian.and_then(|id| self.guardians.get_mut(id)) {
            guardian.dependants.retain(|id| *id != dependant);
        }

        log::debug!("Dependant {dependant:?} removed.");
        Ok(entry.payload)
    }

    /// The guardian of `dependant`, or `None` if it is orphaned or unknown.
    pub fn guardian_of(&self, dependant: DependantId) -> Option<GuardianId> {
        self.dependants.get(dependant).and_then(|entry| entry.guardian)
    }

    /// The dependants of `guardian` in adoption order. Empty for unknown ids.
    pub fn dependants_of(&self, guardian: GuardianId) -> &[DependantId] {
        self.guardians
            .get(guardian)
            .map(|entry| entry.dependants.as_slice())
            .unwrap_or(&[])
    }

    /// Live dependants that have no guardian, in slot order.
    pub fn orphans(&self) -> impl Iterator<Item = DependantId> + '_ {
        self.dependants
            .iter()
            .filter(|(_, entry)| entry.guardian.is_none())
            .map(|(id, _)| id)
    }

    /// The payload of a live guardian.
    pub fn guardian(&self, id: GuardianId) -> Option<&G> {
        self.guardians.get(id).map(|entry| &entry.payload)
    }

    /// Mutable access to the payload of a live guardian.
    pub fn guardian_mut(&mut self, id: GuardianId) -> Option<&mut G> {
        self.guardians.get_mut(id).map(|entry| &mut entry.payload)
    }

    /// The payload of a live dependant.
    pub fn dependant(&self, id: DependantId) -> Option<&D> {
        self.dependants.get(id).map(|entry| &entry.payload)
    }

    /// Mutable access to the payload of a live dependant.
    pub fn dependant_mut(&mut self, id: DependantId) -> Option<&mut D> {
        self.dependants.get_mut(id).map(|entry| &mut entry.payload)
    }

    /// Number of live guardians.
    pub fn guardian_count(&self) -> usize {
        self.guardians.len()
    }

    /// Number of live dependants.
    pub fn dependant_count(&self) -> usize {
        self.dependants.len()
    }
}
