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

//! Generational identifiers for arena-stored records.
//!
//! Every identifier combines a slot index with a generation count. When a
//! record is removed its slot can be recycled, but the generation is bumped,
//! so handles to the old record stop resolving instead of silently pointing
//! at the new one.

use serde::{Deserialize, Serialize};

/// Common shape of an `(index, generation)` identifier.
///
/// Arena stores are generic over this trait so that guardians and dependants
/// can share one slot implementation while keeping distinct handle types.
pub trait ArenaId: Copy + Eq + std::fmt::Debug {
    /// Builds an identifier from its raw parts.
    fn from_parts(index: u32, generation: u32) -> Self;
    /// The slot index.
    fn index(self) -> u32;
    /// The generation of the slot at the time the identifier was issued.
    fn generation(self) -> u32;
}

/// Handle to a guardian: a record that owns an ordered set of dependants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuardianId {
    /// The index of the guardian's slot.
    pub index: u32,
    /// A generation counter that is incremented each time the index is recycled.
    pub generation: u32,
}

/// Handle to a dependant: a record guarded by at most one guardian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependantId {
    /// The index of the dependant's slot.
    pub index: u32,
    /// A generation counter that is incremented each time the index is recycled.
    pub generation: u32,
}

impl ArenaId for GuardianId {
    fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    fn index(self) -> u32 {
        self.index
    }

    fn generation(self) -> u32 {
        self.generation
    }
}

impl ArenaId for DependantId {
    fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    fn index(self) -> u32 {
        self.index
    }

    fn generation(self) -> u32 {
        self.generation
    }
}
