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

use std::cell::Cell;
use std::rc::Rc;

/// A shared, monotonically increasing version number.
///
/// Clones share the same counter: the owner of some source data bumps it on
/// every mutation, and caches derived from that data use it as their
/// staleness basis. Single-threaded by construction (`!Send`).
#[derive(Debug, Clone, Default)]
pub struct VersionCounter(Rc<Cell<u64>>);

impl VersionCounter {
    /// Creates a counter starting at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current version.
    pub fn current(&self) -> u64 {
        self.0.get()
    }

    /// Marks the source data as modified and returns the new version.
    pub fn bump(&self) -> u64 {
        let next = self.0.get().saturating_add(1);
        self.0.set(next);
        next
    }

    /// A basis supplier reading this counter, for use with [`Refreshing`](super::Refreshing).
    pub fn basis(&self) -> impl Fn() -> u64 + 'static {
        let counter = self.clone();
        move || counter.current()
    }
}
