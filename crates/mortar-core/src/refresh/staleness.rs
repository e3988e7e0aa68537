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

//! Ready-made staleness predicates.
//!
//! Each predicate takes the bases in `(previous, current)` order. All of them
//! except [`always`] return `false` for identical bases.

use std::time::{Duration, Instant};

/// Stale whenever the basis changed at all.
pub fn changed<S: PartialEq>() -> impl Fn(&S, &S) -> bool {
    |previous: &S, current: &S| previous != current
}

/// Stale once a version counter moved forward by at least `delta`.
///
/// A `delta` of zero is treated as one.
pub fn advanced_by(delta: u64) -> impl Fn(&u64, &u64) -> bool {
    let delta = delta.max(1);
    move |previous: &u64, current: &u64| current.saturating_sub(*previous) >= delta
}

/// Stale once at least `max_age` has elapsed between the two instants.
///
/// With a zero `max_age` any elapsed time makes the value stale.
pub fn older_than(max_age: Duration) -> impl Fn(&Instant, &Instant) -> bool {
    move |previous: &Instant, current: &Instant| {
        let elapsed = current.saturating_duration_since(*previous);
        elapsed > Duration::ZERO && elapsed >= max_age
    }
}

/// Never stale. The value is computed once and then only on explicit refresh.
pub fn never<S>() -> impl Fn(&S, &S) -> bool {
    |_: &S, _: &S| false
}

/// Always stale, including right after a refresh, so every read recomputes.
pub fn always<S>() -> impl Fn(&S, &S) -> bool {
    |_: &S, _: &S| true
}
