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

//! A lazily recomputed value guarded by a pluggable staleness check.
//!
//! A [`Refreshing`] cache is built from three callbacks:
//!
//! * a **value supplier**, expensive, producing the cached value;
//! * a **staleness-basis supplier**, cheap, producing a snapshot such as a
//!   timestamp or a version number;
//! * a **staleness predicate** comparing the basis captured at the last
//!   refresh with the current one, in `(previous, current)` order.
//!
//! The predicate must return `false` for identical bases, otherwise a value
//! is stale again immediately after it was refreshed.

mod settings;
pub mod staleness;
mod version;

pub use settings::{RefreshSettings, SettingsError};
pub use version::VersionCounter;

use std::convert::Infallible;
use std::fmt;
use std::time::Instant;

/// Freshness classification of a [`Refreshing`] cache at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Freshness {
    /// The cache has never been refreshed.
    Pristine,
    /// The cached value is valid for the current staleness basis.
    Fresh,
    /// The staleness predicate reports the cached value as outdated.
    Stale,
}

impl Freshness {
    /// Returns `true` if reading the value would trigger a refresh.
    pub fn needs_refresh(self) -> bool {
        self != Freshness::Fresh
    }
}

type ValueSupplier<'a, T, E> = Box<dyn FnMut() -> Result<T, E> + 'a>;
type BasisSupplier<'a, S, E> = Box<dyn Fn() -> Result<S, E> + 'a>;
type StalenessPredicate<'a, S> = Box<dyn Fn(&S, &S) -> bool + 'a>;

/// The value and the basis captured by the same refresh. Stored together so
/// that one can never exist without the other.
struct Snapshot<T, S> {
    value: T,
    basis: S,
}

/// A value that is recomputed only when a cheap predicate says it went stale.
///
/// `E` is the error type of the callbacks. Caches built with
/// [`Refreshing::new`] use [`Infallible`] and expose the panic-free
/// [`value`](Refreshing::value), [`refresh`](Refreshing::refresh) and
/// [`freshness`](Refreshing::freshness) methods; fallible caches built with
/// [`Refreshing::try_new`] go through the `try_*` family, which return
/// callback errors unchanged.
///
/// A failed refresh commits nothing: the previous value, basis and refresh
/// count are left as they were, so the next read simply retries.
///
/// The cache does no locking. All mutation goes through `&mut self`; wrap the
/// cache in a `Mutex` if it has to be shared between threads.
pub struct Refreshing<'a, T, S, E = Infallible> {
    value_supplier: ValueSupplier<'a, T, E>,
    basis_supplier: BasisSupplier<'a, S, E>,
    is_stale: StalenessPredicate<'a, S>,
    snapshot: Option<Snapshot<T, S>>,
    refresh_count: u64,
}

impl<'a, T, S, E> Refreshing<'a, T, S, E> {
    /// Creates a pristine cache from fallible callbacks. No callback is invoked.
    pub fn try_new<V, B, P>(value_supplier: V, basis_supplier: B, is_stale: P) -> Self
    where
        V: FnMut() -> Result<T, E> + 'a,
        B: Fn() -> Result<S, E> + 'a,
        P: Fn(&S, &S) -> bool + 'a,
    {
        Self {
            value_supplier: Box::new(value_supplier),
            basis_supplier: Box::new(basis_supplier),
            is_stale: Box::new(is_stale),
            snapshot: None,
            refresh_count: 0,
        }
    }

    /// Classifies the cached value without recomputing it.
    ///
    /// Invokes the basis supplier unless the cache is still pristine; never
    /// invokes the value supplier.
    pub fn try_freshness(&self) -> Result<Freshness, E> {
        let Some(snapshot) = &self.snapshot else {
            return Ok(Freshness::Pristine);
        };

        let current = (self.basis_supplier)()?;
        if (self.is_stale)(&snapshot.basis, &current) {
            log::trace!(
                "Cached value went stale after {} refresh(es).",
                self.refresh_count
            );
            Ok(Freshness::Stale)
        } else {
            Ok(Freshness::Fresh)
        }
    }

    /// Returns the cached value, refreshing it first if it is pristine or stale.
    pub fn try_value(&mut self) -> Result<&T, E> {
        if self.try_freshness()?.needs_refresh() {
            return self.try_refresh();
        }
        match &self.snapshot {
            Some(snapshot) => Ok(&snapshot.value),
            // A fresh cache always holds a snapshot.
            None => unreachable!("fresh cache without a snapshot"),
        }
    }

    /// Unconditionally recomputes the value and captures a new staleness basis.
    ///
    /// Both callbacks run before anything is stored; if either fails its error
    /// is returned and the cache is left untouched.
    pub fn try_refresh(&mut self) -> Result<&T, E> {
        let value = (self.value_supplier)()?;
        let basis = (self.basis_supplier)()?;

        self.refresh_count += 1;
        log::trace!("Committed refresh #{}.", self.refresh_count);

        let snapshot = self.snapshot.insert(Snapshot { value, basis });
        Ok(&snapshot.value)
    }

    /// The value stored by the last refresh, if any. Never triggers a refresh.
    pub fn cached(&self) -> Option<&T> {
        self.snapshot.as_ref().map(|snapshot| &snapshot.value)
    }

    /// The staleness basis captured by the last refresh, if any.
    pub fn previous_basis(&self) -> Option<&S> {
        self.snapshot.as_ref().map(|snapshot| &snapshot.basis)
    }

    /// Number of committed refreshes.
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    /// Returns `true` until the first successful refresh.
    pub fn is_pristine(&self) -> bool {
        self.snapshot.is_none()
    }
}

impl<'a, T, S> Refreshing<'a, T, S> {
    /// Creates a pristine cache from infallible callbacks. No callback is invoked.
    pub fn new<V, B, P>(mut value_supplier: V, basis_supplier: B, is_stale: P) -> Self
    where
        V: FnMut() -> T + 'a,
        B: Fn() -> S + 'a,
        P: Fn(&S, &S) -> bool + 'a,
    {
        Self::try_new(
            move || Ok(value_supplier()),
            move || Ok(basis_supplier()),
            is_stale,
        )
    }

    /// See [`try_freshness`](Self::try_freshness).
    pub fn freshness(&self) -> Freshness {
        into_ok(self.try_freshness())
    }

    /// See [`try_value`](Self::try_value).
    pub fn value(&mut self) -> &T {
        into_ok(self.try_value())
    }

    /// See [`try_refresh`](Self::try_refresh).
    pub fn refresh(&mut self) -> &T {
        into_ok(self.try_refresh())
    }
}

impl<'a, T> Refreshing<'a, T, Instant> {
    /// A cache that goes stale once `settings.max_age_ms` has elapsed since
    /// the last refresh.
    pub fn with_max_age<V>(value_supplier: V, settings: &RefreshSettings) -> Self
    where
        V: FnMut() -> T + 'a,
    {
        Self::new(
            value_supplier,
            Instant::now,
            staleness::older_than(settings.max_age()),
        )
    }
}

impl<'a, T> Refreshing<'a, T, u64> {
    /// A cache that goes stale once `counter` has advanced by at least
    /// `settings.min_version_delta` since the last refresh.
    pub fn tracking<V>(
        value_supplier: V,
        counter: &VersionCounter,
        settings: &RefreshSettings,
    ) -> Self
    where
        V: FnMut() -> T + 'a,
    {
        Self::new(
            value_supplier,
            counter.basis(),
            staleness::advanced_by(settings.min_version_delta),
        )
    }
}

impl<T: fmt::Debug, S: fmt::Debug, E> fmt::Debug for Refreshing<'_, T, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refreshing")
            .field("cached", &self.cached())
            .field("previous_basis", &self.previous_basis())
            .field("refresh_count", &self.refresh_count)
            .finish_non_exhaustive()
    }
}

fn into_ok<R>(result: Result<R, Infallible>) -> R {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts how many times each callback ran.
    #[derive(Default, Clone)]
    struct Calls {
        values: Rc<Cell<u32>>,
        bases: Rc<Cell<u32>>,
    }

    fn counted(calls: &Calls, stale: bool) -> Refreshing<'static, u32, u32> {
        let values = calls.values.clone();
        let bases = calls.bases.clone();
        Refreshing::new(
            move || {
                values.set(values.get() + 1);
                values.get()
            },
            move || {
                bases.set(bases.get() + 1);
                0
            },
            move |_, _| stale,
        )
    }

    #[test]
    fn new_cache_is_pristine_and_untouched() {
        let calls = Calls::default();
        let cache = counted(&calls, false);

        assert_eq!(cache.freshness(), Freshness::Pristine);
        assert!(cache.is_pristine());
        assert_eq!(cache.refresh_count(), 0);
        assert_eq!(cache.cached(), None);
        assert_eq!(calls.values.get(), 0, "Construction must not run the value supplier");
        assert_eq!(calls.bases.get(), 0, "A pristine query must not run the basis supplier");
    }

    #[test]
    fn first_read_refreshes_exactly_once() {
        let calls = Calls::default();
        let mut cache = counted(&calls, false);

        assert_eq!(*cache.value(), 1);
        assert_eq!(calls.values.get(), 1);
        // One basis capture for the refresh; the pristine check needs none.
        assert_eq!(calls.bases.get(), 1);
        assert_eq!(cache.refresh_count(), 1);
        assert_eq!(cache.previous_basis(), Some(&0));
    }

    #[test]
    fn never_stale_cache_computes_once() {
        let calls = Calls::default();
        let mut cache = counted(&calls, false);

        cache.value();
        cache.value();

        assert_eq!(calls.values.get(), 1);
        assert_eq!(cache.freshness(), Freshness::Fresh);
    }

    #[test]
    fn always_stale_cache_computes_on_every_read() {
        let calls = Calls::default();
        let mut cache = counted(&calls, true);

        assert_eq!(*cache.value(), 1);
        assert_eq!(*cache.value(), 2);

        assert_eq!(calls.values.get(), 2);
        assert_eq!(cache.refresh_count(), 2);
    }

    #[test]
    fn fresh_read_borrows_the_stored_value() {
        let stale = Rc::new(Cell::new(false));
        let mut cache = {
            let stale = stale.clone();
            Refreshing::new(|| vec![1u8, 2, 3], || (), move |_, _| stale.get())
        };

        // Pristine read refreshes, fresh read returns the same allocation.
        let first = cache.value().as_ptr();
        let second = cache.value().as_ptr();
        assert_eq!(first, second, "A fresh read must not recompute");
        assert_eq!(cache.refresh_count(), 1);

        stale.set(true);
        assert_eq!(cache.value(), &vec![1, 2, 3]);
        assert_eq!(cache.refresh_count(), 2, "A stale read refreshes before returning");

        stale.set(false);
        assert_eq!(cache.try_value(), Ok(&vec![1, 2, 3]));
        assert_eq!(cache.refresh_count(), 2);
    }

    #[test]
    fn freshness_queries_are_side_effect_free() {
        let calls = Calls::default();
        let mut cache = counted(&calls, true);
        cache.value();

        for _ in 0..5 {
            assert_eq!(cache.freshness(), Freshness::Stale);
        }

        assert_eq!(cache.refresh_count(), 1);
        assert_eq!(cache.cached(), Some(&1));
        assert_eq!(calls.values.get(), 1);
    }

    #[test]
    fn explicit_refresh_bypasses_the_predicate() {
        let calls = Calls::default();
        let mut cache = counted(&calls, false);
        cache.value();
        assert_eq!(cache.freshness(), Freshness::Fresh);

        assert_eq!(*cache.refresh(), 2);
        assert_eq!(cache.refresh_count(), 2);
        assert_eq!(cache.freshness(), Freshness::Fresh);
    }

    #[test]
    fn failed_value_supplier_commits_nothing() {
        let fail = Rc::new(Cell::new(false));
        let next = Rc::new(Cell::new(0u32));
        let basis = Rc::new(Cell::new(10u32));

        let mut cache: Refreshing<u32, u32, String> = {
            let fail = fail.clone();
            let basis = basis.clone();
            Refreshing::try_new(
                move || {
                    if fail.get() {
                        return Err("supplier offline".to_string());
                    }
                    next.set(next.get() + 1);
                    Ok(next.get())
                },
                move || Ok(basis.get()),
                |prev, cur| prev != cur,
            )
        };

        assert_eq!(cache.try_value(), Ok(&1));

        fail.set(true);
        basis.set(11);
        assert_eq!(cache.try_refresh(), Err("supplier offline".to_string()));
        assert_eq!(cache.try_value(), Err("supplier offline".to_string()));

        assert_eq!(cache.cached(), Some(&1));
        assert_eq!(cache.previous_basis(), Some(&10));
        assert_eq!(cache.refresh_count(), 1);
        assert_eq!(cache.try_freshness(), Ok(Freshness::Stale));

        // Not fatal: once the supplier recovers the stale value is replaced.
        fail.set(false);
        assert_eq!(cache.try_value(), Ok(&2));
        assert_eq!(cache.refresh_count(), 2);
    }

    #[test]
    fn failed_basis_supplier_commits_nothing() {
        let fail = Rc::new(Cell::new(true));
        let mut cache: Refreshing<&str, u8, &str> = {
            let fail = fail.clone();
            Refreshing::try_new(
                || Ok("computed"),
                move || if fail.get() { Err("clock unavailable") } else { Ok(0) },
                |_, _| false,
            )
        };

        assert_eq!(cache.try_refresh(), Err("clock unavailable"));
        assert!(cache.is_pristine());
        assert_eq!(cache.refresh_count(), 0);

        fail.set(false);
        assert_eq!(cache.try_value(), Ok(&"computed"));
        assert!(!cache.is_pristine());
    }

    #[test]
    fn pristine_is_never_reentered() {
        let calls = Calls::default();
        let mut cache = counted(&calls, true);
        cache.value();

        assert_ne!(cache.freshness(), Freshness::Pristine);
        assert!(Freshness::Stale.needs_refresh());
        assert!(Freshness::Pristine.needs_refresh());
        assert!(!Freshness::Fresh.needs_refresh());
    }

    #[test]
    fn debug_output_shows_state_not_callbacks() {
        let calls = Calls::default();
        let mut cache = counted(&calls, false);
        cache.value();

        let rendered = format!("{cache:?}");
        assert!(rendered.contains("refresh_count: 1"), "got {rendered}");
        assert!(rendered.contains("cached: Some(1)"), "got {rendered}");
    }
}
