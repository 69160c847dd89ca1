// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cancellation
//!
//! A cooperative cancel signal with register-callback semantics
//! (`spec.md` §4.1). Grounded on this lineage's own
//! `bootstrap::shutdown::CancellationToken` (an `Arc`-shared flag plus
//! notification), extended here with ordered callback registration and
//! parent/child composition, since the pipeline needs synchronous
//! "run this cleanup the instant cancellation happens" hooks rather than an
//! `await`-able signal.
//!
//! - `cancel()` is idempotent and transitions the source from live to
//!   cancelled atomically.
//! - Callbacks registered before `cancel()` fire in registration order, on
//!   the thread that calls `cancel()`.
//! - Callbacks registered after `cancel()` fire synchronously, on the
//!   registering thread.
//! - A child token cancels when its parent cancels; children never
//!   propagate cancellation upward.

use parking_lot::Mutex;
use std::sync::Arc;

type Callback = Box<dyn FnOnce() + Send + 'static>;

enum State {
    Live(Vec<Callback>),
    Cancelled,
}

struct Inner {
    state: Mutex<State>,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: Mutex::new(State::Live(Vec::new())),
        }
    }

    fn is_cancelled(&self) -> bool {
        matches!(*self.state.lock(), State::Cancelled)
    }

    fn register(&self, callback: Callback) {
        let mut guard = self.state.lock();
        match &mut *guard {
            State::Live(callbacks) => callbacks.push(callback),
            State::Cancelled => {
                drop(guard);
                callback();
            }
        }
    }

    fn cancel(&self) {
        let callbacks = {
            let mut guard = self.state.lock();
            match std::mem::replace(&mut *guard, State::Cancelled) {
                State::Live(callbacks) => callbacks,
                State::Cancelled => return,
            }
        };
        for callback in callbacks {
            callback();
        }
    }
}

/// Produces a `CancellationToken` and holds the exclusive right to cancel it.
#[derive(Clone)]
pub struct CancellationSource(Arc<Inner>);

impl CancellationSource {
    pub fn new() -> Self {
        Self(Arc::new(Inner::new()))
    }

    pub fn token(&self) -> CancellationToken {
        CancellationToken(self.0.clone())
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Idempotent: the second and later calls are no-ops.
    pub fn cancel(&self) {
        self.0.cancel();
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

/// A read-only view of a cancellation signal.
#[derive(Clone)]
pub struct CancellationToken(Arc<Inner>);

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Registers `callback` to run when this token is cancelled — or, if it
    /// is already cancelled, runs it immediately on the calling thread.
    pub fn register(&self, callback: impl FnOnce() + Send + 'static) {
        self.0.register(Box::new(callback));
    }

    /// Creates a child source that cancels automatically when this token
    /// cancels. The child does not propagate cancellation back to this
    /// token.
    pub fn child(&self) -> CancellationSource {
        let child = CancellationSource::new();
        let child_for_callback = child.clone();
        self.register(move || child_for_callback.cancel());
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn cancel_is_idempotent() {
        let source = CancellationSource::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        source.token().register(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        source.cancel();
        source.cancel();
        source.cancel();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callbacks_fire_in_registration_order() {
        let source = CancellationSource::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = order.clone();
            source.token().register(move || order.lock().push(i));
        }

        source.cancel();
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn registering_after_cancel_fires_immediately() {
        let source = CancellationSource::new();
        source.cancel();

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        source.token().register(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn child_cancels_when_parent_cancels() {
        let parent = CancellationSource::new();
        let child = parent.token().child();
        assert!(!child.is_cancelled());

        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn child_cancellation_does_not_propagate_to_parent() {
        let parent = CancellationSource::new();
        let child = parent.token().child();

        child.cancel();
        assert!(!parent.is_cancelled());
    }

    proptest::proptest! {
        /// No matter how many times `cancel()` is called, exactly one round of
        /// registered callbacks ever runs (`spec.md` §8: `cancel()` called `k`
        /// times is equivalent to calling it once).
        #[test]
        fn cancel_called_n_times_fires_callbacks_exactly_once(n in 1usize..20) {
            let source = CancellationSource::new();
            let calls = Arc::new(AtomicUsize::new(0));
            let calls_clone = calls.clone();
            source.token().register(move || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            });

            for _ in 0..n {
                source.cancel();
            }

            proptest::prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
            proptest::prop_assert!(source.is_cancelled());
        }
    }
}
