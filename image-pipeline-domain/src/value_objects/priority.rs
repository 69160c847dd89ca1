// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Request/task priority, ordered `VeryLow < Low < Normal < High < VeryHigh`.

use std::cmp::Ordering;

/// Ordered priority for a request, task, or session.
///
/// Session and processing-session priority are always the max of their
/// subscribers' task priorities (see `spec.md` §3, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    VeryLow,
    Low,
    #[default]
    Normal,
    High,
    VeryHigh,
}

impl Priority {
    /// Returns the highest of an iterator of priorities, or `Priority::Normal`
    /// if the iterator is empty. Used to recompute session/processing-session
    /// priority on subscribe/unsubscribe/priority-change.
    pub fn max_of(priorities: impl IntoIterator<Item = Priority>) -> Priority {
        priorities.into_iter().max().unwrap_or_default()
    }
}

/// Tie-break helper: compares two `(Priority, enqueue_order)` pairs so that
/// higher priority sorts first, with ties broken by earlier enqueue time.
/// Used by the bounded operation queue's waiting-region sort.
pub fn priority_then_fifo(a: (Priority, u64), b: (Priority, u64)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1))
}
