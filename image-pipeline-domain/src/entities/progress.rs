// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A task's completed/total byte counters (`spec.md` §3, §9 "lazy progress
//! object"). Writers (the pipeline) update the counters as chunks arrive;
//! an observer materializes a `ProgressSnapshot` on demand — there is
//! nothing to eagerly allocate, so "lazy" here just means the snapshot is
//! computed at read time rather than pushed to observers continuously.

use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time view of a task's download progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: u64,
    pub total: Option<u64>,
}

/// Shared, cheaply-updatable progress counters for one task.
#[derive(Debug, Default)]
pub struct Progress {
    completed: AtomicU64,
    // 0 is used as the "unknown total" sentinel so the field can be a plain
    // atomic; `snapshot()` maps it back to `None`.
    total: AtomicU64,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            completed: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    pub fn update(&self, completed: u64, total: Option<u64>) {
        self.completed.store(completed, Ordering::Relaxed);
        self.total.store(total.unwrap_or(0), Ordering::Relaxed);
    }

    /// Materializes the current counters. This is the "accessor" half of the
    /// lazy-progress contract.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        ProgressSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            total: if total == 0 { None } else { Some(total) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_with_unknown_total() {
        let progress = Progress::new();
        let snapshot = progress.snapshot();
        assert_eq!(snapshot.completed, 0);
        assert_eq!(snapshot.total, None);
    }

    #[test]
    fn update_is_reflected_in_snapshot() {
        let progress = Progress::new();
        progress.update(500, Some(1500));
        let snapshot = progress.snapshot();
        assert_eq!(snapshot.completed, 500);
        assert_eq!(snapshot.total, Some(1500));
    }
}
