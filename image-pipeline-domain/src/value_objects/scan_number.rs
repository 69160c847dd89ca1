// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Monotonic ordering token reported by progressive decoders.

use std::fmt;

/// How much of the final image a partial decode represents. Present only on
/// non-final `ImageContainer`s; must be non-decreasing across a session's
/// partial deliveries (`spec.md` §4.5, §8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanNumber(u64);

impl ScanNumber {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScanNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan#{}", self.0)
    }
}

/// Tracks the last scan number observed for a session and rejects
/// out-of-order reports, enforcing the monotonic-scan-number invariant at a
/// single choke point rather than at every call site.
#[derive(Debug, Default)]
pub struct ScanSequence {
    last: Option<ScanNumber>,
}

impl ScanSequence {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Accepts `scan` if it is `>=` the last accepted scan number, updating
    /// the sequence and returning `true`. Returns `false` (and leaves the
    /// sequence unchanged) for a stale, out-of-order scan.
    pub fn accept(&mut self, scan: ScanNumber) -> bool {
        match self.last {
            Some(last) if scan < last => false,
            _ => {
                self.last = Some(scan);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_strictly_increasing_scans() {
        let mut seq = ScanSequence::new();
        assert!(seq.accept(ScanNumber::new(1)));
        assert!(seq.accept(ScanNumber::new(5)));
        assert!(seq.accept(ScanNumber::new(5)));
        assert!(!seq.accept(ScanNumber::new(3)));
    }

    proptest! {
        /// Feeding any sequence of scan numbers through `accept` must leave the
        /// sequence of *accepted* scans non-decreasing, regardless of what order
        /// they arrived in (`spec.md` §8: monotonic scan numbers).
        #[test]
        fn accepted_scans_are_always_non_decreasing(values in proptest::collection::vec(0u64..20, 0..50)) {
            let mut seq = ScanSequence::new();
            let mut accepted = Vec::new();
            for v in values {
                if seq.accept(ScanNumber::new(v)) {
                    accepted.push(v);
                }
            }
            for pair in accepted.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }
    }
}
