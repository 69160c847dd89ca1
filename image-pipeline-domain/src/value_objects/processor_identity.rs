// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Identity for a `Processor`, used to find-or-create a `ProcessingSession`.

use std::fmt;

/// A value that two `Processor` instances agree on exactly when they would
/// produce the same output for the same input (`spec.md` §4.6: "processor
/// equals `P` by value equality over processor identity"). Implementers
/// typically derive this from their configuration (e.g. `"blur:radius=4"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessorIdentity(String);

impl ProcessorIdentity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_identities_compare_equal() {
        assert_eq!(ProcessorIdentity::new("blur:4"), ProcessorIdentity::new("blur:4"));
        assert_ne!(ProcessorIdentity::new("blur:4"), ProcessorIdentity::new("blur:8"));
    }
}
