// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fragment and chain condition flags.
//!
//! Node conditions describe one contribution (was it a duplicate, did it
//! conflict, was it truncated...). The head of a chain aggregates the node
//! conditions and additionally carries the chain state bits (`DEFRAGMENTED`,
//! `AWAITING_REOPEN`). Decoders test individual bits, so every named condition
//! is kept separate.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// FragmentFlags - per-node conditions and per-chain state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct FragmentFlags(pub u16);

impl FragmentFlags {
    /// Another contribution already occupied this position.
    pub const OVERLAPS_PRIOR: Self = Self(0x0001);

    /// Duplicate whose bytes (or length) differ from the first-seen contribution.
    pub const CONTENT_CONFLICTS_WITH_PRIOR: Self = Self(0x0002);

    /// A second, different final position was announced.
    pub const MULTIPLE_TERMINAL_MARKERS_SEEN: Self = Self(0x0004);

    /// Declared length exceeds the captured bytes.
    pub const DECLARED_LENGTH_EXCEEDS_AVAILABLE_DATA: Self = Self(0x0008);

    /// Position lies past the declared final position.
    pub const BEYOND_FINAL_POSITION: Self = Self(0x0010);

    /// Head only: message is currently complete.
    pub const DEFRAGMENTED: Self = Self(0x0100);

    /// Head only: reopened, waiting for more data.
    pub const AWAITING_REOPEN: Self = Self(0x0200);

    /// Conditions a node contributes to its head.
    pub const NODE_CONDITIONS: Self = Self(0x001f);

    const CODES: [(Self, &'static str); 7] = [
        (Self::DEFRAGMENTED, "DF"),
        (Self::AWAITING_REOPEN, "AR"),
        (Self::OVERLAPS_PRIOR, "OL"),
        (Self::CONTENT_CONFLICTS_WITH_PRIOR, "OC"),
        (Self::MULTIPLE_TERMINAL_MARKERS_SEEN, "MT"),
        (Self::DECLARED_LENGTH_EXCEEDS_AVAILABLE_DATA, "TL"),
        (Self::BEYOND_FINAL_POSITION, "BF"),
    ];

    /// Empty flags
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if every bit of `flag` is set
    pub const fn contains(self, flag: Self) -> bool {
        (self.0 & flag.0) == flag.0
    }

    /// Check if any bit of `flag` is set
    pub const fn intersects(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    /// Set bits.
    pub fn insert(&mut self, flag: Self) {
        self.0 |= flag.0;
    }

    /// Clear bits.
    pub fn remove(&mut self, flag: Self) {
        self.0 &= !flag.0;
    }

    /// No bit set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bit pattern.
    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl BitOr for FragmentFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FragmentFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for FragmentFlags {
    /// Space-separated audit codes, `-` when empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        let mut first = true;
        for (flag, code) in Self::CODES {
            if self.contains(flag) {
                if !first {
                    write!(f, " ")?;
                }
                write!(f, "{}", code)?;
                first = false;
            }
        }
        Ok(())
    }
}
