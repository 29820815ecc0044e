// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dissection pass token.
//!
//! A capture is commonly decoded more than once. Every insertion call carries
//! a [`Pass`] so the engine can tell a first visit (which may mutate tables)
//! from a revisit (which must not).

/// Which dissection pass a call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Pass {
    /// First time this frame is processed: tables may change.
    #[default]
    First,
    /// Frame already processed in an earlier pass: read-only.
    Replay,
}

impl Pass {
    /// Map a decoder's "previously visited" bit onto a pass.
    pub fn from_visited(visited: bool) -> Self {
        if visited {
            Self::Replay
        } else {
            Self::First
        }
    }

    /// True on revisits.
    pub fn is_replay(self) -> bool {
        matches!(self, Self::Replay)
    }
}
