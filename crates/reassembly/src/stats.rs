// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reassembly counters.

/// Reassembly statistics.
///
/// Counters only move on first-pass calls; replays bump `replays_served`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReassemblyStats {
    /// Fragments linked into a chain.
    pub fragments_added: u64,
    /// Calls answered from existing state on a replay pass.
    pub replays_served: u64,
    /// Contributions at an already occupied position.
    pub duplicates: u64,
    /// Duplicates whose bytes differ from the first-seen contribution.
    pub conflicts: u64,
    /// Fragments whose declared length exceeded the captured bytes.
    pub truncated: u64,
    /// Conflicting final-position declarations.
    pub multiple_tails: u64,
    /// Fragments past the final position.
    pub beyond_final: u64,
    /// Chains that became complete (including re-completions).
    pub messages_completed: u64,
    /// Single-frame messages completed without a chain.
    pub unfragmented: u64,
    /// Successful reopen calls.
    pub reopens: u64,
    /// Current open-table entries.
    pub open_chains: usize,
    /// Current completed-table entries.
    pub completed_entries: usize,
}
