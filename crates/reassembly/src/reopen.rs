// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Partial-reassembly reopening.
//!
//! A decoder that finds out a "complete" message was actually cut short can
//! reopen it. The assembled buffer and every node stay in place: winners keep
//! aliasing the old buffer, so the next assembly starts with the old bytes.

use crate::chain::FragmentChain;
use crate::flags::FragmentFlags;

/// Conditions that only hold relative to one particular final position.
const PER_COMPLETION: FragmentFlags = FragmentFlags(
    FragmentFlags::MULTIPLE_TERMINAL_MARKERS_SEEN.0 | FragmentFlags::BEYOND_FINAL_POSITION.0,
);

/// Clear completion state so accumulation can resume.
///
/// Returns `false` (and changes nothing) if the chain is not complete.
pub(crate) fn reopen(chain: &mut FragmentChain) -> bool {
    if !chain.is_complete() {
        return false;
    }
    chain.flags.remove(FragmentFlags::DEFRAGMENTED);
    chain.flags.remove(PER_COMPLETION);
    chain.flags.insert(FragmentFlags::AWAITING_REOPEN);
    chain.final_position = None;
    chain.completed_at = None;
    for node in &mut chain.nodes {
        node.flags.remove(PER_COMPLETION);
    }
    log::debug!(
        "[FragmentChain::reopen] len={} nodes={}",
        chain.assembled.len(),
        chain.nodes.len()
    );
    true
}
