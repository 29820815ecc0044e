// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sequencing and insertion logic shared by every call convention.
//!
//! One call links exactly one node into the chain. Duplicates, conflicts,
//! truncation and conflicting terminal markers are recorded as flags; none of
//! them changes which bytes end up in the assembled buffer (first-seen wins).

use crate::assemble::{assemble, is_assemblable};
use crate::chain::{FragmentChain, FragmentNode, NodeData};
use crate::flags::FragmentFlags;
use crate::payload::Payload;
use crate::stats::ReassemblyStats;

/// Result of linking one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Insertion {
    /// Chain still waits for positions or a terminal marker.
    Incomplete,
    /// This fragment completed the chain.
    Completed,
    /// Chain was already complete; the fragment was linked for audit only.
    AlreadyComplete,
}

fn node_data(payload: &Payload<'_>) -> NodeData {
    match payload.bytes() {
        Some([]) => NodeData::Empty,
        Some(bytes) => NodeData::Owned(bytes.to_vec()),
        None => NodeData::Missing,
    }
}

/// Compare a new contribution against the first-seen one at the same position.
fn conflicts(chain: &FragmentChain, prior: &FragmentNode, len: u32, bytes: Option<&[u8]>) -> bool {
    if prior.len != len {
        return true;
    }
    match (chain.node_bytes(prior), bytes) {
        (Some(old), Some(new)) => old != new,
        _ => false,
    }
}

/// Link one fragment into `chain` and complete it when possible.
pub(crate) fn add_seq_work(
    chain: &mut FragmentChain,
    frame: u32,
    position: u32,
    payload: Payload<'_>,
    more: bool,
    stats: &mut ReassemblyStats,
) -> Insertion {
    stats.fragments_added += 1;
    chain.flags.remove(FragmentFlags::AWAITING_REOPEN);

    let len = payload.declared_len();
    let bytes = payload.bytes();
    let mut flags = FragmentFlags::empty();

    log::trace!(
        "[FragmentChain::add] frame={} pos={} len={} more={} present={}",
        frame,
        position,
        len,
        more,
        bytes.is_some()
    );

    if bytes.is_none() {
        flags.insert(FragmentFlags::DECLARED_LENGTH_EXCEEDS_AVAILABLE_DATA);
        stats.truncated += 1;
        log::debug!(
            "[FragmentChain::add] frame={} pos={} declares {} bytes, {} captured",
            frame,
            position,
            len,
            payload.available()
        );
    }

    if chain.is_complete() {
        // Late arrival: audit against the assembled message, never rebuild.
        flags.insert(FragmentFlags::OVERLAPS_PRIOR);
        stats.duplicates += 1;
        let last = chain.final_position.unwrap_or(0);
        if position > last {
            flags.insert(FragmentFlags::BEYOND_FINAL_POSITION);
            stats.beyond_final += 1;
        } else if let Some(prior) = chain.first_at(position) {
            if conflicts(chain, prior, len, bytes) {
                flags.insert(FragmentFlags::CONTENT_CONFLICTS_WITH_PRIOR);
                stats.conflicts += 1;
            }
        }
        if !more && position != last {
            flags.insert(FragmentFlags::MULTIPLE_TERMINAL_MARKERS_SEEN);
            stats.multiple_tails += 1;
        }
        log::debug!(
            "[FragmentChain::add] frame={} pos={} arrived after completion ({})",
            frame,
            position,
            flags
        );
        chain.push_late(FragmentNode {
            frame,
            position,
            len,
            flags,
            data: node_data(&payload),
        });
        return Insertion::AlreadyComplete;
    }

    if !more {
        match chain.final_position {
            None => chain.final_position = Some(position),
            Some(last) if last != position => {
                flags.insert(FragmentFlags::MULTIPLE_TERMINAL_MARKERS_SEEN);
                stats.multiple_tails += 1;
                log::debug!(
                    "[FragmentChain::add] frame={} declares final {} but final is {}",
                    frame,
                    position,
                    last
                );
            }
            Some(_) => {}
        }
    }

    if let Some(last) = chain.final_position {
        if position > last {
            flags.insert(FragmentFlags::BEYOND_FINAL_POSITION);
            stats.beyond_final += 1;
        }
    }

    if let Some(prior) = chain.first_at(position) {
        flags.insert(FragmentFlags::OVERLAPS_PRIOR);
        stats.duplicates += 1;
        if conflicts(chain, prior, len, bytes) {
            flags.insert(FragmentFlags::CONTENT_CONFLICTS_WITH_PRIOR);
            stats.conflicts += 1;
        }
        log::debug!(
            "[FragmentChain::add] frame={} duplicates pos={} of frame={} ({})",
            frame,
            position,
            prior.frame,
            flags
        );
    }

    chain.push(FragmentNode {
        frame,
        position,
        len,
        flags,
        data: node_data(&payload),
    });

    if is_assemblable(chain) {
        assemble(chain, frame);
        stats.messages_completed += 1;
        return Insertion::Completed;
    }
    Insertion::Incomplete
}
