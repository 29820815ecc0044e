// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Completion and buffer assembly.

use std::collections::{BTreeMap, BTreeSet};

use crate::chain::{FragmentChain, NodeData};
use crate::flags::FragmentFlags;

/// True once the final position is known, no truncated data was seen and
/// every position `0..=final` has a node.
pub(crate) fn is_assemblable(chain: &FragmentChain) -> bool {
    let Some(last) = chain.final_position else {
        return false;
    };
    if chain.is_barred() {
        return false;
    }
    let present: BTreeSet<u32> = chain
        .nodes
        .iter()
        .map(|node| node.position)
        .filter(|position| *position <= last)
        .collect();
    present.len() as u64 == u64::from(last) + 1
}

/// Concatenate the winning node of every position into the head buffer.
///
/// The winner is the first node in arrival order. Winners become aliases into
/// the new buffer; aliases left over from a previous assembly are resolved
/// against the old buffer first. Callers must check [`is_assemblable`].
pub(crate) fn assemble(chain: &mut FragmentChain, frame: u32) {
    let Some(last) = chain.final_position else {
        return;
    };

    let mut winners: BTreeMap<u32, usize> = BTreeMap::new();
    for (idx, node) in chain.nodes.iter().enumerate() {
        if node.position <= last {
            winners.entry(node.position).or_insert(idx);
        }
    }

    let old = std::mem::take(&mut chain.assembled);
    let resolve = |data: &NodeData| -> Vec<u8> {
        match data {
            NodeData::Owned(bytes) => bytes.clone(),
            NodeData::Aliased { start, len } => start
                .checked_add(*len)
                .and_then(|end| old.get(*start..end))
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
            NodeData::Empty | NodeData::Missing => Vec::new(),
        }
    };

    let winner_set: BTreeSet<usize> = winners.values().copied().collect();
    let total: usize = winners
        .values()
        .map(|idx| chain.nodes[*idx].len as usize)
        .sum();
    let mut buffer = Vec::with_capacity(total);
    let mut new_data: Vec<(usize, NodeData)> = Vec::with_capacity(chain.nodes.len());

    for idx in winners.values() {
        let bytes = resolve(&chain.nodes[*idx].data);
        let data = if bytes.is_empty() {
            NodeData::Empty
        } else {
            NodeData::Aliased {
                start: buffer.len(),
                len: bytes.len(),
            }
        };
        buffer.extend_from_slice(&bytes);
        new_data.push((*idx, data));
    }

    // Excluded nodes still aliasing the old buffer get their bytes back.
    for (idx, node) in chain.nodes.iter().enumerate() {
        if !winner_set.contains(&idx) && matches!(node.data, NodeData::Aliased { .. }) {
            new_data.push((idx, NodeData::Owned(resolve(&node.data))));
        }
    }

    for (idx, data) in new_data {
        chain.nodes[idx].data = data;
    }

    for node in chain.nodes.iter_mut().filter(|node| node.position > last) {
        node.flags.insert(FragmentFlags::BEYOND_FINAL_POSITION);
        chain.flags.insert(FragmentFlags::BEYOND_FINAL_POSITION);
    }

    chain.assembled = buffer;
    if !chain.completed_by.is_empty() {
        chain.flags.insert(FragmentFlags::OVERLAPS_PRIOR);
    }
    chain.completed_by.push(frame);
    chain.completed_at = Some(frame);
    chain.flags.insert(FragmentFlags::DEFRAGMENTED);

    log::debug!(
        "[FragmentChain::assemble] frame={} final={} len={} nodes={}",
        frame,
        last,
        chain.assembled.len(),
        chain.nodes.len()
    );
}
