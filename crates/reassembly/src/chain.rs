// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fragment chain model.
//!
//! A [`FragmentChain`] holds every contribution made to one message, in
//! arrival order, plus the aggregate state of the message (final position,
//! completing frame, assembled buffer, flags).
//!
//! # Buffer ownership
//!
//! ```text
//! before completion          after completion
//! node0: Owned([..50])       node0: Aliased { start: 0,   len: 50 } --+
//! node1: Owned([..60])       node1: Aliased { start: 110, len: 60 } --+--> assembled
//! node2: Owned([..60])       node2: Aliased { start: 50,  len: 60 } --+
//! node3: Owned([..60]) dup   node3: Owned([..60])   (kept for audit)
//! ```
//!
//! Aliases are ranges, not pointers: they can only be resolved through the
//! chain that owns the buffer.

use std::collections::BTreeSet;

use crate::flags::FragmentFlags;

/// Storage of one node's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Zero-length contribution.
    Empty,
    /// Private copy of the contribution.
    Owned(Vec<u8>),
    /// Range of the chain's assembled buffer.
    Aliased {
        /// Byte offset in the assembled buffer.
        start: usize,
        /// Byte count.
        len: usize,
    },
    /// Declared bytes were never captured.
    Missing,
}

impl NodeData {
    /// Short ownership tag for dumps.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Owned(_) => "owned",
            Self::Aliased { .. } => "aliased",
            Self::Missing => "missing",
        }
    }
}

/// One contribution to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentNode {
    /// Frame that carried the fragment.
    pub frame: u32,
    /// Sequence position within the message (0-based).
    pub position: u32,
    /// Declared payload length.
    pub len: u32,
    /// Node conditions.
    pub flags: FragmentFlags,
    /// Payload storage.
    pub data: NodeData,
}

/// All contributions for one message identity.
#[derive(Debug, Clone, Default)]
pub struct FragmentChain {
    pub(crate) nodes: Vec<FragmentNode>,
    pub(crate) final_position: Option<u32>,
    pub(crate) completed_at: Option<u32>,
    pub(crate) assembled: Vec<u8>,
    pub(crate) flags: FragmentFlags,
    /// Frames whose arrival completed the chain, one per completion.
    pub(crate) completed_by: Vec<u32>,
    /// Next implicit ordinal.
    pub(crate) ordinal_cursor: u32,
}

impl FragmentChain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Assembled length in bytes.
    ///
    /// While a reopened chain waits for more data this is the length of the
    /// previous assembly.
    pub fn len(&self) -> usize {
        self.assembled.len()
    }

    /// True when the assembled buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.assembled.is_empty()
    }

    /// Assembled bytes in sequence order.
    pub fn data(&self) -> &[u8] {
        &self.assembled
    }

    /// Final sequence position, once a terminal fragment was seen.
    pub fn final_position(&self) -> Option<u32> {
        self.final_position
    }

    /// Frame whose arrival completed the message.
    pub fn completed_at(&self) -> Option<u32> {
        self.completed_at
    }

    /// Head flags: aggregated node conditions plus chain state.
    pub fn flags(&self) -> FragmentFlags {
        self.flags
    }

    /// Message is currently complete.
    pub fn is_complete(&self) -> bool {
        self.flags.contains(FragmentFlags::DEFRAGMENTED)
    }

    /// Reopened and still waiting for a new fragment.
    pub fn is_awaiting_reopen(&self) -> bool {
        self.flags.contains(FragmentFlags::AWAITING_REOPEN)
    }

    /// Chain can never complete through normal accumulation.
    pub fn is_barred(&self) -> bool {
        self.flags
            .contains(FragmentFlags::DECLARED_LENGTH_EXCEEDS_AVAILABLE_DATA)
    }

    /// Nodes in arrival order.
    pub fn nodes(&self) -> impl Iterator<Item = &FragmentNode> {
        self.nodes.iter()
    }

    /// Nodes by position, ties kept in arrival order.
    pub fn nodes_by_position(&self) -> impl Iterator<Item = &FragmentNode> {
        let mut sorted: Vec<&FragmentNode> = self.nodes.iter().collect();
        sorted.sort_by_key(|node| node.position);
        sorted.into_iter()
    }

    /// Resolve a node's bytes; `None` for missing data.
    pub fn node_bytes<'a>(&'a self, node: &'a FragmentNode) -> Option<&'a [u8]> {
        match &node.data {
            NodeData::Empty => Some(&[]),
            NodeData::Owned(bytes) => Some(bytes),
            NodeData::Aliased { start, len } => {
                let end = start.checked_add(*len)?;
                self.assembled.get(*start..end)
            }
            NodeData::Missing => None,
        }
    }

    /// Distinct frames that contributed, in arrival order.
    pub fn contributing_frames(&self) -> Vec<u32> {
        let mut seen = BTreeSet::new();
        self.nodes
            .iter()
            .filter(|node| seen.insert(node.frame))
            .map(|node| node.frame)
            .collect()
    }

    /// Number of nodes, duplicates included.
    pub fn fragment_count(&self) -> usize {
        self.nodes.len()
    }

    /// Frames that completed this chain, oldest first.
    pub fn completed_by(&self) -> &[u32] {
        &self.completed_by
    }

    /// First node (arrival order) at `position`.
    pub(crate) fn first_at(&self, position: u32) -> Option<&FragmentNode> {
        self.nodes.iter().find(|node| node.position == position)
    }

    pub(crate) fn push(&mut self, node: FragmentNode) {
        self.flags |= FragmentFlags(node.flags.0 & FragmentFlags::NODE_CONDITIONS.0);
        self.nodes.push(node);
    }

    /// Link a node that arrived after completion. Truncation stays on the
    /// node: the assembled message never depends on it.
    pub(crate) fn push_late(&mut self, node: FragmentNode) {
        let mut carried = FragmentFlags(node.flags.0 & FragmentFlags::NODE_CONDITIONS.0);
        carried.remove(FragmentFlags::DECLARED_LENGTH_EXCEEDS_AVAILABLE_DATA);
        self.flags |= carried;
        self.nodes.push(node);
    }
}
