// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Public call conventions.
//!
//! All conventions share [`add_seq_work`](crate::sequence); they differ in how
//! the position is obtained, where a finished chain lives and how a replay
//! pass finds its answer.
//!
//! | Convention | Position | Finished chain | Replay answer |
//! |------------|----------|----------------|---------------|
//! | [`add_fragment`](ReassemblyTables::add_fragment) | explicit | stays in open table | open table |
//! | [`add_fragment_check`](ReassemblyTables::add_fragment_check) | explicit | moved to completed table | completed table |
//! | [`add_fragment_802_11`](ReassemblyTables::add_fragment_802_11) | explicit | moved to completed table | completed table |
//! | [`add_fragment_next`](ReassemblyTables::add_fragment_next) | implicit ordinal | moved to completed table | completed table |
//! | [`add_datagram_fragment`](ReassemblyTables::add_datagram_fragment) | explicit | stays in open table | open table |
//!
//! Replays never mutate anything.

use crate::chain::FragmentChain;
use crate::key::{ActivityKey, FragmentKey, ReassemblyKey};
use crate::pass::Pass;
use crate::payload::Payload;
use crate::sequence::{add_seq_work, Insertion};
use crate::table::{ChainHandle, ReassemblyTables};

/// Tables for protocols keyed by `{src, dst, id}`.
pub type DatagramTables = ReassemblyTables<FragmentKey>;

/// Tables for RPC datagram transports keyed by `{src, dst, id, activity}`.
pub type RpcDatagramTables = ReassemblyTables<ActivityKey>;

/// Position rule of the mirrored-table family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckMode {
    Plain,
    LinkLayer,
    Ordinal,
}

impl<K: ReassemblyKey> ReassemblyTables<K> {
    /// Explicit-sequence convention.
    ///
    /// The chain stays in the open table after completion; fragments arriving
    /// later are linked for audit and the complete handle is returned.
    pub fn add_fragment(
        &mut self,
        key: &K,
        frame: u32,
        position: u32,
        payload: Payload<'_>,
        more: bool,
        pass: Pass,
    ) -> Option<ChainHandle> {
        if pass.is_replay() {
            return self.replay_open(key, frame);
        }

        let handle = self.open_or_create(key);
        let slot = self.slots.get_mut(handle.index() as usize)?;
        match add_seq_work(&mut slot.chain, frame, position, payload, more, &mut self.stats) {
            Insertion::Completed | Insertion::AlreadyComplete => Some(handle),
            Insertion::Incomplete => None,
        }
    }

    /// Explicit-sequence convention with the Completed-Message Table.
    ///
    /// A terminal fragment may arrive first. Once complete, the chain leaves
    /// the open table and every contributing frame maps to it in the
    /// completed table; later fragments for the same key start a new chain.
    pub fn add_fragment_check(
        &mut self,
        key: &K,
        frame: u32,
        position: u32,
        payload: Payload<'_>,
        more: bool,
        pass: Pass,
    ) -> Option<ChainHandle> {
        self.check_work(key, frame, Some(position), payload, more, pass, CheckMode::Plain)
    }

    /// Link-layer variant of [`add_fragment_check`](Self::add_fragment_check).
    ///
    /// A terminal fragment with a non-zero position and no prior chain is a
    /// complete single-frame message: the fragment counter merely carried
    /// over from an earlier, unrelated frame. No bytes are retained.
    pub fn add_fragment_802_11(
        &mut self,
        key: &K,
        frame: u32,
        position: u32,
        payload: Payload<'_>,
        more: bool,
        pass: Pass,
    ) -> Option<ChainHandle> {
        self.check_work(key, frame, Some(position), payload, more, pass, CheckMode::LinkLayer)
    }

    /// Implicit-ordinal convention: each call for `key` takes the next
    /// position after the previous call.
    ///
    /// A first call that is also terminal is an unfragmented message,
    /// completed immediately with an empty buffer.
    pub fn add_fragment_next(
        &mut self,
        key: &K,
        frame: u32,
        payload: Payload<'_>,
        more: bool,
        pass: Pass,
    ) -> Option<ChainHandle> {
        self.check_work(key, frame, None, payload, more, pass, CheckMode::Ordinal)
    }

    /// Explicit replay: the chain's answer for `frame`.
    ///
    /// A complete chain answers every frame; a reopened chain still answers
    /// the frames that completed it earlier.
    fn replay_open(&mut self, key: &K, frame: u32) -> Option<ChainHandle> {
        let handle = self.open.get(key).copied()?;
        let chain = self.chain(handle)?;
        let answer = chain.is_complete() || chain.completed_by().contains(&frame);
        if answer {
            self.stats.replays_served += 1;
            Some(handle)
        } else {
            None
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_work(
        &mut self,
        key: &K,
        frame: u32,
        position: Option<u32>,
        payload: Payload<'_>,
        more: bool,
        pass: Pass,
        mode: CheckMode,
    ) -> Option<ChainHandle> {
        if pass.is_replay() {
            let handle = self.lookup_completed(key.id(), frame)?;
            self.stats.replays_served += 1;
            return Some(handle);
        }

        let existing = self.open.get(key).copied();
        let unfragmented = existing.is_none()
            && !more
            && match mode {
                CheckMode::Plain => false,
                CheckMode::LinkLayer => position.unwrap_or(0) != 0,
                CheckMode::Ordinal => true,
            };
        if unfragmented {
            let handle = self.allocate(key);
            let chain = self.chain_mut(handle)?;
            complete_unfragmented(chain, frame);
            self.stats.unfragmented += 1;
            self.stats.messages_completed += 1;
            self.register_completed(key, handle, frame);
            log::debug!(
                "[ReassemblyTables::check_work] {:?} frame={} unfragmented",
                key,
                frame
            );
            return Some(handle);
        }

        let handle = match existing {
            Some(handle) => handle,
            None => self.open_or_create(key),
        };
        let slot = self.slots.get_mut(handle.index() as usize)?;
        let chain = &mut slot.chain;
        let position = position.unwrap_or(chain.ordinal_cursor);
        chain.ordinal_cursor = position.saturating_add(1);

        let insertion = add_seq_work(chain, frame, position, payload, more, &mut self.stats);
        let truncated_here = !payload.is_present();

        match insertion {
            Insertion::Completed => {
                self.register_completed(key, handle, frame);
                Some(handle)
            }
            Insertion::AlreadyComplete => Some(handle),
            Insertion::Incomplete if truncated_here => {
                if !more {
                    self.open.remove(key);
                    log::debug!(
                        "[ReassemblyTables::check_work] {:?} truncated terminal fragment, \
                         chain dropped",
                        key
                    );
                }
                // Only the head of a message can explain why it failed.
                (position == 0).then_some(handle)
            }
            Insertion::Incomplete => None,
        }
    }
}

impl ReassemblyTables<ActivityKey> {
    /// RPC datagram convention: explicit sequence, keyed by activity.
    pub fn add_datagram_fragment(
        &mut self,
        key: &ActivityKey,
        frame: u32,
        position: u32,
        payload: Payload<'_>,
        more: bool,
        pass: Pass,
    ) -> Option<ChainHandle> {
        self.add_fragment(key, frame, position, payload, more, pass)
    }
}

fn complete_unfragmented(chain: &mut FragmentChain, frame: u32) {
    chain.final_position = Some(0);
    chain.completed_at = Some(frame);
    chain.completed_by.push(frame);
    chain.flags.insert(crate::flags::FragmentFlags::DEFRAGMENTED);
}
