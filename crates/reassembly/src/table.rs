// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Key & Table Manager.
//!
//! Chains live in an arena owned by [`ReassemblyTables`]; both lookup tables
//! map to [`ChainHandle`]s into that arena. A handle carries the id of the
//! tables that issued it and the generation it was issued in, so handles from
//! other tables or taken before [`ReassemblyTables::clear`] are rejected
//! instead of silently addressing a different message.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::chain::FragmentChain;
use crate::config::TableConfig;
use crate::dump::TableDump;
use crate::error::ReassemblyError;
use crate::key::{CompletedKey, ReassemblyKey};
use crate::reopen;
use crate::stats::ReassemblyStats;

/// Opaque reference to a chain owned by a [`ReassemblyTables`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainHandle {
    table: u32,
    index: u32,
    generation: u32,
}

impl ChainHandle {
    /// Arena slot (stable for the lifetime of the tables).
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Arena slot: the chain plus the key it was created for.
#[derive(Debug)]
pub(crate) struct Slot<K> {
    pub(crate) key: K,
    pub(crate) chain: FragmentChain,
}

/// Open-fragment table, Completed-Message Table and the chains they index.
#[derive(Debug)]
pub struct ReassemblyTables<K: ReassemblyKey> {
    config: TableConfig,
    pub(crate) open: HashMap<K, ChainHandle>,
    pub(crate) completed: HashMap<CompletedKey, ChainHandle>,
    pub(crate) slots: Vec<Slot<K>>,
    id: u32,
    generation: u32,
    pub(crate) stats: ReassemblyStats,
}

impl<K: ReassemblyKey> ReassemblyTables<K> {
    /// Create empty tables.
    pub fn new(config: TableConfig) -> Self {
        static NEXT_ID: AtomicU32 = AtomicU32::new(1);
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("[ReassemblyTables::new] name={} id={}", config.name, id);
        Self {
            open: HashMap::with_capacity(config.open_capacity),
            completed: HashMap::with_capacity(config.completed_capacity),
            slots: Vec::new(),
            id,
            generation: 0,
            stats: ReassemblyStats::default(),
            config,
        }
    }

    /// Table configuration.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Destroy every chain and start over.
    ///
    /// Handles issued before the call become stale.
    pub fn clear(&mut self) {
        log::debug!(
            "[ReassemblyTables::clear] name={} chains={} open={} completed={}",
            self.config.name,
            self.slots.len(),
            self.open.len(),
            self.completed.len()
        );
        self.open.clear();
        self.completed.clear();
        self.slots.clear();
        self.stats = ReassemblyStats::default();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Resolve a handle.
    pub fn chain(&self, handle: ChainHandle) -> Option<&FragmentChain> {
        self.try_chain(handle).ok()
    }

    /// Resolve a handle, reporting why it failed.
    pub fn try_chain(&self, handle: ChainHandle) -> Result<&FragmentChain, ReassemblyError> {
        self.slot(handle).map(|slot| &slot.chain)
    }

    /// Key the chain behind `handle` was created for.
    pub fn key_of(&self, handle: ChainHandle) -> Option<&K> {
        self.slot(handle).ok().map(|slot| &slot.key)
    }

    /// Current open chain for `key`, if any. Never mutates.
    pub fn lookup(&self, key: &K) -> Option<ChainHandle> {
        self.open.get(key).copied()
    }

    /// Completed message that frame `frame` contributed to under `id`.
    pub fn lookup_completed(&self, id: u32, frame: u32) -> Option<ChainHandle> {
        self.completed.get(&CompletedKey::new(id, frame)).copied()
    }

    /// Open-fragment table size.
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    /// Completed-Message Table size.
    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    /// Every chain ever created since the last clear, in creation order.
    pub fn chains(&self) -> impl Iterator<Item = (ChainHandle, &K, &FragmentChain)> {
        let (table, generation) = (self.id, self.generation);
        self.slots.iter().enumerate().map(move |(index, slot)| {
            let handle = ChainHandle {
                table,
                index: index as u32,
                generation,
            };
            (handle, &slot.key, &slot.chain)
        })
    }

    /// Statistics snapshot.
    pub fn stats(&self) -> ReassemblyStats {
        let mut stats = self.stats.clone();
        stats.open_chains = self.open.len();
        stats.completed_entries = self.completed.len();
        stats
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.stats = ReassemblyStats::default();
    }

    /// Diagnostic view of both tables.
    pub fn dump(&self) -> TableDump<'_, K> {
        TableDump::new(self)
    }

    /// Reopen the completed chain currently open for `key`.
    ///
    /// Returns `false` when there is no such chain or it is not complete.
    pub fn reopen(&mut self, key: &K) -> bool {
        let Some(handle) = self.open.get(key).copied() else {
            log::debug!("[ReassemblyTables::reopen] no open chain for {:?}", key);
            return false;
        };
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return false;
        };
        let reopened = reopen::reopen(&mut slot.chain);
        if reopened {
            self.stats.reopens += 1;
        }
        reopened
    }

    // ========================================================================
    // Internal helpers used by the call conventions
    // ========================================================================

    fn slot(&self, handle: ChainHandle) -> Result<&Slot<K>, ReassemblyError> {
        if handle.table != self.id {
            return Err(ReassemblyError::UnknownHandle);
        }
        if handle.generation != self.generation {
            return Err(ReassemblyError::StaleHandle);
        }
        self.slots
            .get(handle.index as usize)
            .ok_or(ReassemblyError::UnknownHandle)
    }

    pub(crate) fn chain_mut(&mut self, handle: ChainHandle) -> Option<&mut FragmentChain> {
        if handle.table != self.id || handle.generation != self.generation {
            return None;
        }
        self.slots
            .get_mut(handle.index as usize)
            .map(|slot| &mut slot.chain)
    }

    /// Allocate a new chain in the arena (not indexed by any table).
    pub(crate) fn allocate(&mut self, key: &K) -> ChainHandle {
        let handle = ChainHandle {
            table: self.id,
            index: self.slots.len() as u32,
            generation: self.generation,
        };
        self.slots.push(Slot {
            key: key.clone(),
            chain: FragmentChain::new(),
        });
        handle
    }

    /// Open chain for `key`, created on first use.
    pub(crate) fn open_or_create(&mut self, key: &K) -> ChainHandle {
        if let Some(handle) = self.open.get(key) {
            return *handle;
        }
        let handle = self.allocate(key);
        self.open.insert(key.clone(), handle);
        log::trace!("[ReassemblyTables::open_or_create] new chain {:?}", key);
        handle
    }

    /// Move a finished chain from the open table into the completed table,
    /// one entry per contributing frame (or `frame` for a node-less chain).
    pub(crate) fn register_completed(&mut self, key: &K, handle: ChainHandle, frame: u32) {
        if self.open.get(key) == Some(&handle) {
            self.open.remove(key);
        }
        let frames = self
            .chain(handle)
            .map(FragmentChain::contributing_frames)
            .unwrap_or_default();
        let id = key.id();
        if frames.is_empty() {
            self.completed.insert(CompletedKey::new(id, frame), handle);
        }
        for contributing in frames {
            self.completed
                .insert(CompletedKey::new(id, contributing), handle);
        }
        log::debug!(
            "[ReassemblyTables::register_completed] id={} frame={} entries={}",
            id,
            frame,
            self.completed.len()
        );
    }
}

impl<K: ReassemblyKey> Default for ReassemblyTables<K> {
    fn default() -> Self {
        Self::new(TableConfig::default())
    }
}
