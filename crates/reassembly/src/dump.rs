// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Human-readable dump of both tables, for debugging decoders.
//!
//! ```text
//! == open table (ip): 1 chain(s)
//! [#0] 1.2.3.4 -> 5.6.7.8 id=12 len=170 final=2 completed_at=4 flags=DF
//!     frame=1 pos=0 len=50 data=aliased flags=-
//!     frame=4 pos=1 len=60 data=aliased flags=-
//!     frame=3 pos=2 len=60 data=aliased flags=-
//! == completed table (ip): 0 entrie(s)
//! ```
//!
//! Iteration order of the tables is unspecified.

use std::fmt;

use crate::chain::FragmentChain;
use crate::key::ReassemblyKey;
use crate::table::{ChainHandle, ReassemblyTables};

/// Borrowed `Display` view over a [`ReassemblyTables`].
pub struct TableDump<'a, K: ReassemblyKey> {
    tables: &'a ReassemblyTables<K>,
}

impl<'a, K: ReassemblyKey> TableDump<'a, K> {
    pub(crate) fn new(tables: &'a ReassemblyTables<K>) -> Self {
        Self { tables }
    }

    fn write_chain(
        &self,
        f: &mut fmt::Formatter<'_>,
        handle: ChainHandle,
        chain: &FragmentChain,
    ) -> fmt::Result {
        let key = self
            .tables
            .key_of(handle)
            .map(ToString::to_string)
            .unwrap_or_else(|| "?".to_string());
        let last = chain
            .final_position()
            .map_or_else(|| "?".to_string(), |p| p.to_string());
        let done = chain
            .completed_at()
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        writeln!(
            f,
            "[#{}] {} len={} final={} completed_at={} flags={}",
            handle.index(),
            key,
            chain.len(),
            last,
            done,
            chain.flags()
        )?;
        for node in chain.nodes_by_position() {
            writeln!(
                f,
                "    frame={} pos={} len={} data={} flags={}",
                node.frame,
                node.position,
                node.len,
                node.data.kind(),
                node.flags
            )?;
        }
        Ok(())
    }
}

impl<K: ReassemblyKey> fmt::Display for TableDump<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.tables.config().name;

        writeln!(
            f,
            "== open table ({}): {} chain(s)",
            name,
            self.tables.open.len()
        )?;
        for handle in self.tables.open.values() {
            if let Some(chain) = self.tables.chain(*handle) {
                self.write_chain(f, *handle, chain)?;
            }
        }

        writeln!(
            f,
            "== completed table ({}): {} entrie(s)",
            name,
            self.tables.completed.len()
        )?;
        for (key, handle) in &self.tables.completed {
            writeln!(f, "id={} frame={} -> #{}", key.id, key.frame, handle.index())?;
        }
        Ok(())
    }
}
