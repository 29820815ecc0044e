// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Replay report: completed messages, engine statistics and violations.

use crate::config::ReportConfig;
use crate::filter::IdFilter;
use crate::player::{PlaybackStats, Player, Violation};
use reassembly::{FragmentChain, ReassemblyKey, ReassemblyStats, ReassemblyTables};
use serde::Serialize;
use std::fmt::Write as _;

/// One fragment of a reported message.
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub frame: u32,
    pub position: u32,
    pub len: u32,
    /// Storage kind (`aliased`, `owned`, `empty`, `missing`).
    pub data: &'static str,
    pub flags: String,
}

/// One completed message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageReport {
    /// `datagram` or `rpc`.
    pub table: &'static str,
    pub chain: u32,
    pub id: u32,
    pub key: String,
    pub completed_at: Option<u32>,
    pub len: usize,
    pub final_position: Option<u32>,
    pub flags: String,
    /// Contributing frames in arrival order.
    pub frames: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeReport>>,
}

/// Full replay report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub name: String,
    pub playback: PlaybackStats,
    pub messages: Vec<MessageReport>,
    /// Chains that never completed (after filtering).
    pub incomplete: usize,
    pub datagram_stats: ReassemblyStats,
    pub rpc_stats: ReassemblyStats,
    pub violations: Vec<Violation>,
}

impl Report {
    /// Build a report from a player that has run.
    pub fn build(player: &Player, config: &ReportConfig) -> Self {
        let filter = config.id_filter();
        let mut report = Self {
            name: player.config().table.name.clone(),
            playback: player.stats().clone(),
            messages: Vec::new(),
            incomplete: 0,
            datagram_stats: player.datagram_tables().stats(),
            rpc_stats: player.rpc_tables().stats(),
            violations: player.violations().to_vec(),
        };
        report.collect(
            "datagram",
            player.datagram_tables(),
            filter.as_ref(),
            config.include_nodes,
        );
        report.collect("rpc", player.rpc_tables(), filter.as_ref(), config.include_nodes);
        report
    }

    fn collect<K: ReassemblyKey>(
        &mut self,
        table: &'static str,
        tables: &ReassemblyTables<K>,
        filter: Option<&IdFilter>,
        include_nodes: bool,
    ) {
        for (handle, key, chain) in tables.chains() {
            if filter.is_some_and(|f| !f.matches(key.id())) {
                continue;
            }
            if !chain.is_complete() {
                self.incomplete += 1;
                continue;
            }
            self.messages.push(MessageReport {
                table,
                chain: handle.index(),
                id: key.id(),
                key: key.to_string(),
                completed_at: chain.completed_at(),
                len: chain.len(),
                final_position: chain.final_position(),
                flags: chain.flags().to_string(),
                frames: chain.contributing_frames(),
                nodes: include_nodes.then(|| node_rows(chain)),
            });
        }
    }

    /// True when no replay diverged.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "=== Reassembly replay: {} ===", self.name)?;
        writeln!(
            out,
            "events={} adds={} passes={} reopens={}",
            self.playback.events,
            self.playback.adds,
            self.playback.passes_run,
            self.playback.reopens_applied
        )?;
        writeln!(
            out,
            "messages={} incomplete={} violations={}",
            self.messages.len(),
            self.incomplete,
            self.violations.len()
        )?;

        for message in &self.messages {
            writeln!(out)?;
            writeln!(
                out,
                "[{} #{}] {} len={} final={} completed_at={} flags={}",
                message.table,
                message.chain,
                message.key,
                message.len,
                message
                    .final_position
                    .map_or_else(|| "?".to_string(), |p| p.to_string()),
                message
                    .completed_at
                    .map_or_else(|| "-".to_string(), |f| f.to_string()),
                message.flags
            )?;
            let frames: Vec<String> = message.frames.iter().map(u32::to_string).collect();
            writeln!(out, "  frames: {}", frames.join(", "))?;
            for node in message.nodes.iter().flatten() {
                writeln!(
                    out,
                    "  frame={} pos={} len={} data={} flags={}",
                    node.frame, node.position, node.len, node.data, node.flags
                )?;
            }
        }

        writeln!(out)?;
        write_stats(out, "datagram", &self.datagram_stats)?;
        write_stats(out, "rpc", &self.rpc_stats)?;

        if !self.violations.is_empty() {
            writeln!(out)?;
            writeln!(out, "Violations:")?;
            for violation in &self.violations {
                writeln!(out, "  {}", violation)?;
            }
        }
        Ok(())
    }
}

fn node_rows(chain: &FragmentChain) -> Vec<NodeReport> {
    chain
        .nodes_by_position()
        .map(|node| NodeReport {
            frame: node.frame,
            position: node.position,
            len: node.len,
            data: node.data.kind(),
            flags: node.flags.to_string(),
        })
        .collect()
}

fn write_stats(out: &mut String, table: &str, stats: &ReassemblyStats) -> std::fmt::Result {
    writeln!(
        out,
        "{}: added={} replays={} completed={} unfragmented={} duplicates={} conflicts={} truncated={} multiple_tails={} beyond_final={} reopens={} open={} completed_entries={}",
        table,
        stats.fragments_added,
        stats.replays_served,
        stats.messages_completed,
        stats.unfragmented,
        stats.duplicates,
        stats.conflicts,
        stats.truncated,
        stats.multiple_tails,
        stats.beyond_final,
        stats.reopens,
        stats.open_chains,
        stats.completed_entries
    )
}
