// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multi-pass trace replay.
//!
//! The player acts as a dissector: it runs every event once as a first pass,
//! then replays the whole trace `passes - 1` more times and checks that the
//! engine answers replays without changing state:
//!
//! - every replay pass yields the same outcomes as the previous one
//! - every first-pass completion is handed back again by each replay
//! - table sizes and node counts do not move during replays
//!
//! Divergences are collected as [`Violation`]s rather than aborting the run.

use crate::config::{ConfigError, ReplayConfig};
use crate::event::{AddEvent, Convention, TraceEvent};
use crate::format::{TraceError, TraceReader};
use reassembly::{
    ChainHandle, DatagramTables, Pass, ReassemblyError, ReassemblyKey, ReassemblyTables,
    RpcDatagramTables,
};
use serde::Serialize;
use std::fmt;
use std::io::BufRead;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Player errors.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("line {line}: {source}")]
    Event {
        line: usize,
        #[source]
        source: ReassemblyError,
    },
}

/// What one `add` call handed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Outcome {
    /// No handle.
    Incomplete,
    /// A handle to a chain that is not complete (truncated first fragment,
    /// or a reopened message).
    Partial { chain: u32, flags: String },
    /// A handle to a complete message.
    Complete {
        chain: u32,
        len: usize,
        completed_at: Option<u32>,
    },
}

impl Outcome {
    fn resolve<K: ReassemblyKey>(
        tables: &ReassemblyTables<K>,
        handle: Option<ChainHandle>,
    ) -> Self {
        let Some(handle) = handle else {
            return Self::Incomplete;
        };
        match tables.chain(handle) {
            Some(chain) if chain.is_complete() => Self::Complete {
                chain: handle.index(),
                len: chain.len(),
                completed_at: chain.completed_at(),
            },
            Some(chain) => Self::Partial {
                chain: handle.index(),
                flags: chain.flags().to_string(),
            },
            None => Self::Incomplete,
        }
    }

    /// Arena index of the returned chain, if any.
    pub fn chain(&self) -> Option<u32> {
        match self {
            Self::Incomplete => None,
            Self::Partial { chain, .. } | Self::Complete { chain, .. } => Some(*chain),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete => write!(f, "incomplete"),
            Self::Partial { chain, flags } => write!(f, "partial #{} [{}]", chain, flags),
            Self::Complete {
                chain,
                len,
                completed_at,
            } => {
                write!(f, "complete #{} len={}", chain, len)?;
                if let Some(frame) = completed_at {
                    write!(f, " at={}", frame)?;
                }
                Ok(())
            }
        }
    }
}

/// Table occupancy, summed over both key schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableSizes {
    pub open: usize,
    pub completed: usize,
    pub chains: usize,
    pub nodes: usize,
}

impl TableSizes {
    fn add<K: ReassemblyKey>(&mut self, tables: &ReassemblyTables<K>) {
        self.open += tables.open_len();
        self.completed += tables.completed_len();
        for (_, _, chain) in tables.chains() {
            self.chains += 1;
            self.nodes += chain.fragment_count();
        }
    }
}

/// A replay that did not behave like a pure lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// Two replay passes disagree on an event.
    Diverged { previous: Outcome, now: Outcome },
    /// A first-pass completion was not handed back on replay.
    CompletionLost { first: Outcome, replay: Outcome },
    /// A replay pass changed the tables.
    TablesMutated { before: TableSizes, after: TableSizes },
}

/// One idempotence violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Replay pass (1-based; the first pass is 0).
    pub pass: u32,
    /// Trace line, when tied to one event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<u32>,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pass {}", self.pass)?;
        if let Some(line) = self.line {
            write!(f, " line {}", line)?;
        }
        if let Some(frame) = self.frame {
            write!(f, " frame {}", frame)?;
        }
        match &self.kind {
            ViolationKind::Diverged { previous, now } => {
                write!(f, ": replay diverged ({} -> {})", previous, now)
            }
            ViolationKind::CompletionLost { first, replay } => {
                write!(f, ": completion lost ({} -> {})", first, replay)
            }
            ViolationKind::TablesMutated { before, after } => write!(
                f,
                ": tables mutated (open {}->{}, completed {}->{}, nodes {}->{})",
                before.open,
                after.open,
                before.completed,
                after.completed,
                before.nodes,
                after.nodes
            ),
        }
    }
}

/// Playback statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaybackStats {
    /// Events in the trace.
    pub events: usize,
    /// `add` events.
    pub adds: usize,
    /// `reopen` events that found a completed message.
    pub reopens_applied: usize,
    /// Passes run (first pass included).
    pub passes_run: u32,
    /// First-pass calls that handed back a complete message.
    pub first_pass_completions: usize,
}

/// Trace player.
pub struct Player {
    config: ReplayConfig,
    datagram: DatagramTables,
    rpc: RpcDatagramTables,
    events: Vec<(usize, TraceEvent)>,
    first: Vec<Option<Outcome>>,
    violations: Vec<Violation>,
    stats: PlaybackStats,
}

impl Player {
    /// Create a player; validates the configuration.
    pub fn new(config: ReplayConfig) -> Result<Self, PlayerError> {
        config.validate()?;
        let rpc_table = config.table.clone().name(format!("{}-dg", config.table.name));
        Ok(Self {
            datagram: DatagramTables::new(config.table.clone()),
            rpc: RpcDatagramTables::new(rpc_table),
            config,
            events: Vec::new(),
            first: Vec::new(),
            violations: Vec::new(),
            stats: PlaybackStats::default(),
        })
    }

    /// Load every event from a trace reader.
    pub fn load<R: BufRead>(&mut self, reader: TraceReader<R>) -> Result<usize, PlayerError> {
        let before = self.events.len();
        for item in reader {
            let (line, event) = item?;
            self.push(line, event);
        }
        Ok(self.events.len() - before)
    }

    /// Append one event (line number as reported in violations).
    pub fn push(&mut self, line: usize, event: TraceEvent) {
        self.events.push((line, event));
    }

    /// Run the first pass and every replay pass from fresh tables.
    pub fn run(&mut self) -> Result<&PlaybackStats, PlayerError> {
        self.datagram.clear();
        self.rpc.clear();
        self.violations.clear();
        self.stats = PlaybackStats {
            events: self.events.len(),
            adds: self
                .events
                .iter()
                .filter(|(_, e)| matches!(e, TraceEvent::Add(_)))
                .count(),
            ..PlaybackStats::default()
        };

        info!(
            "Playing {} events, {} passes",
            self.stats.events, self.config.passes
        );

        self.first = self.run_pass(Pass::First)?;
        self.stats.passes_run = 1;
        self.stats.first_pass_completions = self
            .first
            .iter()
            .flatten()
            .filter(|o| o.is_complete())
            .count();
        let baseline = self.sizes();

        let mut previous: Option<Vec<Option<Outcome>>> = None;
        for pass in 1..self.config.passes {
            let outcomes = self.run_pass(Pass::Replay)?;
            self.stats.passes_run += 1;

            let after = self.sizes();
            if after != baseline {
                self.record(Violation {
                    pass,
                    line: None,
                    frame: None,
                    kind: ViolationKind::TablesMutated {
                        before: baseline,
                        after,
                    },
                });
            }

            for index in 0..outcomes.len() {
                let Some(now) = outcomes[index].clone() else {
                    continue;
                };
                let (line, event) = &self.events[index];
                let (line, frame) = (Some(*line), event.frame());

                if let Some(first) = self.first[index].clone() {
                    if first.is_complete() && now.chain() != first.chain() {
                        self.record(Violation {
                            pass,
                            line,
                            frame,
                            kind: ViolationKind::CompletionLost {
                                first,
                                replay: now.clone(),
                            },
                        });
                    }
                }

                let prior = previous.as_ref().and_then(|p| p[index].clone());
                if let Some(prior) = prior {
                    if prior != now {
                        self.record(Violation {
                            pass,
                            line,
                            frame,
                            kind: ViolationKind::Diverged {
                                previous: prior,
                                now,
                            },
                        });
                    }
                }
            }
            previous = Some(outcomes);
        }

        info!(
            "Playback complete: {} completions, {} violations",
            self.stats.first_pass_completions,
            self.violations.len()
        );
        Ok(&self.stats)
    }

    fn record(&mut self, violation: Violation) {
        warn!("{}", violation);
        self.violations.push(violation);
    }

    fn sizes(&self) -> TableSizes {
        let mut sizes = TableSizes::default();
        sizes.add(&self.datagram);
        sizes.add(&self.rpc);
        sizes
    }

    fn run_pass(&mut self, pass: Pass) -> Result<Vec<Option<Outcome>>, PlayerError> {
        debug!("Pass {:?} over {} events", pass, self.events.len());
        let events = std::mem::take(&mut self.events);
        let result = events
            .iter()
            .map(|(line, event)| {
                self.apply(event, pass)
                    .map_err(|source| PlayerError::Event {
                        line: *line,
                        source,
                    })
            })
            .collect();
        self.events = events;
        result
    }

    /// Apply one event. `reopen` is first-pass only and yields no outcome.
    fn apply(
        &mut self,
        event: &TraceEvent,
        pass: Pass,
    ) -> Result<Option<Outcome>, ReassemblyError> {
        match event {
            TraceEvent::Add(add) => self.apply_add(add, pass).map(Some),
            TraceEvent::Reopen(reopen) => {
                if pass.is_replay() {
                    return Ok(None);
                }
                let reopened = if reopen.convention.uses_activity() {
                    self.rpc.reopen(&reopen.activity_key()?)
                } else {
                    self.datagram.reopen(&reopen.key()?)
                };
                if reopened {
                    self.stats.reopens_applied += 1;
                }
                debug!("Reopen id={} -> {}", reopen.id, reopened);
                Ok(None)
            }
        }
    }

    fn apply_add(&mut self, add: &AddEvent, pass: Pass) -> Result<Outcome, ReassemblyError> {
        let payload = add.payload();
        let (frame, position, more) = (add.frame, add.position, add.more);

        let datagram = &mut self.datagram;
        let handle = match add.convention {
            Convention::Seq => {
                datagram.add_fragment(&add.key()?, frame, position, payload, more, pass)
            }
            Convention::Check => {
                datagram.add_fragment_check(&add.key()?, frame, position, payload, more, pass)
            }
            Convention::LinkLayer => {
                datagram.add_fragment_802_11(&add.key()?, frame, position, payload, more, pass)
            }
            Convention::Next => datagram.add_fragment_next(&add.key()?, frame, payload, more, pass),
            Convention::DcerpcDg => {
                let key = add.activity_key()?;
                let handle = self
                    .rpc
                    .add_datagram_fragment(&key, frame, position, payload, more, pass);
                return Ok(Outcome::resolve(&self.rpc, handle));
            }
        };
        Ok(Outcome::resolve(&self.datagram, handle))
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn events(&self) -> &[(usize, TraceEvent)] {
        &self.events
    }

    /// First-pass outcome per event (`None` for `reopen`).
    pub fn first_pass(&self) -> &[Option<Outcome>] {
        &self.first
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn stats(&self) -> &PlaybackStats {
        &self.stats
    }

    /// Tables keyed by endpoints and id.
    pub fn datagram_tables(&self) -> &DatagramTables {
        &self.datagram
    }

    /// Tables keyed by RPC activity.
    pub fn rpc_tables(&self) -> &RpcDatagramTables {
        &self.rpc
    }
}
