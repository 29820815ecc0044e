// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fragment traces and multi-pass replay for the `reassembly` engine.
//!
//! A trace is the sequence of calls a protocol decoder makes into the engine
//! while dissecting a capture, stored as JSON Lines. The [`Player`] runs the
//! trace once as a first pass and then replays it, checking that replays only
//! look things up.
//!
//! # Quick Start
//!
//! ```bash
//! # Replay a trace three times and print a text report
//! reassembly-replay --input capture.jsonl --passes 3
//!
//! # JSON report for two message ids, with per-fragment rows
//! reassembly-replay --input capture.jsonl --format json --ids 12,30 --nodes
//!
//! # Write a commented default configuration
//! reassembly-replay gen-config > replay.toml
//! ```

pub mod config;
pub mod event;
pub mod filter;
pub mod format;
pub mod player;
pub mod report;

pub use config::{ConfigError, ReplayConfig, ReportConfig, ReportFormat};
pub use event::{AddEvent, Convention, ReopenEvent, TraceEvent};
pub use filter::IdFilter;
pub use format::{TraceError, TraceReader, TraceWriter};
pub use player::{Outcome, PlaybackStats, Player, PlayerError, Violation, ViolationKind};
pub use report::{MessageReport, NodeReport, Report};
