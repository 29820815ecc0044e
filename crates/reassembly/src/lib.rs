// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # reassembly - fragment reassembly for protocol dissectors
//!
//! Protocol decoders call into this crate whenever a logical message has been
//! split across several captured frames (IP fragmentation, link-layer
//! fragmentation, multi-part RPC datagrams...). The engine collects the
//! contributions, detects duplicates and conflicting retransmissions, and
//! hands back one contiguous buffer once every position is present.
//!
//! A capture is usually dissected more than once. Every call therefore carries
//! a [`Pass`]: replays answer from existing state and never mutate it.
//!
//! ## Quick Start
//!
//! ```rust
//! use reassembly::{DatagramTables, FragmentKey, Pass, Payload, TableConfig};
//!
//! let frame: Vec<u8> = (0..=255u8).collect();
//! let key = FragmentKey::new("1.2.3.4".parse()?, "5.6.7.8".parse()?, 12);
//! let mut tables = DatagramTables::new(TableConfig::default().name("ip"));
//!
//! let first = tables.add_fragment(&key, 1, 0, Payload::new(&frame, 10, 50), true, Pass::First);
//! assert!(first.is_none());
//!
//! let done = tables
//!     .add_fragment(&key, 2, 1, Payload::new(&frame, 5, 60), false, Pass::First)
//!     .expect("message complete");
//! let message = tables.chain(done).expect("live handle");
//! assert_eq!(message.len(), 110);
//! assert_eq!(message.completed_at(), Some(2));
//! # Ok::<(), reassembly::ReassemblyError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! decoder --(key, frame, position, payload, more, pass)--> variants
//!                                                             |
//!                      +--------------------------------------+
//!                      v                                      v
//!                  sequence --(complete?)--> assemble     table (open / completed)
//!                      ^                                      |
//!                      +-------------- reopen <---------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ReassemblyTables`] | Open-fragment table, Completed-Message Table and their chains |
//! | [`FragmentChain`] | Every contribution to one message, plus the assembled buffer |
//! | [`FragmentFlags`] | Duplicate / conflict / truncation conditions and chain state |
//! | [`Payload`] | Borrowed view of a fragment inside a captured frame |
//! | [`Pass`] | First pass or replay |
//!
//! ## Call conventions
//!
//! - [`ReassemblyTables::add_fragment`] - explicit sequence numbers
//! - [`ReassemblyTables::add_fragment_check`] - explicit, with completed table
//! - [`ReassemblyTables::add_fragment_802_11`] - link-layer fragment counters
//! - [`ReassemblyTables::add_fragment_next`] - implicit ordinal
//! - [`ReassemblyTables::add_datagram_fragment`] - RPC datagrams keyed by activity

mod assemble;
pub mod chain;
pub mod config;
pub mod dump;
pub mod error;
pub mod flags;
pub mod key;
pub mod pass;
pub mod payload;
mod reopen;
mod sequence;
pub mod stats;
pub mod table;
pub mod variants;

pub use chain::{FragmentChain, FragmentNode, NodeData};
pub use config::TableConfig;
pub use dump::TableDump;
pub use error::ReassemblyError;
pub use flags::FragmentFlags;
pub use key::{ActivityId, ActivityKey, Address, CompletedKey, FragmentKey, ReassemblyKey};
pub use pass::Pass;
pub use payload::Payload;
pub use stats::ReassemblyStats;
pub use table::{ChainHandle, ReassemblyTables};
pub use variants::{DatagramTables, RpcDatagramTables};
