// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine error type.
//!
//! Fragment insertion never fails: malformed or truncated input degrades to
//! "never completes" and is reported through flags. The variants below cover
//! handle misuse, configuration and textual key parsing only.

/// Reassembly error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassemblyError {
    /// Handle belongs to a table generation that has since been cleared.
    StaleHandle,
    /// Handle does not address any chain of this table.
    UnknownHandle,
    /// Configuration rejected by `validate()`.
    InvalidConfig(String),
    /// Address text could not be parsed.
    InvalidAddress(String),
    /// Activity identifier text could not be parsed.
    InvalidActivityId(String),
}

impl std::fmt::Display for ReassemblyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StaleHandle => write!(f, "chain handle is stale (tables were cleared)"),
            Self::UnknownHandle => write!(f, "chain handle does not belong to this table"),
            Self::InvalidConfig(msg) => write!(f, "invalid table configuration: {}", msg),
            Self::InvalidAddress(text) => write!(f, "invalid address: {:?}", text),
            Self::InvalidActivityId(text) => write!(f, "invalid activity id: {:?}", text),
        }
    }
}

impl std::error::Error for ReassemblyError {}
