// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Table configuration.

use crate::error::ReassemblyError;

/// Configuration of one pair of reassembly tables.
///
/// Capacities are pre-allocation hints, not limits: tables never evict.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TableConfig {
    /// Name used in logs and dumps (usually the protocol).
    pub name: String,
    /// Initial capacity of the open-fragment table.
    pub open_capacity: usize,
    /// Initial capacity of the Completed-Message Table.
    pub completed_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "reassembly".to_string(),
            open_capacity: 64,
            completed_capacity: 64,
        }
    }
}

impl TableConfig {
    /// Set the table name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the open-table capacity hint.
    pub fn open_capacity(mut self, capacity: usize) -> Self {
        self.open_capacity = capacity;
        self
    }

    /// Set the completed-table capacity hint.
    pub fn completed_capacity(mut self, capacity: usize) -> Self {
        self.completed_capacity = capacity;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ReassemblyError> {
        if self.name.trim().is_empty() {
            return Err(ReassemblyError::InvalidConfig(
                "table name must not be empty".to_string(),
            ));
        }
        if self.name.chars().any(char::is_control) {
            return Err(ReassemblyError::InvalidConfig(format!(
                "table name {:?} contains control characters",
                self.name
            )));
        }
        Ok(())
    }
}
