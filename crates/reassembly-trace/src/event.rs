// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Trace events.
//!
//! One event is one decoder call into the engine. Frame bytes are carried
//! base64-encoded so a trace line stays a single JSON object.
//!
//! ```text
//! {"op":"add","frame":1,"convention":"seq","src":"10.0.0.1","dst":"10.0.0.2","id":12,"position":0,"data":"AAECAw==","offset":0,"more":true}
//! {"op":"reopen","src":"10.0.0.1","dst":"10.0.0.2","id":12}
//! ```

use reassembly::{ActivityId, ActivityKey, Address, FragmentKey, Payload, ReassemblyError};
use serde::{Deserialize, Serialize};

/// Which engine entry point an `add` event goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Convention {
    /// Explicit sequence numbers.
    #[default]
    #[serde(rename = "seq")]
    Seq,
    /// Explicit sequence numbers with the completed table.
    #[serde(rename = "check")]
    Check,
    /// Link-layer fragment counters.
    #[serde(rename = "802_11")]
    LinkLayer,
    /// Implicit ordinal.
    #[serde(rename = "next")]
    Next,
    /// RPC datagrams keyed by activity.
    #[serde(rename = "dcerpc_dg")]
    DcerpcDg,
}

impl Convention {
    /// Whether the convention keys messages by activity.
    pub fn uses_activity(&self) -> bool {
        matches!(self, Self::DcerpcDg)
    }
}

/// A fragment handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddEvent {
    /// Capture frame number.
    pub frame: u32,
    #[serde(default)]
    pub convention: Convention,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub dst: String,
    /// Message identifier.
    pub id: u32,
    /// RPC activity UUID (`dcerpc_dg` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    /// Sequence position (ignored by `next`).
    #[serde(default)]
    pub position: u32,
    /// Captured frame bytes.
    #[serde(with = "b64")]
    pub data: Vec<u8>,
    /// Fragment start inside `data`.
    #[serde(default)]
    pub offset: usize,
    /// Declared fragment length; defaults to the bytes after `offset`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<u32>,
    /// More fragments follow.
    pub more: bool,
}

impl AddEvent {
    /// Payload view over the carried frame bytes.
    pub fn payload(&self) -> Payload<'_> {
        let len = self.len.unwrap_or_else(|| {
            let rest = self.data.len().saturating_sub(self.offset);
            u32::try_from(rest).unwrap_or(u32::MAX)
        });
        Payload::new(&self.data, self.offset, len)
    }

    /// Key for the datagram tables.
    pub fn key(&self) -> Result<FragmentKey, ReassemblyError> {
        Ok(FragmentKey::new(self.src.parse()?, self.dst.parse()?, self.id))
    }

    /// Key for the RPC datagram tables. A missing activity is the nil UUID.
    pub fn activity_key(&self) -> Result<ActivityKey, ReassemblyError> {
        activity_key(&self.src, &self.dst, self.id, self.activity.as_deref())
    }
}

/// Reopen the completed message for a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReopenEvent {
    #[serde(default)]
    pub convention: Convention,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub dst: String,
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
}

impl ReopenEvent {
    pub fn key(&self) -> Result<FragmentKey, ReassemblyError> {
        Ok(FragmentKey::new(self.src.parse()?, self.dst.parse()?, self.id))
    }

    pub fn activity_key(&self) -> Result<ActivityKey, ReassemblyError> {
        activity_key(&self.src, &self.dst, self.id, self.activity.as_deref())
    }
}

/// One line of a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TraceEvent {
    Add(AddEvent),
    Reopen(ReopenEvent),
}

impl TraceEvent {
    /// Message identifier the event refers to.
    pub fn id(&self) -> u32 {
        match self {
            Self::Add(add) => add.id,
            Self::Reopen(reopen) => reopen.id,
        }
    }

    /// Frame number, for `add` events.
    pub fn frame(&self) -> Option<u32> {
        match self {
            Self::Add(add) => Some(add.frame),
            Self::Reopen(_) => None,
        }
    }
}

fn activity_key(
    src: &str,
    dst: &str,
    id: u32,
    activity: Option<&str>,
) -> Result<ActivityKey, ReassemblyError> {
    let activity = match activity {
        Some(text) => text.parse()?,
        None => ActivityId::default(),
    };
    let src: Address = src.parse()?;
    let dst: Address = dst.parse()?;
    Ok(ActivityKey::new(src, dst, id, activity))
}

/// Base64 (standard alphabet, padded) for `Vec<u8>` fields.
mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}
