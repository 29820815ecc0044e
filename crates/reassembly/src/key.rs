// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message identity.
//!
//! A reassembly is identified by a value-typed key. Keys are compared
//! structurally: two keys with equal fields denote the same in-flight message,
//! no matter where they were built.
//!
//! | Key | Fields | Used by |
//! |-----|--------|---------|
//! | [`FragmentKey`] | src, dst, id | explicit, check, link-layer and ordinal conventions |
//! | [`ActivityKey`] | src, dst, id, activity | RPC datagram transports |
//! | [`CompletedKey`] | id, frame | Completed-Message Table |

use std::fmt;
use std::hash::Hash;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::ReassemblyError;

/// Endpoint address of a captured frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Address {
    /// No address (link-less or unknown).
    #[default]
    None,
    /// IPv4 address.
    Ipv4(Ipv4Addr),
    /// IPv6 address.
    Ipv6(Ipv6Addr),
    /// 48-bit MAC address.
    Ether([u8; 6]),
    /// Any other address family, kept as raw bytes.
    Raw(Vec<u8>),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "-"),
            Self::Ipv4(addr) => write!(f, "{}", addr),
            Self::Ipv6(addr) => write!(f, "{}", addr),
            Self::Ether(mac) => write!(
                f,
                "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
            ),
            Self::Raw(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Address {
    type Err = ReassemblyError;

    /// Parse `-`/empty, dotted quad, IPv6 text or `aa:bb:cc:dd:ee:ff`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "-" {
            return Ok(Self::None);
        }
        if let Ok(v4) = s.parse::<Ipv4Addr>() {
            return Ok(Self::Ipv4(v4));
        }
        if let Some(mac) = parse_mac(s) {
            return Ok(Self::Ether(mac));
        }
        if let Ok(v6) = s.parse::<Ipv6Addr>() {
            return Ok(Self::Ipv6(v6));
        }
        Err(ReassemblyError::InvalidAddress(s.to_string()))
    }
}

fn parse_mac(s: &str) -> Option<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut parts = s.split(':');
    for slot in &mut mac {
        let part = parts.next()?;
        if part.len() != 2 {
            return None;
        }
        *slot = u8::from_str_radix(part, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(mac)
}

/// Identity of an in-flight message, generic over keying schemes.
///
/// The table manager needs structural equality, hashing and the correlation
/// id (which, together with a frame number, keys the Completed-Message
/// Table). `Display` is used by table dumps.
pub trait ReassemblyKey: Clone + Eq + Hash + fmt::Debug + fmt::Display {
    /// Correlation id carried by the protocol (IP id, sequence group, call id...).
    fn id(&self) -> u32;
}

/// Default message identity: `{source, destination, correlation id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FragmentKey {
    /// Source endpoint.
    pub src: Address,
    /// Destination endpoint.
    pub dst: Address,
    /// Correlation id.
    pub id: u32,
}

impl FragmentKey {
    /// Create a new key.
    pub fn new(src: Address, dst: Address, id: u32) -> Self {
        Self { src, dst, id }
    }
}

impl ReassemblyKey for FragmentKey {
    fn id(&self) -> u32 {
        self.id
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} id={}", self.src, self.dst, self.id)
    }
}

/// 128-bit RPC activity identifier (DCE UUID layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivityId(pub [u8; 16]);

impl ActivityId {
    /// Build from the classic `data1-data2-data3-data4` field split.
    ///
    /// Fields are laid out big-endian, matching the textual form.
    pub fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&data1.to_be_bytes());
        bytes[4..6].copy_from_slice(&data2.to_be_bytes());
        bytes[6..8].copy_from_slice(&data3.to_be_bytes());
        bytes[8..16].copy_from_slice(&data4);
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8) {
                write!(f, "-")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl FromStr for ActivityId {
    type Err = ReassemblyError;

    /// Parse `01020304-0506-0708-090a0b0c0d0e0f10` (dashes optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: Vec<u8> = s.trim().bytes().filter(|b| *b != b'-').collect();
        if hex.len() != 32 {
            return Err(ReassemblyError::InvalidActivityId(s.to_string()));
        }
        let mut bytes = [0u8; 16];
        for (slot, pair) in bytes.iter_mut().zip(hex.chunks_exact(2)) {
            let text = std::str::from_utf8(pair)
                .map_err(|_| ReassemblyError::InvalidActivityId(s.to_string()))?;
            *slot = u8::from_str_radix(text, 16)
                .map_err(|_| ReassemblyError::InvalidActivityId(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

/// RPC datagram identity: messages are partitioned by activity, then by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivityKey {
    /// Source endpoint.
    pub src: Address,
    /// Destination endpoint.
    pub dst: Address,
    /// Correlation id (fragment/sequence number of the call).
    pub id: u32,
    /// Activity identifier.
    pub activity: ActivityId,
}

impl ActivityKey {
    /// Create a new key.
    pub fn new(src: Address, dst: Address, id: u32, activity: ActivityId) -> Self {
        Self {
            src,
            dst,
            id,
            activity,
        }
    }
}

impl ReassemblyKey for ActivityKey {
    fn id(&self) -> u32 {
        self.id
    }
}

impl fmt::Display for ActivityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} id={} act={}",
            self.src, self.dst, self.id, self.activity
        )
    }
}

/// Completed-Message Table key: one entry per contributing frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompletedKey {
    /// Correlation id.
    pub id: u32,
    /// Contributing frame number.
    pub frame: u32,
}

impl CompletedKey {
    /// Create a new key.
    pub fn new(id: u32, frame: u32) -> Self {
        Self { id, frame }
    }
}
