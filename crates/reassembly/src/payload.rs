// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Borrowed view of a fragment's bytes inside a captured frame.
//!
//! Decoders hand the engine the whole frame plus an offset and the length the
//! protocol header *declares*. A capture may be snapped short, so the declared
//! length can exceed what is actually present; that case is detected here and
//! surfaces as `DECLARED_LENGTH_EXCEEDS_AVAILABLE_DATA` on the node.

/// Fragment payload view: `{frame bytes, offset, declared length}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload<'a> {
    frame: &'a [u8],
    offset: usize,
    len: u32,
}

impl<'a> Payload<'a> {
    /// View `len` declared bytes starting at `offset` within `frame`.
    pub fn new(frame: &'a [u8], offset: usize, len: u32) -> Self {
        Self { frame, offset, len }
    }

    /// View the whole slice as the payload.
    ///
    /// Slices longer than `u32::MAX` are clamped; no capture gets near that.
    pub fn whole(frame: &'a [u8]) -> Self {
        let len = u32::try_from(frame.len()).unwrap_or(u32::MAX);
        Self {
            frame,
            offset: 0,
            len,
        }
    }

    /// Length announced by the protocol.
    pub fn declared_len(&self) -> u32 {
        self.len
    }

    /// Bytes actually captured from `offset` onward.
    pub fn available(&self) -> usize {
        self.frame.len().saturating_sub(self.offset)
    }

    /// True when every declared byte was captured.
    pub fn is_present(&self) -> bool {
        self.bytes().is_some()
    }

    /// Declared bytes, or `None` if the capture is short.
    pub fn bytes(&self) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(self.len as usize)?;
        self.frame.get(self.offset..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_in_bounds() {
        let frame: Vec<u8> = (0..=255u8).collect();
        let p = Payload::new(&frame, 10, 50);
        assert!(p.is_present());
        assert_eq!(p.declared_len(), 50);
        assert_eq!(p.available(), 246);
        assert_eq!(p.bytes().unwrap(), &frame[10..60]);
    }

    #[test]
    fn test_payload_truncated() {
        let frame = [0u8; 100];
        let p = Payload::new(&frame, 95, 14);
        assert!(!p.is_present());
        assert_eq!(p.available(), 5);
        assert!(p.bytes().is_none());
    }

    #[test]
    fn test_payload_offset_past_end_never_panics() {
        let frame = [0u8; 4];
        let p = Payload::new(&frame, usize::MAX, 1);
        assert_eq!(p.available(), 0);
        assert!(p.bytes().is_none());

        let p = Payload::new(&frame, 8, 0);
        assert!(p.bytes().is_none());
    }

    #[test]
    fn test_payload_whole_and_empty() {
        let frame = [1u8, 2, 3];
        let p = Payload::whole(&frame);
        assert_eq!(p.declared_len(), 3);
        assert_eq!(p.bytes().unwrap(), &frame);

        let empty = Payload::new(&frame, 3, 0);
        assert_eq!(empty.bytes().unwrap(), &[] as &[u8]);
    }
}
