// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON Lines trace files.
//!
//! One [`TraceEvent`] per line. Blank lines and lines starting with `#` are
//! skipped, so traces can carry comments.

use crate::event::TraceEvent;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;
use thiserror::Error;

/// Trace format errors.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Streaming trace reader.
pub struct TraceReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl TraceReader<BufReader<File>> {
    /// Open a trace file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TraceError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    /// Read every remaining event with its line number.
    pub fn read_all(self) -> Result<Vec<(usize, TraceEvent)>, TraceError> {
        self.collect()
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<(usize, TraceEvent), TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;

            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let line = self.line;
            return Some(
                serde_json::from_str(trimmed)
                    .map(|event| (line, event))
                    .map_err(|source| TraceError::Json { line, source }),
            );
        }
    }
}

/// Trace writer.
pub struct TraceWriter<W: Write> {
    out: W,
    written: usize,
}

impl TraceWriter<BufWriter<File>> {
    /// Create (or truncate) a trace file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, TraceError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TraceWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// Append one event.
    pub fn write_event(&mut self, event: &TraceEvent) -> Result<(), TraceError> {
        let line = serde_json::to_string(event)?;
        writeln!(self.out, "{}", line)?;
        self.written += 1;
        Ok(())
    }

    /// Append a `#` comment line.
    pub fn write_comment(&mut self, text: &str) -> Result<(), TraceError> {
        for line in text.lines() {
            writeln!(self.out, "# {}", line)?;
        }
        Ok(())
    }

    /// Events written so far.
    pub fn events_written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<(), TraceError> {
        self.out.flush()?;
        Ok(())
    }

    /// Flush and return the inner writer.
    pub fn into_inner(mut self) -> Result<W, TraceError> {
        self.out.flush()?;
        Ok(self.out)
    }
}
