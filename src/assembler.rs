// fqmap: Streaming alignment of FASTQ reads against a reference genome.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//

//! Assembler for turning a stream of FASTQ lines into [ShortRead] records.
//!
//! FASTQ stores one read in four lines: the identifier, the sequence, a
//! separator, and the base qualities. [ReadAssembler] consumes one line at a
//! time and returns a [ShortRead] every fourth line.
//!
//! The line counter is never reset, so lines from several files can be fed
//! through the same assembler as long as every file contains whole records.
//! An incomplete record at the end of the input never produces a read; use
//! [pending_lines](ReadAssembler::pending_lines) to find out if one is left
//! over.
//!
//! Lines are taken as raw bytes. Sequence and quality lines are stored as-is
//! and the identifier line is decoded as UTF-8, replacing invalid bytes.
//!
//! ## Usage
//!
//! ```rust
//! use fqmap::ShortRead;
//! use fqmap::assembler::ReadAssembler;
//!
//! let lines = vec!["@r1", "ACGT", "+", "IIII", "@r2", "TT"];
//!
//! let mut assembler = ReadAssembler::new();
//! let reads: Vec<ShortRead> = lines.iter().filter_map(|line| assembler.push(line)).collect();
//!
//! assert_eq!(reads, vec![ShortRead::new("@r1", b"ACGT", b"IIII")]);
//! assert_eq!(assembler.pending_lines(), 2);
//! ```
//!

use bstr::ByteSlice;

use crate::ShortRead;

#[derive(Clone, Debug, Default)]
pub struct ReadAssembler {
    // Total number of lines consumed
    counter: u64,

    id: String,
    bases: Vec<u8>,
}

impl ReadAssembler {
    pub fn new() -> Self {
        ReadAssembler::default()
    }

    /// Consumes one line and returns a [ShortRead] if it completed a record.
    ///
    /// Line contents are not validated.
    pub fn push<T: AsRef<[u8]>>(
        &mut self,
        line: T,
    ) -> Option<ShortRead> {
        let line = line.as_ref();
        let position = self.counter % 4;
        self.counter += 1;
        match position {
            0 => {
                self.id.clear();
                self.id.push_str(&line.to_str_lossy());
                None
            },
            1 => {
                self.bases.clear();
                self.bases.extend_from_slice(line);
                None
            },
            // separator line
            2 => None,
            _ => {
                let read = ShortRead{
                    id: std::mem::take(&mut self.id),
                    bases: std::mem::take(&mut self.bases),
                    qualities: line.to_vec(),
                };
                Some(read)
            },
        }
    }

    /// Number of lines consumed so far.
    pub fn lines_consumed(
        &self,
    ) -> u64 {
        self.counter
    }

    /// Number of complete reads returned so far.
    pub fn reads_assembled(
        &self,
    ) -> u64 {
        self.counter / 4
    }

    /// Number of lines belonging to a record that has not been completed.
    pub fn pending_lines(
        &self,
    ) -> u64 {
        self.counter % 4
    }
}
