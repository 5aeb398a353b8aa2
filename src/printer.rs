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

//! Printer for outputting a [ShortRead] and its [AlignmentRegion]s as plain text.
//!
//! One line is produced per alignment with the tab-separated columns
//!
//! | column | contents                 |
//! |--------|--------------------------|
//! | 1      | read id                  |
//! | 2      | alignment score          |
//! | 3      | chromosome               |
//! | 4      | position                 |
//! | 5      | mapping quality          |
//! | 6      | cigar                    |
//! | 7      | `*`                      |
//! | 8      | `0`                      |
//! | 9      | `0`                      |
//! | 10     | bases                    |
//! | 11     | qualities                |
//! | 12     | `NM:i:` + edit distance  |
//!
//! Columns 7 to 9 hold mate information in SAM and are always `*`, `0`, `0`
//! here. The read id, bases and qualities are written as they were received.
//!
//! ## Usage
//!
//! ```rust
//! use fqmap::{AlignmentRegion, ShortRead};
//! use fqmap::printer::format_record;
//!
//! let read = ShortRead::new("@r1", b"ACGTACGT", b"IIIIIIII");
//! let region = AlignmentRegion{ chrom: "chr1".to_string(), pos: 100, cigar: "8M".to_string(), map_qual: 60, align_score: 8, edit_distance: 0, is_secondary: false };
//!
//! let record = format_record(&read, &region);
//!
//! assert_eq!(record.as_bstr(), "@r1\t8\tchr1\t100\t60\t8M\t*\t0\t0\tACGTACGT\tIIIIIIII\tNM:i:0");
//! ```
//!

use std::io::Write;

use bstr::BStr;
use bstr::BString;
use bstr::ByteSlice;

use crate::AlignmentRegion;
use crate::ShortRead;

type E = Box<dyn std::error::Error>;

/// A single formatted output line, without the line terminator.
///
/// Bases and qualities are copied byte for byte, so the line is not
/// guaranteed to be valid UTF-8.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OutputRecord(BString);

impl OutputRecord {
    pub fn as_bytes(
        &self,
    ) -> &[u8] {
        self.0.as_slice()
    }

    pub fn as_bstr(
        &self,
    ) -> &BStr {
        self.0.as_bstr()
    }
}

impl std::fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<OutputRecord> for Vec<u8> {
    fn from(record: OutputRecord) -> Vec<u8> {
        record.0.into()
    }
}

/// Formats `read` aligned to `region` as an [OutputRecord].
pub fn format_record(
    read: &ShortRead,
    region: &AlignmentRegion,
) -> OutputRecord {
    let separator: u8 = b'\t';
    let formatted: Vec<u8> = [
        read.id.as_bytes().to_vec(),
        region.align_score.to_string().into_bytes(),
        region.chrom.as_bytes().to_vec(),
        region.pos.to_string().into_bytes(),
        region.map_qual.to_string().into_bytes(),
        region.cigar.as_bytes().to_vec(),
        b"*".to_vec(),
        b"0".to_vec(),
        b"0".to_vec(),
        read.bases.clone(),
        read.qualities.clone(),
        format!("NM:i:{}", region.edit_distance).into_bytes(),
    ].join(&separator);

    OutputRecord(BString::from(formatted))
}

/// Format a single alignment and write it to `conn` as one line.
pub fn format_sam_line<W: Write>(
    read: &ShortRead,
    region: &AlignmentRegion,
    conn: &mut W,
) -> Result<(), E> {
    let record = format_record(read, region);
    conn.write_all(record.as_bytes())?;
    conn.write_all(b"\n")?;
    Ok(())
}
