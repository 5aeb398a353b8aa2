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
use crate::AlignmentRegion;
use crate::ShortRead;
use crate::aligner::Aligner;

/// Outcome of aligning a single read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Alignment {
    /// Primary regions in the order the aligner returned them.
    Primary(Vec<AlignmentRegion>),
    /// The aligner reported an I/O failure for this read.
    Failed,
}

impl Alignment {
    /// Primary regions, empty if alignment failed.
    pub fn regions(
        &self,
    ) -> &[AlignmentRegion] {
        match self {
            Alignment::Primary(regions) => regions,
            Alignment::Failed => &[],
        }
    }
}

/// Aligns `read` and keeps only the primary alignments.
///
/// Secondary regions are dropped; the remaining regions keep the order given
/// by `aligner`. An I/O error from `aligner` is logged and the read is treated
/// as having no alignments.
///
pub fn align_primary<A: Aligner>(
    read: &ShortRead,
    aligner: &A,
) -> Alignment {
    match aligner.align(read) {
        Ok(regions) => {
            Alignment::Primary(regions.into_iter().filter(|region| !region.is_secondary).collect())
        },
        Err(e) => {
            log::warn!("Could not align read {}: {}", read.id, e);
            Alignment::Failed
        },
    }
}
