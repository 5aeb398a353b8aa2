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

//! Interface to the alignment engine.
//!
//! The pipeline does not align reads itself. It loads a reference index
//! through an [IndexLoader] once per pipeline instance and then calls the
//! resulting [Aligner] once per read.
//!
//! Implement these two traits to plug in a different aligner. [kmer]
//! contains a small implementation that works directly on a FASTA file.
//!

use std::path::Path;

use crate::AlignmentRegion;
use crate::ShortRead;

// Implementations
pub mod kmer;

type E = Box<dyn std::error::Error>;

/// An alignment engine bound to a loaded reference index.
///
/// Dropping the aligner releases the index.
pub trait Aligner {
    /// Returns the candidate placements of `read`, best first.
    ///
    /// Errors are I/O failures for this read only. The same aligner must
    /// keep working for the following reads.
    fn align(
        &self,
        read: &ShortRead,
    ) -> std::io::Result<Vec<AlignmentRegion>>;
}

/// Loads a reference index from a file and binds an [Aligner] to it.
pub trait IndexLoader {
    type Aligner: Aligner;

    fn load(
        &self,
        path: &Path,
    ) -> Result<Self::Aligner, E>;
}
