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

//! Reading input lines from files and writing records to files.
//!
//! [source::LineSource] turns a directory of (optionally gzipped) text files
//! into a single stream of lines. [sink] opens the output files the records
//! are written to.
//!

pub mod sink;
pub mod source;
