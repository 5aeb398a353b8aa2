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

//! fqmap is a library and a command-line client for:
//!
//!   - Reassembling [FASTQ](https://en.wikipedia.org/wiki/FASTQ_format) reads from a stream of text lines.
//!   - Aligning every read against a reference genome loaded once per pipeline instance.
//!   - Formatting the primary alignments as tab-delimited, SAM-like records.
//!
//! ## Usage
//!
//! ### Command line
//!
//! The fqmap CLI supports the following subcommands:
//!   - `fqmap map` align every FASTQ file in a directory and write the records to an output directory.
//!
//! `map` splits the input files over `--partitions` independent pipeline
//! instances. Each instance loads its own copy of the reference and writes its
//! own output file.
//!
//! ### Rust API
//!
//! The pipeline is built from small pieces that can also be used on their own:
//!
//!   - [ReadAssembler](assembler::ReadAssembler): turns lines into [ShortRead] records, 4 lines at a time.
//!   - [ReferenceSession](reference::ReferenceSession): owns a loaded reference index and the aligner bound to it.
//!   - [align_primary](invoker::align_primary): aligns one read and keeps only the primary [AlignmentRegion]s.
//!   - [format_record](printer::format_record): formats a read and one of its alignments as an [OutputRecord](printer::OutputRecord).
//!   - [Mapper](mapper::Mapper): drives the above through the activate, process, deactivate lifecycle.
//!
//! The aligner itself is pluggable through the [Aligner](aligner::Aligner) and
//! [IndexLoader](aligner::IndexLoader) traits. A small k-mer based
//! implementation that indexes a FASTA file in memory is provided in
//! [aligner::kmer].
//!
//! ## Output format
//!
//! Each primary alignment produces one line with the tab-separated columns
//!
//! `read id, alignment score, chromosome, position, mapping quality, cigar, *, 0, 0, bases, qualities, NM:i:<edit distance>`
//!
//! The `*`, `0` and `0` columns are placeholders for mate information and are
//! never filled in. No SAM header is written.
//!

use std::io::BufRead;
use std::io::Write;

pub mod aligner;
pub mod assembler;
pub mod invoker;
pub mod io;
pub mod mapper;
pub mod printer;
pub mod reference;

type E = Box<dyn std::error::Error>;

/// A single sequencing read.
///
/// Constructed once all four lines of a FASTQ record have been seen. `id`
/// is the identifier line as-is, including the leading `@`.
///
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ShortRead {
    /// Identifier line of the record.
    pub id: String,
    /// Sequence letters.
    pub bases: Vec<u8>,
    /// Base qualities, nominally as long as `bases`.
    pub qualities: Vec<u8>,
}

impl ShortRead {
    pub fn new(
        id: &str,
        bases: &[u8],
        qualities: &[u8],
    ) -> Self {
        ShortRead{ id: id.to_string(), bases: bases.to_vec(), qualities: qualities.to_vec() }
    }
}

/// One candidate placement of a [ShortRead] on the reference.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AlignmentRegion {
    /// Name of the reference sequence.
    pub chrom: String,
    /// 1-based leftmost position on `chrom`.
    pub pos: i64,
    pub cigar: String,
    /// Mapping quality.
    pub map_qual: i32,
    /// Alignment score.
    pub align_score: i32,
    /// Number of edits (NM) between the read and the reference.
    pub edit_distance: i32,
    pub is_secondary: bool,
}

/// Map FASTQ lines from [BufRead](std::io::BufRead) to records in [Write](std::io::Write).
///
/// Runs a single [Mapper](mapper::Mapper) instance over every line of
/// `conn_in`: activates it, processes the lines, and deactivates it.
///
/// Returns the [summary](mapper::MapperSummary) of the run.
///
/// ## Usage
///
/// ```rust
/// use fqmap::map_from_read_to_write;
/// use fqmap::aligner::{Aligner, IndexLoader};
/// use fqmap::mapper::MapperConfig;
/// use fqmap::{AlignmentRegion, ShortRead};
/// use std::io::Cursor;
/// use std::path::Path;
///
/// // Aligner that places every read at chr1:100
/// struct Fixed;
/// impl Aligner for Fixed {
///     fn align(&self, read: &ShortRead) -> std::io::Result<Vec<AlignmentRegion>> {
///         Ok(vec![AlignmentRegion{ chrom: "chr1".to_string(), pos: 100, cigar: format!("{}M", read.bases.len()),
///                                  map_qual: 60, align_score: read.bases.len() as i32, edit_distance: 0, is_secondary: false }])
///     }
/// }
/// struct FixedLoader;
/// impl IndexLoader for FixedLoader {
///     type Aligner = Fixed;
///     fn load(&self, _path: &Path) -> Result<Fixed, Box<dyn std::error::Error>> { Ok(Fixed) }
/// }
///
/// // The reference file only needs to exist for `FixedLoader`
/// let reference = std::env::current_exe().unwrap();
/// let config = MapperConfig{ reference_file_path: reference };
///
/// let mut input = Cursor::new(b"@r1\nACGT\n+\nIIII\n".to_vec());
/// let mut output: Vec<u8> = Vec::new();
/// let summary = map_from_read_to_write(&config, &FixedLoader, &mut input, &mut output).unwrap();
///
/// assert_eq!(output, b"@r1\t4\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII\tNM:i:0\n".to_vec());
/// assert_eq!(summary.records_emitted, 1);
/// ```
///
pub fn map_from_read_to_write<L: aligner::IndexLoader, R: BufRead, W: Write>(
    config: &mapper::MapperConfig,
    loader: &L,
    conn_in: &mut R,
    conn_out: &mut W,
) -> Result<mapper::MapperSummary, E> {
    let mut mapper = mapper::Mapper::new(config.clone(), loader);
    mapper.activate()?;
    let mut line: Vec<u8> = Vec::new();
    while conn_in.read_until(b'\n', &mut line)? > 0 {
        io::source::trim_line_ending(&mut line);
        mapper.process(&line, conn_out)?;
        line.clear();
    }
    let summary = mapper.deactivate()?;
    conn_out.flush()?;
    Ok(summary)
}

/// Map lines from a [LineSource](io::source::LineSource) into a [Write](std::io::Write).
///
/// Same as [map_from_read_to_write] but reads from every file of a line
/// source in order. The read assembler is shared across file boundaries.
///
pub fn map_from_source_to_write<L: aligner::IndexLoader, W: Write>(
    config: &mapper::MapperConfig,
    loader: &L,
    source: &mut io::source::LineSource,
    conn_out: &mut W,
) -> Result<mapper::MapperSummary, E> {
    let mut mapper = mapper::Mapper::new(config.clone(), loader);
    mapper.activate()?;
    for line in source.by_ref() {
        mapper.process(&line?, conn_out)?;
    }
    let summary = mapper.deactivate()?;
    conn_out.flush()?;
    Ok(summary)
}

// Tests
#[cfg(test)]
mod tests {
    use crate::AlignmentRegion;
    use crate::ShortRead;
    use crate::aligner::Aligner;
    use crate::aligner::IndexLoader;

    use std::path::Path;

    // Places every read at chr1:100
    struct Fixed;

    impl Aligner for Fixed {
        fn align(&self, read: &ShortRead) -> std::io::Result<Vec<AlignmentRegion>> {
            Ok(vec![AlignmentRegion{ chrom: "chr1".to_string(), pos: 100, cigar: format!("{}M", read.bases.len()),
                                     map_qual: 60, align_score: read.bases.len() as i32, edit_distance: 0, is_secondary: false }])
        }
    }

    struct FixedLoader;

    impl IndexLoader for FixedLoader {
        type Aligner = Fixed;

        fn load(&self, _path: &Path) -> Result<Fixed, Box<dyn std::error::Error>> {
            Ok(Fixed)
        }
    }

    const NON_UTF8_INPUT: &[u8] = b"@r1\nACGT\n+\nII\xffI\n@r2\r\nTTGA\r\n+\r\nIIII\r\n";

    #[test]
    fn map_from_read_to_write_missing_reference() {
        use super::map_from_read_to_write;
        use crate::aligner::kmer::KmerLoader;
        use crate::mapper::MapperConfig;
        use std::io::Cursor;
        use std::path::PathBuf;

        let config = MapperConfig{ reference_file_path: PathBuf::from("/nonexistent/fqmap/ref.fasta") };
        let mut input = Cursor::new(b"@r1\nACGT\n+\nIIII\n@r2\nACGT\n+\nIIII\n".to_vec());
        let mut output: Vec<u8> = Vec::new();

        let summary = map_from_read_to_write(&config, &KmerLoader::default(), &mut input, &mut output).unwrap();

        assert!(output.is_empty());
        assert_eq!(summary.reads_assembled, 2);
        assert_eq!(summary.records_emitted, 0);
        assert!(summary.degraded.is_some());
    }

    #[test]
    fn map_from_read_to_write_non_utf8_quality() {
        use super::map_from_read_to_write;
        use crate::mapper::MapperConfig;
        use std::io::Cursor;

        let reference = tempfile::NamedTempFile::new().unwrap();
        let config = MapperConfig{ reference_file_path: reference.path().to_path_buf() };
        let mut input = Cursor::new(NON_UTF8_INPUT.to_vec());
        let mut output: Vec<u8> = Vec::new();

        let summary = map_from_read_to_write(&config, &FixedLoader, &mut input, &mut output).unwrap();

        let mut expected: Vec<u8> = b"@r1\t4\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tII\xffI\tNM:i:0\n".to_vec();
        expected.extend_from_slice(b"@r2\t4\tchr1\t100\t60\t4M\t*\t0\t0\tTTGA\tIIII\tNM:i:0\n");
        assert_eq!(summary.reads_assembled, 2);
        assert_eq!(summary.records_emitted, 2);
        assert_eq!(output, expected);
    }

    #[test]
    fn map_from_source_to_write_non_utf8_quality() {
        use super::map_from_source_to_write;
        use crate::io::source::LineSource;
        use crate::mapper::MapperConfig;

        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("ref.fasta");
        std::fs::write(&reference, b">chr1\nACGT\n").unwrap();
        let reads = dir.path().join("reads.fastq");
        std::fs::write(&reads, NON_UTF8_INPUT).unwrap();

        let config = MapperConfig{ reference_file_path: reference };
        let mut source = LineSource::new(vec![reads]);
        let mut output: Vec<u8> = Vec::new();

        let summary = map_from_source_to_write(&config, &FixedLoader, &mut source, &mut output).unwrap();

        assert_eq!(summary.reads_assembled, 2);
        assert_eq!(summary.records_emitted, 2);
        assert_eq!(summary.dangling_lines, 0);
        assert_eq!(output.split(|x| *x == b'\n').filter(|x| !x.is_empty()).count(), 2);
    }
}
