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

//! Exact k-mer seeding with ungapped extension.
//!
//! [KmerLoader] reads a FASTA (or gzipped FASTA) reference and indexes every
//! k-mer of every contig in memory. [KmerAligner] seeds a read on both
//! strands, extends each seed over the full read length without gaps, and
//! scores the result with +1 per match and -4 per mismatch.
//!
//! Hits are reported best first. The best hit is the primary alignment and
//! all other hits are secondary. Because alignments are ungapped, the cigar is
//! always `<read length>M` and the edit distance is the number of mismatches.
//!
//! ## Usage
//!
//! ```rust
//! use fqmap::ShortRead;
//! use fqmap::aligner::Aligner;
//! use fqmap::aligner::kmer::{KmerAligner, KmerLoader};
//! use indexmap::IndexMap;
//!
//! let mut contigs: IndexMap<String, Vec<u8>> = IndexMap::new();
//! contigs.insert("chr1".to_string(), b"TTTTTGATTACAGATTACACCGGAAAAA".to_vec());
//!
//! let loader = KmerLoader{ k: 5, min_score: 10, ..Default::default() };
//! let aligner = KmerAligner::from_contigs(contigs, &loader).unwrap();
//!
//! let read = ShortRead::new("@r1", b"GATTACAGATTACACCGG", b"IIIIIIIIIIIIIIIIII");
//! let regions = aligner.align(&read).unwrap();
//!
//! assert_eq!(regions[0].chrom, "chr1");
//! assert_eq!(regions[0].pos, 6);
//! assert_eq!(regions[0].cigar, "18M");
//! ```
//!

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;

use crate::AlignmentRegion;
use crate::ShortRead;
use crate::aligner::Aligner;
use crate::aligner::IndexLoader;

type E = Box<dyn std::error::Error>;

const MATCH_SCORE: i32 = 1;
const MISMATCH_PENALTY: i32 = 4;
const MAX_MAPQ: i32 = 60;

#[derive(Debug, Clone)]
pub struct InvalidKmerSize {
    pub k: usize,
}

impl std::fmt::Display for InvalidKmerSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "k-mer size must be between 1 and 32, got {}", self.k)
    }
}

impl std::error::Error for InvalidKmerSize {}

#[derive(Debug, Clone)]
pub struct EmptyReference;

impl std::fmt::Display for EmptyReference {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "reference contains no sequences")
    }
}

impl std::error::Error for EmptyReference {}

#[derive(Debug, Clone)]
pub struct DuplicateContig {
    pub name: String,
}

impl std::fmt::Display for DuplicateContig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "contig name {} appears more than once in the reference", self.name)
    }
}

impl std::error::Error for DuplicateContig {}

/// Settings for building a [KmerAligner].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KmerLoader {
    /// Seed length, at most 32.
    pub k: usize,
    /// Hits scoring below this are discarded.
    pub min_score: i32,
    /// Maximum number of hits reported per read.
    pub max_hits: usize,
    /// Seeds occurring more often than this in the reference are skipped.
    pub max_occurrences: usize,
}

impl Default for KmerLoader {
    fn default() -> Self {
        KmerLoader{ k: 15, min_score: 30, max_hits: 5, max_occurrences: 500 }
    }
}

impl IndexLoader for KmerLoader {
    type Aligner = KmerAligner;

    fn load(
        &self,
        path: &Path,
    ) -> Result<KmerAligner, E> {
        let mut reader = needletail::parse_fastx_file(path)?;

        let mut contigs: IndexMap<String, Vec<u8>> = IndexMap::new();
        while let Some(record) = reader.next() {
            let record = record?;
            // Contig name is the first word of the header
            let header = String::from_utf8_lossy(record.id()).to_string();
            let name = header.split_whitespace().next().unwrap_or_default().to_string();
            if contigs.contains_key(&name) {
                return Err(Box::new(DuplicateContig{ name }))
            }
            contigs.insert(name, record.seq().to_ascii_uppercase());
        }

        KmerAligner::from_contigs(contigs, self)
    }
}

// A candidate placement before conversion to AlignmentRegion
#[derive(Clone, Debug)]
struct Hit {
    contig: usize,
    start: usize,
    mismatches: i32,
    score: i32,
}

pub struct KmerAligner {
    contigs: IndexMap<String, Vec<u8>>,
    // k-mer -> (contig index, offset)
    index: HashMap<u64, Vec<(usize, usize)>>,

    k: usize,
    min_score: i32,
    max_hits: usize,
    max_occurrences: usize,
}

impl KmerAligner {
    /// Indexes `contigs` using the settings in `loader`.
    pub fn from_contigs(
        contigs: IndexMap<String, Vec<u8>>,
        loader: &KmerLoader,
    ) -> Result<Self, E> {
        if loader.k == 0 || loader.k > 32 {
            return Err(Box::new(InvalidKmerSize{ k: loader.k }))
        }
        if contigs.is_empty() {
            return Err(Box::new(EmptyReference{}))
        }

        let mut index: HashMap<u64, Vec<(usize, usize)>> = HashMap::new();
        contigs.values().enumerate().for_each(|(contig_idx, seq)| {
            for (offset, kmer) in encode_kmers(seq, loader.k) {
                index.entry(kmer).or_default().push((contig_idx, offset));
            }
        });

        let n_bases: usize = contigs.values().map(|seq| seq.len()).sum();
        log::debug!("Indexed {} contig(s), {} bp, {} distinct {}-mers", contigs.len(), n_bases, index.len(), loader.k);

        Ok(KmerAligner{
            contigs, index,
            k: loader.k, min_score: loader.min_score,
            max_hits: loader.max_hits, max_occurrences: loader.max_occurrences,
        })
    }

    /// Names of the indexed contigs in the order they were loaded.
    pub fn contig_names(
        &self,
    ) -> Vec<String> {
        self.contigs.keys().cloned().collect()
    }

    // Ungapped extension of `query` placed at `start` on contig `contig`
    fn extend(
        &self,
        contig: usize,
        start: i64,
        query: &[u8],
    ) -> Option<Hit> {
        let (_, target) = self.contigs.get_index(contig)?;
        if start < 0 || start as usize + query.len() > target.len() {
            return None
        }
        let start = start as usize;

        let mismatches = query.iter().zip(target[start..(start + query.len())].iter()).filter(|(q, t)| {
            *q != *t || **q == b'N'
        }).count() as i32;
        let matches = query.len() as i32 - mismatches;
        let score = matches * MATCH_SCORE - mismatches * MISMATCH_PENALTY;

        if score < self.min_score {
            return None
        }

        Some(Hit{ contig, start, mismatches, score })
    }
}

impl Aligner for KmerAligner {
    fn align(
        &self,
        read: &ShortRead,
    ) -> std::io::Result<Vec<AlignmentRegion>> {
        let forward = read.bases.to_ascii_uppercase();
        let reverse = reverse_complement(&forward);

        let mut hits: Vec<Hit> = Vec::new();
        for query in [&forward, &reverse] {
            let mut seen: HashSet<(usize, i64)> = HashSet::new();
            for (offset, kmer) in encode_kmers(query, self.k) {
                let Some(positions) = self.index.get(&kmer) else { continue };
                if positions.len() > self.max_occurrences {
                    continue;
                }
                for &(contig, pos) in positions {
                    let start = pos as i64 - offset as i64;
                    if !seen.insert((contig, start)) {
                        continue;
                    }
                    if let Some(hit) = self.extend(contig, start, query) {
                        hits.push(hit);
                    }
                }
            }
        }

        hits.sort_by(|a, b| {
            b.score.cmp(&a.score)
                .then(a.mismatches.cmp(&b.mismatches))
                .then(a.contig.cmp(&b.contig))
                .then(a.start.cmp(&b.start))
        });
        // Reads equal to their own reverse complement hit the same placement on both strands
        let mut placements: HashSet<(usize, usize)> = HashSet::new();
        hits.retain(|hit| placements.insert((hit.contig, hit.start)));
        hits.truncate(self.max_hits);

        let best = hits.first().map(|hit| hit.score);
        let second = hits.get(1).map(|hit| hit.score);
        let map_qual = mapping_quality(best, second);

        let regions = hits.iter().enumerate().map(|(idx, hit)| {
            let chrom = self.contigs.get_index(hit.contig).map(|(name, _)| name.clone()).unwrap_or_default();
            AlignmentRegion{
                chrom,
                pos: hit.start as i64 + 1,
                cigar: format!("{}M", read.bases.len()),
                map_qual: if idx == 0 { map_qual } else { 0 },
                align_score: hit.score,
                edit_distance: hit.mismatches,
                is_secondary: idx > 0,
            }
        }).collect::<Vec<AlignmentRegion>>();

        Ok(regions)
    }
}

fn mapping_quality(
    best: Option<i32>,
    second: Option<i32>,
) -> i32 {
    match (best, second) {
        (None, _) => 0,
        (Some(_), None) => MAX_MAPQ,
        (Some(best), Some(second)) => ((best - second) * 6).clamp(0, MAX_MAPQ),
    }
}

fn encode_base(
    base: u8,
) -> Option<u64> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

/// Returns every k-mer in `seq` 2-bit packed, paired with its offset.
///
/// k-mers overlapping a non-ACGT base are skipped.
pub fn encode_kmers(
    seq: &[u8],
    k: usize,
) -> Vec<(usize, u64)> {
    let mask: u64 = if k >= 32 { u64::MAX } else { (1_u64 << (2 * k)) - 1 };
    let mut kmers: Vec<(usize, u64)> = Vec::new();

    let mut kmer: u64 = 0;
    let mut valid: usize = 0;
    seq.iter().enumerate().for_each(|(idx, base)| {
        if let Some(code) = encode_base(*base) {
            kmer = ((kmer << 2) | code) & mask;
            valid += 1;
            if valid >= k {
                kmers.push((idx + 1 - k, kmer));
            }
        } else {
            kmer = 0;
            valid = 0;
        }
    });

    kmers
}

pub fn reverse_complement(
    seq: &[u8],
) -> Vec<u8> {
    seq.iter().rev().map(|base| {
        match base {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            b'a' => b't',
            b'c' => b'g',
            b'g' => b'c',
            b't' => b'a',
            other => *other,
        }
    }).collect()
}
