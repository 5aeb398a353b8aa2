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

//! Mapper for driving a single pipeline instance from lines to records.
//!
//! A [Mapper] goes through the states
//!
//! `Created -> Activating -> Ready -> Processing -> Deactivating -> Closed`
//!
//! [activate](Mapper::activate) opens the [ReferenceSession]. If the reference
//! cannot be opened the mapper is still Ready but degraded: lines are consumed
//! and reads assembled, but nothing is aligned or written.
//!
//! [process](Mapper::process) consumes one line and writes the records for the
//! read it completed, if any, before returning.
//!
//! [deactivate](Mapper::deactivate) closes the session, logs a summary of the
//! run and returns it as a [MapperSummary]. The mapper cannot be reused.
//!
//! ## Usage
//!
//! ```rust
//! use fqmap::aligner::kmer::KmerLoader;
//! use fqmap::mapper::{Mapper, MapperConfig, State};
//! use std::path::PathBuf;
//!
//! let config = MapperConfig{ reference_file_path: PathBuf::from("/nonexistent/reference.fasta") };
//! let loader = KmerLoader::default();
//!
//! let mut mapper = Mapper::new(config, &loader);
//! mapper.activate().unwrap();
//! assert_eq!(mapper.state(), State::Ready);
//! assert!(mapper.is_degraded());
//!
//! let mut output: Vec<u8> = Vec::new();
//! for line in ["@r1", "ACGT", "+", "IIII"] {
//!     mapper.process(line, &mut output).unwrap();
//! }
//!
//! let summary = mapper.deactivate().unwrap();
//! assert_eq!(mapper.state(), State::Closed);
//! assert_eq!(summary.reads_assembled, 1);
//! assert!(output.is_empty());
//! ```
//!

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use crate::aligner::IndexLoader;
use crate::assembler::ReadAssembler;
use crate::invoker::align_primary;
use crate::invoker::Alignment;
use crate::printer::format_sam_line;
use crate::reference::ReferenceSession;
use crate::reference::SessionError;

type E = Box<dyn std::error::Error>;

/// Settings consumed by a [Mapper].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MapperConfig {
    /// Path to the reference genome the index is loaded from.
    pub reference_file_path: PathBuf,
}

/// Lifecycle states of a [Mapper].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    Created,
    Activating,
    Ready,
    Processing,
    Deactivating,
    Closed,
}

/// A lifecycle method was called in a state that does not allow it.
#[derive(Debug, Clone)]
pub struct LifecycleError {
    pub operation: &'static str,
    pub state: State,
}

impl std::fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "cannot {} a mapper in state {:?}", self.operation, self.state)
    }
}

impl std::error::Error for LifecycleError {}

/// Statistics and timings of a finished [Mapper].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MapperSummary {
    /// Number of complete reads assembled from the input.
    pub reads_assembled: u64,
    /// Number of records written.
    pub records_emitted: u64,
    /// Number of reads the aligner failed on.
    pub reads_failed: u64,
    /// Number of lines left over from an incomplete final record.
    pub dangling_lines: u64,
    /// Time spent loading the reference, None if it was never loaded.
    pub reference_load_time: Option<Duration>,
    /// Time from the end of activation until deactivation.
    pub mapping_time: Duration,
    /// Time from the start of activation until deactivation.
    pub total_time: Duration,
    /// Why the mapper ran without alignment, if it did.
    pub degraded: Option<String>,
}

pub struct Mapper<'a, L: IndexLoader> {
    // Inputs
    config: MapperConfig,
    loader: &'a L,

    state: State,
    assembler: ReadAssembler,
    session: Option<ReferenceSession<L::Aligner>>,
    degraded: Option<SessionError>,

    // Counters
    records_emitted: u64,
    reads_failed: u64,

    // Timers
    activated_at: Option<Instant>,
    mapping_started_at: Option<Instant>,
}

impl<'a, L: IndexLoader> Mapper<'a, L> {
    pub fn new(
        config: MapperConfig,
        loader: &'a L,
    ) -> Self {
        Mapper{
            config, loader,
            state: State::Created,
            assembler: ReadAssembler::new(),
            session: None, degraded: None,
            records_emitted: 0, reads_failed: 0,
            activated_at: None, mapping_started_at: None,
        }
    }
}

impl<L: IndexLoader> Mapper<'_, L> {
    pub fn state(
        &self,
    ) -> State {
        self.state
    }

    /// True if the reference could not be opened.
    pub fn is_degraded(
        &self,
    ) -> bool {
        self.degraded.is_some()
    }

    pub fn config(
        &self,
    ) -> &MapperConfig {
        &self.config
    }

    /// Opens the reference session.
    ///
    /// Failing to open the reference is not an error. The mapper becomes
    /// degraded for the rest of its lifetime instead.
    pub fn activate(
        &mut self,
    ) -> Result<(), LifecycleError> {
        if self.state != State::Created {
            return Err(LifecycleError{ operation: "activate", state: self.state })
        }
        self.state = State::Activating;
        self.activated_at = Some(Instant::now());

        match ReferenceSession::open(&self.config.reference_file_path, self.loader) {
            Ok(session) => {
                log::info!("Beginning to map reads to reference genome {}", session.name());
                self.session = Some(session);
            },
            Err(e) => {
                log::error!("Invalid reference: {}", e);
                self.degraded = Some(e);
            },
        }

        self.mapping_started_at = Some(Instant::now());
        self.state = State::Ready;
        Ok(())
    }

    /// Consumes one line and writes the records of the read it completed.
    ///
    /// `line` is the raw line without its terminator. Returns the number of
    /// records written to `conn`.
    pub fn process<T: AsRef<[u8]>, W: Write>(
        &mut self,
        line: T,
        conn: &mut W,
    ) -> Result<usize, E> {
        match self.state {
            State::Ready | State::Processing => self.state = State::Processing,
            state => return Err(Box::new(LifecycleError{ operation: "process", state })),
        }

        let Some(read) = self.assembler.push(line) else { return Ok(0) };

        let Some(aligner) = self.session.as_ref().and_then(|session| session.aligner()) else { return Ok(0) };

        let alignment = align_primary(&read, aligner);
        if alignment == Alignment::Failed {
            self.reads_failed += 1;
        }

        let regions = alignment.regions();
        for region in regions {
            format_sam_line(&read, region, conn)?;
        }
        self.records_emitted += regions.len() as u64;

        Ok(regions.len())
    }

    /// Closes the reference session and reports the run.
    pub fn deactivate(
        &mut self,
    ) -> Result<MapperSummary, LifecycleError> {
        match self.state {
            State::Ready | State::Processing => self.state = State::Deactivating,
            state => return Err(LifecycleError{ operation: "deactivate", state }),
        }

        let mapping_time = self.mapping_started_at.map(|x| x.elapsed()).unwrap_or_default();
        let total_time = self.activated_at.map(|x| x.elapsed()).unwrap_or_default();

        let reference_load_time = self.session.take().map(|session| {
            log::info!("Teardown of mapping operation started");
            let timings = session.close();
            log::info!("Teardown of mapping operation finished");
            timings.load
        });

        let dangling_lines = self.assembler.pending_lines();
        if dangling_lines > 0 {
            log::warn!("Discarded {} trailing line(s) that do not form a complete FASTQ record", dangling_lines);
        }

        let summary = MapperSummary{
            reads_assembled: self.assembler.reads_assembled(),
            records_emitted: self.records_emitted,
            reads_failed: self.reads_failed,
            dangling_lines,
            reference_load_time,
            mapping_time,
            total_time,
            degraded: self.degraded.as_ref().map(|e| e.to_string()),
        };

        match (&self.degraded, summary.reference_load_time) {
            (Some(e), _) => log::info!("Mapping operation unsuccessful: {}", e),
            (None, Some(load_time)) => {
                log::info!("**********************SUMMARY**********************");
                log::info!("Time elapsed in loading genome: {}ms", load_time.as_millis());
                log::info!("Time elapsed in mapping reads to genome: {}ms", summary.mapping_time.as_millis());
                log::info!("Total time taken by the mapper: {}ms", summary.total_time.as_millis());
                log::info!("Reads: {}, records: {}, failed alignments: {}", summary.reads_assembled, summary.records_emitted, summary.reads_failed);
            },
            (None, None) => {},
        }

        self.state = State::Closed;
        Ok(summary)
    }
}
