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

//! Lifecycle of a loaded reference index.
//!
//! A [ReferenceSession] is created by [open](ReferenceSession::open) and owns
//! the [Aligner] bound to the index until [close](ReferenceSession::close) is
//! called. If the session is dropped without being closed, for example when
//! the pipeline unwinds, the aligner is released in [Drop].
//!
//! Opening fails with a [SessionError] if the reference path is not a regular
//! file or if the index cannot be loaded. Callers are expected to carry on
//! without alignment in that case.
//!

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use crate::aligner::Aligner;
use crate::aligner::IndexLoader;

/// Reasons a [ReferenceSession] could not be opened.
#[derive(Debug)]
pub enum SessionError {
    /// The path does not name an existing regular file.
    InvalidPath(PathBuf),
    /// The file exists but the index could not be loaded from it.
    Load(PathBuf, String),
}

impl SessionError {
    pub fn path(
        &self,
    ) -> &Path {
        match self {
            SessionError::InvalidPath(path) => path,
            SessionError::Load(path, _) => path,
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SessionError::InvalidPath(path) => write!(f, "file not found at {}", path.display()),
            SessionError::Load(path, reason) => write!(f, "could not load reference index from {}: {}", path.display(), reason),
        }
    }
}

impl std::error::Error for SessionError {}

/// Timings recorded by a closed [ReferenceSession].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionTimings {
    /// Time spent loading the index.
    pub load: Duration,
    /// Time from the start of loading until the session was closed.
    pub total: Duration,
}

pub struct ReferenceSession<A: Aligner> {
    path: PathBuf,
    name: String,

    aligner: Option<A>,

    opened_at: Instant,
    load_duration: Duration,
}

impl<A: Aligner> ReferenceSession<A> {
    /// Loads the index at `path` with `loader` and binds an aligner to it.
    ///
    /// `path` must name an existing regular file.
    pub fn open<L: IndexLoader<Aligner = A>>(
        path: &Path,
        loader: &L,
    ) -> Result<Self, SessionError> {
        let opened_at = Instant::now();

        if !path.is_file() {
            return Err(SessionError::InvalidPath(path.to_path_buf()))
        }

        let name = path.file_name().map(|x| x.to_string_lossy().to_string()).unwrap_or_default();

        log::info!("Loading reference genome and its index from {}", path.display());
        let aligner = loader.load(path).map_err(|e| SessionError::Load(path.to_path_buf(), e.to_string()))?;
        let load_duration = opened_at.elapsed();

        log::info!("Time elapsed in loading genome: {}ms", load_duration.as_millis());

        Ok(ReferenceSession{
            path: path.to_path_buf(), name,
            aligner: Some(aligner),
            opened_at, load_duration,
        })
    }

    /// Base name of the reference file.
    pub fn name(
        &self,
    ) -> &str {
        &self.name
    }

    pub fn path(
        &self,
    ) -> &Path {
        &self.path
    }

    pub fn is_loaded(
        &self,
    ) -> bool {
        self.aligner.is_some()
    }

    pub fn load_duration(
        &self,
    ) -> Duration {
        self.load_duration
    }

    /// The aligner bound to the loaded index.
    pub fn aligner(
        &self,
    ) -> Option<&A> {
        self.aligner.as_ref()
    }

    /// Releases the index and the aligner.
    ///
    /// Consumes the session, so the resources can only be released once.
    pub fn close(
        mut self,
    ) -> SessionTimings {
        log::info!("Releasing reference genome {}", self.name);
        drop(self.aligner.take());
        SessionTimings{ load: self.load_duration, total: self.opened_at.elapsed() }
    }
}

impl<A: Aligner> Drop for ReferenceSession<A> {
    fn drop(&mut self) {
        if self.aligner.take().is_some() {
            log::warn!("Reference genome {} released without closing the session", self.name);
        }
    }
}
