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
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;

type E = Box<dyn std::error::Error>;

/// Path of the file written by partition `partition` out of `n_partitions`.
///
/// A single partition writes to `file_name` directly, otherwise the partition
/// index is appended as `<file_name>.<partition>`.
///
pub fn output_file_path(
    output_dir: &Path,
    file_name: &str,
    partition: usize,
    n_partitions: usize,
) -> PathBuf {
    if n_partitions <= 1 {
        output_dir.join(file_name)
    } else {
        output_dir.join(format!("{}.{}", file_name, partition))
    }
}

/// Creates `path` for writing, including any missing parent directories.
pub fn create_output_file(
    path: &Path,
) -> Result<BufWriter<File>, E> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    log::debug!("Writing records to {}", path.display());
    let f = File::create(path)?;
    Ok(BufWriter::new(f))
}
