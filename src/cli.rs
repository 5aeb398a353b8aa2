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
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Align FASTQ reads to a reference genome
    Map {
        // Directory containing the FASTQ files, or a single FASTQ file
        #[arg(short = 'i', long = "input", required = true, help = "Input directory or file")]
        input_dir: PathBuf,

        // Reference genome in FASTA format
        #[arg(short = 'r', long = "reference", required = true, help = "Reference genome file")]
        reference_file: PathBuf,

        // Directory the records are written to
        #[arg(short = 'o', long = "output-dir", required = true, help = "Output directory")]
        output_dir: PathBuf,

        // Name of the output file, suffixed with the partition index if there are several
        #[arg(long = "output-name", default_value = "aligned.sam")]
        output_name: String,

        // Number of independent pipeline instances
        #[arg(short = 'p', long = "partitions", default_value_t = 1)]
        partitions: usize,

        // Seed length
        #[arg(short = 'k', long = "kmer-size", default_value_t = 15)]
        kmer_size: usize,

        // Minimum alignment score
        #[arg(long = "min-score", default_value_t = 30)]
        min_score: i32,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}
