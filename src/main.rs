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
use std::path::Path;
use std::path::PathBuf;

use clap::CommandFactory;
use clap::Parser;
use rayon::prelude::*;

use fqmap::aligner::kmer::KmerLoader;
use fqmap::io::sink::create_output_file;
use fqmap::io::sink::output_file_path;
use fqmap::io::source::list_input_files;
use fqmap::io::source::partition_files;
use fqmap::io::source::LineSource;
use fqmap::mapper::MapperConfig;
use fqmap::mapper::MapperSummary;

mod cli;

type E = Box<dyn std::error::Error>;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init()
    .unwrap();
}

/// Runs one pipeline instance over `files` and writes the records to `out_path`.
fn map_partition(
    config: &MapperConfig,
    loader: &KmerLoader,
    files: &[PathBuf],
    out_path: &Path,
) -> Result<MapperSummary, E> {
    let mut conn_out = create_output_file(out_path)?;
    let mut source = LineSource::new(files.to_vec());
    fqmap::map_from_source_to_write(config, loader, &mut source, &mut conn_out)
}

fn run_map(
    input_dir: &Path,
    reference_file: &Path,
    output_dir: &Path,
    output_name: &str,
    n_partitions: usize,
    kmer_size: usize,
    min_score: i32,
) -> Result<(), E> {
    let files = list_input_files(input_dir)?;
    if files.is_empty() {
        log::warn!("No input files found in {}", input_dir.display());
    }

    let mut partitions = partition_files(&files, n_partitions);
    if partitions.is_empty() {
        partitions.push(Vec::new());
    }
    let n_partitions = partitions.len();

    let config = MapperConfig{ reference_file_path: reference_file.to_path_buf() };
    let loader = KmerLoader{ k: kmer_size, min_score, ..Default::default() };

    let pool = rayon::ThreadPoolBuilder::new().num_threads(n_partitions).build()?;
    let summaries: Vec<MapperSummary> = pool.install(|| {
        partitions.par_iter().enumerate().map(|(idx, files)| {
            let out_path = output_file_path(output_dir, output_name, idx, n_partitions);
            map_partition(&config, &loader, files, &out_path).map_err(|e| format!("partition {}: {}", idx, e))
        }).collect::<Result<Vec<MapperSummary>, String>>()
    })?;

    if n_partitions > 1 {
        let reads: u64 = summaries.iter().map(|x| x.reads_assembled).sum();
        let records: u64 = summaries.iter().map(|x| x.records_emitted).sum();
        log::info!("Mapped {} reads into {} records over {} partitions", reads, records, n_partitions);
    }

    Ok(())
}

fn main() {
    let cli = cli::Cli::parse();

    // Subcommands:
    match &cli.command {
        // Map
        Some(cli::Commands::Map {
            input_dir,
            reference_file,
            output_dir,
            output_name,
            partitions,
            kmer_size,
            min_score,
            verbose,
        }) => {
            init_log(if *verbose { 3 } else { 2 });

            if let Err(e) = run_map(input_dir, reference_file, output_dir, output_name, *partitions, *kmer_size, *min_score) {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => {
            let _ = cli::Cli::command().print_help();
        },
    }
}
