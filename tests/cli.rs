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

//! End-to-end runs of the `fqmap map` command.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

// Deterministic pseudo-random sequence
fn random_seq(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..len).map(|_| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        b"ACGT"[(state >> 62) as usize]
    }).collect()
}

fn write_reference(path: &Path, seq: &[u8]) {
    let mut contents: Vec<u8> = b">chr1 test contig\n".to_vec();
    for line in seq.chunks(60) {
        contents.extend_from_slice(line);
        contents.push(b'\n');
    }
    std::fs::write(path, contents).unwrap();
}

fn fastq_record(id: &str, bases: &[u8]) -> String {
    format!("{}\n{}\n+\n{}\n", id, String::from_utf8_lossy(bases), "I".repeat(bases.len()))
}

#[test]
fn map_directory_of_fastq_files() {
    let dir = tempfile::tempdir().unwrap();
    let reference = random_seq(1200, 101);
    write_reference(&dir.path().join("ref.fasta"), &reference);

    let reads_dir = dir.path().join("reads");
    std::fs::create_dir(&reads_dir).unwrap();
    std::fs::write(reads_dir.join("a.fastq"), fastq_record("@a1", &reference[100..140])).unwrap();
    let second = fastq_record("@b1", &reference[500..545]) + &fastq_record("@b2", &reference[900..940]);
    std::fs::write(reads_dir.join("b.fastq"), second).unwrap();

    Command::cargo_bin("fqmap").unwrap()
        .arg("map")
        .arg("--input").arg(&reads_dir)
        .arg("--reference").arg(dir.path().join("ref.fasta"))
        .arg("--output-dir").arg(dir.path().join("out"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Time elapsed in loading genome"));

    let output = std::fs::read_to_string(dir.path().join("out").join("aligned.sam")).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], format!("@a1\t40\tchr1\t101\t60\t40M\t*\t0\t0\t{}\t{}\tNM:i:0", String::from_utf8_lossy(&reference[100..140]), "I".repeat(40)));
    assert!(lines[1].starts_with("@b1\t45\tchr1\t501\t60\t45M\t"));
    assert!(lines[2].starts_with("@b2\t40\tchr1\t901\t"));
}

#[test]
fn map_with_missing_reference() {
    let dir = tempfile::tempdir().unwrap();
    let reads = dir.path().join("reads.fastq");
    std::fs::write(&reads, fastq_record("@r1", b"ACGTACGTACGTACGTACGTACGTACGTACGTACGT")).unwrap();

    Command::cargo_bin("fqmap").unwrap()
        .arg("map")
        .arg("--input").arg(&reads)
        .arg("--reference").arg(dir.path().join("missing.fasta"))
        .arg("--output-dir").arg(dir.path().join("out"))
        .assert()
        .success()
        .stderr(predicate::str::contains("file not found at"));

    let output = std::fs::read_to_string(dir.path().join("out").join("aligned.sam")).unwrap();
    assert!(output.is_empty());
}

#[test]
fn map_with_partitions() {
    let dir = tempfile::tempdir().unwrap();
    let reference = random_seq(1000, 103);
    write_reference(&dir.path().join("ref.fasta"), &reference);

    let reads_dir = dir.path().join("reads");
    std::fs::create_dir(&reads_dir).unwrap();
    std::fs::write(reads_dir.join("1.fastq"), fastq_record("@p1", &reference[10..50])).unwrap();
    std::fs::write(reads_dir.join("2.fastq"), fastq_record("@p2", &reference[200..240])).unwrap();
    std::fs::write(reads_dir.join("3.fastq"), fastq_record("@p3", &reference[400..440])).unwrap();

    Command::cargo_bin("fqmap").unwrap()
        .arg("map")
        .arg("-i").arg(&reads_dir)
        .arg("-r").arg(dir.path().join("ref.fasta"))
        .arg("-o").arg(dir.path().join("out"))
        .arg("--output-name").arg("part.sam")
        .arg("--partitions").arg("2")
        .assert()
        .success();

    let first = std::fs::read_to_string(dir.path().join("out").join("part.sam.0")).unwrap();
    let second = std::fs::read_to_string(dir.path().join("out").join("part.sam.1")).unwrap();

    let first_ids: Vec<&str> = first.lines().map(|x| x.split('\t').next().unwrap()).collect();
    let second_ids: Vec<&str> = second.lines().map(|x| x.split('\t').next().unwrap()).collect();

    assert_eq!(first_ids, vec!["@p1", "@p3"]);
    assert_eq!(second_ids, vec!["@p2"]);
}

#[test]
fn map_requires_reference() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("fqmap").unwrap()
        .arg("map")
        .arg("--input").arg(dir.path())
        .arg("--output-dir").arg(dir.path().join("out"))
        .assert()
        .failure();
}
