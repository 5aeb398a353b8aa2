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
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use flate2::read::MultiGzDecoder;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone)]
pub struct InputNotFound {
    pub path: PathBuf,
}

impl std::fmt::Display for InputNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "input {} is not a file or a directory", self.path.display())
    }
}

impl std::error::Error for InputNotFound {}

/// Lists the input files at `path`.
///
/// If `path` is a file it is the only input. If it is a directory, all
/// regular files directly inside it are returned in lexicographic order,
/// skipping hidden files.
///
pub fn list_input_files(
    path: &Path,
) -> Result<Vec<PathBuf>, E> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()])
    }
    if !path.is_dir() {
        return Err(Box::new(InputNotFound{ path: path.to_path_buf() }))
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.path().is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    Ok(files)
}

/// Distributes `files` round-robin over at most `n_partitions` partitions.
///
/// Partitions that would receive no files are not returned.
pub fn partition_files(
    files: &[PathBuf],
    n_partitions: usize,
) -> Vec<Vec<PathBuf>> {
    let n_partitions = n_partitions.max(1).min(files.len().max(1));
    let mut partitions: Vec<Vec<PathBuf>> = vec![Vec::new(); n_partitions];
    files.iter().enumerate().for_each(|(idx, file)| {
        partitions[idx % n_partitions].push(file.clone());
    });
    partitions.retain(|partition| !partition.is_empty());
    partitions
}

fn open_lines(
    path: &Path,
) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let gzipped = path.extension().is_some_and(|ext| ext == "gz");
    if gzipped {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Removes a trailing `\n` or `\r\n` from `line`.
pub fn trim_line_ending(
    line: &mut Vec<u8>,
) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}

/// Iterator over the lines of several files, one file after another.
///
/// Lines are returned as raw bytes with the line terminator (`\n` or
/// `\r\n`) removed; no encoding is assumed. Files ending in `.gz` are
/// decompressed.
///
/// ## Usage
///
/// ```rust
/// use fqmap::io::source::LineSource;
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("b.fastq"), b"@r2\nGG\n+\nII\n").unwrap();
/// std::fs::write(dir.path().join("a.fastq"), b"@r1\nCC\n+\nII\n").unwrap();
///
/// let source = LineSource::from_path(dir.path()).unwrap();
/// let lines: Vec<Vec<u8>> = source.map(|line| line.unwrap()).collect();
///
/// assert_eq!(lines[0], b"@r1");
/// assert_eq!(lines[4], b"@r2");
/// assert_eq!(lines.len(), 8);
/// ```
///
pub struct LineSource {
    files: VecDeque<PathBuf>,
    current: Option<Box<dyn BufRead>>,
    buf: Vec<u8>,
}

impl LineSource {
    pub fn new(
        files: Vec<PathBuf>,
    ) -> Self {
        LineSource{ files: files.into(), current: None, buf: Vec::new() }
    }

    /// Reads every input file found by [list_input_files].
    pub fn from_path(
        path: &Path,
    ) -> Result<Self, E> {
        Ok(LineSource::new(list_input_files(path)?))
    }
}

impl Iterator for LineSource {
    type Item = std::io::Result<Vec<u8>>;

    fn next(
        &mut self,
    ) -> Option<std::io::Result<Vec<u8>>> {
        loop {
            if self.current.is_none() {
                let path = self.files.pop_front()?;
                log::debug!("Reading lines from {}", path.display());
                match open_lines(&path) {
                    Ok(reader) => self.current = Some(reader),
                    Err(e) => return Some(Err(e)),
                }
            }

            let reader = self.current.as_mut()?;
            self.buf.clear();
            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.current = None;
                },
                Ok(_) => {
                    trim_line_ending(&mut self.buf);
                    return Some(Ok(self.buf.clone()))
                },
                Err(e) => {
                    self.current = None;
                    return Some(Err(e))
                },
            }
        }
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn list_input_files_sorted_without_hidden() {
        use super::list_input_files;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample_2.fastq"), b"").unwrap();
        std::fs::write(dir.path().join("sample_1.fastq"), b"").unwrap();
        std::fs::write(dir.path().join(".sample_0.fastq.crc"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let got = list_input_files(dir.path()).unwrap();
        let expected = vec![dir.path().join("sample_1.fastq"), dir.path().join("sample_2.fastq")];

        assert_eq!(got, expected);
    }

    #[test]
    fn list_input_files_single_file() {
        use super::list_input_files;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fastq");
        std::fs::write(&path, b"@r1\n").unwrap();

        assert_eq!(list_input_files(&path).unwrap(), vec![path]);
    }

    #[test]
    fn list_input_files_missing() {
        use super::list_input_files;

        let dir = tempfile::tempdir().unwrap();

        assert!(list_input_files(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn partition_files_round_robin() {
        use super::partition_files;
        use std::path::PathBuf;

        let files: Vec<PathBuf> = (0..5).map(|idx| PathBuf::from(format!("{}.fastq", idx))).collect();

        let got = partition_files(&files, 2);
        let expected = vec![
            vec![files[0].clone(), files[2].clone(), files[4].clone()],
            vec![files[1].clone(), files[3].clone()],
        ];
        assert_eq!(got, expected);

        assert_eq!(partition_files(&files, 0).len(), 1);
        assert_eq!(partition_files(&files, 8).len(), 5);
        assert!(partition_files(&[], 4).is_empty());
    }

    #[test]
    fn lines_across_files_and_line_endings() {
        use super::LineSource;

        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.fastq");
        let second = dir.path().join("b.fastq");
        std::fs::write(&first, b"@r1\r\nACGT\r\n+\r\nIIII\r\n").unwrap();
        // No newline at the end of the file
        std::fs::write(&second, b"@r2\nTTTT\n+\nJJJJ").unwrap();

        let got: Vec<String> = LineSource::new(vec![first, second]).map(|line| String::from_utf8(line.unwrap()).unwrap()).collect();
        let expected = vec!["@r1", "ACGT", "+", "IIII", "@r2", "TTTT", "+", "JJJJ"];

        assert_eq!(got, expected);
    }

    #[test]
    fn lines_from_gzipped_file() {
        use super::LineSource;
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fastq.gz");

        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"@r1\nACGT\n+\nIIII\n").unwrap();
        encoder.finish().unwrap();

        let got: Vec<String> = LineSource::new(vec![path]).map(|line| String::from_utf8(line.unwrap()).unwrap()).collect();

        assert_eq!(got, vec!["@r1", "ACGT", "+", "IIII"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        use super::LineSource;
        use std::path::PathBuf;

        let mut source = LineSource::new(vec![PathBuf::from("/nonexistent/fqmap/reads.fastq")]);

        assert!(source.next().unwrap().is_err());
        assert!(source.next().is_none());
    }

    #[test]
    fn non_utf8_lines_are_returned_verbatim() {
        use super::LineSource;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fastq");
        std::fs::write(&path, b"@r1\nACGT\n+\nII\xffI\n@r2\n").unwrap();

        let got: Vec<Vec<u8>> = LineSource::new(vec![path]).map(|line| line.unwrap()).collect();

        assert_eq!(got.len(), 5);
        assert_eq!(got[3], b"II\xffI".to_vec());
        assert_eq!(got[4], b"@r2".to_vec());
    }

    #[test]
    fn trim_line_ending_variants() {
        use super::trim_line_ending;

        let mut unix = b"ACGT\n".to_vec();
        let mut windows = b"ACGT\r\n".to_vec();
        let mut bare = b"ACGT".to_vec();
        trim_line_ending(&mut unix);
        trim_line_ending(&mut windows);
        trim_line_ending(&mut bare);

        assert_eq!(unix, b"ACGT".to_vec());
        assert_eq!(windows, b"ACGT".to_vec());
        assert_eq!(bare, b"ACGT".to_vec());
    }
}
