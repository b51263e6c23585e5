//! C1: measurement calculator.
//!
//! Computes the size/line/block/binary tuple attached to find, create,
//! modify, and restore events. Never invoked for delete or move, which
//! carry no measurement (§3).

use crate::model::Measurement;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes sampled from the head of the file to decide binary-ness.
const SNIFF_LEN: usize = 8192;

/// Fraction of non-text-range bytes in the sniff window above which a file
/// is classified binary, absent a null byte.
const NON_TEXT_THRESHOLD: f64 = 0.30;

const BLOCK_SIZE: u64 = 512;

/// Measure a single file. Any read error is surfaced as `io::Error` for the
/// caller to fold into a `transient-io` log entry (§7) rather than abort.
pub fn measure(path: &Path) -> io::Result<Measurement> {
    let metadata = std::fs::metadata(path)?;
    let size_bytes = metadata.len();

    let mut file = File::open(path)?;
    let mut sniff = vec![0u8; SNIFF_LEN.min(size_bytes as usize)];
    let read = file.read(&mut sniff)?;
    sniff.truncate(read);

    let is_binary = looks_binary(&sniff);
    let (line_count, block_count) = if is_binary {
        (0, blocks_for(size_bytes))
    } else {
        let mut rest = Vec::new();
        file.read_to_end(&mut rest)?;
        let mut full = sniff;
        full.extend_from_slice(&rest);
        (count_lines(&full), blocks_for(size_bytes))
    };

    Ok(Measurement {
        size_bytes,
        line_count,
        block_count,
        is_binary,
    })
}

/// Null byte anywhere in the sniff window, or more than 30% of sampled bytes
/// fall outside the printable/whitespace ASCII range plus UTF-8 continuation
/// bytes.
fn looks_binary(sample: &[u8]) -> bool {
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }
    let non_text = sample.iter().filter(|&&b| !is_text_byte(b)).count();
    (non_text as f64 / sample.len() as f64) > NON_TEXT_THRESHOLD
}

fn is_text_byte(b: u8) -> bool {
    matches!(b, 0x09 | 0x0A | 0x0D | 0x20..=0x7E | 0x80..=0xFF)
}

/// `\n` count plus one; an empty file counts as one line (§3 edge case).
fn count_lines(bytes: &[u8]) -> u64 {
    if bytes.is_empty() {
        return 1;
    }
    bytes.iter().filter(|&&b| b == b'\n').count() as u64 + 1
}

/// `ceil(size / 512)`; an empty file occupies zero blocks.
fn blocks_for(size_bytes: u64) -> u64 {
    if size_bytes == 0 {
        0
    } else {
        (size_bytes + BLOCK_SIZE - 1) / BLOCK_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn empty_file_has_one_line_zero_blocks() {
        let f = write_tmp(b"");
        let m = measure(f.path()).unwrap();
        assert_eq!(m.size_bytes, 0);
        assert_eq!(m.line_count, 1);
        assert_eq!(m.block_count, 0);
        assert!(!m.is_binary);
    }

    #[test]
    fn text_file_counts_lines_and_blocks() {
        let f = write_tmp(b"one\ntwo\nthree");
        let m = measure(f.path()).unwrap();
        assert_eq!(m.line_count, 3);
        assert_eq!(m.block_count, 1);
        assert!(!m.is_binary);
    }

    #[test]
    fn trailing_newline_still_counts_the_newline() {
        let f = write_tmp(b"one\ntwo\n");
        let m = measure(f.path()).unwrap();
        assert_eq!(m.line_count, 3);
    }

    #[test]
    fn null_byte_marks_binary() {
        let f = write_tmp(b"abc\0def");
        let m = measure(f.path()).unwrap();
        assert!(m.is_binary);
        assert_eq!(m.line_count, 0);
    }

    #[test]
    fn high_ratio_non_text_marks_binary() {
        let bytes: Vec<u8> = (0u8..=0x08).cycle().take(1000).collect();
        let f = write_tmp(&bytes);
        let m = measure(f.path()).unwrap();
        assert!(m.is_binary);
    }

    #[test]
    fn block_count_rounds_up() {
        assert_eq!(blocks_for(0), 0);
        assert_eq!(blocks_for(1), 1);
        assert_eq!(blocks_for(512), 1);
        assert_eq!(blocks_for(513), 2);
        assert_eq!(blocks_for(1024), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = measure(Path::new("/nonexistent/path/for/measurement-test"));
        assert!(result.is_err());
    }
}
