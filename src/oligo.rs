//! Oligo text format
//!
//! One strand per line: `<primer_5><bases><primer_3>`, with digits mapped
//! as 0 -> A, 1 -> T, 2 -> G, 3 -> C. Reads coming back from sequencing
//! may carry `N` for an uncalled base, which is read as 0.

use std::io::{BufRead, Write};

use crate::config::OligoConfig;
use crate::error::{Error, Result};

const BASES: [char; 4] = ['A', 'T', 'G', 'C'];

/// Nucleotide for a quaternary digit
pub fn digit_to_base(digit: u8) -> char {
    BASES[usize::from(digit & 0b11)]
}

/// Quaternary digit for a nucleotide (case-insensitive, `N` -> 0)
pub fn base_to_digit(base: char) -> Option<u8> {
    match base.to_ascii_uppercase() {
        'A' | 'N' => Some(0),
        'T' => Some(1),
        'G' => Some(2),
        'C' => Some(3),
        _ => None,
    }
}

/// Map digits to a base string
pub fn to_bases(digits: &[u8]) -> String {
    digits.iter().map(|&d| digit_to_base(d)).collect()
}

/// Map a base string to digits
pub fn to_digits(bases: &str) -> Result<Vec<u8>> {
    bases
        .chars()
        .enumerate()
        .map(|(position, c)| base_to_digit(c).ok_or(Error::InvalidSymbol { symbol: c, position }))
        .collect()
}

/// Render a codeword as a primed oligo line (no newline)
pub fn format_line(codeword: &[u8], primers: &OligoConfig) -> String {
    let mut line =
        String::with_capacity(primers.primer_5.len() + codeword.len() + primers.primer_3.len());
    line.push_str(&primers.primer_5);
    line.push_str(&to_bases(codeword));
    line.push_str(&primers.primer_3);
    line
}

/// Parse one read line into digits
///
/// Primers are stripped when present at either end; reads that were
/// already trimmed are taken as-is.
pub fn parse_line(line: &str, primers: &OligoConfig) -> Result<Vec<u8>> {
    let mut body = line.trim();
    if !primers.primer_5.is_empty() {
        body = body.strip_prefix(primers.primer_5.as_str()).unwrap_or(body);
    }
    if !primers.primer_3.is_empty() {
        body = body.strip_suffix(primers.primer_3.as_str()).unwrap_or(body);
    }
    to_digits(body)
}

/// Write every codeword as an oligo line
pub fn write_pool<W: Write>(mut out: W, codewords: &[Vec<u8>], primers: &OligoConfig) -> Result<()> {
    for codeword in codewords {
        writeln!(out, "{}", format_line(codeword, primers))?;
    }
    out.flush()?;
    Ok(())
}

/// Read every non-empty line as a read
pub fn read_pool<R: BufRead>(input: R, primers: &OligoConfig) -> Result<Vec<Vec<u8>>> {
    let mut reads = Vec::new();
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        reads.push(parse_line(&line, primers)?);
    }
    Ok(reads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping() {
        assert_eq!(to_bases(&[0, 1, 2, 3]), "ATGC");
        assert_eq!(to_digits("ATGC").unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(to_digits("atgcN").unwrap(), vec![0, 1, 2, 3, 0]);
        assert!(matches!(
            to_digits("ATXG"),
            Err(Error::InvalidSymbol { symbol: 'X', position: 2 })
        ));
    }

    #[test]
    fn test_line_with_primers() {
        let primers = OligoConfig::default();
        let line = format_line(&[3, 2, 1, 0], &primers);
        assert!(line.starts_with("CCACGCGTACCGATAGCTTCAG"));
        assert!(line.ends_with("CGTAGCAATTGACCCACGCATGTATC"));
        assert_eq!(parse_line(&line, &primers).unwrap(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_trimmed_read() {
        let primers = OligoConfig::default();
        assert_eq!(parse_line("GCAT\n", &primers).unwrap(), vec![2, 3, 0, 1]);
    }

    #[test]
    fn test_pool_io() {
        let primers = OligoConfig {
            primer_5: "AA".to_string(),
            primer_3: "CC".to_string(),
        };
        let codewords = vec![vec![1, 2, 3], vec![0, 0, 1, 1]];

        let mut buf = Vec::new();
        write_pool(&mut buf, &codewords, &primers).unwrap();
        assert_eq!(String::from_utf8(buf.clone()).unwrap(), "AATGCCC\nAAAATTCC\n");

        let mut text = buf;
        text.extend_from_slice(b"\n  \n");
        let reads = read_pool(&text[..], &primers).unwrap();
        assert_eq!(reads, codewords);
    }
}
