//! This module is responsible for SRT parsing and the timestamp codec.
//! It exposes two parse variants: a lenient entry form used by the chunking
//! path and a numeric block form used by the merging path.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A raw subtitle record as extracted before timestamp parsing.
/// The index and timecode are opaque pass-through strings and are never
/// reformatted on output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrtEntry {
    pub index: String,
    pub timecode: String,
    pub text: String,
}

/// A subtitle record with decomposed timestamps, used by the merge path.
/// `start_ms`/`end_ms` are derived from the string forms at parse time;
/// `content` keeps internal newlines verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrtBlock {
    pub sequence_id: u32,
    pub start_time: String,
    pub end_time: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub content: String,
}

/// Parse SRT text into the lenient entry form.
/// Malformed blocks (fewer than three lines, bad timecode, empty fields)
/// are dropped without failing the parse; an empty result is a valid
/// outcome the caller must handle.
pub fn parse_entries(input: &str) -> Vec<SrtEntry> {
    let mut entries = Vec::new();
    for block in split_blocks(input) {
        let lines: Vec<&str> = block.split('\n').collect();
        if lines.len() < 3 {
            debug!("dropping block with {} lines", lines.len());
            continue;
        }
        let index = lines[0].trim();
        let timecode = lines[1].trim();
        let text = lines[2..].join("\n").trim().to_string();
        if index.is_empty() || text.is_empty() || parse_timecode(timecode).is_err() {
            debug!("dropping malformed block starting with {index:?}");
            continue;
        }
        entries.push(SrtEntry {
            index: index.to_string(),
            timecode: timecode.to_string(),
            text,
        });
    }
    entries
}

/// Parse SRT text into numeric blocks for the merge path.
/// The same tolerance rules apply as for entries, but the sequence number
/// must parse as an integer and the content is preserved without trimming.
pub fn parse_blocks(input: &str) -> Vec<SrtBlock> {
    let mut blocks = Vec::new();
    for block in split_blocks(input) {
        let lines: Vec<&str> = block.split('\n').collect();
        if lines.len() < 3 {
            continue;
        }
        let Ok(sequence_id) = lines[0].trim().parse::<u32>() else {
            debug!("dropping block with non-numeric index {:?}", lines[0]);
            continue;
        };
        let Ok((start_time, end_time)) = split_timecode(lines[1].trim()) else {
            debug!("dropping block {} with bad timecode", lines[0]);
            continue;
        };
        let start_ms = match parse_time(&start_time) {
            Ok(ms) => ms,
            Err(_) => continue,
        };
        let end_ms = match parse_time(&end_time) {
            Ok(ms) => ms,
            Err(_) => continue,
        };
        blocks.push(SrtBlock {
            sequence_id,
            start_time,
            end_time,
            start_ms,
            end_ms,
            content: lines[2..].join("\n"),
        });
    }
    blocks
}

/// Format blocks back to SRT text.
/// The way this works is by writing each block sequentially with blank
/// lines and trimming the trailing separator.
pub fn format_blocks(blocks: &[SrtBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            block.sequence_id, block.start_time, block.end_time, block.content
        ));
    }
    out.trim_end().to_string()
}

/// Split a document into blank-line separated blocks.
/// CRLF is normalized to LF first and runs of blank lines (including
/// whitespace-only lines) act as a single separator.
pub fn split_blocks(input: &str) -> Vec<String> {
    let normalized = input.replace("\r\n", "\n");
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in normalized.trim().split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

/// Parse a timecode line like `00:00:01,000 --> 00:00:02,000`.
pub fn parse_timecode(line: &str) -> Result<(u64, u64)> {
    let (start, end) = split_timecode(line)?;
    Ok((parse_time(&start)?, parse_time(&end)?))
}

/// Split a timecode line into its start and end timestamp strings,
/// validating both.
fn split_timecode(line: &str) -> Result<(String, String)> {
    let mut parts = line.split("-->");
    let start = parts.next().map(str::trim).unwrap_or_default();
    let end = parts
        .next()
        .map(str::trim)
        .ok_or_else(|| anyhow!("missing --> in timecode line {line:?}"))?;
    if parts.next().is_some() {
        return Err(anyhow!("multiple --> in timecode line {line:?}"));
    }
    parse_time(start)?;
    parse_time(end)?;
    Ok((start.to_string(), end.to_string()))
}

/// Parse `HH:MM:SS,mmm` into milliseconds.
/// Minutes, seconds and milliseconds are fixed-width; hours must be at
/// least two digits but may exceed 99.
pub fn parse_time(t: &str) -> Result<u64> {
    let parts: Vec<&str> = t.split([':', ',']).collect();
    if parts.len() != 4 {
        return Err(anyhow!("bad timestamp {t:?}"));
    }
    for (i, width) in [2usize, 2, 2, 3].into_iter().enumerate() {
        let field = parts[i];
        let width_ok = if i == 0 {
            field.len() >= width
        } else {
            field.len() == width
        };
        if !width_ok || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(anyhow!("bad timestamp field {field:?} in {t:?}"));
        }
    }
    let h: u64 = parts[0].parse()?;
    let m: u64 = parts[1].parse()?;
    let s: u64 = parts[2].parse()?;
    let ms: u64 = parts[3].parse()?;
    Ok(((h * 60 + m) * 60 + s) * 1000 + ms)
}

/// Format milliseconds back to `HH:MM:SS,mmm`.
pub fn format_time(ms: u64) -> String {
    let h = ms / 3_600_000;
    let m = (ms % 3_600_000) / 60_000;
    let s = (ms % 60_000) / 1000;
    let ms = ms % 1000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_roundtrip() {
        for t in ["00:00:00,000", "01:02:03,004", "23:59:59,999", "100:00:00,001"] {
            assert_eq!(format_time(parse_time(t).unwrap()), t);
        }
    }

    #[test]
    fn time_rejects_malformed() {
        for t in ["", "00:00:00.000", "0:00:00,000", "00:00:00,00", "aa:bb:cc,ddd"] {
            assert!(parse_time(t).is_err(), "accepted {t:?}");
        }
    }

    #[test]
    fn parses_entries_with_crlf_and_extra_blanks() {
        let input = "1\r\n00:00:00,000 --> 00:00:01,000\r\nHello\r\n\r\n\r\n2\r\n00:00:01,000 --> 00:00:02,000\r\nWorld\r\n";
        let entries = parse_entries(input);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].index, "1");
        assert_eq!(entries[0].timecode, "00:00:00,000 --> 00:00:01,000");
        assert_eq!(entries[1].text, "World");
    }

    #[test]
    fn drops_malformed_blocks_and_keeps_rest() {
        let input = "1\n00:00:00,000 --> 00:00:01,000\nok\n\n2\nno timecode here\nbad\n\n3\n00:00:02,000 --> 00:00:03,000\nalso ok\n\nlonely\n\n";
        let entries = parse_entries(input);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].index, "3");
    }

    #[test]
    fn empty_document_parses_to_nothing() {
        assert!(parse_entries("").is_empty());
        assert!(parse_blocks("\n\n  \n").is_empty());
    }

    #[test]
    fn blocks_keep_multiline_content_verbatim() {
        let input = "1\n00:00:00,500 --> 00:00:02,000\nfirst line\n  second line\n";
        let blocks = parse_blocks(input);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "first line\n  second line");
        assert_eq!(blocks[0].start_ms, 500);
        assert_eq!(blocks[0].end_ms, 2000);
        assert_eq!(blocks[0].start_time, "00:00:00,500");
    }

    #[test]
    fn blocks_require_numeric_index() {
        let input = "one\n00:00:00,000 --> 00:00:01,000\ntext\n";
        assert!(parse_blocks(input).is_empty());
        // The lenient entry form keeps the same record.
        assert_eq!(parse_entries(input).len(), 1);
    }

    #[test]
    fn format_blocks_reparses_identically() {
        let input = "1\n00:00:00,000 --> 00:00:01,000\nHello\nthere\n\n2\n00:00:01,000 --> 00:00:02,000\nWorld\n";
        let blocks = parse_blocks(input);
        let out = format_blocks(&blocks);
        assert_eq!(parse_blocks(&out), blocks);
    }
}
