//! Recombining chunk artifacts into SRT text and merging whole files.
//! Both operations are pure string transformations over parsed input.

use crate::srt::{split_blocks, SrtBlock};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One parsed input file for the multi-file merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrtFile {
    pub name: String,
    pub blocks: Vec<SrtBlock>,
}

/// Recombine a structure stream with a corrected text stream.
/// Timecode blocks are used verbatim and paired positionally with the
/// non-empty text lines; if the counts differ the excess on the longer
/// side is dropped. A mismatch is logged but is not an error.
pub fn merge_chunk(structure: &str, corrected: &str) -> String {
    let timecode_blocks = split_blocks(structure);
    let corrected = corrected.replace("\r\n", "\n");
    let text_lines: Vec<&str> = corrected
        .trim()
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if timecode_blocks.len() != text_lines.len() {
        warn!(
            "count mismatch: {} timecode blocks vs {} text lines, truncating",
            timecode_blocks.len(),
            text_lines.len()
        );
    }
    let mut out = String::new();
    for (tc_block, text_line) in timecode_blocks.iter().zip(text_lines.iter()) {
        out.push_str(&format!("{}\n{}\n\n", tc_block.trim(), text_line));
    }
    out.trim().to_string()
}

/// Merge the blocks of several files into one SRT document.
/// Blocks are emitted in file-list order, original timecode strings are
/// copied verbatim and sequence numbers are replaced by a single counter
/// starting at 1 across file boundaries.
pub fn merge_files(files: &[SrtFile]) -> String {
    let mut global_id = 1u32;
    let mut all_blocks = Vec::new();
    for file in files {
        debug!("merging {} blocks from {}", file.blocks.len(), file.name);
        for block in &file.blocks {
            all_blocks.push(format!(
                "{}\n{} --> {}\n{}",
                global_id, block.start_time, block.end_time, block.content
            ));
            global_id += 1;
        }
    }
    all_blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_entries;
    use crate::srt::{parse_blocks, parse_entries};

    #[test]
    fn merges_structure_with_text_lines() {
        let structure = "1\n00:00:00,000 --> 00:00:01,000\n\n2\n00:00:01,000 --> 00:00:02,000";
        let text = "hello\nworld\n";
        let merged = merge_chunk(structure, text);
        assert_eq!(
            merged,
            "1\n00:00:00,000 --> 00:00:01,000\nhello\n\n2\n00:00:01,000 --> 00:00:02,000\nworld"
        );
    }

    #[test]
    fn truncates_to_shorter_side() {
        let structure = "1\n00:00:00,000 --> 00:00:01,000\n\n2\n00:00:01,000 --> 00:00:02,000";
        let merged = merge_chunk(structure, "only one line");
        assert_eq!(merged, "1\n00:00:00,000 --> 00:00:01,000\nonly one line");

        let merged = merge_chunk("1\n00:00:00,000 --> 00:00:01,000", "a\nb\nc");
        assert_eq!(merged, "1\n00:00:00,000 --> 00:00:01,000\na");
    }

    #[test]
    fn skips_empty_text_lines() {
        let structure = "1\n00:00:00,000 --> 00:00:01,000";
        let merged = merge_chunk(structure, "\n\n  \nkept\n");
        assert_eq!(merged, "1\n00:00:00,000 --> 00:00:01,000\nkept");
    }

    #[test]
    fn chunk_then_merge_reconstructs_entries() {
        let input = (1..=150)
            .map(|i| {
                format!(
                    "{i}\n00:{:02}:{:02},000 --> 00:{:02}:{:02},500\nsubtitle {i}",
                    i / 60,
                    i % 60,
                    i / 60,
                    i % 60
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        let entries = parse_entries(&input);
        assert_eq!(entries.len(), 150);
        let chunks = chunk_entries(&entries, 100);
        assert_eq!(chunks.len(), 2);
        let recombined = chunks
            .iter()
            .map(|c| merge_chunk(&c.structure_content, &c.text_content))
            .collect::<Vec<_>>()
            .join("\n\n");
        let round_tripped = parse_entries(&recombined);
        assert_eq!(round_tripped, entries);
    }

    #[test]
    fn renumbers_across_file_boundaries() {
        let file_a = SrtFile {
            name: "a.srt".into(),
            blocks: parse_blocks(
                "1\n00:00:00,000 --> 00:00:01,000\na1\n\n2\n00:00:01,000 --> 00:00:02,000\na2\n",
            ),
        };
        let file_b = SrtFile {
            name: "b.srt".into(),
            blocks: parse_blocks(
                "1\n00:10:00,000 --> 00:10:01,000\nb1\n\n2\n00:10:01,000 --> 00:10:02,000\nb2\n\n3\n00:10:02,000 --> 00:10:03,000\nb3\n",
            ),
        };
        let merged = merge_files(&[file_a, file_b]);
        let blocks = parse_blocks(&merged);
        assert_eq!(blocks.len(), 5);
        let ids: Vec<u32> = blocks.iter().map(|b| b.sequence_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        // Timing is copied verbatim, never offset.
        assert_eq!(blocks[2].start_time, "00:10:00,000");
        assert_eq!(blocks[4].end_time, "00:10:03,000");
    }

    #[test]
    fn merges_zero_files_to_empty_output() {
        assert_eq!(merge_files(&[]), "");
    }
}
