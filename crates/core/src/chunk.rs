//! Splitting a parsed entry sequence into fixed-size chunks.
//! Each chunk carries two parallel artifacts: a structure stream holding
//! index and timecode pairs, and a text stream holding only the content.

use crate::srt::SrtEntry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of entries per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// One chunk's paired output artifacts.
/// `index_start`/`index_end` are 1-based inclusive positions into the
/// original entry sequence and partition it exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrtChunk {
    pub id: usize,
    pub index_start: usize,
    pub index_end: usize,
    pub structure_file_name: String,
    pub structure_content: String,
    pub text_file_name: String,
    pub text_content: String,
}

/// Partition `entries` into consecutive chunks of at most `size`.
/// The structure stream is shaped like an SRT file with the content
/// removed; the text stream holds one paragraph per entry. Consumers
/// recombine the two by position, so both streams always hold the same
/// number of segments.
pub fn chunk_entries(entries: &[SrtEntry], size: usize) -> Vec<SrtChunk> {
    let size = size.max(1);
    let mut chunks = Vec::new();
    for (k, group) in entries.chunks(size).enumerate() {
        let id = k + 1;
        let structure_content = group
            .iter()
            .map(|e| format!("{}\n{}", e.index, e.timecode))
            .collect::<Vec<_>>()
            .join("\n\n");
        let text_content = group
            .iter()
            .map(|e| e.text.clone())
            .collect::<Vec<_>>()
            .join("\n\n");
        chunks.push(SrtChunk {
            id,
            index_start: k * size + 1,
            index_end: k * size + group.len(),
            structure_file_name: format!("{id}_num&timecodes.txt"),
            structure_content,
            text_file_name: format!("{id}_text.txt"),
            text_content,
        });
    }
    debug!("chunked {} entries into {} chunks", entries.len(), chunks.len());
    chunks
}
