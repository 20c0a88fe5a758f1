/*
 * Copyright (c) 2021 Works Applications Co., Ltd.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Compressed dictionary index.
//!
//! The index is a stream of entries sorted by key. An entry is a UTF-16LE key
//! followed by marked 16-bit units encoding its offsets (see [`codec`]).
//! The stream is cut into chunks of [`CHUNK_SIZE`] bytes which are compressed
//! independently, so an entry can start in one chunk and end in the next one.
//!
//! Lookups bisect byte positions of the uncompressed stream: any position is
//! resolved to the entry surrounding it by scanning for marker boundaries.

pub mod cache;
pub mod codec;

use std::cmp::Ordering;
use std::fmt;

use crate::arena::vardata::read_u32;
use crate::dic::index::codec::{decode_value, is_offset_or_type, VALUE_SIZE};
use crate::dic::Dictionary;
use crate::error::{RikaiError, RikaiResult};
use crate::util::utf16::{compare_units, U16CodeUnits};

/// Uncompressed size of every chunk but the last one
pub const CHUNK_SIZE: usize = 2048;
/// An entry spans at most two chunks
pub const ENTRY_SCRATCH_SIZE: usize = 2 * CHUNK_SIZE;

/// Read-only view of a compressed index
#[derive(Clone, Copy)]
pub struct DictionaryIndex<'a> {
    dictionary: Dictionary,
    data: &'a [u8],
    chunk_offsets: &'a [u8],
    original_size: usize,
    last_chunk_index: usize,
    last_chunk_size: usize,
}

impl<'a> DictionaryIndex<'a> {
    /// Creates an index view.
    ///
    /// `chunk_offsets` holds `num_chunks + 1` little-endian u32 positions of
    /// compressed chunks inside `data`.
    pub fn new(
        dictionary: Dictionary,
        data: &'a [u8],
        chunk_offsets: &'a [u8],
        original_size: usize,
        last_chunk_size: usize,
    ) -> RikaiResult<Self> {
        if chunk_offsets.len() < 4 || chunk_offsets.len() % 4 != 0 {
            return Err(RikaiError::CorruptedIndex("invalid chunk offsets table"));
        }
        let num_chunks = chunk_offsets.len() / 4 - 1;
        let index = DictionaryIndex {
            dictionary,
            data,
            chunk_offsets,
            original_size,
            last_chunk_index: num_chunks.saturating_sub(1),
            last_chunk_size,
        };

        let expected_size = match num_chunks {
            0 => 0,
            n => (n - 1) * CHUNK_SIZE + last_chunk_size,
        };
        if original_size != expected_size || last_chunk_size > CHUNK_SIZE {
            return Err(RikaiError::CorruptedIndex(
                "chunk sizes do not add up to the index size",
            ));
        }
        let mut previous = 0;
        for i in 0..=num_chunks {
            let offset = index.chunk_offset(i);
            if offset < previous || offset > data.len() {
                return Err(RikaiError::CorruptedIndex("chunk offsets are out of order"));
            }
            previous = offset;
        }
        Ok(index)
    }

    pub fn dictionary(&self) -> Dictionary {
        self.dictionary
    }

    /// Size of the uncompressed stream
    pub fn original_size(&self) -> usize {
        self.original_size
    }

    pub fn num_chunks(&self) -> usize {
        self.chunk_offsets.len() / 4 - 1
    }

    #[inline]
    fn chunk_offset(&self, chunk_index: usize) -> usize {
        read_u32(self.chunk_offsets, chunk_index * 4) as usize
    }

    fn compressed_chunk(&self, chunk_index: usize) -> &'a [u8] {
        &self.data[self.chunk_offset(chunk_index)..self.chunk_offset(chunk_index + 1)]
    }

    pub fn real_chunk_size(&self, chunk_index: usize) -> usize {
        if chunk_index == self.last_chunk_index {
            self.last_chunk_size
        } else {
            CHUNK_SIZE
        }
    }
}

impl fmt::Debug for DictionaryIndex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictionaryIndex")
            .field("dictionary", &self.dictionary)
            .field("num_chunks", &self.num_chunks())
            .field("compressed_size", &self.data.len())
            .field("original_size", &self.original_size)
            .field("last_chunk_size", &self.last_chunk_size)
            .finish()
    }
}

/// Entry found in the index, its bytes live in the scratch of [`IndexReader`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CurrentEntry {
    pub start_position_in_index: usize,
    pub end_position_in_index: usize,
    pub key_length: usize,
    pub num_offsets: usize,
    scratch_start: usize,
}

impl CurrentEntry {
    pub fn byte_length(&self) -> usize {
        self.end_position_in_index - self.start_position_in_index
    }
}

#[inline]
fn unit_at(data: &[u8], byte_position: usize) -> u16 {
    u16::from_le_bytes([data[byte_position], data[byte_position + 1]])
}

/// Scans back from `position` over offsets and then over the key.
///
/// Returns the byte position of the key start, or `None` when the
/// scan ran off the start of `chunk`.
pub fn find_entry_start_offset(chunk: &[u8], position: usize) -> Option<usize> {
    // exclusive cursor: the unit under scan is `current - 1`
    let mut current = position / 2 + 1;
    while current > 0 && is_offset_or_type(unit_at(chunk, (current - 1) * 2)) {
        current -= 1;
    }
    while current > 0 && !is_offset_or_type(unit_at(chunk, (current - 1) * 2)) {
        current -= 1;
    }
    if current > 0 {
        Some(current * 2)
    } else {
        None
    }
}

/// Scans forward from `position` over the key and then over offsets.
///
/// Returns the byte position right after the entry, or `None` when the
/// scan reached the end of `chunk`.
pub fn find_entry_end_offset(chunk: &[u8], position: usize) -> Option<usize> {
    let units = chunk.len() / 2;
    let mut current = position / 2;
    while current < units && !is_offset_or_type(unit_at(chunk, current * 2)) {
        current += 1;
    }
    while current < units && is_offset_or_type(unit_at(chunk, current * 2)) {
        current += 1;
    }
    if current < units {
        Some(current * 2)
    } else {
        None
    }
}

/// Start of an entry whose second part begins with `second_part_first_unit`,
/// `chunk` is the full previous chunk
pub fn find_entry_start_in_previous_chunk(
    chunk: &[u8],
    second_part_first_unit: u16,
) -> Option<usize> {
    let last_unit = unit_at(chunk, CHUNK_SIZE - 2);
    if !is_offset_or_type(second_part_first_unit) && is_offset_or_type(last_unit) {
        // previous entry ended on the chunk boundary
        return Some(CHUNK_SIZE);
    }
    find_entry_start_offset(chunk, CHUNK_SIZE - 2)
}

/// End of an entry whose first part ends with `first_part_last_unit`
pub fn find_entry_end_in_next_chunk(chunk: &[u8], first_part_last_unit: u16) -> Option<usize> {
    let first_unit = unit_at(chunk, 0);
    if is_offset_or_type(first_part_last_unit) && !is_offset_or_type(first_unit) {
        // entry ended on the chunk boundary
        return Some(0);
    }
    find_entry_end_offset(chunk, 0)
}

/// Byte length of the key of a complete entry
pub fn find_entry_offsets_start(entry: &[u8]) -> Option<usize> {
    let units = entry.len() / 2;
    (0..units)
        .find(|&i| is_offset_or_type(unit_at(entry, i * 2)))
        .map(|i| i * 2)
}

/// Decompresses index chunks and resolves positions into entries.
///
/// Holds the single decompressed chunk and the scratch where the current
/// entry is assembled.
pub struct IndexReader {
    chunk: [u8; CHUNK_SIZE],
    loaded: Option<(Dictionary, usize)>,
    scratch: [u8; ENTRY_SCRATCH_SIZE],
}

impl Default for IndexReader {
    fn default() -> Self {
        IndexReader {
            chunk: [0; CHUNK_SIZE],
            loaded: None,
            scratch: [0; ENTRY_SCRATCH_SIZE],
        }
    }
}

impl IndexReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dictionary and chunk which are currently decompressed
    pub fn loaded(&self) -> Option<(Dictionary, usize)> {
        self.loaded
    }

    /// Forgets the decompressed chunk
    pub fn invalidate(&mut self) {
        self.loaded = None;
    }

    fn load_chunk(&mut self, index: &DictionaryIndex, chunk_index: usize) -> RikaiResult<()> {
        if self.loaded == Some((index.dictionary, chunk_index)) {
            return Ok(());
        }
        if chunk_index >= index.num_chunks() {
            return Err(RikaiError::CorruptedIndex("chunk index is out of range"));
        }
        let compressed = index.compressed_chunk(chunk_index);
        self.loaded = None;
        let size = lz4_flex::block::decompress_into(compressed, &mut self.chunk)
            .map_err(|_| RikaiError::CorruptedIndex("chunk decompression failed"))?;
        if size != index.real_chunk_size(chunk_index) {
            return Err(RikaiError::CorruptedIndex("decompressed chunk has wrong size"));
        }
        tracing::trace!(dictionary = ?index.dictionary, chunk_index, "decompressed index chunk");
        self.loaded = Some((index.dictionary, chunk_index));
        Ok(())
    }

    /// Resolves the entry which contains the byte `position` of the stream
    pub fn entry_at(&mut self, index: &DictionaryIndex, position: usize) -> RikaiResult<CurrentEntry> {
        if position >= index.original_size {
            return Err(RikaiError::CorruptedIndex("position is past the end of the index"));
        }
        // every unit is 2-aligned in the stream
        let position = position - position % 2;
        let chunk_index = position / CHUNK_SIZE;
        self.load_chunk(index, chunk_index)?;

        let position_in_chunk = position % CHUNK_SIZE;
        let real_size = index.real_chunk_size(chunk_index);
        let mut start = find_entry_start_offset(&self.chunk, position_in_chunk);
        let mut end = find_entry_end_offset(&self.chunk[..real_size], position_in_chunk);
        if start.is_none() && chunk_index == 0 {
            start = Some(0);
        }
        if end.is_none() && chunk_index == index.last_chunk_index {
            end = Some(real_size);
        }

        let (scratch_start, length, start_position) = match (start, end) {
            (Some(start), Some(end)) => {
                let length = end - start;
                self.scratch[..length].copy_from_slice(&self.chunk[start..end]);
                (0, length, chunk_index * CHUNK_SIZE + start)
            }
            (None, Some(end)) => {
                // the second part goes to the end of the scratch, the first one before it
                let second_part = ENTRY_SCRATCH_SIZE - end;
                self.scratch[second_part..].copy_from_slice(&self.chunk[..end]);
                let second_part_first_unit = unit_at(&self.scratch, second_part);

                self.load_chunk(index, chunk_index - 1)?;
                let start =
                    find_entry_start_in_previous_chunk(&self.chunk, second_part_first_unit)
                        .ok_or(RikaiError::CorruptedIndex("entry spans more than two chunks"))?;
                let prefix_length = CHUNK_SIZE - start;
                let entry_start = second_part - prefix_length;
                self.scratch[entry_start..second_part].copy_from_slice(&self.chunk[start..]);
                (
                    entry_start,
                    prefix_length + end,
                    (chunk_index - 1) * CHUNK_SIZE + start,
                )
            }
            (Some(start), None) => {
                let prefix_length = real_size - start;
                self.scratch[..prefix_length].copy_from_slice(&self.chunk[start..real_size]);
                let first_part_last_unit = unit_at(&self.scratch, prefix_length - 2);

                let next_chunk = chunk_index + 1;
                self.load_chunk(index, next_chunk)?;
                let next_size = index.real_chunk_size(next_chunk);
                let end = match find_entry_end_in_next_chunk(
                    &self.chunk[..next_size],
                    first_part_last_unit,
                ) {
                    Some(end) => end,
                    None if next_chunk == index.last_chunk_index => next_size,
                    None => {
                        return Err(RikaiError::CorruptedIndex(
                            "entry spans more than two chunks",
                        ))
                    }
                };
                self.scratch[prefix_length..prefix_length + end]
                    .copy_from_slice(&self.chunk[..end]);
                (0, prefix_length + end, chunk_index * CHUNK_SIZE + start)
            }
            (None, None) => {
                return Err(RikaiError::CorruptedIndex(
                    "entry is longer than an index chunk",
                ))
            }
        };

        let entry = &self.scratch[scratch_start..scratch_start + length];
        let offsets_start = find_entry_offsets_start(entry)
            .ok_or(RikaiError::CorruptedIndex("can't find offsets start in index entry"))?;
        Ok(CurrentEntry {
            start_position_in_index: start_position,
            end_position_in_index: start_position + length,
            key_length: offsets_start / 2,
            num_offsets: (length - offsets_start) / VALUE_SIZE,
            scratch_start,
        })
    }

    /// Bisects the stream between byte positions `low` and `high` for `needle`.
    ///
    /// On a hit the offsets of the entry are decoded in place.
    pub fn search_for_offsets(
        &mut self,
        index: &DictionaryIndex,
        needle: &[u16],
        mut low: usize,
        mut high: usize,
    ) -> RikaiResult<Option<CurrentEntry>> {
        while low < high {
            let mid = low + (high - low) / 2;
            let entry = self.entry_at(index, mid)?;
            let order = compare_units(
                U16CodeUnits::new(self.key_bytes(&entry)),
                needle.iter().copied(),
            );
            match order {
                Ordering::Less => low = entry.end_position_in_index,
                Ordering::Greater => high = entry.start_position_in_index,
                Ordering::Equal => {
                    self.decode_offsets(&entry);
                    return Ok(Some(entry));
                }
            }
        }
        Ok(None)
    }

    fn decode_offsets(&mut self, entry: &CurrentEntry) {
        let start = entry.scratch_start + entry.key_length * 2;
        let end = start + entry.num_offsets * VALUE_SIZE;
        for value in self.scratch[start..end].chunks_exact_mut(VALUE_SIZE) {
            let decoded = decode_value(value);
            value.copy_from_slice(&decoded.to_le_bytes());
        }
    }

    /// UTF-16LE key of the entry last returned by this reader
    pub fn key_bytes(&self, entry: &CurrentEntry) -> &[u8] {
        let start = entry.scratch_start;
        &self.scratch[start..start + entry.key_length * 2]
    }

    /// Offsets of the entry last returned by [`IndexReader::search_for_offsets`]
    pub fn offsets_bytes(&self, entry: &CurrentEntry) -> &[u8] {
        let start = entry.scratch_start + entry.key_length * 2;
        &self.scratch[start..start + entry.num_offsets * VALUE_SIZE]
    }

    /// Raw bytes of the entry last returned by [`IndexReader::entry_at`]
    pub fn entry_bytes(&self, entry: &CurrentEntry) -> &[u8] {
        &self.scratch[entry.scratch_start..entry.scratch_start + entry.byte_length()]
    }
}
