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

use std::collections::BTreeMap;
use std::io::Write;

use itertools::Itertools;

use crate::dic::build::error::IndexBuildError;
use crate::dic::index::codec::{encode_value, is_offset_or_type, IndexOffset, MAX_VALUE};
use crate::dic::index::{DictionaryIndex, CHUNK_SIZE};
use crate::dic::storage::IndexFile;
use crate::dic::Dictionary;
use crate::error::RikaiResult;

/// Collects offsets of keys and writes them as a chunked index
pub struct IndexBuilder {
    // String order is code point order, the order of the index
    data: BTreeMap<String, Vec<IndexOffset>>,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, key: &str, offset: IndexOffset) {
        self.data.entry(key.to_owned()).or_default().push(offset)
    }

    pub fn extend<I: IntoIterator<Item = IndexOffset>>(&mut self, key: &str, offsets: I) {
        self.data.entry(key.to_owned()).or_default().extend(offsets)
    }

    pub fn num_entries(&self) -> usize {
        self.data.len()
    }

    /// Appends one entry to `out`.
    ///
    /// Untyped offsets go first, then typed ones grouped by type,
    /// every group preceded by its type tag.
    pub fn encode_entry(
        key: &str,
        offsets: &[IndexOffset],
        out: &mut Vec<u8>,
    ) -> Result<(), IndexBuildError> {
        if key.is_empty() {
            return Err(IndexBuildError::EmptyKey);
        }
        if offsets.is_empty() {
            return Err(IndexBuildError::NoOffsets(key.to_owned()));
        }
        let start = out.len();
        for unit in key.encode_utf16() {
            if is_offset_or_type(unit) {
                return Err(IndexBuildError::KeyContainsMarker(key.to_owned()));
            }
            out.extend_from_slice(&unit.to_le_bytes());
        }

        let mut push_value = |value: u32, is_type: bool| {
            if value >= MAX_VALUE {
                return Err(IndexBuildError::ValueOutOfRange {
                    key: key.to_owned(),
                    value,
                });
            }
            for unit in encode_value(value, is_type).iter() {
                out.extend_from_slice(&unit.to_le_bytes());
            }
            Ok(())
        };

        for offset in offsets.iter().filter(|o| o.pos() == 0) {
            push_value(offset.offset(), false)?;
        }
        let typed = offsets
            .iter()
            .filter(|o| o.pos() != 0)
            .sorted_by_key(|o| o.pos());
        for (pos, group) in &typed.group_by(|o| o.pos()) {
            push_value(pos, true)?;
            for offset in group {
                push_value(offset.offset(), false)?;
            }
        }

        let length = out.len() - start;
        if length >= CHUNK_SIZE {
            return Err(IndexBuildError::EntryTooLong {
                key: key.to_owned(),
                length,
            });
        }
        Ok(())
    }

    /// Encodes all entries and compresses the stream
    pub fn build(&self) -> Result<BuiltIndex, IndexBuildError> {
        let mut original = Vec::with_capacity(self.data.len() * 16);
        let mut entry_starts = Vec::with_capacity(self.data.len() + 1);
        for (key, offsets) in self.data.iter() {
            entry_starts.push(original.len());
            Self::encode_entry(key, offsets, &mut original)?;
        }
        entry_starts.push(original.len());

        let mut compressed = Vec::with_capacity(original.len() / 2);
        let mut chunk_offsets = Vec::with_capacity((original.len() / CHUNK_SIZE + 2) * 4);
        chunk_offsets.extend_from_slice(&0u32.to_le_bytes());
        for chunk in original.chunks(CHUNK_SIZE) {
            compressed.extend(lz4_flex::block::compress(chunk));
            chunk_offsets.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        }
        let last_chunk_size = match original.len() % CHUNK_SIZE {
            0 if !original.is_empty() => CHUNK_SIZE,
            rest => rest,
        };

        Ok(BuiltIndex {
            original,
            entry_starts,
            compressed,
            chunk_offsets,
            last_chunk_size,
        })
    }
}

/// Result of [`IndexBuilder::build`]
#[derive(Debug)]
pub struct BuiltIndex {
    /// Uncompressed stream
    pub original: Vec<u8>,
    /// Start of every entry in the stream, followed by the stream size
    pub entry_starts: Vec<usize>,
    pub compressed: Vec<u8>,
    /// `num_chunks + 1` little-endian u32
    pub chunk_offsets: Vec<u8>,
    pub last_chunk_size: usize,
}

impl BuiltIndex {
    pub fn num_chunks(&self) -> usize {
        self.chunk_offsets.len() / 4 - 1
    }

    pub fn index(&self, dictionary: Dictionary) -> RikaiResult<DictionaryIndex<'_>> {
        DictionaryIndex::new(
            dictionary,
            &self.compressed,
            &self.chunk_offsets,
            self.original.len(),
            self.last_chunk_size,
        )
    }

    /// Writes the index file, returns the number of written bytes
    pub fn write_to<W: Write>(&self, w: &mut W) -> RikaiResult<usize> {
        IndexFile::write_parts(
            w,
            self.original.len(),
            self.last_chunk_size,
            &self.chunk_offsets,
            &self.compressed,
        )
    }
}
