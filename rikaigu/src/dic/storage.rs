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

use std::io::Write;

use memmap2::Mmap;
use nom::bytes::complete::{tag, take};
use nom::number::complete::le_u32;
use nom::AsBytes;
use thiserror::Error;

use crate::dic::index::{DictionaryIndex, CHUNK_SIZE};
use crate::dic::Dictionary;
use crate::error::{RikaiNomResult, RikaiResult};

/// Bytes of an index or record file resident in memory
pub enum Storage {
    File(Mmap),
    Owned(Vec<u8>),
}

impl AsRef<[u8]> for Storage {
    fn as_ref(&self) -> &[u8] {
        match self {
            Storage::File(m) => m.as_bytes(),
            Storage::Owned(v) => v,
        }
    }
}

#[derive(Error, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum IndexFileError {
    #[error("Invalid magic bytes")]
    InvalidMagic,

    #[error("Unable to parse")]
    CannotParse,

    #[error("Last chunk size {0} is larger than a chunk")]
    InvalidLastChunkSize(u32),

    #[error("Compressed data is {actual} bytes, chunk offsets need {expected}")]
    TruncatedData { expected: usize, actual: usize },
}

/// Index file: header, chunk offsets table and compressed chunks
///
/// ```text
/// magic       8 bytes  "RKIDX\0\0\x01"
/// original    u32      uncompressed stream size
/// last chunk  u32      uncompressed size of the last chunk
/// num chunks  u32
/// offsets     u32 * (num_chunks + 1)
/// data        compressed chunks
/// ```
#[derive(Debug, Clone, Copy)]
pub struct IndexFile<'a> {
    pub original_size: usize,
    pub last_chunk_size: usize,
    pub chunk_offsets: &'a [u8],
    pub data: &'a [u8],
}

pub const INDEX_MAGIC: &[u8; 8] = b"RKIDX\0\0\x01";
pub const INDEX_HEADER_SIZE: usize = INDEX_MAGIC.len() + 3 * 4;

fn index_header_parser(input: &[u8]) -> RikaiNomResult<&[u8], (u32, u32, u32)> {
    let (rest, _) = tag(&INDEX_MAGIC[..])(input)?;
    nom::sequence::tuple((le_u32, le_u32, le_u32))(rest)
}

fn chunk_offsets_parser(input: &[u8], num_chunks: u32) -> RikaiNomResult<&[u8], &[u8]> {
    take((num_chunks as usize + 1) * 4)(input)
}

impl<'a> IndexFile<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<IndexFile<'a>, IndexFileError> {
        if bytes.len() < INDEX_MAGIC.len() || &bytes[..INDEX_MAGIC.len()] != INDEX_MAGIC {
            return Err(IndexFileError::InvalidMagic);
        }
        let (rest, (original_size, last_chunk_size, num_chunks)) =
            index_header_parser(bytes).map_err(|_| IndexFileError::CannotParse)?;
        if last_chunk_size as usize > CHUNK_SIZE {
            return Err(IndexFileError::InvalidLastChunkSize(last_chunk_size));
        }
        let (data, chunk_offsets) =
            chunk_offsets_parser(rest, num_chunks).map_err(|_| IndexFileError::CannotParse)?;

        let last = chunk_offsets.len() - 4;
        let mut compressed_size = [0u8; 4];
        compressed_size.copy_from_slice(&chunk_offsets[last..]);
        let expected = u32::from_le_bytes(compressed_size) as usize;
        if expected > data.len() {
            return Err(IndexFileError::TruncatedData {
                expected,
                actual: data.len(),
            });
        }

        Ok(IndexFile {
            original_size: original_size as usize,
            last_chunk_size: last_chunk_size as usize,
            chunk_offsets,
            data,
        })
    }

    /// Validates the chunk table and returns a view for lookups
    pub fn index(&self, dictionary: Dictionary) -> RikaiResult<DictionaryIndex<'a>> {
        DictionaryIndex::new(
            dictionary,
            self.data,
            self.chunk_offsets,
            self.original_size,
            self.last_chunk_size,
        )
    }

    pub fn write_parts<W: Write>(
        w: &mut W,
        original_size: usize,
        last_chunk_size: usize,
        chunk_offsets: &[u8],
        data: &[u8],
    ) -> RikaiResult<usize> {
        let num_chunks = chunk_offsets.len() / 4 - 1;
        w.write_all(INDEX_MAGIC)?;
        w.write_all(&(original_size as u32).to_le_bytes())?;
        w.write_all(&(last_chunk_size as u32).to_le_bytes())?;
        w.write_all(&(num_chunks as u32).to_le_bytes())?;
        w.write_all(chunk_offsets)?;
        w.write_all(data)?;
        Ok(INDEX_HEADER_SIZE + chunk_offsets.len() + data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dic::build::IndexBuilder;
    use crate::dic::index::codec::IndexOffset;
    use crate::error::RikaiError;
    use claim::assert_matches;

    fn small_file() -> Vec<u8> {
        let mut builder = IndexBuilder::new();
        builder.add("かける", IndexOffset::Offset(10));
        builder.add("かく", IndexOffset::Typed { pos: 3, offset: 20 });
        let built = builder.build().expect("valid index");
        let mut bytes = Vec::new();
        let written = built.write_to(&mut bytes).expect("write");
        assert_eq!(bytes.len(), written);
        bytes
    }

    #[test]
    fn parse_written() {
        let bytes = small_file();
        let file = IndexFile::parse(&bytes).expect("parse");
        // 2 keys of 3 and 2 units, 1 + 2 values
        assert_eq!(6 + 4 + 4 + 8, file.original_size);
        assert_eq!(file.original_size, file.last_chunk_size);
        assert_eq!(8, file.chunk_offsets.len());
        let index = file.index(Dictionary::Words).expect("index");
        assert_eq!(1, index.num_chunks());
    }

    #[test]
    fn graceful_failure() {
        assert_eq!(IndexFile::parse(&[]).err(), Some(IndexFileError::InvalidMagic));
        assert_eq!(
            IndexFile::parse(b"RKIDX\0\0\x02").err(),
            Some(IndexFileError::InvalidMagic)
        );
        assert_eq!(
            IndexFile::parse(INDEX_MAGIC).err(),
            Some(IndexFileError::CannotParse)
        );

        let bytes = small_file();
        assert_matches!(
            IndexFile::parse(&bytes[..bytes.len() - 1]),
            Err(IndexFileError::TruncatedData { .. })
        );
    }

    #[test]
    fn parse_errors_convert() {
        fn open(bytes: &[u8]) -> RikaiResult<DictionaryIndex<'_>> {
            IndexFile::parse(bytes)?.index(Dictionary::Words)
        }
        assert_matches!(
            open(b"RKIDX"),
            Err(RikaiError::InvalidIndexFile(IndexFileError::InvalidMagic))
        );
        let error = open(INDEX_MAGIC).expect_err("no header");
        assert!(!error.is_fatal());
        assert!(error.to_string().starts_with("Invalid index file"));

        let bytes = small_file();
        assert_matches!(open(&bytes), Ok(_));
        assert_eq!(&bytes[..], Storage::Owned(bytes.clone()).as_ref());
    }

    #[test]
    fn inconsistent_sizes() {
        let mut bytes = small_file();
        // original size
        bytes[8] += 2;
        let file = IndexFile::parse(&bytes).expect("header is fine");
        assert_matches!(
            file.index(Dictionary::Names),
            Err(RikaiError::CorruptedIndex(_))
        );
    }
}
