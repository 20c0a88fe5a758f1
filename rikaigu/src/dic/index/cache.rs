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

//! Sorted cache of resolved index entries.
//!
//! Each record keeps the position of an entry in the index stream, its key
//! and decoded offsets are stored as the payload. A miss still narrows the
//! range of the stream which has to be searched.

use std::cmp::Ordering;

use crate::arena::vardata::{read_u32, write_u32, Record, VardataArray};
use crate::arena::Buffer;
use crate::dic::index::codec::{OffsetsIter, VALUE_SIZE};
use crate::dic::index::CurrentEntry;
use crate::error::RikaiResult;
use crate::util::binary_search::binary_locate;
use crate::util::utf16::{compare_units, U16CodeUnits};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DictionaryIndexEntry {
    pub start_position_in_index: u32,
    pub end_position_in_index: u32,
    pub key_length: u32,
    pub num_offsets: u32,
    pub vardata_start_offset: u32,
}

impl Record for DictionaryIndexEntry {
    const SIZE: usize = 20;

    fn encode(&self, out: &mut [u8]) {
        write_u32(out, 0, self.start_position_in_index);
        write_u32(out, 4, self.end_position_in_index);
        write_u32(out, 8, self.key_length);
        write_u32(out, 12, self.num_offsets);
        write_u32(out, 16, self.vardata_start_offset);
    }

    fn decode(src: &[u8]) -> Self {
        DictionaryIndexEntry {
            start_position_in_index: read_u32(src, 0),
            end_position_in_index: read_u32(src, 4),
            key_length: read_u32(src, 8),
            num_offsets: read_u32(src, 12),
            vardata_start_offset: read_u32(src, 16),
        }
    }
}

/// Result of [`EntryCache::locate_entry`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheLookup {
    Found(DictionaryIndexEntry),
    /// `position` is where the key would be inserted,
    /// the key can only be between `low` and `high` in the index stream
    Missing {
        position: usize,
        low: usize,
        high: usize,
    },
}

pub struct EntryCache<'b, 'm> {
    entries: VardataArray<'b, 'm, DictionaryIndexEntry>,
}

impl<'b, 'm> EntryCache<'b, 'm> {
    /// Drops all cached entries
    pub fn clear(buffer: &'b mut Buffer<'m>) -> RikaiResult<Self> {
        Ok(EntryCache {
            entries: VardataArray::make(buffer)?,
        })
    }

    pub fn open(buffer: &'b mut Buffer<'m>) -> RikaiResult<Self> {
        Ok(EntryCache {
            entries: VardataArray::open(buffer)?,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> DictionaryIndexEntry {
        self.entries.get(index)
    }

    pub fn key_bytes(&self, entry: &DictionaryIndexEntry) -> &[u8] {
        self.entries
            .payload(entry.vardata_start_offset, entry.key_length as usize * 2)
    }

    pub fn offsets(&self, entry: &DictionaryIndexEntry) -> OffsetsIter<'_> {
        let key_size = entry.key_length * 2;
        let values = self.entries.payload(
            entry.vardata_start_offset + key_size,
            entry.num_offsets as usize * VALUE_SIZE,
        );
        OffsetsIter::new(values)
    }

    fn compare_key(&self, index: usize, needle: &[u16]) -> Ordering {
        let entry = self.entries.get(index);
        compare_units(
            U16CodeUnits::new(self.key_bytes(&entry)),
            needle.iter().copied(),
        )
    }

    /// Searches the cache for `needle`.
    ///
    /// On a miss, `low` and `high` are narrowed to the neighbours of the
    /// insertion point.
    pub fn locate_entry(&self, needle: &[u16], mut low: usize, mut high: usize) -> CacheLookup {
        let count = self.entries.len();
        let (position, found) = binary_locate(count, |i| self.compare_key(i, needle));
        if found {
            return CacheLookup::Found(self.entries.get(position));
        }
        if position > 0 {
            low = self.entries.get(position - 1).end_position_in_index as usize;
        }
        if position < count {
            high = self.entries.get(position).start_position_in_index as usize;
        }
        CacheLookup::Missing {
            position,
            low,
            high,
        }
    }

    /// Copies the entry found in the index at its sorted `position`
    pub fn add_current(
        &mut self,
        position: usize,
        entry: &CurrentEntry,
        key: &[u8],
        offsets: &[u8],
    ) -> RikaiResult<DictionaryIndexEntry> {
        debug_assert_eq!(key.len(), entry.key_length * 2);
        debug_assert_eq!(offsets.len(), entry.num_offsets * VALUE_SIZE);
        self.entries
            .insert(position, &[key, offsets], |vardata_start_offset| {
                DictionaryIndexEntry {
                    start_position_in_index: entry.start_position_in_index as u32,
                    end_position_in_index: entry.end_position_in_index as u32,
                    key_length: entry.key_length as u32,
                    num_offsets: entry.num_offsets as u32,
                    vardata_start_offset,
                }
            })?;
        tracing::trace!(position, cached = self.entries.len(), "index entry cached");
        Ok(self.entries.get(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::dic::index::codec::IndexOffset;
    use crate::error::RikaiError;
    use claim::assert_matches;

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn key_bytes(s: &str) -> Vec<u8> {
        utf16(s).iter().flat_map(|c| c.to_le_bytes()).collect()
    }

    fn values(v: &[u32]) -> Vec<u8> {
        v.iter().flat_map(|x| x.to_le_bytes()).collect()
    }

    fn entry(key: &str, start: usize, end: usize, num_offsets: usize) -> CurrentEntry {
        CurrentEntry {
            start_position_in_index: start,
            end_position_in_index: end,
            key_length: key.encode_utf16().count(),
            num_offsets,
            ..CurrentEntry::default()
        }
    }

    fn add(cache: &mut EntryCache, key: &str, start: usize, end: usize, offsets: &[u32]) {
        let position = match cache.locate_entry(&utf16(key), 0, usize::MAX) {
            CacheLookup::Missing { position, .. } => position,
            CacheLookup::Found(_) => panic!("{} is already cached", key),
        };
        cache
            .add_current(
                position,
                &entry(key, start, end, offsets.len()),
                &key_bytes(key),
                &values(offsets),
            )
            .expect("fits");
    }

    #[test]
    fn add_and_locate() {
        let mut memory = vec![0u8; 4096];
        let mut arena = Arena::split_with_sizes(&mut memory, [64, 512, 64, 64, 64]).expect("split");
        let mut cache = EntryCache::clear(&mut arena.index_entries).expect("cache");
        add(&mut cache, "3", 123, 456, &[1, 2, 3]);
        add(&mut cache, "12", 321, 654, &[4, 5]);

        assert_eq!(2, cache.len());
        assert_eq!(key_bytes("12"), cache.key_bytes(&cache.get(0)));
        assert_eq!(key_bytes("3"), cache.key_bytes(&cache.get(1)));

        match cache.locate_entry(&utf16("3"), 0, 1000) {
            CacheLookup::Found(e) => {
                assert_eq!(123, e.start_position_in_index);
                assert_eq!(456, e.end_position_in_index);
                let offsets: Vec<_> = cache.offsets(&e).collect();
                assert_eq!(
                    vec![
                        IndexOffset::Offset(1),
                        IndexOffset::Offset(2),
                        IndexOffset::Offset(3)
                    ],
                    offsets
                );
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            CacheLookup::Missing {
                position: 0,
                low: 0,
                high: 321
            },
            cache.locate_entry(&utf16("0"), 0, 1000)
        );
        assert_eq!(
            CacheLookup::Missing {
                position: 1,
                low: 654,
                high: 123
            },
            cache.locate_entry(&utf16("20"), 0, 1000)
        );
        assert_eq!(
            CacheLookup::Missing {
                position: 2,
                low: 456,
                high: 1000
            },
            cache.locate_entry(&utf16("4"), 0, 1000)
        );
    }

    #[test]
    fn reopen_keeps_entries() {
        let mut memory = vec![0u8; 4096];
        let mut arena = Arena::split_with_sizes(&mut memory, [64, 512, 64, 64, 64]).expect("split");
        {
            let mut cache = EntryCache::clear(&mut arena.index_entries).expect("cache");
            add(&mut cache, "かける", 10, 30, &[7]);
        }
        let cache = EntryCache::open(&mut arena.index_entries).expect("open");
        assert_eq!(1, cache.len());
        assert_matches!(
            cache.locate_entry(&utf16("かける"), 0, 100),
            CacheLookup::Found(DictionaryIndexEntry { key_length: 3, .. })
        );
        let cache = EntryCache::clear(&mut arena.index_entries).expect("clear");
        assert!(cache.is_empty());
    }

    #[test]
    fn overflow_is_reported() {
        let mut memory = vec![0u8; 4096];
        let mut arena = Arena::split_with_sizes(&mut memory, [64, 64, 64, 64, 64]).expect("split");
        let mut cache = EntryCache::clear(&mut arena.index_entries).expect("cache");
        let many: Vec<u32> = (0..10).collect();
        let result = cache.add_current(
            0,
            &entry("長い", 0, 100, many.len()),
            &key_bytes("長い"),
            &values(&many),
        );
        assert_matches!(result, Err(RikaiError::CapacityExceeded { .. }));
        assert!(cache.is_empty());
    }
}
