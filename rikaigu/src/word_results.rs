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

use std::cmp::Ordering;

use crate::arena::vardata::{read_u32, write_u32, Record, Records, VardataArray};
use crate::arena::Buffer;
use crate::dentry::UNKNOWN_WORD_FREQ_ORDER;
use crate::dic::Dictionary;
use crate::error::RikaiResult;
use crate::host::RequestOffsets;
use crate::util::binary_search::binary_locate;
use crate::util::utf16::U16CodeUnits;

/// Marks results which have no record attached yet
pub const NO_DENTRY: u32 = u32::MAX;

/// Dictionary record matched by the current search.
///
/// Payload holds the matched key as UTF-16LE followed by the inflection names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordResult {
    pub offset: u32,
    pub vardata_start_offset: u32,
    pub key_length: u8,
    pub match_utf16_length: u8,
    pub inflection_name_length: u16,
    pub is_name: bool,
    pub freq: u32,
    /// Index of the record span in the dentries buffer
    pub dentry: u32,
}

impl Record for WordResult {
    const SIZE: usize = 24;

    fn encode(&self, out: &mut [u8]) {
        write_u32(out, 0, self.offset);
        write_u32(out, 4, self.vardata_start_offset);
        out[8] = self.key_length;
        out[9] = self.match_utf16_length;
        out[10..12].copy_from_slice(&self.inflection_name_length.to_le_bytes());
        out[12] = self.is_name as u8;
        out[13..16].copy_from_slice(&[0; 3]);
        write_u32(out, 16, self.freq);
        write_u32(out, 20, self.dentry);
    }

    fn decode(src: &[u8]) -> Self {
        WordResult {
            offset: read_u32(src, 0),
            vardata_start_offset: read_u32(src, 4),
            key_length: src[8],
            match_utf16_length: src[9],
            inflection_name_length: u16::from_le_bytes([src[10], src[11]]),
            is_name: src[12] != 0,
            freq: read_u32(src, 16),
            dentry: read_u32(src, 20),
        }
    }
}

impl WordResult {
    pub fn dictionary(&self) -> Dictionary {
        if self.is_name {
            Dictionary::Names
        } else {
            Dictionary::Words
        }
    }

    /// Offset as it is sent to the host
    pub fn request_offset(&self) -> u32 {
        self.dictionary().request_offset(self.offset)
    }

    fn uniq_cmp(&self, other: &WordResult) -> Ordering {
        self.is_name
            .cmp(&other.is_name)
            .then_with(|| self.offset.cmp(&other.offset))
    }

    /// Ranking order: more frequent first, words before names, longer match first
    pub fn rank_cmp(&self, other: &WordResult) -> Ordering {
        self.freq
            .cmp(&other.freq)
            .then_with(|| self.is_name.cmp(&other.is_name))
            .then_with(|| other.match_utf16_length.cmp(&self.match_utf16_length))
            .then_with(|| self.offset.cmp(&other.offset))
    }
}

/// Results of the current search, unique by dictionary and record offset
#[derive(Debug)]
pub struct WordResults<'b, 'm> {
    array: VardataArray<'b, 'm, WordResult>,
}

impl<'b, 'm> WordResults<'b, 'm> {
    pub fn open(buffer: &'b mut Buffer<'m>) -> RikaiResult<Self> {
        Ok(WordResults {
            array: VardataArray::open(buffer)?,
        })
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn get(&self, index: usize) -> WordResult {
        self.array.get(index)
    }

    pub fn set(&mut self, index: usize, result: &WordResult) {
        self.array.set(index, result)
    }

    pub fn iter(&self) -> Records<'_, WordResult> {
        self.array.iter()
    }

    /// Matched key of the result, after deinflection
    pub fn key(&self, result: &WordResult) -> U16CodeUnits<'_> {
        U16CodeUnits::new(
            self.array
                .payload(result.vardata_start_offset, result.key_length as usize * 2),
        )
    }

    pub fn inflection_name(&self, result: &WordResult) -> &str {
        let start = result.vardata_start_offset + result.key_length as u32 * 2;
        let bytes = self
            .array
            .payload(start, result.inflection_name_length as usize);
        std::str::from_utf8(bytes).unwrap_or_default()
    }

    /// Writes the offsets of all results, in order, into the free space of the buffer
    pub fn request_offsets(&mut self) -> RikaiResult<RequestOffsets<'_>> {
        let count = self.len();
        let (results, out) = self.array.with_free_space(count * 4)?;
        for (result, slot) in results.zip(out.chunks_exact_mut(4)) {
            slot.copy_from_slice(&result.request_offset().to_le_bytes());
        }
        Ok(RequestOffsets::new(out))
    }

    /// Records a match unless the same record was already found.
    ///
    /// Returns `false` for a duplicate.
    pub fn try_add(
        &mut self,
        dictionary: Dictionary,
        match_length: usize,
        key: &[u8],
        inflection_name: &[u8],
        offset: u32,
    ) -> RikaiResult<bool> {
        let new_result = WordResult {
            offset,
            vardata_start_offset: 0,
            key_length: (key.len() / 2) as u8,
            match_utf16_length: match_length as u8,
            inflection_name_length: inflection_name.len() as u16,
            is_name: dictionary.is_names(),
            freq: UNKNOWN_WORD_FREQ_ORDER,
            dentry: NO_DENTRY,
        };
        let (index, found) = binary_locate(self.len(), |i| self.get(i).uniq_cmp(&new_result));
        if found {
            return Ok(false);
        }
        self.array
            .insert(index, &[key, inflection_name], |vardata_start_offset| {
                WordResult {
                    vardata_start_offset,
                    ..new_result
                }
            })?;
        Ok(true)
    }

    /// Stable insertion sort by [`WordResult::rank_cmp`], then drops everything past `limit`
    pub fn sort_and_limit(&mut self, limit: usize) {
        for i in 1..self.len() {
            let current = self.get(i);
            let (to, _) = binary_locate(i, |j| match self.get(j).rank_cmp(&current) {
                Ordering::Equal => Ordering::Less,
                o => o,
            });
            if to != i {
                self.array.move_back(i, to);
            }
        }
        self.array.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::util::testing::utf16;
    use crate::util::utf16::to_le_bytes;

    fn key(s: &str) -> Vec<u8> {
        to_le_bytes(&utf16(s)).collect()
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut memory = vec![0u8; 1 << 18];
        let mut arena = Arena::split(&mut memory).expect("arena");
        let mut results = WordResults::open(&mut arena.word_results).expect("open");
        let k = key("かける");
        assert!(results
            .try_add(Dictionary::Words, 5, &k, b"fake", 12)
            .expect("add"));
        assert!(results
            .try_add(Dictionary::Words, 5, &k, b"fake2", 3)
            .expect("add"));
        assert!(!results
            .try_add(Dictionary::Words, 4, &k, b"other", 12)
            .expect("add"));
        assert!(results
            .try_add(Dictionary::Names, 5, &k, b"", 12)
            .expect("add"));

        assert_eq!(3, results.len());
        let first = results.get(0);
        assert_eq!(3, first.offset);
        assert_eq!("fake2", results.inflection_name(&first));
        assert_eq!(utf16("かける"), results.key(&first).collect::<Vec<u16>>());
        let second = results.get(1);
        assert_eq!(12, second.offset);
        assert_eq!("fake", results.inflection_name(&second));
        assert_eq!(5, second.match_utf16_length);
        let third = results.get(2);
        assert!(third.is_name);
        assert_eq!(12 | (1 << 31), third.request_offset());
        assert_eq!("", results.inflection_name(&third));
    }

    #[test]
    fn request_offsets_follow_results() {
        let mut memory = vec![0u8; 1 << 18];
        let mut arena = Arena::split(&mut memory).expect("arena");
        let mut results = WordResults::open(&mut arena.word_results).expect("open");
        let k = key("かけ");
        results.try_add(Dictionary::Names, 2, &k, b"", 7).expect("add");
        results.try_add(Dictionary::Words, 2, &k, b"", 40).expect("add");
        results.try_add(Dictionary::Words, 2, &k, b"", 3).expect("add");

        let offsets = results.request_offsets().expect("offsets");
        assert_eq!(3, offsets.len());
        assert_eq!(vec![3, 40, 7 | (1 << 31)], offsets.iter().collect::<Vec<u32>>());

        // offsets are scratch, results stay intact
        assert_eq!(3, results.len());
        assert_eq!(40, results.get(1).offset);
        assert_eq!(utf16("かけ"), results.key(&results.get(2)).collect::<Vec<u16>>());
    }

    #[test]
    fn sort_prefers_frequent_words() {
        let mut memory = vec![0u8; 1 << 18];
        let mut arena = Arena::split(&mut memory).expect("arena");
        let mut results = WordResults::open(&mut arena.word_results).expect("open");
        let k = key("か");
        for offset in 0..40u32 {
            let dictionary = if offset % 5 == 0 {
                Dictionary::Names
            } else {
                Dictionary::Words
            };
            results
                .try_add(dictionary, 1, &k, b"", offset)
                .expect("add");
        }
        for i in 0..results.len() {
            let mut result = results.get(i);
            result.freq = 1000 - result.offset * 10;
            results.set(i, &result);
        }

        results.sort_and_limit(32);
        assert_eq!(32, results.len());
        let freqs: Vec<u32> = results.iter().map(|r| r.freq).collect();
        assert!(freqs.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(1000 - 39 * 10, freqs[0]);
        assert!(results.iter().all(|r| r.offset >= 8));
    }

    #[test]
    fn sort_ties() {
        let mut memory = vec![0u8; 1 << 18];
        let mut arena = Arena::split(&mut memory).expect("arena");
        let mut results = WordResults::open(&mut arena.word_results).expect("open");
        let k = key("か");
        results.try_add(Dictionary::Names, 3, &k, b"", 1).expect("add");
        results.try_add(Dictionary::Words, 1, &k, b"", 2).expect("add");
        results.try_add(Dictionary::Words, 3, &k, b"", 3).expect("add");
        results.try_add(Dictionary::Words, 3, &k, b"", 4).expect("add");

        results.sort_and_limit(32);
        let order: Vec<(bool, u32)> = results.iter().map(|r| (r.is_name, r.offset)).collect();
        assert_eq!(vec![(false, 3), (false, 4), (false, 2), (true, 1)], order);
        assert!(results.iter().all(|r| r.freq == UNKNOWN_WORD_FREQ_ORDER));
    }
}
