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

//! Expansion of a surface form into the dictionary forms it may come from.
//!
//! Candidates are stored in the candidates buffer in discovery order.
//! Each one is expanded once with the rules allowed by its own part of speech
//! mask, unless an earlier candidate (or the root word) has the same text.

pub mod rules;

use crate::arena::vardata::{read_u32, write_u32, Record, Records, VardataArray};
use crate::arena::{Buffer, BufferKind};
use crate::error::{RikaiError, RikaiResult};
use crate::pos::PosFlags;
use crate::util::utf16::U16CodeUnits;

use self::rules::{DeinflectionRule, RuleTable};

/// Longest word a candidate can hold, in UTF-16 code units
pub const MAX_CANDIDATE_LENGTH: usize = 64;
/// Longest comma-joined chain of inflection names, in bytes
pub const MAX_INFLECTION_NAME_LENGTH: usize = 512;

/// One hypothesis about the dictionary form of the input.
///
/// Payload holds the word as UTF-16LE followed by the inflection names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub vardata_start_offset: u32,
    pub word_length: u16,
    pub inflection_name_length: u16,
    pub pos: PosFlags,
}

impl Record for Candidate {
    const SIZE: usize = 12;

    fn encode(&self, out: &mut [u8]) {
        write_u32(out, 0, self.vardata_start_offset);
        out[4..6].copy_from_slice(&self.word_length.to_le_bytes());
        out[6..8].copy_from_slice(&self.inflection_name_length.to_le_bytes());
        write_u32(out, 8, self.pos.bits());
    }

    fn decode(src: &[u8]) -> Self {
        Candidate {
            vardata_start_offset: read_u32(src, 0),
            word_length: u16::from_le_bytes([src[4], src[5]]),
            inflection_name_length: u16::from_le_bytes([src[6], src[7]]),
            pos: PosFlags::from_bits_retain(read_u32(src, 8)),
        }
    }
}

impl Candidate {
    fn word_byte_length(&self) -> usize {
        self.word_length as usize * 2
    }

    fn payload_length(&self) -> usize {
        self.word_byte_length() + self.inflection_name_length as usize
    }
}

/// Candidates produced by the last call to [`deinflect`]
#[derive(Debug)]
pub struct Candidates<'b, 'm> {
    array: VardataArray<'b, 'm, Candidate>,
}

impl<'b, 'm> Candidates<'b, 'm> {
    pub fn open(buffer: &'b mut Buffer<'m>) -> RikaiResult<Self> {
        debug_assert_eq!(BufferKind::Candidates, buffer.kind());
        Ok(Candidates {
            array: VardataArray::open(buffer)?,
        })
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn get(&self, index: usize) -> Candidate {
        self.array.get(index)
    }

    pub fn iter(&self) -> Records<'_, Candidate> {
        self.array.iter()
    }

    pub fn word_bytes(&self, candidate: &Candidate) -> &[u8] {
        self.array
            .payload(candidate.vardata_start_offset, candidate.word_byte_length())
    }

    pub fn word(&self, candidate: &Candidate) -> U16CodeUnits<'_> {
        U16CodeUnits::new(self.word_bytes(candidate))
    }

    /// Comma-joined names of the rules which produced the candidate
    pub fn inflection_name_bytes(&self, candidate: &Candidate) -> &[u8] {
        let start = candidate.vardata_start_offset + candidate.word_byte_length() as u32;
        self.array
            .payload(start, candidate.inflection_name_length as usize)
    }

    pub fn inflection_name(&self, candidate: &Candidate) -> &str {
        // names are only ever built from whole rule names and commas
        std::str::from_utf8(self.inflection_name_bytes(candidate)).unwrap_or_default()
    }
}

/// A candidate copied out of the candidates buffer, so it stays readable while the buffer changes
pub struct CandidateText {
    units: [u16; MAX_CANDIDATE_LENGTH],
    bytes: [u8; MAX_CANDIDATE_LENGTH * 2],
    length: usize,
    name: [u8; MAX_INFLECTION_NAME_LENGTH],
    name_length: usize,
}

impl Default for CandidateText {
    fn default() -> Self {
        CandidateText {
            units: [0; MAX_CANDIDATE_LENGTH],
            bytes: [0; MAX_CANDIDATE_LENGTH * 2],
            length: 0,
            name: [0; MAX_INFLECTION_NAME_LENGTH],
            name_length: 0,
        }
    }
}

impl CandidateText {
    pub fn set(&mut self, word: &[u16], name: &[u8]) -> RikaiResult<()> {
        if word.len() > MAX_CANDIDATE_LENGTH || name.len() > MAX_INFLECTION_NAME_LENGTH {
            return Err(too_long(word.len() * 2 + name.len()));
        }
        self.units[..word.len()].copy_from_slice(word);
        for (i, unit) in word.iter().enumerate() {
            self.bytes[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        self.length = word.len();
        self.name[..name.len()].copy_from_slice(name);
        self.name_length = name.len();
        Ok(())
    }

    pub fn load(&mut self, candidates: &Candidates, candidate: &Candidate) -> RikaiResult<()> {
        let length = candidate.word_length as usize;
        let name_length = candidate.inflection_name_length as usize;
        if length > MAX_CANDIDATE_LENGTH || name_length > MAX_INFLECTION_NAME_LENGTH {
            return Err(too_long(candidate.payload_length()));
        }
        for (i, unit) in candidates.word(candidate).enumerate() {
            self.units[i] = unit;
        }
        self.bytes[..length * 2].copy_from_slice(candidates.word_bytes(candidate));
        self.length = length;
        self.name[..name_length].copy_from_slice(candidates.inflection_name_bytes(candidate));
        self.name_length = name_length;
        Ok(())
    }

    pub fn word(&self) -> &[u16] {
        &self.units[..self.length]
    }

    pub fn word_bytes(&self) -> &[u8] {
        &self.bytes[..self.length * 2]
    }

    pub fn name(&self) -> &[u8] {
        &self.name[..self.name_length]
    }
}

fn too_long(requested: usize) -> RikaiError {
    RikaiError::CapacityExceeded {
        buffer: BufferKind::Candidates,
        requested,
        available: MAX_CANDIDATE_LENGTH * 2 + MAX_INFLECTION_NAME_LENGTH,
    }
}

/// Appends the candidate obtained by rewriting the suffix of `word` with `rule`
pub fn apply_rule(
    candidates: &mut Candidates,
    rule: &DeinflectionRule,
    word_bytes: &[u8],
    inflection_name: &[u8],
) -> RikaiResult<()> {
    let stem_bytes = word_bytes.len() - rule.suffix.len() * 2;
    let word_length = stem_bytes / 2 + rule.new_suffix.len();
    if word_length > MAX_CANDIDATE_LENGTH {
        return Err(too_long(word_length * 2));
    }
    let mut new_suffix = [0u8; MAX_CANDIDATE_LENGTH * 2];
    for (i, unit) in rule.new_suffix.iter().enumerate() {
        new_suffix[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    let new_suffix = &new_suffix[..rule.new_suffix.len() * 2];

    let separator: &[u8] = if inflection_name.is_empty() { b"" } else { b"," };
    let name_length = inflection_name.len() + separator.len() + rule.inflection_name.len();
    if name_length > MAX_INFLECTION_NAME_LENGTH {
        return Err(too_long(name_length));
    }

    candidates.array.push(
        &[
            &word_bytes[..stem_bytes],
            new_suffix,
            inflection_name,
            separator,
            rule.inflection_name.as_bytes(),
        ],
        |vardata_start_offset| Candidate {
            vardata_start_offset,
            word_length: word_length as u16,
            inflection_name_length: name_length as u16,
            pos: rule.target_pos_mask,
        },
    )
}

/// Applies every rule which matches a suffix of `word` and accepts one of `pos`
fn deinflect_one_word(
    candidates: &mut Candidates,
    rules: &RuleTable,
    pos: PosFlags,
    word: &CandidateText,
) -> RikaiResult<()> {
    let units = word.word();
    let max_length = rules.max_suffix_length().min(units.len());
    for suffix_length in (1..=max_length).rev() {
        let suffix = &units[units.len() - suffix_length..];
        let range = match rules.rule_index_bounds_for_suffix(suffix) {
            Some(r) => r,
            None => continue,
        };
        for rule in &rules.rules()[range] {
            if !pos.intersects(rule.source_pos_mask) {
                continue;
            }
            apply_rule(candidates, rule, word.word_bytes(), word.name())?;
        }
    }
    Ok(())
}

fn seen_before(candidates: &Candidates, index: usize, root: &[u8]) -> bool {
    let candidate = candidates.get(index);
    let word = candidates.word_bytes(&candidate);
    word == root
        || (0..index).any(|i| {
            let earlier = candidates.get(i);
            earlier.word_length == candidate.word_length && candidates.word_bytes(&earlier) == word
        })
}

/// Fills the candidates buffer with every form reachable from `word`
pub fn deinflect<'b, 'm>(
    buffer: &'b mut Buffer<'m>,
    rules: &RuleTable,
    word: &[u16],
) -> RikaiResult<Candidates<'b, 'm>> {
    let mut candidates = Candidates {
        array: VardataArray::make(buffer)?,
    };
    let mut scratch = CandidateText::default();
    scratch.set(word, &[])?;
    deinflect_one_word(&mut candidates, rules, PosFlags::ANY_POS, &scratch)?;

    let root = scratch.bytes;
    let root = &root[..word.len() * 2];
    let mut current = 0;
    while current < candidates.len() {
        if !seen_before(&candidates, current, root) {
            let candidate = candidates.get(current);
            scratch.load(&candidates, &candidate)?;
            deinflect_one_word(&mut candidates, rules, candidate.pos, &scratch)?;
        }
        current += 1;
    }

    tracing::trace!(candidates = candidates.len(), "deinflected");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::util::testing::utf16;
    use claim::assert_matches;
    use rules::embedded_rules;

    fn words(candidates: &Candidates) -> Vec<String> {
        candidates
            .iter()
            .map(|c| String::from_utf16_lossy(&candidates.word(&c).collect::<Vec<u16>>()))
            .collect()
    }

    #[test]
    fn koki_tsukawarete() {
        let mut memory = vec![0u8; 1 << 18];
        let mut arena = Arena::split(&mut memory).expect("arena");
        let rules = embedded_rules().expect("rules");
        let candidates =
            deinflect(&mut arena.candidates, rules, &utf16("こき使われて")).expect("deinflect");
        assert_eq!(
            vec![
                "こき使われつ",
                "こき使われる",
                "こき使われてる",
                "こき使う",
                "こき使わる",
                "こき使われつ",
            ],
            words(&candidates)
        );

        let first = candidates.get(0);
        assert_eq!(PosFlags::V5T, first.pos);
        assert_eq!("imperative", candidates.inflection_name(&first));
        let passive = candidates.get(3);
        assert_eq!(PosFlags::V5U, passive.pos);
        assert_eq!("-te,passive", candidates.inflection_name(&passive));
    }

    #[test]
    fn kakerarete() {
        let mut memory = vec![0u8; 1 << 18];
        let mut arena = Arena::split(&mut memory).expect("arena");
        let rules = embedded_rules().expect("rules");
        let candidates =
            deinflect(&mut arena.candidates, rules, &utf16("かけられて")).expect("deinflect");
        let found = words(&candidates);
        assert_eq!(
            vec![
                "かけられつ",
                "かけられる",
                "かけられてる",
                "かける",
                "かける",
                "かけらる",
                "かけられつ",
                "かく",
            ],
            found
        );
        let v1 = candidates.get(3);
        assert!(v1.pos.contains(PosFlags::V1));
    }

    #[test]
    fn nothing_to_rewrite() {
        let mut memory = vec![0u8; 1 << 18];
        let mut arena = Arena::split(&mut memory).expect("arena");
        let rules = embedded_rules().expect("rules");
        let candidates = deinflect(&mut arena.candidates, rules, &utf16("abc")).expect("deinflect");
        assert!(candidates.is_empty());
    }

    #[test]
    fn small_buffer_overflows() {
        let mut memory = vec![0u8; 1 << 18];
        let mut arena =
            Arena::split_with_sizes(&mut memory, [64, 1024, 1024, 1024, 1024]).expect("arena");
        let rules = embedded_rules().expect("rules");
        assert_matches!(
            deinflect(&mut arena.candidates, rules, &utf16("こき使われて")),
            Err(RikaiError::CapacityExceeded {
                buffer: BufferKind::Candidates,
                ..
            })
        );
    }
}
