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

//! Index keys of dictionary records

use itertools::Itertools;

use crate::dentry::Dentry;
use crate::dic::build::IndexBuilder;
use crate::dic::index::codec::IndexOffset;
use crate::pos::PosFlags;

const KATAKANA_FIRST: char = '\u{30a1}';
const KATAKANA_LAST: char = '\u{30f6}';
const KATAKANA_TO_HIRAGANA: u32 = 0x60;

/// Folds katakana to hiragana, everything else is kept
pub fn hiragana_key(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            KATAKANA_FIRST..=KATAKANA_LAST => {
                char::from_u32(c as u32 - KATAKANA_TO_HIRAGANA).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}

/// Conjugation classes named in the sense groups of a record
pub fn record_pos(dentry: &Dentry) -> PosFlags {
    dentry
        .sense_groups()
        .flat_map(|g| g.types())
        .filter_map(PosFlags::from_pos_name)
        .fold(PosFlags::empty(), |mask, pos| mask | pos)
}

/// Spellings and readings of a record, each once
pub fn record_keys(dentry: &Dentry) -> Vec<String> {
    dentry
        .kanji_groups()
        .flat_map(|g| g.kanjis())
        .chain(dentry.readings())
        .map(|s| hiragana_key(s.text))
        .filter(|k| !k.is_empty())
        .unique()
        .collect()
}

impl IndexBuilder {
    /// Indexes the record at `offset` under all of its keys, returns the number of keys.
    ///
    /// With `typed`, records of conjugating words get their mask as the offset type.
    pub fn add_record(&mut self, offset: u32, record: &str, typed: bool) -> usize {
        let dentry = Dentry::make(record);
        let pos = if typed {
            record_pos(&dentry)
        } else {
            PosFlags::empty()
        };
        let value = if pos.is_empty() {
            IndexOffset::Offset(offset)
        } else {
            IndexOffset::Typed {
                pos: pos.bits(),
                offset,
            }
        };
        let keys = record_keys(&dentry);
        for key in keys.iter() {
            self.add(key, value);
        }
        keys.len()
    }
}
