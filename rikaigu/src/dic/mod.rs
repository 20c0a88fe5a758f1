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

pub mod build;
pub mod index;
pub mod names_types;
pub mod storage;

use crate::dic::index::DictionaryIndex;
use crate::error::{RikaiError, RikaiResult};

/// Set in offsets of names records when they are requested from the host
pub const NAMES_OFFSET_FLAG: u32 = 1 << 31;

/// Sub-dictionary an index or a record belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dictionary {
    Words,
    Names,
}

impl Dictionary {
    pub const ALL: [Dictionary; 2] = [Dictionary::Words, Dictionary::Names];

    pub fn is_names(self) -> bool {
        self == Dictionary::Names
    }

    /// Offset of a record as it is sent in read requests
    #[inline]
    pub fn request_offset(self, offset: u32) -> u32 {
        match self {
            Dictionary::Words => offset,
            Dictionary::Names => offset | NAMES_OFFSET_FLAG,
        }
    }
}

/// Indices of both dictionaries
#[derive(Clone, Copy, Debug)]
pub struct Dictionaries<'a> {
    words: DictionaryIndex<'a>,
    names: DictionaryIndex<'a>,
}

impl<'a> Dictionaries<'a> {
    pub fn new(words: DictionaryIndex<'a>, names: DictionaryIndex<'a>) -> RikaiResult<Self> {
        if words.dictionary() != Dictionary::Words || names.dictionary() != Dictionary::Names {
            return Err(RikaiError::InvalidDataFormat(
                0,
                String::from("words and names indices are swapped"),
            ));
        }
        Ok(Dictionaries { words, names })
    }

    pub fn index(&self, dictionary: Dictionary) -> &DictionaryIndex<'a> {
        match dictionary {
            Dictionary::Words => &self.words,
            Dictionary::Names => &self.names,
        }
    }
}
