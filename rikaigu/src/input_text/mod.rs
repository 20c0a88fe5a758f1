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

pub mod kana;

use crate::error::{RikaiError, RikaiResult};

pub use self::kana::kata_to_hira_character;
use self::kana::REPLACE_PREVIOUS;

/// Maximum number of UTF-16 code units of one lookup
pub const MAX_INPUT_LENGTH: usize = 32;

/// Text under the cursor, normalized in place before lookup
#[derive(Clone, Debug)]
pub struct Input {
    data: [u16; MAX_INPUT_LENGTH],
    /// Number of original code units consumed by the first `i` normalized units
    length_mapping: [u8; MAX_INPUT_LENGTH + 1],
    length: usize,
}

impl Default for Input {
    fn default() -> Self {
        Input {
            data: [0; MAX_INPUT_LENGTH],
            length_mapping: [0; MAX_INPUT_LENGTH + 1],
            length: 0,
        }
    }
}

impl Input {
    pub fn new(text: &[u16]) -> RikaiResult<Self> {
        let mut input = Input::default();
        input.set(text)?;
        Ok(input)
    }

    /// Replaces the content with raw text, mapping every unit to itself
    pub fn set(&mut self, text: &[u16]) -> RikaiResult<()> {
        if text.len() > MAX_INPUT_LENGTH {
            return Err(RikaiError::InputTooLong(text.len(), MAX_INPUT_LENGTH));
        }
        self.data[..text.len()].copy_from_slice(text);
        for (i, m) in self.length_mapping[..=text.len()].iter_mut().enumerate() {
            *m = i as u8;
        }
        self.length = text.len();
        Ok(())
    }

    /// Writable storage of the host, `set_length` must follow a write
    pub fn data_mut(&mut self) -> &mut [u16; MAX_INPUT_LENGTH] {
        &mut self.data
    }

    pub fn set_length(&mut self, length: usize) -> RikaiResult<()> {
        if length > MAX_INPUT_LENGTH {
            return Err(RikaiError::InputTooLong(length, MAX_INPUT_LENGTH));
        }
        let data = self.data;
        self.set(&data[..length])
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.data[..self.length]
    }

    pub fn length_mapping(&self) -> &[u8] {
        &self.length_mapping[..=self.length]
    }

    /// Number of original code units covered by the first `normalized_length` units
    pub fn original_length(&self, normalized_length: usize) -> usize {
        self.length_mapping[normalized_length] as usize
    }

    /// Folds katakana (full and half width) to hiragana in place
    pub fn kata_to_hira(&mut self) {
        let mut previous = 0u16;
        let mut out = 0;
        self.length_mapping[0] = 0;
        for i in 0..self.length {
            let converted = kata_to_hira_character(self.data[i], previous);
            let c = converted as u16;
            if converted & REPLACE_PREVIOUS != 0 {
                // only produced when `previous` is a real character
                debug_assert!(out > 0);
                self.data[out - 1] = c;
                self.length_mapping[out] = (i + 1) as u8;
            } else {
                self.data[out] = c;
                self.length_mapping[out + 1] = (i + 1) as u8;
                out += 1;
            }
            previous = c;
        }
        self.length = out;
    }
}
