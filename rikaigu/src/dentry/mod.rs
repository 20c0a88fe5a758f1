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

//! Dictionary records.
//!
//! A record is one line of the dictionary file:
//! `kanji groups \t readings \t sense groups \t frequency`, where the kanji
//! groups and the frequency may be missing. [`Dentry`] is a view over such a
//! line; nothing is copied, every part is split lazily on access.

use crate::arena::vardata::{read_u32, write_u32, Record, VardataArray};
use crate::arena::Buffer;
use crate::error::{RikaiError, RikaiResult};

/// Frequency rank of records which do not carry one, they sort after every ranked record
pub const UNKNOWN_WORD_FREQ_ORDER: u32 = u32::MAX;

/// Kanji or kana spelling of a word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface<'a> {
    pub text: &'a str,
    pub common: bool,
}

impl<'a> Surface<'a> {
    /// Trailing `U` marks an uncommon spelling
    pub fn parse(raw: &'a str) -> Self {
        match raw.strip_suffix('U') {
            Some(text) => Surface {
                text: text.strip_suffix('|').unwrap_or(text),
                common: false,
            },
            None => Surface {
                text: raw,
                common: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KanjiGroup<'a> {
    kanjis: &'a str,
    reading_indices: Option<&'a str>,
}

impl<'a> KanjiGroup<'a> {
    pub fn parse(raw: &'a str) -> Self {
        match raw.find('#') {
            Some(pos) => KanjiGroup {
                kanjis: &raw[..pos],
                reading_indices: Some(&raw[pos + 1..]),
            },
            None => KanjiGroup {
                kanjis: raw,
                reading_indices: None,
            },
        }
    }

    pub fn kanjis(&self) -> impl Iterator<Item = Surface<'a>> {
        self.kanjis.split(',').map(Surface::parse)
    }

    /// Whether the group applies only to some readings of the entry
    pub fn is_restricted(&self) -> bool {
        self.reading_indices.is_some()
    }

    /// Indices of the readings the group applies to, empty when it applies to all of them
    pub fn reading_indices(&self) -> impl Iterator<Item = usize> + 'a {
        self.reading_indices
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.parse().ok())
    }
}

/// Parts of speech and glosses sharing them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenseGroup<'a> {
    types: &'a str,
    senses: &'a str,
}

impl<'a> SenseGroup<'a> {
    pub fn parse(raw: &'a str) -> Self {
        match raw.find(';') {
            Some(pos) => SenseGroup {
                types: &raw[..pos],
                senses: &raw[pos + 1..],
            },
            None => SenseGroup {
                types: "",
                senses: raw,
            },
        }
    }

    pub fn types(&self) -> impl Iterator<Item = &'a str> {
        self.types.split(',').filter(|t| !t.is_empty())
    }

    pub fn senses(&self) -> impl Iterator<Item = &'a str> {
        self.senses.split('`')
    }

    pub fn num_senses(&self) -> usize {
        self.senses.matches('`').count() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dentry<'a> {
    kanjis: Option<&'a str>,
    readings: &'a str,
    definition: &'a str,
    pub freq: u32,
}

fn parse_freq(s: &str) -> Option<u32> {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

impl<'a> Dentry<'a> {
    pub fn make(raw: &'a str) -> Self {
        let mut parts = [""; 4];
        let mut num_parts = 0;
        for part in raw.splitn(4, '\t') {
            parts[num_parts] = part;
            num_parts += 1;
        }

        match num_parts {
            4 => Dentry {
                kanjis: Some(parts[0]),
                readings: parts[1],
                definition: parts[2],
                freq: parse_freq(parts[3]).unwrap_or(UNKNOWN_WORD_FREQ_ORDER),
            },
            3 => match parse_freq(parts[2]) {
                Some(freq) => Dentry {
                    kanjis: None,
                    readings: parts[0],
                    definition: parts[1],
                    freq,
                },
                None => Dentry {
                    kanjis: Some(parts[0]),
                    readings: parts[1],
                    definition: parts[2],
                    freq: UNKNOWN_WORD_FREQ_ORDER,
                },
            },
            2 => Dentry {
                kanjis: None,
                readings: parts[0],
                definition: parts[1],
                freq: UNKNOWN_WORD_FREQ_ORDER,
            },
            _ => Dentry {
                kanjis: None,
                readings: parts[0],
                definition: "",
                freq: UNKNOWN_WORD_FREQ_ORDER,
            },
        }
    }

    pub fn has_kanji(&self) -> bool {
        self.kanjis.is_some()
    }

    pub fn kanji_groups(&self) -> impl Iterator<Item = KanjiGroup<'a>> {
        self.kanjis
            .into_iter()
            .flat_map(|k| k.split(';'))
            .map(KanjiGroup::parse)
    }

    pub fn readings(&self) -> impl Iterator<Item = Surface<'a>> {
        self.readings.split(';').map(Surface::parse)
    }

    pub fn reading(&self, index: usize) -> Option<Surface<'a>> {
        self.readings().nth(index)
    }

    pub fn num_readings(&self) -> usize {
        self.readings.matches(';').count() + 1
    }

    pub fn sense_groups(&self) -> impl Iterator<Item = SenseGroup<'a>> {
        self.definition.split('\\').map(SenseGroup::parse)
    }
}

/// Location of a record inside the raw dentries buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DentrySpan {
    pub start: u32,
    pub length: u32,
    pub freq: u32,
}

impl Record for DentrySpan {
    const SIZE: usize = 12;

    fn encode(&self, out: &mut [u8]) {
        write_u32(out, 0, self.start);
        write_u32(out, 4, self.length);
        write_u32(out, 8, self.freq);
    }

    fn decode(src: &[u8]) -> Self {
        DentrySpan {
            start: read_u32(src, 0),
            length: read_u32(src, 4),
            freq: read_u32(src, 8),
        }
    }
}

/// Spans of all records received for the current search
#[derive(Debug)]
pub struct DentrySpans<'b, 'm> {
    array: VardataArray<'b, 'm, DentrySpan>,
}

impl<'b, 'm> DentrySpans<'b, 'm> {
    pub fn make(buffer: &'b mut Buffer<'m>) -> RikaiResult<Self> {
        Ok(DentrySpans {
            array: VardataArray::make(buffer)?,
        })
    }

    pub fn open(buffer: &'b mut Buffer<'m>) -> RikaiResult<Self> {
        Ok(DentrySpans {
            array: VardataArray::open(buffer)?,
        })
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn get(&self, index: usize) -> DentrySpan {
        self.array.get(index)
    }

    pub fn push(&mut self, span: DentrySpan) -> RikaiResult<u32> {
        let index = self.array.len() as u32;
        self.array.push(&[], |_| span)?;
        Ok(index)
    }
}

/// Text of a record stored in the raw dentries buffer
pub fn record_text<'a>(raw: &'a [u8], span: &DentrySpan) -> RikaiResult<&'a str> {
    let start = span.start as usize;
    let bytes = &raw[start..start + span.length as usize];
    std::str::from_utf8(bytes).map_err(|e| {
        RikaiError::InvalidDataFormat(start + e.valid_up_to(), String::from("record is not UTF-8"))
    })
}
