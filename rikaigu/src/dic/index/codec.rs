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

//! Packing of offsets and part-of-speech tags into the index stream.
//!
//! Every 32-bit value is stored as two 16-bit units. Each unit carries the
//! `101` marker in its three high bits, which no code unit of a key can have,
//! and 13 bits of payload. Bit 12 of the second unit marks a type tag.

use std::iter::FusedIterator;

use crate::arena::vardata::read_u32;

pub const PREFIX_MASK: u16 = 0xE000;
pub const PREFIX: u16 = 0xA000;
pub const SUFFIX_MASK: u16 = 0x1FFF;
pub const SUFFIX_BITS: u32 = 13;
/// Set in decoded values which are type tags
pub const TYPE_BIT: u32 = 1 << 25;
/// Offsets and types must be strictly smaller
pub const MAX_VALUE: u32 = TYPE_BIT;
/// Size of an encoded value in bytes
pub const VALUE_SIZE: usize = 4;

/// Offset of a dictionary record, optionally tagged with a part-of-speech mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOffset {
    Offset(u32),
    Typed { pos: u32, offset: u32 },
}

impl IndexOffset {
    #[inline]
    pub fn offset(&self) -> u32 {
        match *self {
            IndexOffset::Offset(offset) => offset,
            IndexOffset::Typed { offset, .. } => offset,
        }
    }

    /// Part of speech mask, 0 for untyped offsets
    #[inline]
    pub fn pos(&self) -> u32 {
        match *self {
            IndexOffset::Offset(_) => 0,
            IndexOffset::Typed { pos, .. } => pos,
        }
    }
}

#[inline]
pub fn is_offset_or_type(unit: u16) -> bool {
    unit & PREFIX_MASK == PREFIX
}

/// Splits a value into two marked units, `value` must be below [`MAX_VALUE`]
#[inline]
pub fn encode_value(value: u32, is_type: bool) -> [u16; 2] {
    debug_assert!(value < MAX_VALUE);
    let low = (value as u16 & SUFFIX_MASK) | PREFIX;
    let mut high = ((value >> SUFFIX_BITS) as u16 & SUFFIX_MASK) | PREFIX;
    if is_type {
        high |= 1 << 12;
    }
    [low, high]
}

#[inline]
pub fn decode_units(low: u16, high: u16) -> u32 {
    (low & SUFFIX_MASK) as u32 | (((high & SUFFIX_MASK) as u32) << SUFFIX_BITS)
}

/// Decodes a value from its 4 stored bytes, the type bit stays in the result
#[inline]
pub fn decode_value(bytes: &[u8]) -> u32 {
    let low = u16::from_le_bytes([bytes[0], bytes[1]]);
    let high = u16::from_le_bytes([bytes[2], bytes[3]]);
    decode_units(low, high)
}

/// Iterates over decoded index values stored as little-endian u32.
///
/// A type tag is not yielded by itself, every offset after it gets its type
/// until the next tag. Offsets before the first tag are untyped.
pub struct OffsetsIter<'a> {
    values: &'a [u8],
    position: usize,
    current_type: u32,
}

impl<'a> OffsetsIter<'a> {
    pub fn new(values: &'a [u8]) -> Self {
        debug_assert_eq!(values.len() % VALUE_SIZE, 0);
        OffsetsIter {
            values,
            position: 0,
            current_type: 0,
        }
    }
}

impl Iterator for OffsetsIter<'_> {
    type Item = IndexOffset;

    fn next(&mut self) -> Option<Self::Item> {
        while self.position < self.values.len() {
            let value = read_u32(self.values, self.position);
            self.position += VALUE_SIZE;
            if value & TYPE_BIT != 0 {
                self.current_type = value & !TYPE_BIT;
                continue;
            }
            return Some(match self.current_type {
                0 => IndexOffset::Offset(value),
                pos => IndexOffset::Typed { pos, offset: value },
            });
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = (self.values.len() - self.position) / VALUE_SIZE;
        (0, Some(rem))
    }
}

impl FusedIterator for OffsetsIter<'_> {}
