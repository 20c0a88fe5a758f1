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

use std::char::decode_utf16;
use std::cmp::Ordering;
use std::iter::FusedIterator;

/// Read UTF-16 code units from non-aligned storage
#[derive(Clone)]
pub struct U16CodeUnits<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> U16CodeUnits<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        U16CodeUnits { data, offset: 0 }
    }
}

impl Iterator for U16CodeUnits<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < self.offset + 2 {
            return None;
        }
        let p1 = self.data[self.offset];
        let p2 = self.data[self.offset + 1];
        self.offset += 2;
        Some(u16::from_le_bytes([p1, p2]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = (self.data.len() - self.offset) / 2;
        (rem, Some(rem))
    }
}

impl ExactSizeIterator for U16CodeUnits<'_> {}

impl FusedIterator for U16CodeUnits<'_> {}

fn code_points<I: IntoIterator<Item = u16>>(units: I) -> impl Iterator<Item = u32> {
    decode_utf16(units).map(|r| match r {
        Ok(c) => c as u32,
        Err(e) => e.unpaired_surrogate() as u32,
    })
}

/// Orders two UTF-16 strings by code points, a proper prefix goes first
pub fn compare_units<A, B>(a: A, b: B) -> Ordering
where
    A: IntoIterator<Item = u16>,
    B: IntoIterator<Item = u16>,
{
    code_points(a).cmp(code_points(b))
}

#[inline]
pub fn compare(a: &[u16], b: &[u16]) -> Ordering {
    compare_units(a.iter().copied(), b.iter().copied())
}

/// Length of `data[..length]` without its last code point
pub fn drop_code_point(data: &[u16], length: usize) -> usize {
    debug_assert!(length > 0);
    if length >= 2 && (data[length - 1] & 0xFC00) == 0xDC00 {
        length - 2
    } else {
        length - 1
    }
}

/// Little-endian bytes of UTF-16 code units
pub fn to_le_bytes(data: &[u16]) -> impl Iterator<Item = u8> + '_ {
    data.iter().flat_map(|c| c.to_le_bytes())
}
