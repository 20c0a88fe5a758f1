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

//! Array of fixed-size records with variable-length payloads inside one buffer.
//!
//! Layout: `[header][record 0][record 1]...    free    ...[payload 1][payload 0]`.
//! Records grow forward from the header, payloads grow backward from the end of the
//! buffer, so payload offsets stay valid while records are inserted and moved.

use std::fmt;
use std::marker::PhantomData;

use crate::arena::Buffer;
use crate::error::{RikaiError, RikaiResult};

/// count: u32, stride: u32, tail: u32, padding
pub const HEADER_SIZE: usize = 16;

/// Fixed-size record stored in a [`VardataArray`]
pub trait Record: Sized {
    const SIZE: usize;

    fn encode(&self, out: &mut [u8]);
    fn decode(src: &[u8]) -> Self;
}

#[inline]
pub(crate) fn read_u32(src: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&src[at..at + 4]);
    u32::from_le_bytes(bytes)
}

#[inline]
pub(crate) fn write_u32(out: &mut [u8], at: usize, value: u32) {
    out[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Iterator over the records of a [`VardataArray`], in index order
pub struct Records<'a, R: Record> {
    data: &'a [u8],
    index: usize,
    count: usize,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Iterator for Records<'_, R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        if self.index >= self.count {
            return None;
        }
        let start = HEADER_SIZE + self.index * R::SIZE;
        self.index += 1;
        Some(R::decode(&self.data[start..start + R::SIZE]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl<R: Record> ExactSizeIterator for Records<'_, R> {}

pub struct VardataArray<'b, 'm, R: Record> {
    buffer: &'b mut Buffer<'m>,
    _record: PhantomData<R>,
}

impl<R: Record> fmt::Debug for VardataArray<'_, '_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VardataArray")
            .field("kind", &self.buffer.kind())
            .field("len", &self.len())
            .field("tail", &self.tail())
            .finish()
    }
}

impl<'b, 'm, R: Record> VardataArray<'b, 'm, R> {
    /// Resets the buffer and writes an empty array into it
    pub fn make(buffer: &'b mut Buffer<'m>) -> RikaiResult<Self> {
        buffer.clear();
        let tail = buffer.capacity() as u32;
        let header = buffer.allocate(HEADER_SIZE)?;
        write_u32(header, 0, 0);
        write_u32(header, 4, R::SIZE as u32);
        write_u32(header, 8, tail);
        write_u32(header, 12, 0);
        Ok(VardataArray {
            buffer,
            _record: PhantomData,
        })
    }

    /// Opens the array living in the buffer, making a new one when the buffer is empty
    pub fn open(buffer: &'b mut Buffer<'m>) -> RikaiResult<Self> {
        if buffer.is_empty() {
            return Self::make(buffer);
        }
        if read_u32(buffer.raw(), 4) as usize != R::SIZE {
            return Err(RikaiError::InvalidDataFormat(
                4,
                format!("{:?} does not hold records of {} bytes", buffer.kind(), R::SIZE),
            ));
        }
        Ok(VardataArray {
            buffer,
            _record: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        read_u32(self.buffer.raw(), 0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tail(&self) -> usize {
        read_u32(self.buffer.raw(), 8) as usize
    }

    fn set_header(&mut self, count: usize, tail: usize) {
        let raw = self.buffer.raw_mut();
        write_u32(raw, 0, count as u32);
        write_u32(raw, 8, tail as u32);
        self.buffer.set_size(HEADER_SIZE + count * R::SIZE);
    }

    #[inline]
    fn record_start(index: usize) -> usize {
        HEADER_SIZE + index * R::SIZE
    }

    pub fn get(&self, index: usize) -> R {
        debug_assert!(index < self.len());
        let start = Self::record_start(index);
        R::decode(&self.buffer.raw()[start..start + R::SIZE])
    }

    pub fn set(&mut self, index: usize, record: &R) {
        debug_assert!(index < self.len());
        let start = Self::record_start(index);
        record.encode(&mut self.buffer.raw_mut()[start..start + R::SIZE]);
    }

    pub fn iter(&self) -> Records<'_, R> {
        Records {
            data: self.buffer.raw(),
            index: 0,
            count: self.len(),
            _record: PhantomData,
        }
    }

    /// Records together with `bytes` of the free space after them.
    ///
    /// The free space is not reserved, the next insertion may overwrite it.
    pub fn with_free_space(&mut self, bytes: usize) -> RikaiResult<(Records<'_, R>, &mut [u8])> {
        let count = self.len();
        let records_end = self.buffer.size();
        let free = self.tail() - records_end;
        if bytes > free {
            return Err(RikaiError::CapacityExceeded {
                buffer: self.buffer.kind(),
                requested: bytes,
                available: free,
            });
        }
        let (records, rest) = self.buffer.raw_mut().split_at_mut(records_end);
        let records = Records {
            data: records,
            index: 0,
            count,
            _record: PhantomData,
        };
        Ok((records, &mut rest[..bytes]))
    }

    /// Appends `count` zeroed records and reserves `vardata_bytes` of payload in one step.
    ///
    /// Returns the offset of the reserved payload inside the buffer.
    pub fn enlarge(&mut self, count: usize, vardata_bytes: usize) -> RikaiResult<usize> {
        let old_count = self.len();
        let records_end = self.buffer.size();
        let free = self.tail() - records_end;
        let requested = count * R::SIZE + vardata_bytes;
        if requested > free {
            return Err(RikaiError::CapacityExceeded {
                buffer: self.buffer.kind(),
                requested,
                available: free,
            });
        }

        let new_tail = self.tail() - vardata_bytes;
        for b in &mut self.buffer.raw_mut()[records_end..records_end + count * R::SIZE] {
            *b = 0;
        }
        self.set_header(old_count + count, new_tail);
        Ok(new_tail)
    }

    /// Inserts a record at `index`, shifting the following records.
    ///
    /// `payload` parts are stored contiguously and `make` receives their offset.
    pub fn insert<F>(&mut self, index: usize, payload: &[&[u8]], make: F) -> RikaiResult<()>
    where
        F: FnOnce(u32) -> R,
    {
        let count = self.len();
        debug_assert!(index <= count);
        let payload_len = payload.iter().map(|p| p.len()).sum();
        let payload_start = self.enlarge(1, payload_len)?;

        let raw = self.buffer.raw_mut();
        let mut cursor = payload_start;
        for part in payload {
            raw[cursor..cursor + part.len()].copy_from_slice(part);
            cursor += part.len();
        }
        let from = Self::record_start(index);
        raw.copy_within(from..Self::record_start(count), from + R::SIZE);

        self.set(index, &make(payload_start as u32));
        Ok(())
    }

    pub fn push<F>(&mut self, payload: &[&[u8]], make: F) -> RikaiResult<()>
    where
        F: FnOnce(u32) -> R,
    {
        self.insert(self.len(), payload, make)
    }

    /// Moves the record at `from` to `to` (`to <= from`), shifting the records between
    pub fn move_back(&mut self, from: usize, to: usize) {
        debug_assert!(to <= from && from < self.len());
        let range = Self::record_start(to)..Self::record_start(from + 1);
        self.buffer.raw_mut()[range].rotate_right(R::SIZE);
    }

    /// Forgets records past `len`, their payloads are kept
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            let tail = self.tail();
            self.set_header(len, tail);
        }
    }

    pub fn payload(&self, offset: u32, len: usize) -> &[u8] {
        let start = offset as usize;
        &self.buffer.raw()[start..start + len]
    }
}
