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

//! Fixed memory model of the engine.
//!
//! One memory block supplied by the host is split once into six 8-byte aligned
//! buffers. Every buffer is a bump allocator which can only be reset as a whole,
//! and running out of capacity is an error for the current call.

pub mod vardata;

use std::fmt;

use crate::error::{RikaiError, RikaiResult};

pub const BUFFER_ALIGNMENT: usize = 8;

/// Buffers of the arena, in memory order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Deinflection candidates of the word being searched
    Candidates,
    /// Cache of already resolved index entries
    IndexEntries,
    /// Accumulated search results
    WordResults,
    /// Dictionary records supplied by the host
    RawDentries,
    /// Record spans and frequencies attached to the results
    Dentries,
    /// Rendered output
    Html,
}

impl BufferKind {
    pub const ALL: [BufferKind; 6] = [
        BufferKind::Candidates,
        BufferKind::IndexEntries,
        BufferKind::WordResults,
        BufferKind::RawDentries,
        BufferKind::Dentries,
        BufferKind::Html,
    ];
}

/// Capacities of all buffers but the last one, which receives the rest of the block
pub const DEFAULT_BUFFER_SIZES: [usize; 5] = [1 << 14, 1 << 17, 1 << 15, 1 << 16, 1 << 12];

/// Bump-allocated region of the arena
pub struct Buffer<'m> {
    kind: BufferKind,
    data: &'m mut [u8],
    size: usize,
}

impl<'m> Buffer<'m> {
    fn new(kind: BufferKind, data: &'m mut [u8]) -> Self {
        Buffer {
            kind,
            data,
            size: 0,
        }
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn available(&self) -> usize {
        self.capacity() - self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn clear(&mut self) {
        self.size = 0;
    }

    /// Allocated part of the buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.size]
    }

    /// Reserves `num_bytes` at the end of the allocated part
    pub fn allocate(&mut self, num_bytes: usize) -> RikaiResult<&mut [u8]> {
        if self.available() < num_bytes {
            return Err(self.overflow(num_bytes));
        }
        let start = self.size;
        self.size += num_bytes;
        Ok(&mut self.data[start..self.size])
    }

    pub fn append(&mut self, bytes: &[u8]) -> RikaiResult<()> {
        self.allocate(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    #[inline]
    pub fn append_str(&mut self, text: &str) -> RikaiResult<()> {
        self.append(text.as_bytes())
    }

    pub(crate) fn overflow(&self, requested: usize) -> RikaiError {
        RikaiError::CapacityExceeded {
            buffer: self.kind,
            requested,
            available: self.available(),
        }
    }

    pub(crate) fn raw(&self) -> &[u8] {
        &self.data[..]
    }

    pub(crate) fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }

    pub(crate) fn set_size(&mut self, size: usize) {
        debug_assert!(size <= self.capacity());
        self.size = size;
    }
}

impl fmt::Debug for Buffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("capacity", &self.data.len())
            .finish()
    }
}

/// All buffers of one engine
#[derive(Debug)]
pub struct Arena<'m> {
    pub candidates: Buffer<'m>,
    pub index_entries: Buffer<'m>,
    pub word_results: Buffer<'m>,
    pub raw_dentries: Buffer<'m>,
    pub dentries: Buffer<'m>,
    pub html: Buffer<'m>,
}

fn carve<'m>(rest: &mut &'m mut [u8], size: usize) -> &'m mut [u8] {
    let (head, tail) = std::mem::take(rest).split_at_mut(size);
    *rest = tail;
    head
}

impl<'m> Arena<'m> {
    /// Splits the memory block with the default capacities
    pub fn split(memory: &'m mut [u8]) -> RikaiResult<Self> {
        Self::split_with_sizes(memory, DEFAULT_BUFFER_SIZES)
    }

    pub fn split_with_sizes(memory: &'m mut [u8], sizes: [usize; 5]) -> RikaiResult<Self> {
        let total = memory.len();
        let sizes = sizes.map(|s| s - s % BUFFER_ALIGNMENT);
        let skip = memory.as_ptr().align_offset(BUFFER_ALIGNMENT);
        let required = sizes.iter().sum::<usize>() + skip + BUFFER_ALIGNMENT;
        if skip > total || total < required {
            return Err(RikaiError::NotEnoughMemory(total, required));
        }

        let mut rest = &mut memory[skip..];
        let candidates = carve(&mut rest, sizes[0]);
        let index_entries = carve(&mut rest, sizes[1]);
        let word_results = carve(&mut rest, sizes[2]);
        let raw_dentries = carve(&mut rest, sizes[3]);
        let dentries = carve(&mut rest, sizes[4]);
        let html_size = rest.len() - rest.len() % BUFFER_ALIGNMENT;
        let html = carve(&mut rest, html_size);

        tracing::debug!(total, html_size, "memory split into buffers");

        Ok(Arena {
            candidates: Buffer::new(BufferKind::Candidates, candidates),
            index_entries: Buffer::new(BufferKind::IndexEntries, index_entries),
            word_results: Buffer::new(BufferKind::WordResults, word_results),
            raw_dentries: Buffer::new(BufferKind::RawDentries, raw_dentries),
            dentries: Buffer::new(BufferKind::Dentries, dentries),
            html: Buffer::new(BufferKind::Html, html),
        })
    }

    pub fn buffer(&self, kind: BufferKind) -> &Buffer<'m> {
        match kind {
            BufferKind::Candidates => &self.candidates,
            BufferKind::IndexEntries => &self.index_entries,
            BufferKind::WordResults => &self.word_results,
            BufferKind::RawDentries => &self.raw_dentries,
            BufferKind::Dentries => &self.dentries,
            BufferKind::Html => &self.html,
        }
    }

    /// Drops everything allocated by the previous call
    pub fn clear(&mut self) {
        self.candidates.clear();
        self.index_entries.clear();
        self.word_results.clear();
        self.raw_dentries.clear();
        self.dentries.clear();
        self.html.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::assert_matches;

    #[test]
    fn split_is_aligned_and_complete() {
        let mut memory = vec![0u8; 300_003];
        let arena = Arena::split(&mut memory).expect("split");
        for kind in BufferKind::ALL.iter() {
            let buffer = arena.buffer(*kind);
            assert_eq!(0, buffer.raw().as_ptr() as usize % BUFFER_ALIGNMENT);
            assert_eq!(0, buffer.capacity() % BUFFER_ALIGNMENT);
            assert_eq!(*kind, buffer.kind());
        }
        assert_eq!(1 << 14, arena.candidates.capacity());
        assert_eq!(1 << 12, arena.dentries.capacity());
        let fixed: usize = DEFAULT_BUFFER_SIZES.iter().sum();
        assert!(arena.html.capacity() + fixed <= 300_003);
        assert!(arena.html.capacity() + fixed + 2 * BUFFER_ALIGNMENT > 300_003);
    }

    #[test]
    fn too_small_memory() {
        let mut memory = vec![0u8; 1024];
        assert_matches!(
            Arena::split(&mut memory),
            Err(RikaiError::NotEnoughMemory(1024, _))
        );
    }

    #[test]
    fn allocation_is_bounded() {
        let mut memory = vec![0u8; 256];
        let mut arena = Arena::split_with_sizes(&mut memory, [16, 16, 16, 16, 16]).expect("split");
        arena.candidates.append(b"0123456789").expect("fits");
        assert_eq!(10, arena.candidates.size());
        assert_eq!(b"0123456789", arena.candidates.as_slice());
        assert_matches!(
            arena.candidates.allocate(7),
            Err(RikaiError::CapacityExceeded {
                buffer: BufferKind::Candidates,
                requested: 7,
                available: 6
            })
        );
        // failed allocation leaves the buffer untouched
        assert_eq!(10, arena.candidates.size());
        arena.candidates.allocate(6).expect("fits exactly");
        arena.clear();
        assert!(arena.candidates.is_empty());
    }
}
