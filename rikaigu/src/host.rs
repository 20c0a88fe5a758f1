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

use crate::arena::vardata::read_u32;

/// Record offsets of one read request, stored as little-endian u32
#[derive(Clone, Copy, Debug)]
pub struct RequestOffsets<'a> {
    data: &'a [u8],
}

impl<'a> RequestOffsets<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        debug_assert_eq!(0, data.len() % 4);
        RequestOffsets { data }
    }

    pub fn len(&self) -> usize {
        self.data.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> u32 {
        read_u32(self.data, index * 4)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + 'a {
        let data = self.data;
        (0..data.len() / 4).map(move |i| read_u32(data, i * 4))
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }
}

/// Application which embeds the engine.
///
/// The engine never reads dictionary records itself: it hands record offsets
/// over with [`Host::request_read_dictionary`] and resumes when the host passes
/// the records to `search_finish`.
pub trait Host {
    /// Asks for the records at `offsets`, names records have bit 31 set.
    ///
    /// Records must be returned in the same order, each prefixed with its
    /// byte length as a little-endian u16.
    fn request_read_dictionary(&mut self, offsets: RequestOffsets<'_>, request_id: u32);

    /// Reports an internal failure after which the current call is abandoned
    fn take_a_trip(&mut self, message: &str);
}

/// Host which remembers the last request, for hosts that answer synchronously
#[derive(Debug, Default, Clone)]
pub struct PendingRequest {
    pub offsets: Vec<u32>,
    pub request_id: u32,
    pub failures: Vec<String>,
}

impl Host for PendingRequest {
    fn request_read_dictionary(&mut self, offsets: RequestOffsets<'_>, request_id: u32) {
        self.offsets.clear();
        self.offsets.extend(offsets.iter());
        self.request_id = request_id;
    }

    fn take_a_trip(&mut self, message: &str) {
        tracing::error!(message, "search abandoned");
        self.failures.push(message.to_owned());
    }
}
