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

use crate::dic::build::{BuiltIndex, IndexBuilder};
use crate::dic::index::codec::IndexOffset;

/// Keys of the test index with the byte size of their entries
pub const INDEX_FIXTURE: [(&str, usize); 10] = [
    ("五劫の", 750),
    ("住む処", 750),
    ("寿限無", 750),
    ("擦り切れ", 752),
    ("水行末", 1090),
    ("海砂利水魚の", 752),
    ("藪柑子", 750),
    ("長久命", 550),
    ("長助", 540),
    ("雲来末", 750),
];

/// Offsets of the `entry`-th fixture key: one typed offset and enough
/// untyped ones to fill `byte_size`
pub fn fixture_offsets(entry: usize, key: &str, byte_size: usize) -> Vec<IndexOffset> {
    let key_size = key.encode_utf16().count() * 2;
    let num_values = (byte_size - key_size) / 4;
    let i = entry as u32;
    let mut offsets = vec![
        IndexOffset::Typed {
            pos: 2 * i + 1,
            offset: 2 * i + 2,
        },
        IndexOffset::Offset(i),
    ];
    offsets.extend((0..num_values - 3).map(|j| IndexOffset::Offset((i * 7 + j as u32) % 10)));
    offsets
}

/// Ten entries over four chunks, with entries crossing chunk boundaries
/// and one ending exactly on a boundary
pub fn fixture_index() -> BuiltIndex {
    let mut builder = IndexBuilder::new();
    for (i, (key, size)) in INDEX_FIXTURE.iter().enumerate() {
        builder.extend(key, fixture_offsets(i, key, *size));
    }
    builder.build().expect("fixture index is valid")
}

pub fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}
