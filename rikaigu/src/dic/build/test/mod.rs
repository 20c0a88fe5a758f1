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

use super::*;
use crate::dic::index::codec::{decode_value, IndexOffset, OffsetsIter, MAX_VALUE, TYPE_BIT};
use crate::dic::index::CHUNK_SIZE;
use crate::util::testing::{fixture_index, INDEX_FIXTURE};
use claim::assert_matches;

fn encoded(key: &str, offsets: &[IndexOffset]) -> Result<Vec<u8>, IndexBuildError> {
    let mut out = Vec::new();
    IndexBuilder::encode_entry(key, offsets, &mut out)?;
    Ok(out)
}

/// Decodes the values after a key of `key_units` code units
fn decoded_values(entry: &[u8], key_units: usize) -> Vec<u8> {
    entry[key_units * 2..]
        .chunks(4)
        .flat_map(|c| decode_value(c).to_le_bytes())
        .collect()
}

#[test]
fn untyped_offsets_go_first() {
    let offsets = [
        IndexOffset::Typed { pos: 2, offset: 5 },
        IndexOffset::Offset(3),
        IndexOffset::Typed { pos: 1, offset: 7 },
        IndexOffset::Typed { pos: 2, offset: 9 },
        IndexOffset::Offset(4),
    ];
    let entry = encoded("かく", &offsets).expect("valid entry");
    assert_eq!(2 * 2 + 7 * 4, entry.len());
    assert_eq!(&entry[..4], &[0x4B, 0x30, 0x4F, 0x30]);

    let values = decoded_values(&entry, 2);
    assert_eq!(TYPE_BIT | 1, u32::from_le_bytes([values[8], values[9], values[10], values[11]]));
    let decoded: Vec<_> = OffsetsIter::new(&values).collect();
    assert_eq!(
        vec![
            IndexOffset::Offset(3),
            IndexOffset::Offset(4),
            IndexOffset::Typed { pos: 1, offset: 7 },
            IndexOffset::Typed { pos: 2, offset: 5 },
            IndexOffset::Typed { pos: 2, offset: 9 },
        ],
        decoded
    );
}

#[test]
fn invalid_entries() {
    let one = [IndexOffset::Offset(1)];
    assert_eq!(Err(IndexBuildError::EmptyKey), encoded("", &one));
    assert_eq!(
        Err(IndexBuildError::NoOffsets(String::from("かく"))),
        encoded("かく", &[])
    );
    assert_eq!(
        Err(IndexBuildError::KeyContainsMarker(String::from("a\u{a500}"))),
        encoded("a\u{a500}", &one)
    );
    assert_eq!(
        Err(IndexBuildError::ValueOutOfRange {
            key: String::from("a"),
            value: MAX_VALUE,
        }),
        encoded("a", &[IndexOffset::Offset(MAX_VALUE)])
    );
    assert_matches!(
        encoded("a", &[IndexOffset::Typed { pos: MAX_VALUE + 1, offset: 0 }]),
        Err(IndexBuildError::ValueOutOfRange { .. })
    );
}

#[test]
fn entry_must_fit_in_a_chunk() {
    let values: Vec<_> = (0..(CHUNK_SIZE as u32 - 4) / 4).map(IndexOffset::Offset).collect();
    assert_eq!(Ok(CHUNK_SIZE - 2), encoded("a", &values).map(|e| e.len()));
    // an entry filling a whole chunk has no boundary inside it
    assert_eq!(
        Err(IndexBuildError::EntryTooLong {
            key: String::from("ab"),
            length: CHUNK_SIZE,
        }),
        encoded("ab", &values)
    );

    let too_many: Vec<_> = (0..600).map(IndexOffset::Offset).collect();
    assert_eq!(
        Err(IndexBuildError::EntryTooLong {
            key: String::from("a"),
            length: 2 + 600 * 4,
        }),
        encoded("a", &too_many)
    );
}

#[test]
fn failed_entry_fails_build() {
    let mut builder = IndexBuilder::new();
    builder.add("a", IndexOffset::Offset(1));
    builder.extend("b", std::iter::empty::<IndexOffset>());
    assert_eq!(2, builder.num_entries());
    assert_matches!(builder.build(), Err(IndexBuildError::NoOffsets(_)));
}

#[test]
fn keys_are_sorted() {
    let mut builder = IndexBuilder::new();
    builder.add("かける", IndexOffset::Offset(1));
    builder.add("かく", IndexOffset::Offset(2));
    builder.add("かける", IndexOffset::Offset(3));
    let built = builder.build().expect("valid index");
    assert_eq!(vec![0, 4 + 4, 4 + 4 + 6 + 8], built.entry_starts);
    let first_key: Vec<u8> = "かく".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    assert_eq!(first_key.as_slice(), &built.original[..4]);
}

#[test]
fn fixture_chunks() {
    let built = fixture_index();
    let total: usize = INDEX_FIXTURE.iter().map(|(_, size)| size).sum();
    assert_eq!(total, built.original.len());
    assert_eq!(INDEX_FIXTURE.len() + 1, built.entry_starts.len());
    assert_eq!(Some(&total), built.entry_starts.last());
    assert_eq!(4, built.num_chunks());
    assert_eq!(total - 3 * CHUNK_SIZE, built.last_chunk_size);

    let mut file = Vec::new();
    let written = built.write_to(&mut file).expect("write");
    assert_eq!(file.len(), written);
}

#[test]
fn empty_index() {
    let built = IndexBuilder::default().build().expect("empty index");
    assert_eq!(0, built.num_chunks());
    assert_eq!(0, built.last_chunk_size);
    assert_eq!(vec![0], built.entry_starts);
}
