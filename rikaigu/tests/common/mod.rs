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

#![allow(dead_code)]

use lazy_static::lazy_static;

use rikaigu::arena::Arena;
use rikaigu::deinflect::rules::{embedded_rules, RuleTable};
use rikaigu::dic::build::{BuiltIndex, IndexBuilder};
use rikaigu::dic::index::codec::IndexOffset;
use rikaigu::dic::{Dictionaries, Dictionary, NAMES_OFFSET_FLAG};
use rikaigu::engine::Engine;
use rikaigu::pos::PosFlags;

/// Records of the test words dictionary
pub const WORDS: [&str; 6] = [
    "掛ける;懸ける\tかける\tv1,vt;to hang`to put on\t120",
    "欠ける\tかける\tv1,vi;to be chipped\t800",
    "掛け\tかけ\tn;credit",
    "かけら\tn;fragment",
    "駆ける\tかける\tvk;to gallop\t50",
    "かける\tv1;to lack\t60",
];

pub const NAMES: [&str; 2] = ["掛\tかけ\ts;Kake", "筧\tかけい\tn;Kakei"];

fn text_of(lines: &[&str]) -> String {
    lines.iter().map(|l| format!("{}\n", l)).collect()
}

fn line_offsets(lines: &[&str]) -> Vec<u32> {
    let mut offset = 0;
    lines
        .iter()
        .map(|l| {
            let start = offset;
            offset += l.len() as u32 + 1;
            start
        })
        .collect()
}

lazy_static! {
    pub static ref WORDS_TEXT: String = text_of(&WORDS);
    pub static ref NAMES_TEXT: String = text_of(&NAMES);
    pub static ref WORDS_OFFSETS: Vec<u32> = line_offsets(&WORDS);
    pub static ref NAMES_OFFSETS: Vec<u32> = line_offsets(&NAMES);
    pub static ref WORDS_INDEX: BuiltIndex = {
        let o = &WORDS_OFFSETS;
        let mut builder = IndexBuilder::new();
        builder.extend(
            "かける",
            vec![
                IndexOffset::Typed {
                    pos: PosFlags::V1.bits(),
                    offset: o[0],
                },
                IndexOffset::Typed {
                    pos: PosFlags::V1.bits(),
                    offset: o[1],
                },
                IndexOffset::Typed {
                    pos: PosFlags::VK.bits(),
                    offset: o[4],
                },
                IndexOffset::Offset(o[5]),
            ],
        );
        builder.add("かけ", IndexOffset::Offset(o[2]));
        builder.add("かけら", IndexOffset::Offset(o[3]));
        builder.build().expect("words index")
    };
    pub static ref NAMES_INDEX: BuiltIndex = {
        let mut builder = IndexBuilder::new();
        builder.add("かけ", IndexOffset::Offset(NAMES_OFFSETS[0]));
        builder.add("かけい", IndexOffset::Offset(NAMES_OFFSETS[1]));
        builder.build().expect("names index")
    };
}

pub fn dictionaries() -> Dictionaries<'static> {
    Dictionaries::new(
        WORDS_INDEX.index(Dictionary::Words).expect("words"),
        NAMES_INDEX.index(Dictionary::Names).expect("names"),
    )
    .expect("dictionaries")
}

pub fn rules() -> &'static RuleTable {
    embedded_rules().expect("embedded rules")
}

pub fn memory() -> Vec<u8> {
    vec![0u8; 1 << 19]
}

pub fn engine(memory: &mut [u8]) -> Engine<'static, '_> {
    let arena = Arena::split(memory).expect("arena");
    Engine::new(arena, dictionaries(), rules())
}

pub fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

/// Record at `offset` in `text`, without the line end
pub fn record_at(text: &str, offset: u32) -> &str {
    text[offset as usize..].split('\n').next().unwrap_or_default()
}

/// Answer to a read request, as a host would build it
pub fn records(offsets: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    for &offset in offsets {
        let record = if offset & NAMES_OFFSET_FLAG != 0 {
            record_at(&NAMES_TEXT, offset & !NAMES_OFFSET_FLAG)
        } else {
            record_at(&WORDS_TEXT, offset)
        };
        out.extend_from_slice(&(record.len() as u16).to_le_bytes());
        out.extend_from_slice(record.as_bytes());
    }
    out
}
