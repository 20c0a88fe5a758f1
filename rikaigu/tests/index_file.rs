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

mod common;

use std::fs::File;
use std::io::Write;

use claim::assert_matches;
use memmap2::Mmap;
use tempfile::NamedTempFile;

use common::*;
use rikaigu::api::Rikaigu;
use rikaigu::dic::build::BuiltIndex;
use rikaigu::dic::storage::{IndexFile, IndexFileError, Storage};
use rikaigu::dic::{Dictionaries, Dictionary};
use rikaigu::host::PendingRequest;

fn written(index: &BuiltIndex) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    let mut bytes = Vec::new();
    index.write_to(&mut bytes).expect("write index");
    file.write_all(&bytes).expect("write file");
    file.flush().expect("flush");
    file
}

fn mapped(file: &NamedTempFile) -> Storage {
    let file = File::open(file.path()).expect("open");
    let map = unsafe { Mmap::map(&file) }.expect("mmap");
    Storage::File(map)
}

#[test]
fn search_over_mapped_files() {
    let words_file = written(&WORDS_INDEX);
    let names_file = written(&NAMES_INDEX);
    let words = mapped(&words_file);
    let names = mapped(&names_file);

    let words = IndexFile::parse(words.as_ref()).expect("words file");
    let names = IndexFile::parse(names.as_ref()).expect("names file");
    assert_eq!(WORDS_INDEX.original.len(), words.original_size);
    assert_eq!(WORDS_INDEX.compressed.as_slice(), words.data);

    let dictionaries = Dictionaries::new(
        words.index(Dictionary::Words).expect("words index"),
        names.index(Dictionary::Names).expect("names index"),
    )
    .expect("dictionaries");
    let mut memory = memory();
    let mut rikaigu =
        Rikaigu::init(&mut memory, dictionaries, rules(), PendingRequest::default())
            .expect("init");
    assert_eq!(5, rikaigu.search(&utf16("かけられて"), 1).expect("search"));

    let answer = records(&rikaigu.host().offsets);
    let html = rikaigu.search_finish(&answer).expect("finish");
    assert!(html.contains("to be chipped"));
}

#[test]
fn swapped_indices_are_rejected() {
    let words = WORDS_INDEX.index(Dictionary::Words).expect("words");
    let names = NAMES_INDEX.index(Dictionary::Names).expect("names");
    assert!(Dictionaries::new(names, words).is_err());
}

#[test]
fn truncated_file() {
    let mut bytes = Vec::new();
    WORDS_INDEX.write_to(&mut bytes).expect("write index");
    bytes.truncate(bytes.len() - 3);
    assert_matches!(
        IndexFile::parse(&bytes),
        Err(IndexFileError::TruncatedData { .. })
    );
}
