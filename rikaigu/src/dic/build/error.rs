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

use thiserror::Error;

/// Reasons why a key can't be written to an index
#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum IndexBuildError {
    #[error("Empty key")]
    EmptyKey,

    #[error("Key {0:?} contains code units reserved for offsets")]
    KeyContainsMarker(String),

    #[error("Key {0:?} has no offsets")]
    NoOffsets(String),

    #[error("Value {value} of key {key:?} does not fit into 25 bits")]
    ValueOutOfRange { key: String, value: u32 },

    #[error("Entry of key {key:?} takes {length} bytes, it must be smaller than a chunk")]
    EntryTooLong { key: String, length: usize },
}
