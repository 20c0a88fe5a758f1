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

//! Labels of single-letter types used in names records

use crate::util::binary_search::locate_in;

/// Sorted by key
static NAME_TYPES: [(u8, &str); 12] = [
    (b'a', "place"),
    (b'c', "company"),
    (b'd', "product"),
    (b'f', "female given name or forename"),
    (b'g', "given name or forename, gender not specified"),
    (b'm', "male given name or forename"),
    (b'n', "family or surname"),
    (b'o', "organization"),
    (b'p', "full name of a particular person"),
    (b's', "railway station"),
    (b'u', "unclassified name"),
    (b'w', "work of art, literature, music, etc. name"),
];

pub fn name_type_label(key: u8) -> Option<&'static str> {
    match locate_in(&NAME_TYPES, |(k, _)| k.cmp(&key)) {
        (i, true) => Some(NAME_TYPES[i].1),
        _ => None,
    }
}
