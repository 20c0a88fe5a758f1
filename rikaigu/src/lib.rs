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

//! Dictionary lookup core of rikaigu, a reading aid for Japanese text.
//!
//! The text under the cursor is normalized, deinflected and looked up in
//! LZ4-compressed dictionary indices. All transient data lives in a fixed
//! memory block supplied by the host, split into the buffers of an
//! [`Arena`](arena/struct.Arena.html). The main entry point is
//! [`Rikaigu`](api/struct.Rikaigu.html).

pub mod api;
pub mod arena;
pub mod config;
pub mod deinflect;
pub mod dentry;
pub mod dic;
pub mod engine;
pub mod error;
pub mod host;
pub mod input_text;
pub mod pos;
pub mod render;
pub mod util;
pub mod word_results;

pub mod prelude {
    pub use crate::{
        api::Rikaigu,
        dic::{Dictionaries, Dictionary},
        error::{RikaiError, RikaiResult},
        host::Host,
        pos::PosFlags,
    };
}
