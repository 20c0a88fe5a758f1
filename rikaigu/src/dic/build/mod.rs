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

//! Writer side of the dictionary index.
//!
//! Produces the same stream the index readers expect, used by the host tools
//! and for in-process fixtures.

pub mod error;
pub mod index;
pub mod records;

pub use error::IndexBuildError;
pub use index::{BuiltIndex, IndexBuilder};

#[cfg(test)]
mod test;
