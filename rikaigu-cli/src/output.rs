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

use std::io::{self, BufWriter, Write};

pub type Writer = BufWriter<Box<dyn Write>>;

/// Result of looking up one position of the input
pub struct Lookup<'a> {
    /// Text starting at the looked up position
    pub text: &'a str,
    /// Number of UTF-16 code units of `text` which matched
    pub matched: usize,
    pub html: Option<&'a str>,
}

impl Lookup<'_> {
    /// Matched part of the text
    pub fn matched_text(&self) -> &str {
        let mut units = 0;
        for (idx, c) in self.text.char_indices() {
            if units >= self.matched {
                return &self.text[..idx];
            }
            units += c.len_utf16();
        }
        self.text
    }
}

pub trait RikaiOutput {
    fn write(&self, writer: &mut Writer, lookup: &Lookup) -> io::Result<()>;
}

/// Only the matched words, one per line
pub struct Matches;

impl RikaiOutput for Matches {
    fn write(&self, writer: &mut Writer, lookup: &Lookup) -> io::Result<()> {
        if lookup.matched == 0 {
            return Ok(());
        }
        writer.write_all(lookup.matched_text().as_bytes())?;
        writer.write_all(b"\n")
    }
}

/// Matched text and the rendered entries
pub struct Html;

impl RikaiOutput for Html {
    fn write(&self, writer: &mut Writer, lookup: &Lookup) -> io::Result<()> {
        if lookup.matched == 0 {
            return Ok(());
        }
        writer.write_all(lookup.matched_text().as_bytes())?;
        writer.write_all(b"\t")?;
        writer.write_all(lookup.html.unwrap_or_default().as_bytes())?;
        writer.write_all(b"\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matched_prefix() {
        let lookup = Lookup {
            text: "かけられている",
            matched: 5,
            html: None,
        };
        assert_eq!("かけられて", lookup.matched_text());

        let lookup = Lookup {
            text: "\u{20b9f}か",
            matched: 2,
            html: None,
        };
        assert_eq!("\u{20b9f}", lookup.matched_text());
    }
}
