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

//! Search orchestration.
//!
//! A search runs in two calls. [`Engine::search_start`] normalizes the input,
//! collects matches of every prefix of it (and of every deinflected form for
//! words) and asks the host for the matched records. [`Engine::search_finish`]
//! receives the records, ranks the matches and renders them.

use crate::arena::Arena;
use crate::config::{DEFAULT_MAX_RESULTS, DEFAULT_MORE_CUT};
use crate::deinflect::rules::RuleTable;
use crate::deinflect::{deinflect, CandidateText, Candidates};
use crate::dentry::{record_text, Dentry, DentrySpan, DentrySpans};
use crate::dic::index::cache::{CacheLookup, DictionaryIndexEntry, EntryCache};
use crate::dic::index::IndexReader;
use crate::dic::{Dictionaries, Dictionary};
use crate::error::{RikaiError, RikaiResult};
use crate::host::Host;
use crate::input_text::{Input, MAX_INPUT_LENGTH};
use crate::pos::PosFlags;
use crate::render::render_entries;
use crate::util::utf16::drop_code_point;
use crate::word_results::WordResults;

/// All state of one search session
pub struct Engine<'a, 'm> {
    arena: Arena<'m>,
    dictionaries: Dictionaries<'a>,
    rules: &'a RuleTable,
    reader: IndexReader,
    cached_dictionary: Option<Dictionary>,
    input: Input,
    /// Id of the read request which still waits for its records
    pending_request: Option<u32>,
    max_results: usize,
    more_cut: usize,
}

impl<'a, 'm> Engine<'a, 'm> {
    pub fn new(arena: Arena<'m>, dictionaries: Dictionaries<'a>, rules: &'a RuleTable) -> Self {
        Engine {
            arena,
            dictionaries,
            rules,
            reader: IndexReader::new(),
            cached_dictionary: None,
            input: Input::default(),
            pending_request: None,
            max_results: DEFAULT_MAX_RESULTS,
            more_cut: DEFAULT_MORE_CUT,
        }
    }

    /// Sets how many results are kept and how many are shown before the fold
    pub fn with_limits(mut self, max_results: usize, more_cut: usize) -> Self {
        self.max_results = max_results;
        self.more_cut = more_cut;
        self
    }

    pub fn arena(&self) -> &Arena<'m> {
        &self.arena
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Text storage the host writes into before [`Engine::search_start`]
    pub fn input_mut(&mut self) -> &mut [u16; MAX_INPUT_LENGTH] {
        self.input.data_mut()
    }

    /// Forgets everything produced by the previous search
    pub fn reset(&mut self) {
        self.arena.clear();
        self.cached_dictionary = None;
        self.pending_request = None;
    }

    pub fn pending_request(&self) -> Option<u32> {
        self.pending_request
    }

    pub fn word_results(&mut self) -> RikaiResult<WordResults<'_, 'm>> {
        WordResults::open(&mut self.arena.word_results)
    }

    /// Resolves the index entry of `word`, through the entry cache
    fn index_entry(
        &mut self,
        dictionary: Dictionary,
        word: &[u16],
    ) -> RikaiResult<Option<DictionaryIndexEntry>> {
        let index = *self.dictionaries.index(dictionary);
        let mut cache = if self.cached_dictionary == Some(dictionary) {
            EntryCache::open(&mut self.arena.index_entries)?
        } else {
            self.cached_dictionary = Some(dictionary);
            EntryCache::clear(&mut self.arena.index_entries)?
        };

        match cache.locate_entry(word, 0, index.original_size()) {
            CacheLookup::Found(entry) => {
                tracing::trace!(?dictionary, "index entry cache hit");
                Ok(Some(entry))
            }
            CacheLookup::Missing {
                position,
                low,
                high,
            } => match self.reader.search_for_offsets(&index, word, low, high)? {
                Some(current) => {
                    let key = self.reader.key_bytes(&current);
                    let offsets = self.reader.offsets_bytes(&current);
                    cache.add_current(position, &current, key, offsets).map(Some)
                }
                None => Ok(None),
            },
        }
    }

    /// Adds a result for every record of `word` whose type is allowed.
    ///
    /// An empty `allowed` mask accepts records of any type.
    /// Returns whether at least one new result was added.
    pub fn word_search(
        &mut self,
        dictionary: Dictionary,
        match_length: usize,
        word: &[u16],
        allowed: PosFlags,
        inflection_name: &[u8],
    ) -> RikaiResult<bool> {
        let entry = match self.index_entry(dictionary, word)? {
            Some(e) => e,
            None => return Ok(false),
        };

        let cache = EntryCache::open(&mut self.arena.index_entries)?;
        let mut results = WordResults::open(&mut self.arena.word_results)?;
        let key = cache.key_bytes(&entry);
        let mut found = false;
        for offset in cache.offsets(&entry) {
            if !allowed.is_empty() && offset.pos() & allowed.bits() == 0 {
                continue;
            }
            found |= results.try_add(dictionary, match_length, key, inflection_name, offset.offset())?;
        }
        Ok(found)
    }

    /// Searches every prefix of the normalized input, longest first.
    ///
    /// Returns the length in original code units of the longest prefix with a new result, or 0.
    pub fn input_search(&mut self, dictionary: Dictionary) -> RikaiResult<usize> {
        let text = self.input.clone();
        let text = text.as_slice();
        let mut current = CandidateText::default();
        let mut max_match_length = 0;

        let mut length = text.len();
        while length > 0 {
            let word = &text[..length];
            let mut found = self.word_search(dictionary, length, word, PosFlags::empty(), &[])?;

            if dictionary == Dictionary::Words {
                let num_candidates =
                    deinflect(&mut self.arena.candidates, self.rules, word)?.len();
                for i in 0..num_candidates {
                    let candidate = {
                        let candidates = Candidates::open(&mut self.arena.candidates)?;
                        let candidate = candidates.get(i);
                        current.load(&candidates, &candidate)?;
                        candidate
                    };
                    found |= self.word_search(
                        dictionary,
                        length,
                        current.word(),
                        candidate.pos,
                        current.name(),
                    )?;
                }
            }

            if found && max_match_length == 0 {
                max_match_length = length;
            }
            length = drop_code_point(text, length);
        }

        Ok(self.input.original_length(max_match_length))
    }

    /// Looks up the first `utf16_length` units written into the input.
    ///
    /// When something matched, the host is asked for the records of all
    /// results. Returns the number of original code units to highlight.
    pub fn search_start<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        utf16_length: usize,
        request_id: u32,
    ) -> RikaiResult<usize> {
        let _span = tracing::debug_span!("search_start", utf16_length, request_id).entered();
        self.reset();
        self.input.set_length(utf16_length)?;
        self.input.kata_to_hira();

        let words_match_length = self.input_search(Dictionary::Words)?;
        let names_match_length = self.input_search(Dictionary::Names)?;
        let max_match_length = words_match_length.max(names_match_length);
        if max_match_length == 0 {
            tracing::debug!("nothing found");
            return Ok(0);
        }

        let mut results = WordResults::open(&mut self.arena.word_results)?;
        let offsets = results.request_offsets()?;
        tracing::debug!(
            results = offsets.len(),
            max_match_length,
            "requesting dictionary records"
        );
        host.request_read_dictionary(offsets, request_id);
        self.pending_request = Some(request_id);
        Ok(max_match_length)
    }

    /// Attaches the records requested by [`Engine::search_start`] and renders the results.
    ///
    /// `records` is a sequence of `[u16 LE length][record]`, in request order.
    /// A request is answered once: after a successful call the results are
    /// ranked and cut, and only a new [`Engine::search_start`] can be finished.
    pub fn search_finish(&mut self, records: &[u8]) -> RikaiResult<&str> {
        let _span = tracing::debug_span!("search_finish", bytes = records.len()).entered();
        if self.pending_request.is_none() {
            return Err(RikaiError::NoPendingRequest);
        }
        self.arena.raw_dentries.clear();
        self.arena.raw_dentries.append(records)?;

        let raw = self.arena.raw_dentries.as_slice();
        let mut spans = DentrySpans::make(&mut self.arena.dentries)?;
        let mut results = WordResults::open(&mut self.arena.word_results)?;

        let mut position = 0;
        let mut index = 0;
        while position < raw.len() {
            if position + 2 > raw.len() {
                return Err(RikaiError::RecordsMismatch(String::from(
                    "record length is truncated",
                )));
            }
            let length = u16::from_le_bytes([raw[position], raw[position + 1]]) as usize;
            let start = position + 2;
            if start + length > raw.len() {
                return Err(RikaiError::RecordsMismatch(format!(
                    "record {} is truncated",
                    index
                )));
            }
            if index >= results.len() {
                return Err(RikaiError::RecordsMismatch(format!(
                    "more records than the {} requested",
                    results.len()
                )));
            }

            let mut span = DentrySpan {
                start: start as u32,
                length: length as u32,
                freq: 0,
            };
            span.freq = Dentry::make(record_text(raw, &span)?).freq;
            let mut result = results.get(index);
            result.freq = span.freq;
            result.dentry = spans.push(span)?;
            results.set(index, &result);

            position = start + length;
            index += 1;
        }
        if index != results.len() {
            return Err(RikaiError::RecordsMismatch(format!(
                "{} records for {} results",
                index,
                results.len()
            )));
        }

        results.sort_and_limit(self.max_results);
        self.pending_request = None;
        self.arena.html.clear();
        render_entries(&mut self.arena.html, &results, &spans, raw, self.more_cut)?;
        tracing::debug!(
            entries = results.len(),
            html_bytes = self.arena.html.size(),
            "rendered"
        );

        std::str::from_utf8(self.arena.html.as_slice())
            .map_err(|e| RikaiError::InvalidDataFormat(e.valid_up_to(), String::from("html")))
    }
}
