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

//! Deinflection rule table.
//!
//! Rules are read from a tab-separated file with the columns
//! `suffix, new suffix, source types, target types, inflection name`.
//! The table keeps them ordered by descending suffix length and then by
//! suffix, so all rules for one suffix form a contiguous run.

use std::io::Read;
use std::ops::Range;

use csv::{StringRecord, Trim};
use lazy_static::lazy_static;
use thiserror::Error;

use crate::error::{RikaiError, RikaiResult};
use crate::pos::PosFlags;
use crate::util::binary_search::binary_locate_bounds;
use crate::util::utf16;

const NUM_FIELDS: usize = 5;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RuleParseError {
    #[error("line {line}: expected {} fields, found {actual}", NUM_FIELDS)]
    InvalidFieldCount { line: usize, actual: usize },

    #[error("line {line}: rule suffix is empty")]
    EmptySuffix { line: usize },

    #[error("line {line}: {cause}")]
    InvalidPos { line: usize, cause: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeinflectionRule {
    pub suffix: Vec<u16>,
    pub new_suffix: Vec<u16>,
    pub source_pos_mask: PosFlags,
    pub target_pos_mask: PosFlags,
    pub inflection_name: String,
}

impl DeinflectionRule {
    pub fn new(
        suffix: &str,
        new_suffix: &str,
        source_pos_mask: PosFlags,
        target_pos_mask: PosFlags,
        inflection_name: &str,
    ) -> Self {
        DeinflectionRule {
            suffix: suffix.encode_utf16().collect(),
            new_suffix: new_suffix.encode_utf16().collect(),
            source_pos_mask,
            target_pos_mask,
            inflection_name: inflection_name.to_owned(),
        }
    }
}

#[derive(Debug)]
pub struct RuleTable {
    rules: Vec<DeinflectionRule>,
    /// Element `l` is the index of the first rule with a suffix of `l` units or shorter
    first_suffix_of_length_position: Vec<usize>,
}

impl RuleTable {
    pub fn parse<R: Read>(reader: R) -> Result<Self, RuleParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .quoting(false)
            .trim(Trim::None)
            .flexible(true)
            .from_reader(reader);
        let mut record = StringRecord::new();
        let mut rules = Vec::with_capacity(256);
        while reader.read_record(&mut record)? {
            let line = record.position().map_or(0, |p| p.line()) as usize;
            rules.push(parse_record(&record, line)?);
        }
        Ok(Self::from_rules(rules))
    }

    /// Builds the table, rules sharing a suffix keep their relative order
    pub fn from_rules(mut rules: Vec<DeinflectionRule>) -> Self {
        rules.sort_by(|a, b| {
            b.suffix
                .len()
                .cmp(&a.suffix.len())
                .then_with(|| utf16::compare(&a.suffix, &b.suffix))
        });
        let max_length = rules.first().map_or(0, |r| r.suffix.len());
        let first_suffix_of_length_position = (0..=max_length)
            .map(|length| rules.iter().take_while(|r| r.suffix.len() > length).count())
            .collect();
        RuleTable {
            rules,
            first_suffix_of_length_position,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule(&self, index: usize) -> &DeinflectionRule {
        &self.rules[index]
    }

    pub fn rules(&self) -> &[DeinflectionRule] {
        &self.rules
    }

    pub fn max_suffix_length(&self) -> usize {
        self.first_suffix_of_length_position.len().saturating_sub(1)
    }

    /// Indices of the rules whose suffix is exactly `suffix`
    pub fn rule_index_bounds_for_suffix(&self, suffix: &[u16]) -> Option<Range<usize>> {
        let length = suffix.len();
        if length == 0 || length > self.max_suffix_length() {
            return None;
        }
        let low = self.first_suffix_of_length_position[length];
        let high = self.first_suffix_of_length_position[length - 1];
        let bucket = &self.rules[low..high];
        let range = binary_locate_bounds(bucket.len(), |i| utf16::compare(&bucket[i].suffix, suffix));
        if range.is_empty() {
            None
        } else {
            Some(low + range.start..low + range.end)
        }
    }
}

fn parse_record(record: &StringRecord, line: usize) -> Result<DeinflectionRule, RuleParseError> {
    if record.len() != NUM_FIELDS {
        return Err(RuleParseError::InvalidFieldCount {
            line,
            actual: record.len(),
        });
    }
    if record[0].is_empty() {
        return Err(RuleParseError::EmptySuffix { line });
    }
    let pos = |field: &str| {
        field.parse::<PosFlags>().map_err(|e| RuleParseError::InvalidPos {
            line,
            cause: e.to_string(),
        })
    };
    Ok(DeinflectionRule::new(
        &record[0],
        &record[1],
        pos(&record[2])?,
        pos(&record[3])?,
        &record[4],
    ))
}

lazy_static! {
    static ref EMBEDDED_RULES: Result<RuleTable, String> =
        RuleTable::parse(include_str!("../../resources/deinflect.dat").as_bytes())
            .map_err(|e| e.to_string());
}

/// Rule table compiled into the library
pub fn embedded_rules() -> RikaiResult<&'static RuleTable> {
    match &*EMBEDDED_RULES {
        Ok(table) => Ok(table),
        Err(e) => Err(RikaiError::InvalidDataFormat(0, e.clone())
            .with_context("embedded deinflection rules")),
    }
}
