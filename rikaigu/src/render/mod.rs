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

//! HTML output of search results.
//!
//! Everything is appended to the html buffer of the arena; record text is
//! written as is.

use crate::arena::Buffer;
use crate::dentry::{record_text, Dentry, DentrySpans, KanjiGroup, SenseGroup, Surface};
use crate::dic::names_types::name_type_label;
use crate::error::{RikaiError, RikaiResult};
use crate::word_results::{WordResult, WordResults, NO_DENTRY};

const READING_SEPARATOR: &str = "\u{3001}";

fn append_if(out: &mut Buffer, condition: bool, text: &str) -> RikaiResult<()> {
    if condition {
        out.append_str(text)
    } else {
        Ok(())
    }
}

fn render_inflection(out: &mut Buffer, inflection_name: &str) -> RikaiResult<()> {
    if inflection_name.is_empty() {
        return Ok(());
    }
    out.append_str(" <span class=\"w-conj\">(")?;
    out.append_str(inflection_name)?;
    out.append_str(")</span>")
}

pub fn render_reading(out: &mut Buffer, reading: &Surface, second_and_further: bool) -> RikaiResult<()> {
    append_if(out, second_and_further, READING_SEPARATOR)?;
    out.append_str("<span class=\"w-kana rikaigu-review-listed")?;
    append_if(out, !reading.common, " uncommon")?;
    out.append_str("\">")?;
    out.append_str(reading.text)?;
    out.append_str("</span>")
}

pub fn render_all_readings(out: &mut Buffer, dentry: &Dentry) -> RikaiResult<()> {
    for (i, reading) in dentry.readings().enumerate() {
        render_reading(out, &reading, i > 0)?;
    }
    Ok(())
}

/// Spellings of the group followed by the readings they are read with
pub fn render_kanji_group(
    out: &mut Buffer,
    dentry: &Dentry,
    group: &KanjiGroup,
    inflection_name: Option<&str>,
) -> RikaiResult<()> {
    for (i, kanji) in group.kanjis().enumerate() {
        append_if(out, i > 0, READING_SEPARATOR)?;
        out.append_str("<span class=\"w-kanji")?;
        append_if(out, !kanji.common, " uncommon")?;
        out.append_str("\">")?;
        out.append_str(kanji.text)?;
        out.append_str("</span>")?;
    }
    out.append_str("<span class=\"spacer\"></span>&#32;")?;

    if group.is_restricted() {
        let readings = group.reading_indices().filter_map(|i| dentry.reading(i));
        for (i, reading) in readings.enumerate() {
            render_reading(out, &reading, i > 0)?;
        }
    } else {
        render_all_readings(out, dentry)?;
    }

    if let Some(name) = inflection_name {
        render_inflection(out, name)?;
    }
    out.append_str("<br />")
}

pub fn render_sense_group(out: &mut Buffer, group: &SenseGroup, is_name: bool) -> RikaiResult<()> {
    out.append_str("<span class=\"w-pos\">")?;
    for (i, pos) in group.types().enumerate() {
        append_if(out, i > 0, ", ")?;
        let label = match pos.as_bytes() {
            [key] if is_name => name_type_label(*key).unwrap_or(pos),
            _ => pos,
        };
        out.append_str(label)?;
    }
    out.append_str("</span><span class=\"rikaigu-review-listed rikaigu-hidden\">; </span>")?;

    if group.num_senses() > 1 {
        out.append_str("<ul class=\"w-def rikaigu-review-listed\"><li>")?;
        for (i, sense) in group.senses().enumerate() {
            append_if(out, i > 0, "</li><li>")?;
            out.append_str(sense)?;
        }
        out.append_str("</li></ul>")
    } else {
        out.append_str(" <span class=\"w-def rikaigu-review-listed\">")?;
        for sense in group.senses() {
            out.append_str(sense)?;
        }
        out.append_str("</span><br />")
    }
}

pub fn render_dentry(
    out: &mut Buffer,
    dentry: &Dentry,
    is_name: bool,
    inflection_name: &str,
) -> RikaiResult<()> {
    if dentry.has_kanji() {
        for (i, group) in dentry.kanji_groups().enumerate() {
            let inflection = if i == 0 { Some(inflection_name) } else { None };
            render_kanji_group(out, dentry, &group, inflection)?;
        }
    } else {
        render_all_readings(out, dentry)?;
        render_inflection(out, inflection_name)?;
        out.append_str("<br />")?;
    }

    if !is_name {
        out.append_str("<p class=\"w-review-context rikaigu-review-listed rikaigu-hidden\"></p>")?;
    }

    out.append_str("<div class=\"rikaigu-pos-and-def\">")?;
    for group in dentry.sense_groups() {
        render_sense_group(out, &group, is_name)?;
    }
    out.append_str("</div>")
}

/// One table row, rows past the fold are hidden
pub fn render_entry(
    out: &mut Buffer,
    dentry: &Dentry,
    result: &WordResult,
    inflection_name: &str,
    folded: bool,
) -> RikaiResult<()> {
    out.append_str("<tr class=\"")?;
    append_if(out, folded, " rikaigu-second-and-further rikaigu-hidden")?;
    out.append_str("\"><td class=\"word")?;
    append_if(out, result.is_name, " rikaigu-name")?;
    out.append_str("\">")?;
    render_dentry(out, dentry, result.is_name, inflection_name)?;
    out.append_str("</td></tr>")
}

/// Renders every result in its current order, `raw` holds the record texts
pub fn render_entries(
    out: &mut Buffer,
    results: &WordResults,
    spans: &DentrySpans,
    raw: &[u8],
    more_cut: usize,
) -> RikaiResult<()> {
    out.append_str("<table>")?;
    for (i, result) in results.iter().enumerate() {
        if result.dentry == NO_DENTRY {
            return Err(RikaiError::RecordsMismatch(format!(
                "result {} has no record attached",
                i
            )));
        }
        let span = spans.get(result.dentry as usize);
        let dentry = Dentry::make(record_text(raw, &span)?);
        render_entry(out, &dentry, &result, results.inflection_name(&result), i >= more_cut)?;
    }
    out.append_str("</table>")?;
    append_if(
        out,
        results.len() > more_cut,
        "<div class=\"rikaigu-lurk-moar\">\u{25bc}</div>",
    )
}
