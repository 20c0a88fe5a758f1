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

//! Katakana to hiragana folding tables.
//!
//! Half-width voicing marks and the prolonged sound mark depend on the
//! previous (already folded) character.

/// Set in the result when the previous character must be replaced instead of appending
pub const REPLACE_PREVIOUS: u32 = 1 << 16;

const FULL_WIDTH_FIRST: u16 = 0x30A1; // ァ
const FULL_WIDTH_LAST: u16 = 0x30F6; // ヶ
const HIRAGANA_FIRST: u16 = 0x3041; // ぁ
const LONG_VOWEL_MARK: u16 = 0x30FC; // ー
const HALF_WIDTH_LONG_VOWEL_MARK: u16 = 0xFF70; // ｰ
const HALF_WIDTH_FIRST: u16 = 0xFF66; // ｦ
const HALF_WIDTH_LAST: u16 = 0xFF9D; // ﾝ
const HALF_WIDTH_VOICED_MARK: u16 = 0xFF9E; // ﾞ
const HALF_WIDTH_HALF_VOICED_MARK: u16 = 0xFF9F; // ﾟ

#[rustfmt::skip]
const HALF_WIDTH_KATAKANA: [char; 56] = [
    'を',
    'ぁ', 'ぃ', 'ぅ', 'ぇ', 'ぉ',
    'ゃ', 'ゅ', 'ょ',
    'っ', 'ー',
    'あ', 'い', 'う', 'え', 'お',
    'か', 'き', 'く', 'け', 'こ',
    'さ', 'し', 'す', 'せ', 'そ',
    'た', 'ち', 'つ', 'て', 'と',
    'な', 'に', 'ぬ', 'ね', 'の',
    'は', 'ひ', 'ふ', 'へ', 'ほ',
    'ま', 'み', 'む', 'め', 'も',
    'や', 'ゆ', 'よ',
    'ら', 'り', 'る', 'れ', 'ろ',
    'わ', 'ん',
];

// う..=ほ
const VOICED_FIRST: u16 = 0x3046;
#[rustfmt::skip]
const VOICED: [char; 54] = [
    'ゔ', 'ぇ', 'え', 'ぉ', 'お',
    'が', 'が', 'ぎ', 'ぎ', 'ぐ', 'ぐ', 'げ', 'げ', 'ご', 'ご',
    'ざ', 'ざ', 'じ', 'じ', 'ず', 'ず', 'ぜ', 'ぜ', 'ぞ', 'ぞ',
    'だ', 'だ', 'ぢ', 'ぢ', 'っ', 'づ', 'づ', 'で', 'で', 'ど', 'ど',
    'な', 'に', 'ぬ', 'ね', 'の',
    'ば', 'ば', 'ぱ', 'び', 'び', 'ぴ', 'ぶ', 'ぶ', 'ぷ', 'べ', 'べ', 'ぺ',
    'ぼ',
];

// は..=ほ
const HALF_VOICED_FIRST: u16 = 0x306F;
#[rustfmt::skip]
const HALF_VOICED: [char; 13] = [
    'ぱ', 'ば', 'ぱ', 'ぴ', 'び', 'ぴ', 'ぷ', 'ぶ', 'ぷ', 'ぺ', 'べ', 'ぺ',
    'ぽ',
];

// ぁ..=ゔ, the vowel a prolonged sound mark stands for
#[rustfmt::skip]
const LONG_VOWEL: [char; 84] = [
    'ー', 'あ', 'ー', 'い', 'ー', 'う', 'ー', 'い', 'ー', 'う',
    'あ', 'あ', 'い', 'い', 'う', 'う', 'い', 'い', 'う', 'う',
    'あ', 'あ', 'い', 'い', 'う', 'う', 'い', 'い', 'う', 'う',
    'あ', 'あ', 'い', 'い', 'ー', 'う', 'う', 'い', 'い', 'う', 'う',
    'あ', 'い', 'う', 'い', 'う',
    'あ', 'あ', 'あ', 'い', 'い', 'い', 'う', 'う', 'う', 'い', 'い', 'い', 'う', 'う', 'う',
    'あ', 'い', 'う', 'い', 'う',
    'あ', 'あ', 'う', 'う', 'う', 'う',
    'あ', 'い', 'う', 'い', 'う',
    'ー', 'あ', 'い', 'い', 'ー',
    'ー',
    'ー',
];

#[inline]
fn lookup(table: &[char], first: u16, c: u16) -> Option<u16> {
    let index = c.checked_sub(first)? as usize;
    table.get(index).map(|m| *m as u16)
}

/// Folds one character to hiragana given the previous folded character.
///
/// Voicing marks combine with the previous character: the result then carries
/// [`REPLACE_PREVIOUS`] and the low 16 bits replace that character.
pub fn kata_to_hira_character(c: u16, previous: u16) -> u32 {
    if (FULL_WIDTH_FIRST..=FULL_WIDTH_LAST).contains(&c) {
        return (c - FULL_WIDTH_FIRST + HIRAGANA_FIRST) as u32;
    }

    let mapped = match c {
        LONG_VOWEL_MARK | HALF_WIDTH_LONG_VOWEL_MARK => {
            lookup(&LONG_VOWEL, HIRAGANA_FIRST, previous).map(u32::from)
        }
        HALF_WIDTH_FIRST..=HALF_WIDTH_LAST => {
            lookup(&HALF_WIDTH_KATAKANA, HALF_WIDTH_FIRST, c).map(u32::from)
        }
        HALF_WIDTH_VOICED_MARK => {
            lookup(&VOICED, VOICED_FIRST, previous).map(|m| m as u32 | REPLACE_PREVIOUS)
        }
        HALF_WIDTH_HALF_VOICED_MARK => {
            lookup(&HALF_VOICED, HALF_VOICED_FIRST, previous).map(|m| m as u32 | REPLACE_PREVIOUS)
        }
        _ => None,
    };
    mapped.unwrap_or(c as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(c: char, previous: char) -> u32 {
        kata_to_hira_character(c as u16, previous as u16)
    }

    #[test]
    fn table_ranges() {
        assert_eq!((HALF_WIDTH_LAST - HALF_WIDTH_FIRST + 1) as usize, HALF_WIDTH_KATAKANA.len());
        assert_eq!(('ほ' as u16 - VOICED_FIRST + 1) as usize, VOICED.len());
        assert_eq!(('ほ' as u16 - HALF_VOICED_FIRST + 1) as usize, HALF_VOICED.len());
        assert_eq!(('ゔ' as u16 - HIRAGANA_FIRST + 1) as usize, LONG_VOWEL.len());
    }

    #[test]
    fn full_width() {
        assert_eq!('ぁ' as u32, conv('ァ', '\0'));
        assert_eq!('ゔ' as u32, conv('ヴ', '\0'));
        assert_eq!('ゖ' as u32, conv('ヶ', '\0'));
        assert_eq!('漢' as u32, conv('漢', 'か'));
    }

    #[test]
    fn half_width() {
        assert_eq!('を' as u32, conv('ｦ', '\0'));
        assert_eq!('っ' as u32, conv('ｯ', '\0'));
        assert_eq!('か' as u32, conv('ｶ', '\0'));
        assert_eq!('ん' as u32, conv('ﾝ', '\0'));
    }

    #[test]
    fn voicing_marks_replace_previous() {
        assert_eq!('が' as u32 | REPLACE_PREVIOUS, conv('ﾞ', 'か'));
        assert_eq!('ゔ' as u32 | REPLACE_PREVIOUS, conv('ﾞ', 'う'));
        assert_eq!('ぼ' as u32 | REPLACE_PREVIOUS, conv('ﾞ', 'ほ'));
        assert_eq!('ぴ' as u32 | REPLACE_PREVIOUS, conv('ﾟ', 'ひ'));
        // nothing to combine with
        assert_eq!('ﾞ' as u32, conv('ﾞ', 'ま'));
        assert_eq!('ﾟ' as u32, conv('ﾟ', 'か'));
    }

    #[test]
    fn prolonged_sound_mark() {
        assert_eq!('あ' as u32, conv('ー', 'か'));
        assert_eq!('い' as u32, conv('ー', 'せ'));
        assert_eq!('う' as u32, conv('ｰ', 'ょ'));
        assert_eq!('ー' as u32, conv('ー', 'ん'));
        assert_eq!('ー' as u32, conv('ー', 'カ'));
        assert_eq!('ｰ' as u32, conv('ｰ', '\0'));
    }
}
