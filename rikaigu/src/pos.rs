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

use crate::error::RikaiError;
use bitflags::bitflags;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

bitflags! {
    /// Parts of speech a word form can conjugate as.
    ///
    /// Dictionary index entries carry these masks as offset types and
    /// deinflection rules use them to restrict which forms they apply to.
    #[repr(transparent)]
    #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct PosFlags: u32 {
        /** Ichidan verb */
        const V1 = (1 << 0);
        /** Ichidan verb, kureru special class */
        const V1_S = (1 << 1);
        /** Godan verb, -aru special class */
        const V5ARU = (1 << 2);
        /** Godan verb with `bu` ending */
        const V5B = (1 << 3);
        /** Godan verb with `gu` ending */
        const V5G = (1 << 4);
        /** Godan verb with `ku` ending */
        const V5K = (1 << 5);
        /** Godan verb, iku/yuku special class */
        const V5K_S = (1 << 6);
        /** Godan verb with `mu` ending */
        const V5M = (1 << 7);
        /** Godan verb with `nu` ending */
        const V5N = (1 << 8);
        /** Godan verb with `ru` ending */
        const V5R = (1 << 9);
        /** Godan verb with `ru` ending, irregular */
        const V5R_I = (1 << 10);
        /** Godan verb with `su` ending */
        const V5S = (1 << 11);
        /** Godan verb with `tsu` ending */
        const V5T = (1 << 12);
        /** Godan verb with `u` ending */
        const V5U = (1 << 13);
        /** Godan verb with `u` ending, special class */
        const V5U_S = (1 << 14);
        /** Kuru verb */
        const VK = (1 << 15);
        /** Suru verb, included */
        const VS_I = (1 << 16);
        /** Suru verb, special class */
        const VS_S = (1 << 17);
        /** Ichidan zuru verb */
        const VZ = (1 << 18);
        /** Adjective */
        const ADJ_I = (1 << 19);
        /** Surface form which was not deinflected yet */
        const INITIAL = (1 << 20);

        /** Mask accepted by the root of deinflection */
        const ANY_POS = (1 << 21) - 1;
    }
}

impl PosFlags {
    /// Parses one part of speech as written in rule files and dictionaries, `v5k-s`
    pub fn from_pos_name(name: &str) -> Option<PosFlags> {
        let const_name = name.trim().to_ascii_uppercase().replace('-', "_");
        match PosFlags::from_name(&const_name) {
            Some(PosFlags::ANY_POS) | None => None,
            flag => flag,
        }
    }

    /// Names of the single parts of speech in this mask, in bit order
    pub fn pos_names(self) -> impl Iterator<Item = String> {
        self.iter_names()
            .filter(|(_, flag)| flag.bits().count_ones() == 1)
            .map(|(name, _)| name.to_ascii_lowercase().replace('_', "-"))
    }
}

impl Default for PosFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl Debug for PosFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

impl Display for PosFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for name in self.pos_names() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(&name)?;
            first = false;
        }
        Ok(())
    }
}

/// Parses `|`-separated part of speech names, `v1|v5r`
impl FromStr for PosFlags {
    type Err = RikaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut result = PosFlags::empty();
        for part in s.split('|') {
            match PosFlags::from_pos_name(part) {
                Some(flag) => result |= flag,
                None => return Err(RikaiError::InvalidPartOfSpeech(part.to_owned())),
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use claim::assert_matches;

    #[test]
    fn parse_names() {
        assert_eq!(Some(PosFlags::V5K_S), PosFlags::from_pos_name("v5k-s"));
        assert_eq!(Some(PosFlags::ADJ_I), PosFlags::from_pos_name("adj-i"));
        assert_eq!(None, PosFlags::from_pos_name("any-pos"));
        assert_eq!(None, PosFlags::from_pos_name("v6"));
    }

    #[test]
    fn parse_list() {
        let flags: PosFlags = "v1|v5r".parse().expect("valid");
        assert_eq!(PosFlags::V1 | PosFlags::V5R, flags);
        assert_matches!(
            "v1|x".parse::<PosFlags>(),
            Err(RikaiError::InvalidPartOfSpeech(s)) if s == "x"
        );
        assert_matches!("".parse::<PosFlags>(), Err(_));
    }

    #[test]
    fn display_round_trip() {
        let flags = PosFlags::VS_S | PosFlags::V1 | PosFlags::V5K_S;
        assert_eq!("v1|v5k-s|vs-s", flags.to_string());
        assert_eq!(flags, flags.to_string().parse().expect("valid"));
    }

    #[test]
    fn any_pos_covers_all() {
        for (_, flag) in PosFlags::all().iter_names() {
            assert!(PosFlags::ANY_POS.contains(flag));
        }
        assert!(PosFlags::ANY_POS.bits() < (1 << 25));
    }

    #[test]
    fn format() {
        assert_eq!("V5R", format!("{:?}", PosFlags::V5R));
    }
}
