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

use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_RESOURCE_DIR: &str = "resources";
const DEFAULT_WORDS_INDEX_FILE: &str = "dict.idx";
const DEFAULT_NAMES_INDEX_FILE: &str = "names.idx";
const DEFAULT_WORDS_DICTIONARY_FILE: &str = "dict.dat";
const DEFAULT_NAMES_DICTIONARY_FILE: &str = "names.dat";

/// Total size of the memory block handed to the engine
pub const DEFAULT_MEMORY_SIZE: usize = 1 << 20;
/// Number of results left after ranking
pub const DEFAULT_MAX_RESULTS: usize = 32;
/// Number of rendered entries shown before the rest is folded
pub const DEFAULT_MORE_CUT: usize = 2;

/// Config error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config file not found")]
    FileNotFound(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Setting data loaded from config file
#[derive(Debug, Clone)]
pub struct Config {
    pub resource_dir: PathBuf,
    pub words_index: PathBuf,
    pub names_index: PathBuf,
    pub words_dictionary: PathBuf,
    pub names_dictionary: PathBuf,
    /// Replaces the built-in deinflection rules when set
    pub deinflection_rules: Option<PathBuf>,

    pub memory_size: usize,
    pub max_results: usize,
    pub more_cut: usize,
}

/// Struct corresponds with raw config json file.
/// You must use filed names defined here as json object key.
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    resourcePath: Option<PathBuf>,
    wordsIndex: Option<PathBuf>,
    namesIndex: Option<PathBuf>,
    wordsDictionary: Option<PathBuf>,
    namesDictionary: Option<PathBuf>,
    deinflectionRules: Option<PathBuf>,

    memorySize: Option<usize>,
    maxResults: Option<usize>,
    moreCut: Option<usize>,
}

impl RawConfig {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::resolve(RawConfig::default(), None)
    }
}

impl Config {
    pub fn new(
        config_file: Option<PathBuf>,
        resource_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        // without a file every setting takes its default
        let raw_config = match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path.display().to_string()));
                }
                let file = File::open(path)?;
                RawConfig::from_reader(BufReader::new(file))?
            }
            None => RawConfig::default(),
        };

        let config = Config::resolve(raw_config, resource_dir);
        if config.max_results == 0 {
            return Err(ConfigError::InvalidFormat(
                "maxResults must be positive".to_owned(),
            ));
        }
        Ok(config)
    }

    fn resolve(raw_config: RawConfig, resource_dir: Option<PathBuf>) -> Self {
        // prioritize arg (cli option) > config file > default
        let resource_dir = resource_dir
            .or(raw_config.resourcePath)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCE_DIR));

        let file = |value: Option<PathBuf>, default: &str| {
            Config::join_if_relative(&resource_dir, value.unwrap_or_else(|| PathBuf::from(default)))
        };

        Config {
            words_index: file(raw_config.wordsIndex, DEFAULT_WORDS_INDEX_FILE),
            names_index: file(raw_config.namesIndex, DEFAULT_NAMES_INDEX_FILE),
            words_dictionary: file(raw_config.wordsDictionary, DEFAULT_WORDS_DICTIONARY_FILE),
            names_dictionary: file(raw_config.namesDictionary, DEFAULT_NAMES_DICTIONARY_FILE),
            deinflection_rules: raw_config
                .deinflectionRules
                .map(|p| Config::join_if_relative(&resource_dir, p)),
            memory_size: raw_config.memorySize.unwrap_or(DEFAULT_MEMORY_SIZE),
            max_results: raw_config.maxResults.unwrap_or(DEFAULT_MAX_RESULTS),
            more_cut: raw_config.moreCut.unwrap_or(DEFAULT_MORE_CUT),
            resource_dir,
        }
    }

    fn join_if_relative(resource_dir: &Path, file_path: PathBuf) -> PathBuf {
        if file_path.is_absolute() {
            file_path
        } else {
            resource_dir.join(&file_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::assert_matches;
    use std::io::Write;

    #[test]
    fn defaults_without_file() {
        let config = Config::new(None, Some(PathBuf::from("/data"))).expect("config");
        assert_eq!(PathBuf::from("/data/dict.idx"), config.words_index);
        assert_eq!(PathBuf::from("/data/names.dat"), config.names_dictionary);
        assert_eq!(DEFAULT_MAX_RESULTS, config.max_results);
        assert_eq!(DEFAULT_MORE_CUT, config.more_cut);
        assert!(config.deinflection_rules.is_none());
    }

    #[test]
    fn file_values_and_cli_priority() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{"resourcePath": "/from/file", "wordsIndex": "/abs/words.idx", "namesIndex": "n.idx", "maxResults": 10}}"#
        )
        .expect("write");

        let config = Config::new(Some(file.path().to_owned()), None).expect("config");
        assert_eq!(PathBuf::from("/abs/words.idx"), config.words_index);
        assert_eq!(PathBuf::from("/from/file/n.idx"), config.names_index);
        assert_eq!(10, config.max_results);

        let config = Config::new(Some(file.path().to_owned()), Some(PathBuf::from("/cli")))
            .expect("config");
        assert_eq!(PathBuf::from("/cli/n.idx"), config.names_index);
    }

    #[test]
    fn rejects_unknown_keys_and_missing_files() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"systemDict": "x"}}"#).expect("write");
        assert_matches!(
            Config::new(Some(file.path().to_owned()), None),
            Err(ConfigError::SerdeError(_))
        );
        assert_matches!(
            Config::new(Some(PathBuf::from("/definitely/missing.json")), None),
            Err(ConfigError::FileNotFound(_))
        );
    }
}
