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

mod build;
mod output;
mod records;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use structopt::StructOpt;

use rikaigu::config::Config;
use rikaigu::deinflect::rules::{embedded_rules, RuleTable};
use rikaigu::dic::index::DictionaryIndex;
use rikaigu::dic::storage::{IndexFile, Storage};
use rikaigu::host::PendingRequest;
use rikaigu::input_text::MAX_INPUT_LENGTH;
use rikaigu::prelude::*;

use crate::build::{build_main, is_build_mode};
use crate::output::{Html, Lookup, Matches, RikaiOutput, Writer};
use crate::records::{map_file, RecordFiles};

/// Looks up Japanese text in the rikaigu dictionaries
#[derive(StructOpt)]
#[structopt(name = "rikaigu")]
struct Cli {
    /// Input text file: If not present, read from STDIN
    #[structopt(parse(from_os_str))]
    file: Option<PathBuf>,

    /// Path to the setting file in JSON format
    #[structopt(short = "r", long = "config-file", parse(from_os_str))]
    config_file: Option<PathBuf>,

    /// Path to the root directory of resources
    #[structopt(short = "p", long = "resource_dir", parse(from_os_str))]
    resource_dir: Option<PathBuf>,

    // Output text file: If not present, use stdout
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output_file: Option<PathBuf>,

    /// Looks up every position of a line, not only its start
    #[structopt(short = "s", long = "scan")]
    scan: bool,

    /// Outputs only the matched words
    #[structopt(short = "w", long = "words-only")]
    words_only: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if is_build_mode() {
        build_main();
        return;
    }

    let args: Cli = Cli::from_args();
    if let Err(e) = run(&args) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn load_rules(config: &Config) -> RikaiResult<Option<RuleTable>> {
    match &config.deinflection_rules {
        Some(path) => {
            let file = File::open(path)?;
            let rules = RuleTable::parse(BufReader::new(file))
                .map_err(|e| RikaiError::from(e).with_context(path.display().to_string()))?;
            Ok(Some(rules))
        }
        None => Ok(None),
    }
}

fn open_index<'a>(
    storage: &'a Storage,
    path: &Path,
    dictionary: Dictionary,
) -> RikaiResult<DictionaryIndex<'a>> {
    let file = IndexFile::parse(storage.as_ref())
        .map_err(|e| RikaiError::from(e).with_context(path.display().to_string()))?;
    file.index(dictionary)
}

fn run(args: &Cli) -> RikaiResult<()> {
    // input: stdin or file
    let reader: Box<dyn BufRead> = match &args.file {
        Some(input_path) => Box::new(BufReader::new(
            File::open(&input_path)
                .unwrap_or_else(|_| panic!("Failed to open input file {:?}", &input_path)),
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    // output: stdout or file
    let inner_writer: Box<dyn Write> = match &args.output_file {
        Some(output_path) => Box::new(
            File::create(&output_path)
                .unwrap_or_else(|_| panic!("Failed to open output file {:?}", &output_path)),
        ),
        None => Box::new(io::stdout()),
    };
    let mut writer = BufWriter::new(inner_writer);

    // load config file
    let config = Config::new(args.config_file.clone(), args.resource_dir.clone())?;

    let custom_rules = load_rules(&config)?;
    let rules = match &custom_rules {
        Some(rules) => rules,
        None => embedded_rules()?,
    };

    let words_storage = map_file(&config.words_index)?;
    let names_storage = map_file(&config.names_index)?;
    let dictionaries = Dictionaries::new(
        open_index(&words_storage, &config.words_index, Dictionary::Words)?,
        open_index(&names_storage, &config.names_index, Dictionary::Names)?,
    )?;
    let records = RecordFiles::open(&config.words_dictionary, &config.names_dictionary)?;

    let mut memory = vec![0u8; config.memory_size];
    let mut rikaigu = Rikaigu::with_config(
        &config,
        &mut memory,
        dictionaries,
        rules,
        PendingRequest::default(),
    )?;

    let output: Box<dyn RikaiOutput> = if args.words_only {
        Box::new(Matches)
    } else {
        Box::new(Html)
    };

    for (line_number, line) in reader.lines().enumerate() {
        let input = line?;
        let starts: Vec<usize> = if args.scan {
            input.char_indices().map(|(idx, _)| idx).collect()
        } else {
            vec![0]
        };
        for start in starts {
            let text = &input[start..];
            look_up(
                &mut rikaigu,
                &records,
                text,
                line_number as u32,
                output.as_ref(),
                &mut writer,
            )
            .map_err(|e| e.with_context(format!("looking up {:?}", text)))?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// UTF-16 units of the longest prefix of `text` which fits into the engine input
fn input_units(text: &str) -> Vec<u16> {
    let mut units = Vec::with_capacity(MAX_INPUT_LENGTH);
    let mut buf = [0u16; 2];
    for c in text.chars() {
        let encoded = c.encode_utf16(&mut buf);
        if units.len() + encoded.len() > MAX_INPUT_LENGTH {
            break;
        }
        units.extend_from_slice(encoded);
    }
    units
}

fn look_up(
    rikaigu: &mut Rikaigu<'_, '_, PendingRequest>,
    records: &RecordFiles,
    text: &str,
    request_id: u32,
    output: &dyn RikaiOutput,
    writer: &mut Writer,
) -> RikaiResult<()> {
    let units = input_units(text);
    if units.is_empty() {
        return Ok(());
    }
    let matched = rikaigu.search(&units, request_id)?;
    let html = if matched > 0 {
        let answer = records.answer(&rikaigu.host().offsets)?;
        Some(rikaigu.search_finish(&answer)?)
    } else {
        None
    };
    let lookup = Lookup {
        text,
        matched,
        html,
    };
    output.write(writer, &lookup)?;
    Ok(())
}
