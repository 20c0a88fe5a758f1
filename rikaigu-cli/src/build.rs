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

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use structopt::StructOpt;

use rikaigu::dic::build::IndexBuilder;
use rikaigu::error::{RikaiError, RikaiResult};

use crate::records::map_file;

/// Check that the first argument is a subcommand and the file with the same name does
/// not exists.
/// If the file does exists, it is text to look up.
pub fn is_build_mode() -> bool {
    let mut args = std::env::args_os();
    let _ = args.next();
    match args.next() {
        Some(x) => x == "index" && !Path::new(&x).exists(),
        None => false,
    }
}

#[derive(StructOpt)]
#[structopt(name = "rikaigu")]
enum BuildCli {
    /// Builds the index of a dictionary records file
    #[structopt(name = "index")]
    Index {
        /// Records file, one record per line
        #[structopt(parse(from_os_str))]
        input: PathBuf,

        /// Where to place the index.
        /// If there was an existing one it will be overwritten.
        #[structopt(short = "o", long = "output", parse(from_os_str))]
        output_file: PathBuf,

        /// Records are names: offsets are not typed with parts of speech
        #[structopt(short = "n", long = "names")]
        names: bool,
    },
}

pub fn build_main() {
    let args: BuildCli = BuildCli::from_args();

    let result = match args {
        BuildCli::Index {
            input,
            output_file,
            names,
        } => build_index(&input, &output_file, names),
    };
    if let Err(e) = result {
        eprintln!("Failed to build index: {}", e);
        std::process::exit(1);
    }
}

fn build_index(input: &Path, output: &Path, names: bool) -> RikaiResult<()> {
    let start = Instant::now();
    let data = map_file(input)?;
    let text = std::str::from_utf8(data.as_ref()).map_err(|e| {
        RikaiError::InvalidDataFormat(e.valid_up_to(), String::from("records are not UTF-8"))
            .with_context(input.display().to_string())
    })?;

    let mut builder = IndexBuilder::new();
    let mut offset = 0;
    let mut num_records = 0;
    let mut num_keys = 0;
    for line in text.split_inclusive('\n') {
        let record = line.trim_end_matches(&['\n', '\r'][..]);
        if !record.is_empty() {
            num_keys += builder.add_record(offset as u32, record, !names);
            num_records += 1;
        }
        offset += line.len();
    }
    let built = builder.build()?;
    tracing::info!(
        records = num_records,
        keys = num_keys,
        entries = builder.num_entries(),
        "indexed {:?}",
        input
    );

    let mut buf_writer = BufWriter::with_capacity(16 * 1024, output_file(output));
    let written = built.write_to(&mut buf_writer)?;
    buf_writer.flush()?;
    eprintln!(
        "{} records, {} entries in {} chunks, {} bytes in {:.3} sec",
        num_records,
        builder.num_entries(),
        built.num_chunks(),
        written,
        start.elapsed().as_secs_f32()
    );
    Ok(())
}

fn output_file(p: &Path) -> File {
    if p.exists() {
        std::fs::remove_file(p).unwrap_or_else(|e| panic!("failed to delete {:?}\n{:?}", p, e));
    }

    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&p)
        .unwrap_or_else(|e| panic!("failed to open {:?} for writing:\n{:?}", p, e))
}
