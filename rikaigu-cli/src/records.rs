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

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use rikaigu::dic::storage::Storage;
use rikaigu::dic::NAMES_OFFSET_FLAG;
use rikaigu::error::{RikaiError, RikaiResult};

/// Maps a whole file, empty files can't be mapped and are read as no bytes
pub fn map_file(path: &Path) -> RikaiResult<Storage> {
    let context = |e: std::io::Error| RikaiError::from(e).with_context(path.display().to_string());
    let file = File::open(path).map_err(context)?;
    if file.metadata().map_err(context)?.len() == 0 {
        return Ok(Storage::Owned(Vec::new()));
    }
    let map = unsafe { Mmap::map(&file) }.map_err(context)?;
    Ok(Storage::File(map))
}

/// Words and names records files, answering read requests of the engine
pub struct RecordFiles {
    words: Storage,
    names: Storage,
}

impl RecordFiles {
    pub fn open(words: &Path, names: &Path) -> RikaiResult<Self> {
        Ok(RecordFiles {
            words: map_file(words)?,
            names: map_file(names)?,
        })
    }

    /// Line starting at `offset`, names offsets have bit 31 set
    pub fn record(&self, offset: u32) -> RikaiResult<&[u8]> {
        let (data, offset) = if offset & NAMES_OFFSET_FLAG != 0 {
            (self.names.as_ref(), (offset & !NAMES_OFFSET_FLAG) as usize)
        } else {
            (self.words.as_ref(), offset as usize)
        };
        if offset >= data.len() {
            return Err(RikaiError::RecordsMismatch(format!(
                "offset {} is past the end of the records file",
                offset
            )));
        }
        let rest = &data[offset..];
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        let record = &rest[..end];
        Ok(record.strip_suffix(b"\r").unwrap_or(record))
    }

    /// Records at `offsets`, each prefixed with its length
    pub fn answer(&self, offsets: &[u32]) -> RikaiResult<Vec<u8>> {
        let mut out = Vec::with_capacity(offsets.len() * 128);
        for &offset in offsets {
            let record = self.record(offset)?;
            if record.len() > u16::MAX as usize {
                return Err(RikaiError::RecordsMismatch(format!(
                    "record at {} is {} bytes long",
                    offset,
                    record.len()
                )));
            }
            out.extend_from_slice(&(record.len() as u16).to_le_bytes());
            out.extend_from_slice(record);
        }
        Ok(out)
    }
}
