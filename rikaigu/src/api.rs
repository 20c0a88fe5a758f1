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

use crate::arena::Arena;
use crate::config::Config;
use crate::deinflect::rules::RuleTable;
use crate::dic::Dictionaries;
use crate::engine::Engine;
use crate::error::{RikaiError, RikaiResult};
use crate::host::Host;
use crate::input_text::MAX_INPUT_LENGTH;

/// Call boundary between the host application and the engine.
///
/// Errors which leave the engine state inconsistent are reported to
/// [`Host::take_a_trip`] before they are returned.
pub struct Rikaigu<'a, 'm, H: Host> {
    engine: Engine<'a, 'm>,
    host: H,
}

impl<'a, 'm, H: Host> Rikaigu<'a, 'm, H> {
    /// Installs the engine into `memory`, which is split into the arena buffers
    pub fn init(
        memory: &'m mut [u8],
        dictionaries: Dictionaries<'a>,
        rules: &'a RuleTable,
        host: H,
    ) -> RikaiResult<Self> {
        let arena = Arena::split(memory)?;
        Ok(Rikaigu {
            engine: Engine::new(arena, dictionaries, rules),
            host,
        })
    }

    /// Same as [`Rikaigu::init`], with result limits taken from the configuration
    pub fn with_config(
        config: &Config,
        memory: &'m mut [u8],
        dictionaries: Dictionaries<'a>,
        rules: &'a RuleTable,
        host: H,
    ) -> RikaiResult<Self> {
        let mut rikaigu = Self::init(memory, dictionaries, rules, host)?;
        rikaigu.engine = rikaigu
            .engine
            .with_limits(config.max_results, config.more_cut);
        Ok(rikaigu)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn engine(&mut self) -> &mut Engine<'a, 'm> {
        &mut self.engine
    }

    pub fn input_mut(&mut self) -> &mut [u16; MAX_INPUT_LENGTH] {
        self.engine.input_mut()
    }

    /// Writes `text` into the input and starts a search over it
    pub fn search(&mut self, text: &[u16], request_id: u32) -> RikaiResult<usize> {
        if text.len() > MAX_INPUT_LENGTH {
            return Err(RikaiError::InputTooLong(text.len(), MAX_INPUT_LENGTH));
        }
        self.input_mut()[..text.len()].copy_from_slice(text);
        self.search_start(text.len(), request_id)
    }

    pub fn search_start(&mut self, utf16_length: usize, request_id: u32) -> RikaiResult<usize> {
        let result = self
            .engine
            .search_start(&mut self.host, utf16_length, request_id);
        report(&mut self.host, result)
    }

    pub fn search_finish(&mut self, records: &[u8]) -> RikaiResult<&str> {
        match self.engine.search_finish(records) {
            Ok(html) => Ok(html),
            Err(e) => Err(report_error(&mut self.host, e)),
        }
    }
}

fn report_error<H: Host>(host: &mut H, error: RikaiError) -> RikaiError {
    if error.is_fatal() {
        host.take_a_trip(&error.to_string());
    }
    error
}

fn report<H: Host, T>(host: &mut H, result: RikaiResult<T>) -> RikaiResult<T> {
    result.map_err(|e| report_error(host, e))
}
