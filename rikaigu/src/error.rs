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

use std::io::Error;
use thiserror::Error;

use crate::arena::BufferKind;
use crate::config::ConfigError;
use crate::deinflect::rules::RuleParseError;
use crate::dic::build::IndexBuildError;
use crate::dic::storage::IndexFileError;

pub type RikaiResult<T> = Result<T, RikaiError>;

/// Rikaigu error
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RikaiError {
    #[error("{context}: {cause}")]
    ErrWithContext {
        context: String,
        cause: Box<RikaiError>,
    },

    #[error("{context}: {cause}")]
    Io {
        cause: std::io::Error,
        context: String,
    },

    #[error("Config Error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Invalid index file: {0}")]
    InvalidIndexFile(#[from] IndexFileError),

    #[error("Invalid index entry: {0}")]
    InvalidIndexEntry(#[from] IndexBuildError),

    #[error("Invalid deinflection rules: {0}")]
    InvalidRules(#[from] RuleParseError),

    #[error("Buffer {buffer:?} is out of space: requested {requested} bytes, {available} available")]
    CapacityExceeded {
        buffer: BufferKind,
        requested: usize,
        available: usize,
    },

    #[error("Memory block of {0} bytes can't hold all buffers, at least {1} required")]
    NotEnoughMemory(usize, usize),

    #[error("Input is too long, it can't be more than {1} code units, was {0}")]
    InputTooLong(usize, usize),

    #[error("Invalid data format: {1} at position {0}")]
    InvalidDataFormat(usize, String),

    #[error("Corrupted dictionary index: {0}")]
    CorruptedIndex(&'static str),

    #[error("No read request is waiting for records")]
    NoPendingRequest,

    #[error("Dictionary records do not match the requested offsets: {0}")]
    RecordsMismatch(String),

    #[error("Invalid part of speech: {0}")]
    InvalidPartOfSpeech(String),
}

impl From<std::io::Error> for RikaiError {
    fn from(e: Error) -> Self {
        RikaiError::Io {
            cause: e,
            context: String::from("IO Error"),
        }
    }
}

impl RikaiError {
    pub fn with_context<S: Into<String>>(self, ctx: S) -> Self {
        match self {
            RikaiError::Io { cause, .. } => RikaiError::Io {
                cause,
                context: ctx.into(),
            },
            cause => RikaiError::ErrWithContext {
                cause: Box::new(cause),
                context: ctx.into(),
            },
        }
    }

    /// Errors which mean that the engine state of the current call can't be trusted anymore
    pub fn is_fatal(&self) -> bool {
        match self {
            RikaiError::ErrWithContext { cause, .. } => cause.is_fatal(),
            RikaiError::CapacityExceeded { .. }
            | RikaiError::CorruptedIndex(_)
            | RikaiError::RecordsMismatch(_) => true,
            _ => false,
        }
    }
}

pub type RikaiNomResult<I, O> = nom::IResult<I, O, RikaiNomError<I>>;

/// Custom nom error
#[derive(Debug, PartialEq)]
pub enum RikaiNomError<I> {
    Nom(I, nom::error::ErrorKind),
}

impl<I> nom::error::ParseError<I> for RikaiNomError<I> {
    fn from_error_kind(input: I, kind: nom::error::ErrorKind) -> Self {
        RikaiNomError::Nom(input, kind)
    }
    fn append(_: I, _: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}
