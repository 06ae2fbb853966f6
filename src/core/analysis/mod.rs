// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

mod token_stream;

pub use self::token_stream::*;

mod whitespace_tokenizer;

pub use self::whitespace_tokenizer::*;

use error::Result;

use std::fmt::Debug;

pub const MIN_BUFFER_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct Token {
    pub term: Vec<u8>,
    /// Determines the position of this token relative to the previous Token in a
    /// TokenStream, used in phrase searching.
    ///
    /// The default value is one. Zero puts several terms at the same position,
    /// e.g. stems or synonyms of one word.
    pub position: usize,
    /// The start and end character offset of a Token.
    pub start_offset: usize,
    pub end_offset: usize,
    /// The payload of a Token, stored in the index at each position.
    pub payload: Vec<u8>,
}

impl Default for Token {
    fn default() -> Self {
        Token::new()
    }
}

impl Token {
    pub fn new() -> Token {
        Token {
            term: Vec::with_capacity(MIN_BUFFER_SIZE),
            position: 1,
            start_offset: 0,
            end_offset: 0,
            payload: Vec::with_capacity(0),
        }
    }

    pub fn clear(&mut self) {
        self.position = 1;
        self.start_offset = 0;
        self.end_offset = 0;
        self.payload.clear();
        self.term.clear();
    }

    pub fn end(&mut self) {
        self.clear();
        self.position = 0;
    }

    /// Set the starting and ending offset.
    pub fn set_offset(&mut self, start_offset: usize, end_offset: usize) -> Result<()> {
        if end_offset < start_offset {
            bail!(
                "endOffset must be >= startOffset; got startOffset={}, endOffset={}",
                start_offset,
                end_offset
            )
        }

        self.start_offset = start_offset;
        self.end_offset = end_offset;
        Ok(())
    }
}

/// A `TokenStream` enumerates the sequence of tokens of one field value.
///
/// The consumer calls `reset`, then `next_token` until it returns false, reading
/// `token()` after each call, and finally `end` so that end-of-stream state (the
/// final offset and any trailing position increment) becomes visible.
///
/// A stream is not required to support being consumed concurrently with another
/// stream of the same analyzer.
pub trait TokenStream: Debug {
    /// Advances to the next token. Returns false at the end of the stream.
    fn next_token(&mut self) -> Result<bool>;

    /// Called after the last token has been consumed. Implementations leave the
    /// final offset in `token().end_offset` and any trailing position increment
    /// in `token().position`.
    fn end(&mut self) -> Result<()>;

    /// Resets this stream to a clean state, ready for consumption.
    fn reset(&mut self) -> Result<()>;

    fn token(&self) -> &Token;

    fn token_mut(&mut self) -> &mut Token;

    fn clear_token(&mut self) {
        self.token_mut().clear();
    }

    fn end_token(&mut self) {
        self.token_mut().end();
    }
}

/// Builds token streams for field text.
pub trait Analyzer: Send + Sync {
    fn token_stream(&self, field_name: &str, text: &str) -> Result<Box<dyn TokenStream>>;

    /// Positions inserted between two values of the same field in one document.
    fn position_increment_gap(&self, _field_name: &str) -> i32 {
        0
    }

    /// Offset inserted between two values of the same field in one document.
    fn offset_gap(&self, _field_name: &str) -> usize {
        1
    }
}
