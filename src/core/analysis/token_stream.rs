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

use core::analysis::{Token, TokenStream};

use error::Result;

/// Emits the whole string as a single token.
#[derive(Debug)]
pub struct StringTokenStream {
    token: Token,
    used: bool,
    value: String,
}

impl StringTokenStream {
    pub fn new(value: String) -> Self {
        StringTokenStream {
            token: Token::new(),
            used: true,
            value,
        }
    }
}

impl TokenStream for StringTokenStream {
    fn next_token(&mut self) -> Result<bool> {
        if self.used {
            return Ok(false);
        }
        self.clear_token();

        self.token.term.extend_from_slice(self.value.as_bytes());
        self.token
            .set_offset(0, self.value.chars().count())?;
        self.used = true;
        Ok(true)
    }

    fn end(&mut self) -> Result<()> {
        self.end_token();
        let final_offset = self.value.chars().count();
        self.token.set_offset(final_offset, final_offset)
    }

    fn reset(&mut self) -> Result<()> {
        self.used = false;
        Ok(())
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }
}

/// Emits a binary value as a single token.
#[derive(Debug)]
pub struct BinaryTokenStream {
    token: Token,
    used: bool,
    value: Vec<u8>,
}

impl BinaryTokenStream {
    pub fn new(value: Vec<u8>) -> Self {
        BinaryTokenStream {
            token: Token::new(),
            used: true,
            value,
        }
    }
}

impl TokenStream for BinaryTokenStream {
    fn next_token(&mut self) -> Result<bool> {
        if self.used {
            return Ok(false);
        }
        self.clear_token();
        self.token.term.extend_from_slice(&self.value);
        self.used = true;
        Ok(true)
    }

    fn end(&mut self) -> Result<()> {
        self.end_token();
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.used = false;
        Ok(())
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }
}

/// Replays a fixed list of tokens, mostly useful for pre-analyzed fields.
#[derive(Debug)]
pub struct CannedTokenStream {
    tokens: Vec<Token>,
    upto: usize,
    final_offset: usize,
    final_position_increment: usize,
    token: Token,
}

impl CannedTokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        let final_offset = tokens.last().map_or(0, |t| t.end_offset);
        CannedTokenStream {
            tokens,
            upto: 0,
            final_offset,
            final_position_increment: 0,
            token: Token::new(),
        }
    }

    pub fn with_final(tokens: Vec<Token>, final_offset: usize, final_pos_inc: usize) -> Self {
        let mut stream = Self::new(tokens);
        stream.final_offset = final_offset;
        stream.final_position_increment = final_pos_inc;
        stream
    }
}

impl TokenStream for CannedTokenStream {
    fn next_token(&mut self) -> Result<bool> {
        if self.upto >= self.tokens.len() {
            return Ok(false);
        }
        self.token = self.tokens[self.upto].clone();
        self.upto += 1;
        Ok(true)
    }

    fn end(&mut self) -> Result<()> {
        self.end_token();
        self.token.position = self.final_position_increment;
        self.token.set_offset(self.final_offset, self.final_offset)
    }

    fn reset(&mut self) -> Result<()> {
        self.upto = 0;
        Ok(())
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }
}
