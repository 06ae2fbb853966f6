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

use core::analysis::{Analyzer, Token, TokenStream};

use error::Result;

// NOTE: this length is length by byte
const MAX_WORD_LEN: usize = 511;

/// A tokenizer that divides text at whitespace characters.
///
/// Adjacent sequences of non-whitespace characters form tokens. Offsets count
/// characters, not bytes.
#[derive(Debug)]
pub struct WhitespaceTokenizer {
    text: String,
    byte_pos: usize,
    char_pos: usize,
    token: Token,
}

impl WhitespaceTokenizer {
    pub fn new(text: String) -> Self {
        WhitespaceTokenizer {
            text,
            byte_pos: 0,
            char_pos: 0,
            token: Token::new(),
        }
    }

    fn is_token_char(c: char) -> bool {
        !c.is_whitespace()
    }
}

impl TokenStream for WhitespaceTokenizer {
    fn next_token(&mut self) -> Result<bool> {
        self.token.clear();
        let mut start = None;
        let mut end = self.char_pos;

        for c in self.text[self.byte_pos..].chars() {
            if Self::is_token_char(c) {
                if start.is_none() {
                    start = Some(self.char_pos);
                }
                self.byte_pos += c.len_utf8();
                self.char_pos += 1;
                end = self.char_pos;
                let mut buf = [0u8; 4];
                self.token
                    .term
                    .extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                if self.token.term.len() >= MAX_WORD_LEN {
                    break;
                }
            } else if start.is_some() {
                break;
            } else {
                self.byte_pos += c.len_utf8();
                self.char_pos += 1;
            }
        }

        match start {
            Some(start) => {
                self.token.set_offset(start, end)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn end(&mut self) -> Result<()> {
        self.token.end();
        let final_offset = self.text.chars().count();
        self.token.set_offset(final_offset, final_offset)
    }

    fn reset(&mut self) -> Result<()> {
        self.byte_pos = 0;
        self.char_pos = 0;
        self.token.clear();
        Ok(())
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }
}

/// Analyzer that splits text on whitespace and keeps terms verbatim.
#[derive(Debug, Default, Clone)]
pub struct WhitespaceAnalyzer {
    position_increment_gap: i32,
}

impl WhitespaceAnalyzer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_position_increment_gap(gap: i32) -> Self {
        WhitespaceAnalyzer {
            position_increment_gap: gap,
        }
    }
}

impl Analyzer for WhitespaceAnalyzer {
    fn token_stream(&self, _field_name: &str, text: &str) -> Result<Box<dyn TokenStream>> {
        Ok(Box::new(WhitespaceTokenizer::new(text.to_string())))
    }

    fn position_increment_gap(&self, _field_name: &str) -> i32 {
        self.position_increment_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_tokenizer() {
        let source = "The quick brown fox jumps over a lazy dog";
        let offsets = [
            (0usize, 3usize),
            (4, 9),
            (10, 15),
            (16, 19),
            (20, 25),
            (26, 30),
            (31, 32),
            (33, 37),
            (38, 41),
        ];
        let words: Vec<&str> = source.split(' ').collect();

        let mut tokenizer = WhitespaceTokenizer::new(source.to_string());
        tokenizer.reset().unwrap();
        for i in 0..9 {
            assert!(tokenizer.next_token().unwrap());
            assert_eq!(tokenizer.token().start_offset, offsets[i].0);
            assert_eq!(tokenizer.token().end_offset, offsets[i].1);
            assert_eq!(tokenizer.token().term, words[i].as_bytes().to_vec());
            assert_eq!(tokenizer.token().position, 1);
        }
        assert!(!tokenizer.next_token().unwrap());
        tokenizer.end().unwrap();
        assert_eq!(tokenizer.token().end_offset, 41);
    }

    #[test]
    fn test_multibyte_offsets_and_blank_input() {
        let mut tokenizer = WhitespaceTokenizer::new("  héllo  wörld ".to_string());
        tokenizer.reset().unwrap();
        assert!(tokenizer.next_token().unwrap());
        assert_eq!(tokenizer.token().term, "héllo".as_bytes().to_vec());
        assert_eq!(
            (tokenizer.token().start_offset, tokenizer.token().end_offset),
            (2, 7)
        );
        assert!(tokenizer.next_token().unwrap());
        assert_eq!(
            (tokenizer.token().start_offset, tokenizer.token().end_offset),
            (9, 14)
        );
        assert!(!tokenizer.next_token().unwrap());

        let analyzer = WhitespaceAnalyzer::new();
        let mut ts = analyzer.token_stream("body", " \t ").unwrap();
        ts.reset().unwrap();
        assert!(!ts.next_token().unwrap());
    }
}
