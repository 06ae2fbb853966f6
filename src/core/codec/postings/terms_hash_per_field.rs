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

use core::analysis::Token;
use core::codec::field_infos::{FieldInfo, FieldInvertState};
use core::codec::postings::{PostingsDoc, PostingsPosition, TermPostings};
use core::codec::term_vectors::TermVectorsConsumerPerField;
use core::util::DocId;

use std::cmp::max;
use std::collections::HashMap;

// approximate heap cost of the buffered postings
const BYTES_PER_TERM: i64 = 64;
const BYTES_PER_DOC: i64 = 24;
const BYTES_PER_POSITION: i64 = 16;

/// In-memory postings of one field for the segment being written.
pub struct FreqProxTermsWriterPerField {
    pub field_name: String,
    has_freq: bool,
    has_prox: bool,
    has_offsets: bool,
    term_ids: HashMap<Vec<u8>, usize>,
    postings: Vec<TermPostings>,
    pub saw_payloads: bool,
    pub sum_total_term_freq: i64,
    pub sum_doc_freq: i64,
    pub doc_count: i32,
    pub next_per_field: TermVectorsConsumerPerField,
    pub do_next_call: bool,
}

impl FreqProxTermsWriterPerField {
    pub fn new(field_info: &FieldInfo, next_per_field: TermVectorsConsumerPerField) -> Self {
        let index_options = field_info.index_options;
        FreqProxTermsWriterPerField {
            field_name: field_info.name.clone(),
            has_freq: index_options.has_freqs(),
            has_prox: index_options.has_positions(),
            has_offsets: index_options.has_offsets(),
            term_ids: HashMap::new(),
            postings: vec![],
            saw_payloads: false,
            sum_total_term_freq: 0,
            sum_doc_freq: 0,
            doc_count: 0,
            next_per_field,
            do_next_call: false,
        }
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    /// Buffered terms in byte order.
    pub fn sorted_terms(&self) -> Vec<&TermPostings> {
        let mut terms: Vec<&TermPostings> = self.postings.iter().collect();
        terms.sort_by(|a, b| a.term.cmp(&b.term));
        terms
    }

    /// Records one occurrence of `token` in `doc_id` and returns the
    /// number of bytes newly allocated.
    pub fn add(&mut self, field_state: &mut FieldInvertState, token: &Token, doc_id: DocId) -> i64 {
        let mut bytes = 0;
        let term_id = match self.term_ids.get(&token.term) {
            Some(&id) => id,
            None => {
                // First time we're seeing this term since the last flush
                let id = self.postings.len();
                self.postings.push(TermPostings::new(token.term.clone()));
                self.term_ids.insert(token.term.clone(), id);
                bytes += BYTES_PER_TERM + 2 * token.term.len() as i64;
                id
            }
        };

        let postings = &mut self.postings[term_id];
        let new_doc = postings.docs.last().map_or(true, |d| d.doc_id != doc_id);
        if new_doc {
            debug_assert!(postings.docs.last().map_or(true, |d| d.doc_id < doc_id));
            postings.docs.push(PostingsDoc {
                doc_id,
                freq: 0,
                positions: vec![],
            });
            field_state.unique_term_count += 1;
            bytes += BYTES_PER_DOC;
        }

        let last = postings.docs.len() - 1;
        let doc = &mut postings.docs[last];
        doc.freq += 1;
        if self.has_freq {
            field_state.max_term_frequency = max(field_state.max_term_frequency, doc.freq as u32);
        } else {
            field_state.max_term_frequency = max(field_state.max_term_frequency, 1);
        }

        if self.has_prox {
            let (start_offset, end_offset) = if self.has_offsets {
                (
                    (field_state.offset + token.start_offset) as i32,
                    (field_state.offset + token.end_offset) as i32,
                )
            } else {
                (-1, -1)
            };
            if !token.payload.is_empty() {
                self.saw_payloads = true;
            }
            doc.positions.push(PostingsPosition {
                position: field_state.position,
                start_offset,
                end_offset,
                payload: token.payload.clone(),
            });
            bytes += BYTES_PER_POSITION + token.payload.len() as i64;
        }
        bytes
    }

    pub fn finish(&mut self, field_state: &FieldInvertState) {
        self.sum_doc_freq += field_state.unique_term_count as i64;
        self.sum_total_term_freq += field_state.length as i64;
        if field_state.length > 0 {
            self.doc_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::doc::{DocValuesType, IndexOptions};

    fn per_field(options: IndexOptions) -> FreqProxTermsWriterPerField {
        let fi = FieldInfo::new(
            "f".into(),
            0,
            false,
            false,
            false,
            options,
            DocValuesType::Null,
            HashMap::new(),
        )
        .unwrap();
        FreqProxTermsWriterPerField::new(&fi, TermVectorsConsumerPerField::new(&fi))
    }

    fn token(term: &str) -> Token {
        let mut t = Token::new();
        t.term.extend_from_slice(term.as_bytes());
        t
    }

    #[test]
    fn test_docs_only_skips_positions() {
        let mut pf = per_field(IndexOptions::Docs);
        let mut state = FieldInvertState::new("f".into());
        state.reset();
        for _ in 0..3 {
            state.position += 1;
            pf.add(&mut state, &token("x"), 5);
        }
        assert_eq!(pf.num_terms(), 1);
        let terms = pf.sorted_terms();
        assert_eq!(terms[0].docs[0].freq, 3);
        assert!(terms[0].docs[0].positions.is_empty());
        assert_eq!(state.unique_term_count, 1);
        assert_eq!(state.max_term_frequency, 1);
    }

    #[test]
    fn test_term_stats_across_documents() {
        let mut pf = per_field(IndexOptions::DocsAndFreqsAndPositions);
        for doc in 0..2 {
            let mut state = FieldInvertState::new("f".into());
            state.reset();
            for word in &["a", "b", "a"] {
                state.position += 1;
                state.length += 1;
                pf.add(&mut state, &token(word), doc);
            }
            assert_eq!(state.max_term_frequency, 2);
            assert_eq!(state.unique_term_count, 2);
            pf.finish(&state);
        }
        assert_eq!(pf.doc_count, 2);
        assert_eq!(pf.sum_doc_freq, 4);
        assert_eq!(pf.sum_total_term_freq, 6);

        let a = pf.sorted_terms()[0];
        assert_eq!(a.doc_freq(), 2);
        assert_eq!(a.total_term_freq(), 4);
        let positions: Vec<i32> = a.docs[1].positions.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 2]);
    }
}
