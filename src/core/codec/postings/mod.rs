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

mod terms_hash;

pub use self::terms_hash::*;

mod terms_hash_per_field;

pub use self::terms_hash_per_field::*;

mod plain_postings_format;

pub use self::plain_postings_format::*;

use core::codec::field_infos::FieldInfo;
use core::codec::segment_infos::SegmentWriteState;
use core::util::DocId;

use error::Result;

/// Longest term, in bytes, the in-memory postings accept.
pub const MAX_TERM_LENGTH: usize = 32766;

/// Encodes terms, postings, and proximity data of a flushed segment.
pub trait PostingsFormat: Send + Sync {
    type FieldsConsumer: FieldsConsumer;

    /// Writes a new segment
    fn fields_consumer(&self, state: &SegmentWriteState) -> Result<Self::FieldsConsumer>;

    /// Returns this posting format's name
    fn name(&self) -> &str;
}

/// Abstract API that consumes terms, doc, freq, prox, offset and
/// payloads postings.
pub trait FieldsConsumer {
    /// Writes all fields, terms and postings. Fields arrive sorted by name
    /// and terms sorted by their bytes. The consumer is done after this call
    /// returns successfully.
    fn write(&mut self, fields: &[FieldPostings]) -> Result<()>;
}

/// One occurrence of a term inside a document.
#[derive(Clone, Debug, PartialEq)]
pub struct PostingsPosition {
    pub position: i32,
    pub start_offset: i32,
    pub end_offset: i32,
    pub payload: Vec<u8>,
}

/// Postings of a term for one document.
#[derive(Clone, Debug, PartialEq)]
pub struct PostingsDoc {
    pub doc_id: DocId,
    pub freq: i32,
    pub positions: Vec<PostingsPosition>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TermPostings {
    pub term: Vec<u8>,
    pub docs: Vec<PostingsDoc>,
}

impl TermPostings {
    pub fn new(term: Vec<u8>) -> TermPostings {
        TermPostings { term, docs: vec![] }
    }

    pub fn doc_freq(&self) -> usize {
        self.docs.len()
    }

    pub fn total_term_freq(&self) -> i64 {
        self.docs.iter().map(|d| d.freq as i64).sum()
    }
}

/// Read-only view of one field's buffered postings handed to the
/// `FieldsConsumer` at flush.
pub struct FieldPostings<'a> {
    pub field_info: &'a FieldInfo,
    pub terms: Vec<&'a TermPostings>,
    pub sum_total_term_freq: i64,
    pub sum_doc_freq: i64,
    pub doc_count: i32,
}
