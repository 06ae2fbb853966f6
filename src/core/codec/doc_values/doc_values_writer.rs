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

use core::codec::doc_values::{flushed_field_info, DocValuesConsumer};
use core::codec::field_infos::FieldInfo;
use core::codec::segment_infos::SegmentWriteState;
use core::doc::DocValuesType;
use core::util::{Counter, DocId};

use error::{ErrorKind::IllegalArgument, Result};

use std::collections::HashMap;
use std::mem;

/// Longest value a sorted or sorted set field accepts.
pub const MAX_SORTED_VALUE_LENGTH: usize = 32766;

const MAX_ARRAY_LENGTH: usize = (i32::max_value() - 1024) as usize;

const EMPTY_ORD: i64 = -1;

pub trait DocValuesWriter {
    fn finish(&mut self, num_doc: i32);

    fn flush<W: DocValuesConsumer>(
        &mut self,
        state: &SegmentWriteState,
        consumer: &mut W,
    ) -> Result<()>;
}

pub enum DocValuesWriterEnum {
    Numeric(NumericDocValuesWriter),
    Binary(BinaryDocValuesWriter),
    Sorted(SortedDocValuesWriter),
    SortedNumeric(SortedNumericDocValuesWriter),
    SortedSet(SortedSetDocValuesWriter),
}

impl DocValuesWriterEnum {
    /// Creates the writer matching `dv_type`, `None` for `DocValuesType::Null`.
    pub fn new(
        dv_type: DocValuesType,
        field_info: &FieldInfo,
        bytes_used: Counter,
    ) -> Option<DocValuesWriterEnum> {
        let writer = match dv_type {
            DocValuesType::Null => return None,
            DocValuesType::Numeric => {
                DocValuesWriterEnum::Numeric(NumericDocValuesWriter::new(field_info, bytes_used))
            }
            DocValuesType::Binary => {
                DocValuesWriterEnum::Binary(BinaryDocValuesWriter::new(field_info, bytes_used))
            }
            DocValuesType::Sorted => {
                DocValuesWriterEnum::Sorted(SortedDocValuesWriter::new(field_info, bytes_used))
            }
            DocValuesType::SortedNumeric => DocValuesWriterEnum::SortedNumeric(
                SortedNumericDocValuesWriter::new(field_info, bytes_used),
            ),
            DocValuesType::SortedSet => DocValuesWriterEnum::SortedSet(
                SortedSetDocValuesWriter::new(field_info, bytes_used),
            ),
        };
        Some(writer)
    }

    pub fn doc_values_type(&self) -> DocValuesType {
        match self {
            DocValuesWriterEnum::Numeric(_) => DocValuesType::Numeric,
            DocValuesWriterEnum::Binary(_) => DocValuesType::Binary,
            DocValuesWriterEnum::Sorted(_) => DocValuesType::Sorted,
            DocValuesWriterEnum::SortedNumeric(_) => DocValuesType::SortedNumeric,
            DocValuesWriterEnum::SortedSet(_) => DocValuesType::SortedSet,
        }
    }
}

impl DocValuesWriter for DocValuesWriterEnum {
    fn finish(&mut self, num_doc: i32) {
        match self {
            DocValuesWriterEnum::Numeric(n) => n.finish(num_doc),
            DocValuesWriterEnum::Binary(b) => b.finish(num_doc),
            DocValuesWriterEnum::Sorted(s) => s.finish(num_doc),
            DocValuesWriterEnum::SortedNumeric(s) => s.finish(num_doc),
            DocValuesWriterEnum::SortedSet(s) => s.finish(num_doc),
        }
    }

    fn flush<W: DocValuesConsumer>(
        &mut self,
        state: &SegmentWriteState,
        consumer: &mut W,
    ) -> Result<()> {
        match self {
            DocValuesWriterEnum::Numeric(n) => n.flush(state, consumer),
            DocValuesWriterEnum::Binary(b) => b.flush(state, consumer),
            DocValuesWriterEnum::Sorted(s) => s.flush(state, consumer),
            DocValuesWriterEnum::SortedNumeric(s) => s.flush(state, consumer),
            DocValuesWriterEnum::SortedSet(s) => s.flush(state, consumer),
        }
    }
}

fn appears_more_than_once(field_name: &str) -> Result<()> {
    bail!(IllegalArgument(format!(
        "DocValuesField {} appears more than once in this document (only one value is allowed \
         per field)",
        field_name
    )))
}

fn check_sorted_length(field_name: &str, value: &[u8]) -> Result<()> {
    if value.len() > MAX_SORTED_VALUE_LENGTH {
        bail!(IllegalArgument(format!(
            "DocValuesField {} is too large, must be <= {}",
            field_name, MAX_SORTED_VALUE_LENGTH
        )));
    }
    Ok(())
}

/// Buffers up pending long per doc, then flushes when segment flushes.
pub struct NumericDocValuesWriter {
    field_name: String,
    pending: Vec<Option<i64>>,
    bytes_used: Counter,
}

impl NumericDocValuesWriter {
    pub fn new(field_info: &FieldInfo, bytes_used: Counter) -> NumericDocValuesWriter {
        NumericDocValuesWriter {
            field_name: field_info.name.clone(),
            pending: vec![],
            bytes_used,
        }
    }

    pub fn add_value(&mut self, doc_id: DocId, value: i64) -> Result<()> {
        if (doc_id as usize) < self.pending.len() {
            return appears_more_than_once(&self.field_name);
        }
        let added = doc_id as usize + 1 - self.pending.len();
        self.pending.resize(doc_id as usize, None);
        self.pending.push(Some(value));
        self.bytes_used
            .add((added * mem::size_of::<Option<i64>>()) as i64);
        Ok(())
    }
}

impl DocValuesWriter for NumericDocValuesWriter {
    fn finish(&mut self, _num_doc: i32) {}

    fn flush<W: DocValuesConsumer>(
        &mut self,
        state: &SegmentWriteState,
        consumer: &mut W,
    ) -> Result<()> {
        let field_info = flushed_field_info(state, &self.field_name)?;
        let max_doc = state.segment_info.max_doc() as usize;
        debug_assert!(self.pending.len() <= max_doc);
        self.pending.resize(max_doc, None);
        consumer.add_numeric_field(field_info, &self.pending)
    }
}

/// Buffers up pending bytes per doc, then flushes when segment flushes.
pub struct BinaryDocValuesWriter {
    field_name: String,
    bytes: Vec<u8>,
    // (start, length) into `bytes` for every doc seen so far
    entries: Vec<Option<(usize, usize)>>,
    bytes_used: Counter,
}

impl BinaryDocValuesWriter {
    pub fn new(field_info: &FieldInfo, bytes_used: Counter) -> BinaryDocValuesWriter {
        BinaryDocValuesWriter {
            field_name: field_info.name.clone(),
            bytes: vec![],
            entries: vec![],
            bytes_used,
        }
    }

    pub fn add_value(&mut self, doc_id: DocId, value: &[u8]) -> Result<()> {
        if (doc_id as usize) < self.entries.len() {
            return appears_more_than_once(&self.field_name);
        }
        if value.len() > MAX_ARRAY_LENGTH {
            bail!(IllegalArgument(format!(
                "DocValuesField {} is too large, must be <={}",
                self.field_name, MAX_ARRAY_LENGTH
            )));
        }
        // Fill in any holes:
        let added = doc_id as usize + 1 - self.entries.len();
        self.entries.resize(doc_id as usize, None);
        self.entries.push(Some((self.bytes.len(), value.len())));
        self.bytes.extend_from_slice(value);
        self.bytes_used.add(
            (added * mem::size_of::<Option<(usize, usize)>>() + value.len()) as i64,
        );
        Ok(())
    }
}

impl DocValuesWriter for BinaryDocValuesWriter {
    fn finish(&mut self, _num_doc: i32) {}

    fn flush<W: DocValuesConsumer>(
        &mut self,
        state: &SegmentWriteState,
        consumer: &mut W,
    ) -> Result<()> {
        let field_info = flushed_field_info(state, &self.field_name)?;
        let max_doc = state.segment_info.max_doc() as usize;
        let bytes = &self.bytes;
        let mut values: Vec<Option<&[u8]>> = self
            .entries
            .iter()
            .map(|e| e.map(|(start, len)| &bytes[start..start + len]))
            .collect();
        values.resize(max_doc, None);
        consumer.add_binary_field(field_info, &values)
    }
}

/// Dedups the values of a sorted field, assigns term ids in insertion
/// order and maps them to ordinals in byte order at flush.
#[derive(Default)]
struct TermIds {
    ids: HashMap<Vec<u8>, i64>,
    terms: Vec<Vec<u8>>,
}

impl TermIds {
    // returns the term id and whether it was newly added
    fn add(&mut self, value: &[u8]) -> (i64, bool) {
        if let Some(&id) = self.ids.get(value) {
            return (id, false);
        }
        let id = self.terms.len() as i64;
        self.terms.push(value.to_vec());
        self.ids.insert(value.to_vec(), id);
        (id, true)
    }

    // sorted unique values, plus the ordinal of every term id
    fn sort(&self) -> (Vec<&[u8]>, Vec<i64>) {
        let mut sorted_ids: Vec<usize> = (0..self.terms.len()).collect();
        sorted_ids.sort_by(|a, b| self.terms[*a].cmp(&self.terms[*b]));
        let mut ord_map = vec![0i64; self.terms.len()];
        for (ord, id) in sorted_ids.iter().enumerate() {
            ord_map[*id] = ord as i64;
        }
        let values = sorted_ids
            .iter()
            .map(|id| self.terms[*id].as_slice())
            .collect();
        (values, ord_map)
    }
}

/// Buffers up pending byte[] per doc, deref and sorting via int ord, then
/// flushes when segment flushes.
pub struct SortedDocValuesWriter {
    field_name: String,
    hash: TermIds,
    pending: Vec<i64>,
    bytes_used: Counter,
}

impl SortedDocValuesWriter {
    pub fn new(field_info: &FieldInfo, bytes_used: Counter) -> SortedDocValuesWriter {
        SortedDocValuesWriter {
            field_name: field_info.name.clone(),
            hash: TermIds::default(),
            pending: vec![],
            bytes_used,
        }
    }

    pub fn add_value(&mut self, doc_id: DocId, value: &[u8]) -> Result<()> {
        if (doc_id as usize) < self.pending.len() {
            return appears_more_than_once(&self.field_name);
        }
        check_sorted_length(&self.field_name, value)?;

        let (term_id, is_new) = self.hash.add(value);
        let added = doc_id as usize + 1 - self.pending.len();
        self.pending.resize(doc_id as usize, EMPTY_ORD);
        self.pending.push(term_id);
        let mut bytes = added * mem::size_of::<i64>();
        if is_new {
            bytes += 2 * value.len() + mem::size_of::<Vec<u8>>();
        }
        self.bytes_used.add(bytes as i64);
        Ok(())
    }
}

impl DocValuesWriter for SortedDocValuesWriter {
    fn finish(&mut self, _num_doc: i32) {}

    fn flush<W: DocValuesConsumer>(
        &mut self,
        state: &SegmentWriteState,
        consumer: &mut W,
    ) -> Result<()> {
        let field_info = flushed_field_info(state, &self.field_name)?;
        let max_doc = state.segment_info.max_doc() as usize;
        let (values, ord_map) = self.hash.sort();
        let mut doc_to_ord: Vec<i32> = self
            .pending
            .iter()
            .map(|&id| {
                if id == EMPTY_ORD {
                    -1
                } else {
                    ord_map[id as usize] as i32
                }
            })
            .collect();
        doc_to_ord.resize(max_doc, -1);
        consumer.add_sorted_field(field_info, &values, &doc_to_ord)
    }
}

/// Buffers up pending long[] per doc, sorts, then flushes when segment flushes.
pub struct SortedNumericDocValuesWriter {
    field_name: String,
    pending: Vec<i64>,
    pending_counts: Vec<u32>,
    current_doc: DocId,
    current_values: Vec<i64>,
    bytes_used: Counter,
}

impl SortedNumericDocValuesWriter {
    pub fn new(field_info: &FieldInfo, bytes_used: Counter) -> SortedNumericDocValuesWriter {
        SortedNumericDocValuesWriter {
            field_name: field_info.name.clone(),
            pending: vec![],
            pending_counts: vec![],
            current_doc: 0,
            current_values: vec![],
            bytes_used,
        }
    }

    pub fn add_value(&mut self, doc_id: DocId, value: i64) {
        if doc_id != self.current_doc {
            self.finish_current_doc();
        }

        while self.current_doc < doc_id {
            self.pending_counts.push(0);
            self.current_doc += 1;
        }

        self.current_values.push(value);
        self.bytes_used.add(mem::size_of::<i64>() as i64);
    }

    // finalize current_doc: this sorts the values in the current doc
    fn finish_current_doc(&mut self) {
        self.current_values.sort();
        self.pending.extend_from_slice(&self.current_values);
        self.pending_counts.push(self.current_values.len() as u32);
        self.bytes_used.add(mem::size_of::<u32>() as i64);
        self.current_values.clear();
        self.current_doc += 1;
    }
}

impl DocValuesWriter for SortedNumericDocValuesWriter {
    // may be called more than once before `flush`
    fn finish(&mut self, num_doc: i32) {
        if self.current_doc < num_doc {
            self.finish_current_doc();

            while self.current_doc < num_doc {
                self.pending_counts.push(0);
                self.current_doc += 1;
            }
        }
    }

    fn flush<W: DocValuesConsumer>(
        &mut self,
        state: &SegmentWriteState,
        consumer: &mut W,
    ) -> Result<()> {
        let field_info = flushed_field_info(state, &self.field_name)?;
        let max_doc = state.segment_info.max_doc();
        self.finish(max_doc);
        debug_assert_eq!(self.pending_counts.len(), max_doc as usize);
        consumer.add_sorted_numeric_field(field_info, &self.pending_counts, &self.pending)
    }
}

/// Buffers up pending byte[]s per doc, deref and sorting via int ord, then
/// flushes when segment flushes.
pub struct SortedSetDocValuesWriter {
    field_name: String,
    hash: TermIds,
    pending: Vec<i64>,
    pending_counts: Vec<u32>,
    current_doc: DocId,
    current_values: Vec<i64>,
    bytes_used: Counter,
}

impl SortedSetDocValuesWriter {
    pub fn new(field_info: &FieldInfo, bytes_used: Counter) -> SortedSetDocValuesWriter {
        SortedSetDocValuesWriter {
            field_name: field_info.name.clone(),
            hash: TermIds::default(),
            pending: vec![],
            pending_counts: vec![],
            current_doc: 0,
            current_values: vec![],
            bytes_used,
        }
    }

    pub fn add_value(&mut self, doc_id: DocId, value: &[u8]) -> Result<()> {
        check_sorted_length(&self.field_name, value)?;

        if doc_id != self.current_doc {
            self.finish_current_doc();
        }

        while self.current_doc < doc_id {
            self.pending_counts.push(0);
            self.current_doc += 1;
        }

        let (term_id, is_new) = self.hash.add(value);
        self.current_values.push(term_id);
        let mut bytes = mem::size_of::<i64>();
        if is_new {
            bytes += 2 * value.len() + mem::size_of::<Vec<u8>>();
        }
        self.bytes_used.add(bytes as i64);
        Ok(())
    }

    // finalize current_doc: this sorts and dedups the term ids in the current doc
    fn finish_current_doc(&mut self) {
        self.current_values.sort();
        self.current_values.dedup();
        self.pending.extend_from_slice(&self.current_values);
        // record the number of unique term ids for this doc
        self.pending_counts.push(self.current_values.len() as u32);
        self.current_values.clear();
        self.current_doc += 1;
    }
}

impl DocValuesWriter for SortedSetDocValuesWriter {
    fn finish(&mut self, num_doc: i32) {
        if self.current_doc < num_doc {
            self.finish_current_doc();

            while self.current_doc < num_doc {
                self.pending_counts.push(0);
                self.current_doc += 1;
            }
        }
    }

    fn flush<W: DocValuesConsumer>(
        &mut self,
        state: &SegmentWriteState,
        consumer: &mut W,
    ) -> Result<()> {
        let field_info = flushed_field_info(state, &self.field_name)?;
        let max_doc = state.segment_info.max_doc();
        self.finish(max_doc);
        debug_assert_eq!(self.pending_counts.len(), max_doc as usize);

        let (values, ord_map) = self.hash.sort();
        let mut ords = Vec::with_capacity(self.pending.len());
        let mut upto = 0;
        for &count in &self.pending_counts {
            let start = ords.len();
            for &term_id in &self.pending[upto..upto + count as usize] {
                ords.push(ord_map[term_id as usize]);
            }
            ords[start..].sort();
            upto += count as usize;
        }
        consumer.add_sorted_set_field(field_info, &values, &self.pending_counts, &ords)
    }
}
