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
use core::codec::postings::TermsHash;
use core::codec::segment_infos::{SegmentInfo, SegmentWriteState};
use core::codec::term_vectors::{TermVectorsFormat, TermVectorsWriter};
use core::codec::Codec;
use core::doc::FieldType;
use core::store::directory::Directory;
use core::store::{FlushInfo, IOContext};
use core::util::{Counter, DocId};

use error::ErrorKind::{IllegalArgument, IllegalState};
use error::Result;

use std::collections::{BTreeMap, HashMap};
use std::mem;
use std::sync::Arc;

type TVWriter<C> = <<C as Codec>::TermVectorsFmt as TermVectorsFormat>::Writer;

// rough per-occurrence cost of the buffered vectors
const BYTES_PER_TERM: i64 = 48;
const BYTES_PER_POSITION: i64 = 16;

fn term_bytes(term: &TermVectorTerm) -> i64 {
    let positions = term.positions.len().max(term.offsets.len()) as i64;
    BYTES_PER_TERM + positions * BYTES_PER_POSITION
}

/// Buffers the term vectors of the current document and writes them through
/// the codec's `TermVectorsWriter` when the document finishes. Documents
/// without vectors get an empty entry so that the writer sees every doc id.
pub struct TermVectorsConsumer<C: Codec> {
    codec: Arc<C>,
    directory: Arc<dyn Directory>,
    segment_info: SegmentInfo,
    writer: Option<TVWriter<C>>,
    has_vectors: bool,
    last_doc_id: DocId,
    // fields of the current document that produced vectors
    pending: Vec<TermVectorsField>,
    bytes_used: Counter,
}

impl<C: Codec> TermVectorsConsumer<C> {
    pub fn new(
        codec: Arc<C>,
        directory: Arc<dyn Directory>,
        segment_info: SegmentInfo,
        bytes_used: Counter,
    ) -> Self {
        TermVectorsConsumer {
            codec,
            directory,
            segment_info,
            writer: None,
            has_vectors: false,
            last_doc_id: 0,
            pending: vec![],
            bytes_used,
        }
    }

    pub fn has_vectors(&self) -> bool {
        self.has_vectors
    }

    fn init_term_vectors_writer(&mut self, doc_id: DocId) -> Result<()> {
        if self.writer.is_none() {
            let context = IOContext::Flush(FlushInfo::new(doc_id as u32 + 1, 0));
            let writer = self.codec.term_vectors_format().tv_writer(
                Arc::clone(&self.directory),
                &self.segment_info,
                &context,
            )?;
            debug!(
                "term vectors writer created for segment {}",
                self.segment_info.name
            );
            self.writer = Some(writer);
            self.last_doc_id = 0;
        }
        Ok(())
    }

    fn writer(&mut self) -> Result<&mut TVWriter<C>> {
        match self.writer.as_mut() {
            Some(w) => Ok(w),
            None => bail!(IllegalState("term vectors writer is not started".into())),
        }
    }

    /// Fills in no-term-vectors for all docs we haven't seen since the last
    /// doc that had term vectors.
    fn fill(&mut self, doc_id: DocId) -> Result<()> {
        while self.last_doc_id < doc_id {
            let writer = self.writer()?;
            writer.start_document(0)?;
            writer.finish_document()?;
            self.last_doc_id += 1;
        }
        Ok(())
    }

    fn release(&mut self) {
        let mut freed = 0i64;
        for field in self.pending.drain(..) {
            freed += field.terms.iter().map(|&(_, ref t)| term_bytes(t)).sum::<i64>();
        }
        if freed > 0 {
            self.bytes_used.add(-freed);
        }
    }
}

impl<C: Codec> TermsHash for TermVectorsConsumer<C> {
    type PerField = TermVectorsConsumerPerField;

    fn add_field(&mut self, field_info: &FieldInfo) -> TermVectorsConsumerPerField {
        TermVectorsConsumerPerField::new(field_info)
    }

    fn start_document(&mut self) -> Result<()> {
        self.release();
        Ok(())
    }

    fn start_field(
        &mut self,
        per_field: &mut TermVectorsConsumerPerField,
        field_type: &FieldType,
        first: bool,
    ) -> Result<bool> {
        if first {
            // terms left behind by a document that failed inside this field
            let stale = per_field.buffered_bytes();
            if stale > 0 {
                self.bytes_used.add(-stale);
            }
        }
        let do_vectors = per_field.start(field_type, first)?;
        if do_vectors {
            self.has_vectors = true;
        }
        Ok(do_vectors)
    }

    fn add(
        &mut self,
        per_field: &mut TermVectorsConsumerPerField,
        field_state: &mut FieldInvertState,
        token: &Token,
        _doc_id: DocId,
    ) -> Result<()> {
        let (new_term, with_position) = per_field.add(field_state, token);
        let mut delta = 0;
        if new_term {
            delta += BYTES_PER_TERM;
        }
        if with_position {
            delta += BYTES_PER_POSITION;
        }
        if delta > 0 {
            self.bytes_used.add(delta);
        }
        Ok(())
    }

    fn finish_field(
        &mut self,
        per_field: &mut TermVectorsConsumerPerField,
        _field_state: &FieldInvertState,
        field_info: &mut FieldInfo,
    ) -> Result<()> {
        if per_field.do_vectors && !per_field.terms.is_empty() {
            field_info.set_store_term_vectors();
            let mut terms: Vec<(Vec<u8>, TermVectorTerm)> = per_field.terms.drain().collect();
            terms.sort_by(|a, b| a.0.cmp(&b.0));
            self.pending.push(TermVectorsField {
                field_info: field_info.clone(),
                has_positions: per_field.do_vector_positions,
                has_offsets: per_field.do_vector_offsets,
                has_payloads: per_field.has_payloads,
                terms,
            });
        }
        per_field.do_vectors = false;
        Ok(())
    }

    fn finish_document(&mut self, doc_id: DocId) -> Result<()> {
        if !self.has_vectors {
            return Ok(());
        }

        self.init_term_vectors_writer(doc_id)?;
        self.fill(doc_id)?;

        let mut fields = mem::replace(&mut self.pending, Vec::new());
        fields.sort_by(|a, b| a.field_info.name.cmp(&b.field_info.name));
        let res = {
            let writer = self.writer()?;
            write_document(writer, &fields)
        };
        self.pending = fields;
        self.release();
        res?;

        debug_assert_eq!(self.last_doc_id, doc_id);
        self.last_doc_id += 1;
        Ok(())
    }

    fn flush(
        &mut self,
        _fields: BTreeMap<String, &mut TermVectorsConsumerPerField>,
        state: &SegmentWriteState,
    ) -> Result<()> {
        let res = if self.writer.is_some() {
            let num_docs = state.segment_info.max_doc();
            // At least one doc in this run had term vectors enabled
            self.fill(num_docs)
                .and_then(|_| {
                    let field_infos = &state.field_infos;
                    self.writer()?.finish(field_infos, num_docs as usize)
                })
        } else {
            Ok(())
        };
        self.writer = None;
        self.last_doc_id = 0;
        self.has_vectors = false;
        res
    }

    fn abort(&mut self) -> Result<()> {
        self.has_vectors = false;
        self.last_doc_id = 0;
        self.release();
        if let Some(mut writer) = self.writer.take() {
            writer.abort()?;
        }
        Ok(())
    }
}

fn write_document<W: TermVectorsWriter>(writer: &mut W, fields: &[TermVectorsField]) -> Result<()> {
    writer.start_document(fields.len())?;
    for field in fields {
        writer.start_field(
            &field.field_info,
            field.terms.len(),
            field.has_positions,
            field.has_offsets,
            field.has_payloads,
        )?;
        for (term, tv) in &field.terms {
            writer.start_term(term, tv.freq)?;
            if field.has_positions || field.has_offsets {
                for i in 0..tv.freq as usize {
                    let position = if field.has_positions {
                        tv.positions[i]
                    } else {
                        -1
                    };
                    let (start_offset, end_offset) = if field.has_offsets {
                        tv.offsets[i]
                    } else {
                        (-1, -1)
                    };
                    let payload: &[u8] = if field.has_payloads {
                        &tv.payloads[i]
                    } else {
                        &[]
                    };
                    writer.add_position(position, start_offset, end_offset, payload)?;
                }
            }
            writer.finish_term()?;
        }
        writer.finish_field()?;
    }
    writer.finish_document()
}

/// Occurrences of one term within one field of the current document.
#[derive(Debug, Default)]
pub struct TermVectorTerm {
    pub freq: i32,
    pub positions: Vec<i32>,
    pub offsets: Vec<(i32, i32)>,
    pub payloads: Vec<Vec<u8>>,
}

struct TermVectorsField {
    field_info: FieldInfo,
    has_positions: bool,
    has_offsets: bool,
    has_payloads: bool,
    terms: Vec<(Vec<u8>, TermVectorTerm)>,
}

pub struct TermVectorsConsumerPerField {
    field_name: String,
    do_vectors: bool,
    do_vector_positions: bool,
    do_vector_offsets: bool,
    do_vector_payloads: bool,
    // if enabled, and we actually saw any for this field
    has_payloads: bool,
    terms: HashMap<Vec<u8>, TermVectorTerm>,
}

impl TermVectorsConsumerPerField {
    pub fn new(field_info: &FieldInfo) -> Self {
        TermVectorsConsumerPerField {
            field_name: field_info.name.clone(),
            do_vectors: false,
            do_vector_positions: false,
            do_vector_offsets: false,
            do_vector_payloads: false,
            has_payloads: false,
            terms: HashMap::new(),
        }
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    fn buffered_bytes(&self) -> i64 {
        self.terms.values().map(term_bytes).sum()
    }

    fn start(&mut self, field_type: &FieldType, first: bool) -> Result<bool> {
        if first {
            // Only necessary if previous doc hit a non-aborting error while
            // writing vectors in this field
            self.terms.clear();
            self.has_payloads = false;
            self.do_vectors = field_type.store_term_vectors();
            if self.do_vectors {
                self.do_vector_positions = field_type.store_term_vector_positions();
                // Somewhat confusingly, unlike postings, you are allowed to
                // index TV offsets without TV positions
                self.do_vector_offsets = field_type.store_term_vector_offsets();

                if self.do_vector_positions {
                    self.do_vector_payloads = field_type.store_term_vector_payloads();
                } else {
                    self.do_vector_payloads = false;
                    if field_type.store_term_vector_payloads() {
                        bail!(IllegalArgument(format!(
                            "cannot index term vector payloads without term vector positions \
                             (field=\"{}\")",
                            self.field_name
                        )));
                    }
                }
            } else {
                if field_type.store_term_vector_offsets() {
                    bail!(IllegalArgument(format!(
                        "cannot index term vector offsets when term vectors are not indexed \
                         (field=\"{}\")",
                        self.field_name
                    )));
                }
                if field_type.store_term_vector_positions() {
                    bail!(IllegalArgument(format!(
                        "cannot index term vector positions when term vectors are not indexed \
                         (field=\"{}\")",
                        self.field_name
                    )));
                }
                if field_type.store_term_vector_payloads() {
                    bail!(IllegalArgument(format!(
                        "cannot index term vector payloads when term vectors are not indexed \
                         (field=\"{}\")",
                        self.field_name
                    )));
                }
            }
        } else {
            let changed = if self.do_vectors != field_type.store_term_vectors() {
                Some("store_term_vectors")
            } else if self.do_vector_positions != field_type.store_term_vector_positions() {
                Some("store_term_vector_positions")
            } else if self.do_vector_offsets != field_type.store_term_vector_offsets() {
                Some("store_term_vector_offsets")
            } else if self.do_vector_payloads != field_type.store_term_vector_payloads() {
                Some("store_term_vector_payloads")
            } else {
                None
            };
            if let Some(option) = changed {
                bail!(IllegalArgument(format!(
                    "all instances of a given field name must have the same term vectors \
                     settings ({} changed for field=\"{}\")",
                    option, self.field_name
                )));
            }
        }

        Ok(self.do_vectors)
    }

    // returns whether the term is new to this field, and whether a position
    // or offset was recorded
    fn add(&mut self, field_state: &FieldInvertState, token: &Token) -> (bool, bool) {
        let mut new_term = false;
        let do_positions = self.do_vector_positions;
        let do_offsets = self.do_vector_offsets;
        let do_payloads = self.do_vector_payloads;

        let term = self.terms.entry(token.term.clone()).or_insert_with(|| {
            new_term = true;
            TermVectorTerm::default()
        });
        term.freq += 1;
        if do_positions {
            term.positions.push(field_state.position);
            if do_payloads && !token.payload.is_empty() {
                term.payloads.push(token.payload.clone());
                self.has_payloads = true;
            } else {
                term.payloads.push(Vec::new());
            }
        }
        if do_offsets {
            let start_offset = (field_state.offset + token.start_offset) as i32;
            let end_offset = (field_state.offset + token.end_offset) as i32;
            term.offsets.push((start_offset, end_offset));
        }
        (new_term, do_positions || do_offsets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::codec::tests::{TestCodec, WriterEvent};
    use core::codec::FieldInfos;
    use core::doc::{DocValuesType, IndexOptions};
    use core::store::directory::RAMDirectory;
    use core::util::{random_id, Count};
    use std::collections::HashMap as StdHashMap;

    fn vectors_type(positions: bool, offsets: bool) -> FieldType {
        let mut ft = FieldType::default();
        ft.index_options = IndexOptions::DocsAndFreqsAndPositionsAndOffsets;
        ft.store_term_vectors = true;
        ft.store_term_vector_positions = positions;
        ft.store_term_vector_offsets = offsets;
        ft
    }

    fn field_info(name: &str) -> FieldInfo {
        FieldInfo::new(
            name.into(),
            0,
            false,
            false,
            false,
            IndexOptions::DocsAndFreqsAndPositionsAndOffsets,
            DocValuesType::Null,
            StdHashMap::new(),
        )
        .unwrap()
    }

    fn token(term: &str, start: usize, end: usize) -> Token {
        let mut t = Token::new();
        t.term.extend_from_slice(term.as_bytes());
        t.set_offset(start, end).unwrap();
        t
    }

    fn consumer(codec: &Arc<TestCodec>) -> TermVectorsConsumer<TestCodec> {
        let dir: Arc<dyn Directory> = Arc::new(RAMDirectory::new());
        let si = SegmentInfo::new("_0", -1, random_id(), "Test");
        TermVectorsConsumer::new(Arc::clone(codec), dir, si, Counter::new())
    }

    #[test]
    fn test_settings_must_not_change_within_document() {
        let mut fi = field_info("body");
        let codec = Arc::new(TestCodec::default());
        let mut tv = consumer(&codec);
        let mut pf = tv.add_field(&fi);

        assert!(tv.start_field(&mut pf, &vectors_type(true, false), true).unwrap());
        let err = tv
            .start_field(&mut pf, &vectors_type(true, true), false)
            .unwrap_err();
        assert!(format!("{}", err).contains("store_term_vector_offsets changed"));

        let mut plain = FieldType::default();
        plain.index_options = IndexOptions::Docs;
        plain.store_term_vector_positions = true;
        assert!(tv.start_field(&mut pf, &plain, true).is_err());

        plain.store_term_vector_positions = false;
        assert!(!tv.start_field(&mut pf, &plain, true).unwrap());
        let state = FieldInvertState::new("body".into());
        tv.finish_field(&mut pf, &state, &mut fi).unwrap();
        assert!(!fi.has_store_term_vector);
    }

    #[test]
    fn test_documents_without_vectors_are_filled() {
        let codec = Arc::new(TestCodec::default());
        let mut tv = consumer(&codec);
        let mut fi = field_info("body");
        let mut pf = tv.add_field(&fi);
        let mut state = FieldInvertState::new("body".into());

        // doc 0 and 1 have no vectors, doc 2 does
        for doc in 0..2 {
            tv.start_document().unwrap();
            tv.finish_document(doc).unwrap();
        }
        tv.start_document().unwrap();
        tv.start_field(&mut pf, &vectors_type(true, true), true)
            .unwrap();
        state.reset();
        state.position = 0;
        tv.add(&mut pf, &mut state, &token("b", 0, 1), 2).unwrap();
        state.position = 1;
        tv.add(&mut pf, &mut state, &token("a", 2, 3), 2).unwrap();
        state.position = 2;
        tv.add(&mut pf, &mut state, &token("b", 4, 5), 2).unwrap();
        tv.finish_field(&mut pf, &state, &mut fi).unwrap();
        tv.finish_document(2).unwrap();
        assert!(fi.has_store_term_vector);

        let si = SegmentInfo::new("_0", 3, random_id(), "Test");
        let infos = FieldInfos::new(vec![fi]).unwrap();
        let state = SegmentWriteState::new(
            Arc::new(RAMDirectory::new()),
            si,
            infos,
            IOContext::Default,
            String::new(),
        );
        tv.flush(BTreeMap::new(), &state).unwrap();

        let events = codec.term_vectors_events();
        assert_eq!(
            events,
            vec![
                WriterEvent::StartDocument(0),
                WriterEvent::FinishDocument,
                WriterEvent::StartDocument(0),
                WriterEvent::FinishDocument,
                WriterEvent::StartDocument(1),
                WriterEvent::StartField("body".into(), 2),
                WriterEvent::StartTerm(b"a".to_vec(), 1),
                WriterEvent::AddPosition(1, 2, 3),
                WriterEvent::StartTerm(b"b".to_vec(), 2),
                WriterEvent::AddPosition(0, 0, 1),
                WriterEvent::AddPosition(2, 4, 5),
                WriterEvent::FinishField,
                WriterEvent::FinishDocument,
                WriterEvent::Finish(3),
            ]
        );
    }

    #[test]
    fn test_failed_document_terms_released() {
        let codec = Arc::new(TestCodec::default());
        let bytes_used = Counter::new();
        let dir: Arc<dyn Directory> = Arc::new(RAMDirectory::new());
        let si = SegmentInfo::new("_0", -1, random_id(), "Test");
        let mut tv =
            TermVectorsConsumer::new(Arc::clone(&codec), dir, si, bytes_used.shallow_copy());
        let fi = field_info("body");
        let mut pf = tv.add_field(&fi);
        let mut state = FieldInvertState::new("body".into());

        // the document fails before the field is finished
        tv.start_document().unwrap();
        tv.start_field(&mut pf, &vectors_type(true, true), true)
            .unwrap();
        state.reset();
        state.position = 0;
        tv.add(&mut pf, &mut state, &token("a", 0, 1), 0).unwrap();
        state.position = 1;
        tv.add(&mut pf, &mut state, &token("b", 2, 3), 0).unwrap();
        assert_eq!(bytes_used.get(), 2 * (BYTES_PER_TERM + BYTES_PER_POSITION));

        tv.start_document().unwrap();
        tv.start_field(&mut pf, &vectors_type(true, true), true)
            .unwrap();
        assert_eq!(pf.num_terms(), 0);
        assert_eq!(bytes_used.get(), 0);
    }

    #[test]
    fn test_abort_discards_writer() {
        let codec = Arc::new(TestCodec::default());
        let mut tv = consumer(&codec);
        let mut fi = field_info("body");
        let mut pf = tv.add_field(&fi);
        let mut state = FieldInvertState::new("body".into());

        tv.start_document().unwrap();
        tv.start_field(&mut pf, &vectors_type(false, false), true)
            .unwrap();
        state.reset();
        tv.add(&mut pf, &mut state, &token("x", 0, 1), 0).unwrap();
        tv.finish_field(&mut pf, &state, &mut fi).unwrap();
        tv.finish_document(0).unwrap();

        tv.abort().unwrap();
        tv.abort().unwrap();
        assert!(!tv.has_vectors());
        assert_eq!(codec.term_vectors_events().last(), Some(&WriterEvent::Abort));
    }
}
