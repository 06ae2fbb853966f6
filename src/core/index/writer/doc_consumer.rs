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

use core::codec::doc_values::{
    DocValuesConsumer, DocValuesFormat, DocValuesWriter, DocValuesWriterEnum,
};
use core::codec::field_infos::{
    FieldInfo, FieldInfosBuilder, FieldInfosFormat, FieldInvertState, FieldNumbersRef,
};
use core::codec::norms::{NormValuesWriter, NormsConsumer, NormsFormat};
use core::codec::postings::{FreqProxTermsWriter, TermsHash};
use core::codec::segment_infos::{SegmentInfo, SegmentWriteState};
use core::codec::stored_fields::StoredFieldsConsumer;
use core::codec::term_vectors::TermVectorsConsumer;
use core::codec::Codec;
use core::doc::{DocValuesType, FieldType, Fieldable, IndexOptions};
use core::index::writer::{DocState, INDEX_MAX_POSITION};
use core::search::similarity::Similarity;
use core::store::directory::Directory;
use core::store::IOContext;
use core::util::{Count, Counter, DocId, VariantValue};

use error::ErrorKind::{IllegalArgument, IllegalState, UnsupportedOperation};
use error::{merge_error, Error, ErrorKind, Result};

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// The indexing chain of one segment.
///
/// Every field of a document is routed to the postings (and, behind them,
/// term vectors) hash, the stored fields writer, the norms and the doc
/// values writers. `flush` writes everything that was buffered into the
/// files of the segment.
///
/// A chain belongs to exactly one session and sees one document at a time.
pub struct DocConsumer<C: Codec, T: TermsHash = FreqProxTermsWriter<C>> {
    codec: Arc<C>,
    pub field_infos: FieldInfosBuilder<FieldNumbersRef>,
    // Writes postings and term vectors
    terms_hash: T,
    // lazy init:
    stored_fields_consumer: StoredFieldsConsumer<C>,
    // per field state for the life of the segment, `field_index` maps a
    // name to its slot so handles held in `fields` stay valid on growth
    field_hash: Vec<PerField<T::PerField>>,
    field_index: HashMap<String, usize>,
    // Holds fields seen in each document
    fields: Vec<usize>,
    next_field_gen: i64,
    // every doc id below this one had its stored fields cycle
    last_stored_doc_id: DocId,
    bytes_used: Counter,
    max_stored_field_length: usize,
}

impl<C: Codec> DocConsumer<C> {
    /// `bytes_used` may be shared with other chains, the chain accounts into
    /// a child of it and only ever releases its own bytes.
    pub fn new(
        codec: Arc<C>,
        directory: Arc<dyn Directory>,
        segment_info: &SegmentInfo,
        field_infos: FieldInfosBuilder<FieldNumbersRef>,
        bytes_used: Counter,
        max_stored_field_length: usize,
    ) -> Self {
        let bytes_used = bytes_used.child();
        let term_vectors = TermVectorsConsumer::new(
            Arc::clone(&codec),
            Arc::clone(&directory),
            segment_info.clone(),
            bytes_used.shallow_copy(),
        );
        let terms_hash =
            FreqProxTermsWriter::new(Arc::clone(&codec), term_vectors, bytes_used.shallow_copy());
        Self::with_terms_hash(
            codec,
            directory,
            segment_info,
            field_infos,
            terms_hash,
            bytes_used,
            max_stored_field_length,
        )
    }
}

impl<C: Codec, T: TermsHash> DocConsumer<C, T> {
    /// `bytes_used` must be owned by this chain alone (see `Counter::child`),
    /// `abort` gives all of it back.
    pub fn with_terms_hash(
        codec: Arc<C>,
        directory: Arc<dyn Directory>,
        segment_info: &SegmentInfo,
        field_infos: FieldInfosBuilder<FieldNumbersRef>,
        terms_hash: T,
        bytes_used: Counter,
        max_stored_field_length: usize,
    ) -> Self {
        let stored_fields_consumer =
            StoredFieldsConsumer::new(Arc::clone(&codec), directory, segment_info.clone());
        DocConsumer {
            codec,
            field_infos,
            terms_hash,
            stored_fields_consumer,
            field_hash: vec![],
            field_index: HashMap::new(),
            fields: vec![],
            next_field_gen: 0,
            last_stored_doc_id: 0,
            bytes_used,
            max_stored_field_length,
        }
    }

    /// Number of distinct field names seen in this segment.
    pub fn num_fields(&self) -> usize {
        self.field_hash.len()
    }

    /// The first doc id that has not had its stored fields cycle yet.
    pub fn stored_fields_cursor(&self) -> DocId {
        self.last_stored_doc_id
    }

    pub fn bytes_used(&self) -> i64 {
        self.bytes_used.get()
    }

    pub fn process_document<F: Fieldable>(
        &mut self,
        doc_state: &mut DocState,
        doc: &mut [F],
    ) -> Result<()> {
        if doc_state.is_aborting() {
            bail!(IllegalState(format!(
                "cannot process document {}: the indexing chain hit an aborting error and must \
                 be aborted",
                doc_state.doc_id
            )));
        }
        if doc_state.doc_id < self.last_stored_doc_id {
            bail!(IllegalState(format!(
                "document {} was already processed, next doc id is {}",
                doc_state.doc_id, self.last_stored_doc_id
            )));
        }

        // How many indexed field names we've seen (collapses
        // multiple field instances by the same name):
        self.fields.clear();
        let field_gen = self.next_field_gen;
        self.next_field_gen += 1;

        if let Err(e) = self.terms_hash.start_document() {
            doc_state.set_aborting();
            return Err(e);
        }
        self.start_stored_fields(doc_state)?;

        // NOTE: all instances of a given field name are inverted through the
        // same PerField before it is finished, the analyzer is free to reuse
        // its token stream across fields so only one stream runs at a time
        let mut res = Ok(());
        for field in doc.iter_mut() {
            res = self.process_field(field, doc_state, field_gen);
            if res.is_err() {
                break;
            }
        }

        if !doc_state.is_aborting() {
            // Finish each indexed field name seen in the document:
            let mut cleanup = self.finish_fields(doc_state);
            if !doc_state.is_aborting() {
                cleanup = merge_error(cleanup, self.finish_stored_fields(doc_state));
            }
            res = merge_error(res, cleanup);
        }
        res?;

        if let Err(e) = self.terms_hash.finish_document(doc_state.doc_id) {
            // the term vectors of this document may be half written, there
            // is no way to roll back a single document
            doc_state.set_aborting();
            return Err(e);
        }
        Ok(())
    }

    /// Calls `StoredFieldsConsumer::start_document` for every document that
    /// was skipped, then for the current one, aborting the segment if it
    /// hits any error.
    fn start_stored_fields(&mut self, doc_state: &mut DocState) -> Result<()> {
        let res = self
            .catch_up_stored_fields(doc_state.doc_id)
            .and_then(|_| self.stored_fields_consumer.start_document());
        if res.is_err() {
            doc_state.set_aborting();
        }
        res
    }

    fn catch_up_stored_fields(&mut self, doc_id: DocId) -> Result<()> {
        while self.last_stored_doc_id < doc_id {
            self.stored_fields_consumer.start_document()?;
            self.stored_fields_consumer.finish_document()?;
            self.last_stored_doc_id += 1;
        }
        Ok(())
    }

    /// Calls `StoredFieldsConsumer::finish_document`, aborting the segment
    /// if it hits any error.
    fn finish_stored_fields(&mut self, doc_state: &mut DocState) -> Result<()> {
        match self.stored_fields_consumer.finish_document() {
            Ok(()) => {
                self.last_stored_doc_id += 1;
                Ok(())
            }
            Err(e) => {
                doc_state.set_aborting();
                Err(e)
            }
        }
    }

    /// Finishes every field seen in the document, even after one of them
    /// failed. All failures are merged into the result.
    fn finish_fields(&mut self, doc_state: &mut DocState) -> Result<()> {
        let DocConsumer {
            ref fields,
            ref mut field_hash,
            ref mut field_infos,
            ref mut terms_hash,
            ..
        } = *self;
        let mut res = Ok(());
        for &idx in fields {
            let per_field = &mut field_hash[idx];
            let finished = field_infos.get_mut(&per_field.name).and_then(|field_info| {
                let mut ctx = DocContext {
                    doc_state: &mut *doc_state,
                    terms_hash: &mut *terms_hash,
                };
                per_field.finish(field_info, &mut ctx)
            });
            if finished.is_err() {
                doc_state.set_aborting();
            }
            res = merge_error(res, finished);
        }
        res
    }

    fn process_field<F: Fieldable>(
        &mut self,
        field: &mut F,
        doc_state: &mut DocState,
        field_gen: i64,
    ) -> Result<()> {
        let field_type = field.field_type().clone();
        let name = field.name().to_string();
        let mut handle = None;

        // Invert indexed fields:
        if field_type.indexed() {
            // if the field omits norms, the boost cannot be indexed.
            if field_type.omit_norms && (field.boost() - 1.0).abs() > ::std::f32::EPSILON {
                bail!(UnsupportedOperation(Cow::Owned(format!(
                    "You cannot set an index-time boost: norms are omitted for field '{}'",
                    name
                ))));
            }

            let idx = self.get_or_add_field(&name, &field_type, true, doc_state)?;
            let first = self.field_hash[idx].field_gen != field_gen;
            {
                let DocConsumer {
                    ref mut field_hash,
                    ref mut field_infos,
                    ref mut terms_hash,
                    ..
                } = *self;
                let field_info = field_infos.get_mut(&name)?;
                let mut ctx = DocContext {
                    doc_state: &mut *doc_state,
                    terms_hash,
                };
                field_hash[idx].invert(field, field_info, first, &mut ctx)?;
            }

            if first {
                self.fields.push(idx);
                self.field_hash[idx].field_gen = field_gen;
            }
            handle = Some(idx);
        } else {
            verify_unindexed_field_type(&name, &field_type)?;
        }

        // Add stored fields:
        if field_type.stored() {
            if handle.is_none() {
                handle = Some(self.get_or_add_field(&name, &field_type, false, doc_state)?);
            }
            let value = match field.field_data() {
                Some(v) => v,
                None => bail!(IllegalArgument(format!(
                    "field '{}' is stored but does not have a value",
                    name
                ))),
            };
            check_stored_value(&name, value, self.max_stored_field_length)?;

            let field_info = self.field_infos.get_mut(&name)?;
            if let Err(e) = self.stored_fields_consumer.write_field(field_info, value) {
                doc_state.set_aborting();
                return Err(e);
            }
        }

        let dv_type = field_type.doc_values_type;
        if dv_type != DocValuesType::Null {
            let idx = match handle {
                Some(idx) => idx,
                None => self.get_or_add_field(&name, &field_type, false, doc_state)?,
            };
            self.index_doc_value(idx, dv_type, field, doc_state.doc_id)?;
        } else if handle.is_none() {
            // neither indexed, stored nor doc values: only recorded in the
            // field infos
            self.get_or_add_field(&name, &field_type, false, doc_state)?;
        }
        Ok(())
    }

    /// Returns the handle of a previously created `PerField`, creating a
    /// new `PerField` if this field name wasn't seen yet in this segment.
    fn get_or_add_field(
        &mut self,
        name: &str,
        field_type: &FieldType,
        invert: bool,
        doc_state: &DocState,
    ) -> Result<usize> {
        let existing = self.field_index.get(name).cloned();
        let idx = match existing {
            Some(idx) => idx,
            None => {
                // First time we are seeing this field in this segment
                let field_info = self.field_infos.get_or_add(name)?;
                let idx = self.field_hash.len();
                self.field_hash
                    .push(PerField::new(field_info, Arc::clone(&doc_state.similarity)));
                self.field_index.insert(name.to_string(), idx);
                idx
            }
        };

        if invert && !self.field_hash[idx].is_inverted() {
            // the postings buffers look at the initial index options to
            // decide what they track, `PerField::invert` sets them again to
            // allow for later downgrading
            let DocConsumer {
                ref mut field_hash,
                ref mut field_infos,
                ref mut terms_hash,
                ref bytes_used,
                ..
            } = *self;
            let field_info = field_infos.get_mut(name)?;
            field_info.set_index_options(field_type.index_options);
            field_hash[idx].set_invert_state(field_info, terms_hash, bytes_used);
        }
        Ok(idx)
    }

    /// Called from `process_document` to index one field's doc value.
    fn index_doc_value<F: Fieldable>(
        &mut self,
        idx: usize,
        dv_type: DocValuesType,
        field: &F,
        doc_id: DocId,
    ) -> Result<()> {
        // the first declaration records the kind for this name, any later
        // attempt to change it fails
        self.field_infos.set_doc_values_type(field.name(), dv_type)?;

        let DocConsumer {
            ref mut field_hash,
            ref field_infos,
            ref bytes_used,
            ..
        } = *self;
        let per_field = &mut field_hash[idx];
        if per_field.doc_values_writer.is_none() {
            let field_info = match field_infos.get(field.name()) {
                Some(fi) => fi,
                None => bail!(IllegalState(format!(
                    "field '{}' is missing from the field infos",
                    field.name()
                ))),
            };
            per_field.doc_values_writer =
                DocValuesWriterEnum::new(dv_type, field_info, bytes_used.shallow_copy());
        }

        match per_field.doc_values_writer {
            Some(DocValuesWriterEnum::Numeric(ref mut w)) => {
                w.add_value(doc_id, numeric_doc_value(field, dv_type)?)
            }
            Some(DocValuesWriterEnum::Binary(ref mut w)) => {
                w.add_value(doc_id, binary_doc_value(field, dv_type)?)
            }
            Some(DocValuesWriterEnum::Sorted(ref mut w)) => {
                w.add_value(doc_id, binary_doc_value(field, dv_type)?)
            }
            Some(DocValuesWriterEnum::SortedNumeric(ref mut w)) => {
                w.add_value(doc_id, numeric_doc_value(field, dv_type)?);
                Ok(())
            }
            Some(DocValuesWriterEnum::SortedSet(ref mut w)) => {
                w.add_value(doc_id, binary_doc_value(field, dv_type)?)
            }
            None => bail!(IllegalState(format!(
                "field '{}' has no doc values writer for {:?}",
                field.name(),
                dv_type
            ))),
        }
    }

    pub fn flush(&mut self, state: &mut SegmentWriteState) -> Result<()> {
        // NOTE: caller (DocumentsWriterPerThread) handles
        // aborting on any error from this method
        state.field_infos = self.field_infos.finish()?;
        let max_doc = state.segment_info.max_doc();
        debug!(
            "indexing chain: flush segment {} with {} docs and {} fields",
            state.segment_info.name,
            max_doc,
            state.field_infos.len()
        );

        self.write_norms(state)?;
        self.write_doc_values(state)?;

        // it's possible all docs hit non-aborting errors...
        self.stored_fields_consumer.finish(max_doc as usize)?;
        self.last_stored_doc_id = max_doc;
        self.stored_fields_consumer.flush(state)?;

        {
            let mut fields_to_flush = BTreeMap::new();
            for per_field in &mut self.field_hash {
                let name = per_field.name.clone();
                if let Some(ref mut terms_hash_per_field) = per_field.terms_hash_per_field {
                    fields_to_flush.insert(name, terms_hash_per_field);
                }
            }
            self.terms_hash.flush(fields_to_flush, state)?;
        }

        // Important to save after asking consumer to flush so
        // consumer can alter the FieldInfo* if necessary.  EG,
        // FreqProxTermsWriter does this with
        // FieldInfo.storePayload.
        self.codec.field_infos_format().write(
            state.directory.as_ref(),
            &state.segment_info,
            &state.segment_suffix,
            &state.field_infos,
            &IOContext::Default,
        )
    }

    /// Writes all buffered norms.
    fn write_norms(&mut self, state: &SegmentWriteState) -> Result<()> {
        if !state.field_infos.has_norms {
            return Ok(());
        }
        let max_doc = state.segment_info.max_doc();
        let mut consumer = self.codec.norms_format().norms_consumer(state)?;
        let mut res = Ok(());
        for per_field in &mut self.field_hash {
            let has_norms = state
                .field_infos
                .field_info_by_name(&per_field.name)
                .map_or(false, FieldInfo::has_norms);
            // the field may have had norms once and then omitted them
            if !has_norms {
                continue;
            }
            if let Some(ref mut norms) = per_field.norms {
                norms.finish(max_doc);
                res = norms.flush(state, &mut consumer);
                if res.is_err() {
                    break;
                }
            }
        }
        merge_error(res, consumer.finish())
    }

    /// Writes all buffered doc values (called from `flush`).
    fn write_doc_values(&mut self, state: &SegmentWriteState) -> Result<()> {
        let max_doc = state.segment_info.max_doc();
        let mut consumer = None;
        let mut res = Ok(());
        for per_field in &mut self.field_hash {
            if let Some(ref mut writer) = per_field.doc_values_writer {
                if consumer.is_none() {
                    // lazy init
                    consumer = Some(self.codec.doc_values_format().fields_consumer(state)?);
                }
                if let Some(ref mut consumer) = consumer {
                    writer.finish(max_doc);
                    res = writer.flush(state, consumer);
                }
                if res.is_err() {
                    break;
                }
            }
        }
        match consumer {
            Some(mut consumer) => merge_error(res, consumer.finish()),
            None => res,
        }
    }

    /// Drops everything buffered for the segment. Safe to call more than
    /// once and before any document was processed.
    pub fn abort(&mut self) -> Result<()> {
        debug!(
            "indexing chain: abort, dropping {} fields and {} stored docs",
            self.field_hash.len(),
            self.last_stored_doc_id
        );
        let res = self.stored_fields_consumer.abort();
        let res = merge_error(res, self.terms_hash.abort());

        self.field_hash.clear();
        self.field_index.clear();
        self.fields.clear();
        self.field_infos.by_name.clear();
        self.last_stored_doc_id = 0;
        let used = self.bytes_used.get();
        self.bytes_used.add(-used);
        res
    }
}

/// What a `PerField` sees of the document being processed.
pub struct DocContext<'a, T: 'a> {
    pub doc_state: &'a mut DocState,
    pub terms_hash: &'a mut T,
}

/// State of one field name for the life of the segment.
pub struct PerField<P> {
    name: String,
    similarity: Arc<dyn Similarity>,
    invert_state: FieldInvertState,
    // Some once the field was indexed in this segment
    terms_hash_per_field: Option<P>,
    norms: Option<NormValuesWriter>,
    // Some if this field ever had doc values in this segment
    doc_values_writer: Option<DocValuesWriterEnum>,
    /// We use this to know when a PerField is seen for the
    /// first time in the current document. Only one document is in flight
    /// per chain so a plain counter is enough.
    field_gen: i64,
}

impl<P> PerField<P> {
    fn new(field_info: &FieldInfo, similarity: Arc<dyn Similarity>) -> Self {
        PerField {
            name: field_info.name.clone(),
            similarity,
            invert_state: FieldInvertState::new(field_info.name.clone()),
            terms_hash_per_field: None,
            norms: None,
            doc_values_writer: None,
            field_gen: -1,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_inverted(&self) -> bool {
        self.terms_hash_per_field.is_some()
    }

    fn set_invert_state<T: TermsHash<PerField = P>>(
        &mut self,
        field_info: &FieldInfo,
        terms_hash: &mut T,
        bytes_used: &Counter,
    ) {
        self.terms_hash_per_field = Some(terms_hash.add_field(field_info));
        if !field_info.omit_norms {
            self.norms = Some(NormValuesWriter::new(field_info, bytes_used.shallow_copy()));
        }
    }

    fn finish<T: TermsHash<PerField = P>>(
        &mut self,
        field_info: &mut FieldInfo,
        ctx: &mut DocContext<T>,
    ) -> Result<()> {
        if field_info.has_norms() && self.invert_state.length != 0 {
            let norm = self.similarity.compute_norm(&self.invert_state);
            match self.norms {
                Some(ref mut norms) => norms.add_value(ctx.doc_state.doc_id, norm)?,
                None => bail!(IllegalState(format!(
                    "field '{}' has norms but no norms writer",
                    self.name
                ))),
            }
        }

        match self.terms_hash_per_field {
            Some(ref mut per_field) => {
                ctx.terms_hash
                    .finish_field(per_field, &self.invert_state, field_info)
            }
            None => bail!(IllegalState(format!(
                "field '{}' was never inverted",
                self.name
            ))),
        }
    }

    /// Inverts one field for one document; `first` is true if this is the
    /// first time we are seeing this field name in this document.
    fn invert<F: Fieldable, T: TermsHash<PerField = P>>(
        &mut self,
        field: &mut F,
        field_info: &mut FieldInfo,
        first: bool,
        ctx: &mut DocContext<T>,
    ) -> Result<()> {
        if first {
            // First time we're seeing this field (indexed) in
            // this document:
            self.invert_state.reset();
        }

        let index_options = field.field_type().index_options;
        field_info.set_index_options(index_options);
        if field.field_type().omit_norms {
            field_info.set_omit_norms();
        }

        let analyzed = field.field_type().tokenized;
        // only bother checking offsets if something will consume them.
        let check_offsets = index_options == IndexOptions::DocsAndFreqsAndPositionsAndOffsets;

        let per_field = match self.terms_hash_per_field {
            Some(ref mut pf) => pf,
            None => bail!(IllegalState(format!(
                "field '{}' is not set up for inversion",
                self.name
            ))),
        };

        // If we hit an error in here (which is fairly common, e.g. if the
        // analyzer chokes on a given document), it's non-aborting: this one
        // document will be marked as deleted, but still consume a doc id
        let mut stream = field.token_stream(ctx.doc_state.analyzer.as_ref())?;
        stream.reset()?;
        ctx.terms_hash
            .start_field(per_field, field.field_type(), first)?;

        let name = &self.name;
        let state = &mut self.invert_state;
        while stream.next_token()? {
            let pos_incr = stream.token().position as i32;
            state.position = state.position.wrapping_add(pos_incr);
            if state.position < state.last_position {
                if pos_incr == 0 {
                    bail!(IllegalArgument(format!(
                        "first position increment must be > 0 (got 0) for field '{}'",
                        name
                    )));
                } else if pos_incr < 0 {
                    bail!(IllegalArgument(format!(
                        "position increment must be >= 0 (got {}) for field '{}'",
                        pos_incr, name
                    )));
                } else {
                    bail!(IllegalArgument(format!(
                        "position overflowed i32::MAX (got posIncr={} lastPosition={} \
                         position={}) for field '{}'",
                        pos_incr, state.last_position, state.position, name
                    )));
                }
            } else if state.position > INDEX_MAX_POSITION {
                bail!(IllegalArgument(format!(
                    "position {} is too large for field '{}': max allowed position is {}",
                    state.position, name, INDEX_MAX_POSITION
                )));
            }
            state.last_position = state.position;
            if pos_incr == 0 {
                state.num_overlap += 1;
            }

            if check_offsets {
                let start_offset = state.offset + stream.token().start_offset;
                let end_offset = state.offset + stream.token().end_offset;
                if (start_offset as i64) < i64::from(state.last_start_offset)
                    || end_offset < start_offset
                {
                    bail!(IllegalArgument(format!(
                        "startOffset must be non-negative, and endOffset must be >= startOffset, \
                         and offsets must not go backwards startOffset={},endOffset={},\
                         lastStartOffset={} for field '{}'",
                        start_offset, end_offset, state.last_start_offset, name
                    )));
                }
                state.last_start_offset = start_offset as i32;
            }

            state.length = match state.length.checked_add(1) {
                Some(length) => length,
                None => bail!(IllegalArgument(format!(
                    "too many tokens in field '{}'",
                    name
                ))),
            };

            // If we hit an error in here, we abort all buffered documents
            // since the last flush, on the likelihood that the internal
            // state of the terms hash is now corrupt. A rejected term is
            // checked up front and leaves nothing behind.
            if let Err(e) =
                ctx.terms_hash
                    .add(per_field, state, stream.token(), ctx.doc_state.doc_id)
            {
                if !is_illegal_argument(&e) {
                    ctx.doc_state.set_aborting();
                }
                return Err(e);
            }
        }

        // trigger streams to perform end-of-stream operations
        stream.end()?;
        state.position = state
            .position
            .wrapping_add(stream.token().position as i32);
        state.offset += stream.token().end_offset;

        if analyzed {
            state.position = state
                .position
                .wrapping_add(ctx.doc_state.analyzer.position_increment_gap(name));
            state.offset += ctx.doc_state.analyzer.offset_gap(name);
        }
        state.boost *= field.boost();
        Ok(())
    }
}

fn is_illegal_argument(e: &Error) -> bool {
    match *e.primary().kind() {
        ErrorKind::IllegalArgument(_) => true,
        _ => false,
    }
}

fn verify_unindexed_field_type(name: &str, ft: &FieldType) -> Result<()> {
    if ft.store_term_vectors() {
        bail!(IllegalArgument(format!(
            "cannot store term vectors for a field that is not indexed (field=\"{}\")",
            name
        )));
    }
    if ft.store_term_vector_positions() {
        bail!(IllegalArgument(format!(
            "cannot store term vector positions for a field that is not indexed (field=\"{}\")",
            name
        )));
    }
    if ft.store_term_vector_offsets() {
        bail!(IllegalArgument(format!(
            "cannot store term vector offsets for a field that is not indexed (field=\"{}\")",
            name
        )));
    }
    if ft.store_term_vector_payloads() {
        bail!(IllegalArgument(format!(
            "cannot store term vector payloads for a field that is not indexed (field=\"{}\")",
            name
        )));
    }
    Ok(())
}

fn check_stored_value(name: &str, value: &VariantValue, max_length: usize) -> Result<()> {
    let length = match *value {
        VariantValue::VString(ref s) => s.len(),
        VariantValue::Binary(ref b) => b.len(),
        _ => 0,
    };
    if length > max_length {
        bail!(IllegalArgument(format!(
            "stored field \"{}\" is too large ({} bytes) to store, max is {}",
            name, length, max_length
        )));
    }
    Ok(())
}

fn numeric_doc_value<F: Fieldable>(field: &F, dv_type: DocValuesType) -> Result<i64> {
    match field.numeric_value() {
        Some(n) => Ok(n.long_value()),
        None => bail!(IllegalArgument(format!(
            "field '{}' declares {:?} doc values but has no numeric value",
            field.name(),
            dv_type
        ))),
    }
}

fn binary_doc_value<F: Fieldable>(field: &F, dv_type: DocValuesType) -> Result<&[u8]> {
    match field
        .binary_value()
        .or_else(|| field.string_value().map(str::as_bytes))
    {
        Some(bytes) => Ok(bytes),
        None => bail!(IllegalArgument(format!(
            "field '{}' declares {:?} doc values but has no binary or string value",
            field.name(),
            dv_type
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::analysis::{CannedTokenStream, Token, WhitespaceAnalyzer};
    use core::codec::field_infos::FieldInfos;
    use core::codec::norms::PlainNormsReader;
    use core::codec::tests::{FailPoint, TestCodec, WriterEvent};
    use core::codec::PlainCodec;
    use core::doc::{Field, FieldType, STORED_FIELD_TYPE, TEXT_FIELD_TYPE_NOT_STORED};
    use core::index::writer::DEFAULT_MAX_STORED_FIELD_LENGTH;
    use core::search::similarity::BM25Similarity;
    use core::store::directory::RAMDirectory;
    use core::util::random_id;

    use std::io;

    #[derive(Debug, Clone, PartialEq)]
    enum HashEvent {
        StartDocument,
        StartField(String, bool),
        Add(String, String, i32),
        FinishField(String, i32),
        FinishDocument(DocId),
        Flush(Vec<String>),
        Abort,
    }

    #[derive(Default)]
    struct RecordingTermsHash {
        events: Vec<HashEvent>,
        fail_finish_document: bool,
        fail_finish_field: Option<String>,
    }

    struct RecordingPerField {
        name: String,
    }

    impl TermsHash for RecordingTermsHash {
        type PerField = RecordingPerField;

        fn add_field(&mut self, field_info: &FieldInfo) -> RecordingPerField {
            RecordingPerField {
                name: field_info.name.clone(),
            }
        }

        fn start_document(&mut self) -> Result<()> {
            self.events.push(HashEvent::StartDocument);
            Ok(())
        }

        fn start_field(
            &mut self,
            per_field: &mut RecordingPerField,
            _field_type: &FieldType,
            first: bool,
        ) -> Result<bool> {
            self.events
                .push(HashEvent::StartField(per_field.name.clone(), first));
            Ok(true)
        }

        fn add(
            &mut self,
            per_field: &mut RecordingPerField,
            field_state: &mut FieldInvertState,
            token: &Token,
            _doc_id: DocId,
        ) -> Result<()> {
            self.events.push(HashEvent::Add(
                per_field.name.clone(),
                String::from_utf8_lossy(&token.term).into_owned(),
                field_state.position,
            ));
            Ok(())
        }

        fn finish_field(
            &mut self,
            per_field: &mut RecordingPerField,
            field_state: &FieldInvertState,
            _field_info: &mut FieldInfo,
        ) -> Result<()> {
            if self.fail_finish_field.as_ref() == Some(&per_field.name) {
                bail!(IllegalState(format!("cannot finish {}", per_field.name)));
            }
            self.events.push(HashEvent::FinishField(
                per_field.name.clone(),
                field_state.length,
            ));
            Ok(())
        }

        fn finish_document(&mut self, doc_id: DocId) -> Result<()> {
            if self.fail_finish_document {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full").into());
            }
            self.events.push(HashEvent::FinishDocument(doc_id));
            Ok(())
        }

        fn flush(
            &mut self,
            fields: BTreeMap<String, &mut RecordingPerField>,
            _state: &SegmentWriteState,
        ) -> Result<()> {
            self.events
                .push(HashEvent::Flush(fields.keys().cloned().collect()));
            Ok(())
        }

        fn abort(&mut self) -> Result<()> {
            self.events.push(HashEvent::Abort);
            Ok(())
        }
    }

    type TestConsumer = DocConsumer<TestCodec, RecordingTermsHash>;

    fn consumer(codec: &Arc<TestCodec>) -> (TestConsumer, Arc<dyn Directory>) {
        let dir: Arc<dyn Directory> = Arc::new(RAMDirectory::new());
        let si = SegmentInfo::new("_0", -1, random_id(), "Test");
        let consumer = DocConsumer::with_terms_hash(
            Arc::clone(codec),
            Arc::clone(&dir),
            &si,
            FieldInfosBuilder::default(),
            RecordingTermsHash::default(),
            Counter::new(),
            DEFAULT_MAX_STORED_FIELD_LENGTH,
        );
        (consumer, dir)
    }

    fn doc_state(doc_id: DocId) -> DocState {
        let mut state = DocState::new(
            Arc::new(WhitespaceAnalyzer::new()),
            Arc::new(BM25Similarity::default()),
        );
        state.doc_id = doc_id;
        state
    }

    fn add(name: &str, term: &str, position: i32) -> HashEvent {
        HashEvent::Add(name.into(), term.into(), position)
    }

    #[test]
    fn test_repeated_field_inverted_together() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        let mut state = doc_state(0);
        let mut doc = vec![
            Field::new_text("title", "hello world", false),
            Field::new_text("title", "again", false),
        ];
        consumer.process_document(&mut state, &mut doc).unwrap();

        assert_eq!(
            consumer.terms_hash.events,
            vec![
                HashEvent::StartDocument,
                HashEvent::StartField("title".into(), true),
                add("title", "hello", 0),
                add("title", "world", 1),
                HashEvent::StartField("title".into(), false),
                add("title", "again", 2),
                HashEvent::FinishField("title".into(), 3),
                HashEvent::FinishDocument(0),
            ]
        );
        assert_eq!(consumer.num_fields(), 1);
        assert!(consumer.bytes_used() >= 0);
    }

    #[test]
    fn test_fields_finished_in_first_seen_order() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        for doc_id in 0..2 {
            let mut state = doc_state(doc_id);
            let mut doc = vec![
                Field::new_text("title", "a", false),
                Field::new_text("body", "b c", false),
                Field::new_text("title", "d", false),
            ];
            consumer.process_document(&mut state, &mut doc).unwrap();
        }

        let finished: Vec<&HashEvent> = consumer
            .terms_hash
            .events
            .iter()
            .filter(|e| match **e {
                HashEvent::FinishField(..) | HashEvent::StartField(..) => true,
                _ => false,
            })
            .collect();
        let one_doc = vec![
            HashEvent::StartField("title".into(), true),
            HashEvent::StartField("body".into(), true),
            HashEvent::StartField("title".into(), false),
            HashEvent::FinishField("title".into(), 2),
            HashEvent::FinishField("body".into(), 2),
        ];
        let expected: Vec<&HashEvent> = one_doc.iter().chain(one_doc.iter()).collect();
        assert_eq!(finished, expected);
        assert_eq!(consumer.num_fields(), 2);
    }

    #[test]
    fn test_stored_fields_cursor() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        for doc_id in 0..3 {
            let mut state = doc_state(doc_id);
            let mut doc = vec![Field::new_text("body", "text", false)];
            if doc_id == 1 {
                doc.push(Field::new_stored("note", VariantValue::from("kept")));
            }
            consumer.process_document(&mut state, &mut doc).unwrap();
            assert_eq!(consumer.stored_fields_cursor(), doc_id + 1);
        }

        assert_eq!(
            codec.stored_fields_events(),
            vec![
                WriterEvent::StartDocument(0),
                WriterEvent::FinishDocument,
                WriterEvent::StartDocument(0),
                WriterEvent::WriteField("note".into(), VariantValue::from("kept")),
                WriterEvent::FinishDocument,
                WriterEvent::StartDocument(0),
                WriterEvent::FinishDocument,
            ]
        );
    }

    #[test]
    fn test_stored_fields_catch_up_for_skipped_ids() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);

        let mut state = doc_state(0);
        let mut doc = vec![Field::new_stored("note", VariantValue::Int(1))];
        consumer.process_document(&mut state, &mut doc).unwrap();

        // docs 1 and 2 never reached the chain
        let mut state = doc_state(3);
        let mut doc = vec![Field::new_stored("note", VariantValue::Int(4))];
        consumer.process_document(&mut state, &mut doc).unwrap();
        assert_eq!(consumer.stored_fields_cursor(), 4);

        let events = codec.stored_fields_events();
        let starts = events
            .iter()
            .filter(|e| **e == WriterEvent::StartDocument(0))
            .count();
        let finishes = events
            .iter()
            .filter(|e| **e == WriterEvent::FinishDocument)
            .count();
        assert_eq!(starts, 4);
        assert_eq!(finishes, 4);
        assert_eq!(
            events[events.len() - 3..].to_vec(),
            vec![
                WriterEvent::StartDocument(0),
                WriterEvent::WriteField("note".into(), VariantValue::Int(4)),
                WriterEvent::FinishDocument,
            ]
        );

        // a doc id below the cursor is refused
        let mut state = doc_state(2);
        let mut doc: Vec<Field> = vec![];
        assert!(consumer.process_document(&mut state, &mut doc).is_err());
    }

    #[test]
    fn test_boost_on_omitted_norms_rejected() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        let mut state = doc_state(0);
        let mut id = Field::new_string("id", "x1", false);
        id.set_boost(2.0);
        let mut doc = vec![id];

        let err = consumer.process_document(&mut state, &mut doc).unwrap_err();
        match *err.kind() {
            ErrorKind::UnsupportedOperation(ref msg) => {
                assert!(msg.contains("norms are omitted for field 'id'"))
            }
            ref k => panic!("unexpected error {:?}", k),
        }
        assert_eq!(consumer.terms_hash.events, vec![HashEvent::StartDocument]);
        assert!(consumer.field_infos.get("id").is_none());
        assert!(!state.is_aborting());

        // the chain keeps working
        let mut state = doc_state(1);
        let mut doc = vec![Field::new_string("id", "x2", false)];
        consumer.process_document(&mut state, &mut doc).unwrap();
        assert_eq!(consumer.stored_fields_cursor(), 2);
    }

    #[test]
    fn test_field_error_merged_with_stored_fields_failure() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        codec
            .stored_fields_log()
            .fail_at(Some(FailPoint::FinishDocument));
        let mut state = doc_state(0);
        let mut id = Field::new_string("id", "x1", false);
        id.set_boost(2.0);
        let mut doc = vec![id];

        let err = consumer.process_document(&mut state, &mut doc).unwrap_err();
        match *err.kind() {
            ErrorKind::Merged(ref primary, ref suppressed) => {
                match *primary.kind() {
                    ErrorKind::UnsupportedOperation(ref msg) => {
                        assert!(msg.contains("norms are omitted for field 'id'"))
                    }
                    ref k => panic!("unexpected primary {:?}", k),
                }
                assert!(format!("{}", suppressed).contains("FinishDocument"));
            }
            ref k => panic!("unexpected error {:?}", k),
        }
        let msg = format!("{}", err);
        assert!(msg.contains("norms are omitted") && msg.contains("FinishDocument"));
        assert!(state.is_aborting());
        assert_eq!(consumer.stored_fields_cursor(), 0);
    }

    #[test]
    fn test_every_field_finished_after_failure() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        consumer.terms_hash.fail_finish_field = Some("title".into());
        let mut state = doc_state(0);
        let mut doc = vec![
            Field::new_text("title", "a", false),
            Field::new_text("body", "b", false),
        ];

        let err = consumer.process_document(&mut state, &mut doc).unwrap_err();
        match *err.kind() {
            ErrorKind::IllegalState(ref msg) => assert_eq!(msg, "cannot finish title"),
            ref k => panic!("unexpected error {:?}", k),
        }
        assert!(state.is_aborting());
        assert!(consumer
            .terms_hash
            .events
            .contains(&HashEvent::FinishField("body".into(), 1)));
        assert!(!consumer
            .terms_hash
            .events
            .iter()
            .any(|e| *e == HashEvent::FinishDocument(0)));
    }

    #[test]
    fn test_abort_releases_only_own_bytes() {
        let shared = Counter::new();
        let chain = || {
            let si = SegmentInfo::new("_0", -1, random_id(), "Plain");
            DocConsumer::new(
                Arc::new(PlainCodec::default()),
                Arc::new(RAMDirectory::new()),
                &si,
                FieldInfosBuilder::default(),
                shared.shallow_copy(),
                DEFAULT_MAX_STORED_FIELD_LENGTH,
            )
        };
        let mut first = chain();
        let mut second = chain();
        for consumer in vec![&mut first, &mut second] {
            let mut state = doc_state(0);
            let mut doc = vec![Field::new_text("body", "hello world", false)];
            consumer.process_document(&mut state, &mut doc).unwrap();
        }
        let second_bytes = second.bytes_used();
        assert!(first.bytes_used() > 0 && second_bytes > 0);
        assert_eq!(shared.get(), first.bytes_used() + second_bytes);

        first.abort().unwrap();
        assert_eq!(first.bytes_used(), 0);
        assert_eq!(second.bytes_used(), second_bytes);
        assert_eq!(shared.get(), second_bytes);
    }

    #[test]
    fn test_finish_document_failure_aborts() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        consumer.terms_hash.fail_finish_document = true;

        let mut state = doc_state(0);
        let mut doc = vec![Field::new_text("body", "a b", false)];
        assert!(consumer.process_document(&mut state, &mut doc).is_err());
        assert!(state.is_aborting());

        consumer.terms_hash.fail_finish_document = false;
        state.doc_id = 1;
        let err = consumer.process_document(&mut state, &mut doc).unwrap_err();
        match *err.kind() {
            ErrorKind::IllegalState(_) => {}
            ref k => panic!("unexpected error {:?}", k),
        }
        let starts = consumer
            .terms_hash
            .events
            .iter()
            .filter(|e| **e == HashEvent::StartDocument)
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn test_abort_is_idempotent() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        consumer.abort().unwrap();

        let mut state = doc_state(0);
        let mut doc = vec![
            Field::new_text("body", "a b", false),
            Field::new_stored("note", VariantValue::Long(3)),
        ];
        consumer.process_document(&mut state, &mut doc).unwrap();
        assert_eq!(consumer.num_fields(), 2);

        consumer.abort().unwrap();
        consumer.abort().unwrap();
        assert_eq!(consumer.num_fields(), 0);
        assert!(consumer.field_infos.is_empty());
        assert_eq!(consumer.stored_fields_cursor(), 0);
        assert_eq!(consumer.bytes_used(), 0);

        let aborts = consumer
            .terms_hash
            .events
            .iter()
            .filter(|e| **e == HashEvent::Abort)
            .count();
        assert_eq!(aborts, 3);
        let stored_aborts = codec
            .stored_fields_events()
            .iter()
            .filter(|e| **e == WriterEvent::Abort)
            .count();
        assert_eq!(stored_aborts, 1);
    }

    #[test]
    fn test_unindexed_field_with_term_vectors_rejected() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        let mut ft = STORED_FIELD_TYPE;
        ft.store_term_vectors = true;
        let mut state = doc_state(0);
        let mut doc = vec![Field::new("f", ft, VariantValue::from("x"))];

        let err = consumer.process_document(&mut state, &mut doc).unwrap_err();
        match *err.kind() {
            ErrorKind::IllegalArgument(ref msg) => assert!(msg.contains(
                "cannot store term vectors for a field that is not indexed (field=\"f\")"
            )),
            ref k => panic!("unexpected error {:?}", k),
        }
        assert!(!state.is_aborting());
    }

    #[test]
    fn test_doc_values_kind_conflict() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);

        let mut state = doc_state(0);
        let mut doc = vec![Field::new_numeric_doc_values("price", 5)];
        consumer.process_document(&mut state, &mut doc).unwrap();

        let mut state = doc_state(1);
        let mut doc = vec![Field::new_binary_doc_values("price", b"x".to_vec())];
        let err = consumer.process_document(&mut state, &mut doc).unwrap_err();
        match *err.kind() {
            ErrorKind::IllegalArgument(_) => {}
            ref k => panic!("unexpected error {:?}", k),
        }
        assert!(!state.is_aborting());
        assert_eq!(
            consumer.field_infos.get("price").unwrap().doc_values_type,
            DocValuesType::Numeric
        );
    }

    #[test]
    fn test_doc_values_without_value_rejected() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        let mut field = Field::new_numeric_doc_values("price", 5);
        field.set_field_data(None);
        let mut state = doc_state(0);
        let err = consumer
            .process_document(&mut state, &mut [field])
            .unwrap_err();
        match *err.kind() {
            ErrorKind::IllegalArgument(ref msg) => assert!(msg.contains("no numeric value")),
            ref k => panic!("unexpected error {:?}", k),
        }
    }

    #[test]
    fn test_stored_writer_failure_aborts() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        codec.stored_fields_log().fail_at(Some(FailPoint::WriteField));

        let mut state = doc_state(0);
        let mut doc = vec![Field::new_stored("note", VariantValue::from("x"))];
        let err = consumer.process_document(&mut state, &mut doc).unwrap_err();
        assert!(format!("{}", err).contains("injected failure"));
        assert!(state.is_aborting());
        // finish is skipped once aborting
        assert!(!consumer
            .terms_hash
            .events
            .iter()
            .any(|e| *e == HashEvent::FinishDocument(0)));
    }

    #[test]
    fn test_stored_value_too_large() {
        let codec = Arc::new(TestCodec::default());
        let dir: Arc<dyn Directory> = Arc::new(RAMDirectory::new());
        let si = SegmentInfo::new("_0", -1, random_id(), "Test");
        let mut consumer = DocConsumer::with_terms_hash(
            Arc::clone(&codec),
            dir,
            &si,
            FieldInfosBuilder::default(),
            RecordingTermsHash::default(),
            Counter::new(),
            4,
        );
        let mut state = doc_state(0);
        let mut doc = vec![Field::new_stored("note", VariantValue::from("too long"))];
        let err = consumer.process_document(&mut state, &mut doc).unwrap_err();
        match *err.kind() {
            ErrorKind::IllegalArgument(ref msg) => {
                assert!(msg.contains("stored field \"note\" is too large"))
            }
            ref k => panic!("unexpected error {:?}", k),
        }
        assert!(!state.is_aborting());
        assert_eq!(consumer.stored_fields_cursor(), 1);
    }

    #[test]
    fn test_first_position_increment_zero_rejected() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        let mut token = Token::new();
        token.term.extend_from_slice(b"x");
        token.position = 0;
        let stream = CannedTokenStream::new(vec![token]);
        let mut doc = vec![Field::with_token_stream(
            "body",
            TEXT_FIELD_TYPE_NOT_STORED,
            Box::new(stream),
        )];
        let mut state = doc_state(0);

        let err = consumer.process_document(&mut state, &mut doc).unwrap_err();
        match *err.kind() {
            ErrorKind::IllegalArgument(ref msg) => assert_eq!(
                msg,
                "first position increment must be > 0 (got 0) for field 'body'"
            ),
            ref k => panic!("unexpected error {:?}", k),
        }
        assert!(!state.is_aborting());
    }

    #[test]
    fn test_backwards_offsets_rejected() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        let mut first = Token::new();
        first.term.extend_from_slice(b"b");
        first.set_offset(4, 5).unwrap();
        let mut second = Token::new();
        second.term.extend_from_slice(b"a");
        second.set_offset(0, 1).unwrap();

        let mut ft = TEXT_FIELD_TYPE_NOT_STORED;
        ft.index_options = IndexOptions::DocsAndFreqsAndPositionsAndOffsets;
        let stream = CannedTokenStream::new(vec![first, second]);
        let mut doc = vec![Field::with_token_stream("body", ft, Box::new(stream))];
        let mut state = doc_state(0);

        let err = consumer.process_document(&mut state, &mut doc).unwrap_err();
        match *err.kind() {
            ErrorKind::IllegalArgument(ref msg) => {
                assert!(msg.contains("offsets must not go backwards startOffset=0"))
            }
            ref k => panic!("unexpected error {:?}", k),
        }
    }

    #[test]
    fn test_field_without_capabilities_is_recorded() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, _) = consumer(&codec);
        let mut ft = FieldType::default();
        ft.tokenized = false;
        let mut doc = vec![Field::new("meta", ft, VariantValue::Int(1))];
        let mut state = doc_state(0);
        consumer.process_document(&mut state, &mut doc).unwrap();

        assert_eq!(consumer.num_fields(), 1);
        let fi = consumer.field_infos.get("meta").unwrap();
        assert!(!fi.is_indexed());
        assert_eq!(fi.doc_values_type, DocValuesType::Null);
    }

    #[test]
    fn test_flush_writes_segment() {
        let codec = Arc::new(TestCodec::default());
        let (mut consumer, dir) = consumer(&codec);

        let mut state = doc_state(0);
        let mut doc = vec![
            Field::new_text("body", "a b c", false),
            Field::new_string("id", "0", true),
        ];
        consumer.process_document(&mut state, &mut doc).unwrap();
        let mut state = doc_state(1);
        let mut doc = vec![Field::new_string("id", "1", true)];
        consumer.process_document(&mut state, &mut doc).unwrap();

        let si = SegmentInfo::new("_0", 2, random_id(), "Test");
        let mut write_state = SegmentWriteState::new(
            Arc::clone(&dir),
            si.clone(),
            FieldInfos::default(),
            IOContext::Default,
            String::new(),
        );
        consumer.flush(&mut write_state).unwrap();

        assert_eq!(
            consumer.terms_hash.events.last(),
            Some(&HashEvent::Flush(vec!["body".to_string(), "id".to_string()]))
        );
        assert_eq!(
            codec.stored_fields_events().last(),
            Some(&WriterEvent::Finish(2))
        );

        let fis = codec
            .field_infos_format()
            .read(dir.as_ref(), &si, "")
            .unwrap();
        assert_eq!(fis.len(), 2);
        assert!(fis.field_info_by_name("body").unwrap().has_norms());
        assert!(!fis.field_info_by_name("id").unwrap().has_norms());

        let norms = PlainNormsReader::open(dir.as_ref(), &si, &fis).unwrap();
        let body = norms.norms("body").unwrap();
        assert_eq!(body.len(), 2);
        assert!(body[0] != 0);
        assert_eq!(body[1], 0);
        assert!(norms.norms("id").is_none());
    }
}
